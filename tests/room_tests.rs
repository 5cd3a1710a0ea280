use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use sibyl::error::SibylError;
use sibyl::room::{join_token, AudioFrame, LoopbackConnector, LoopbackRoom, RoomConnector, RoomSession};

#[tokio::test]
async fn join_token_is_a_jwt() {
    let token = join_token(
        "api-key",
        "api-secret-api-secret-api-secret",
        "room-1",
        "sibyl-worker",
        Duration::from_secs(3600),
    )
    .unwrap();

    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn join_token_requires_credentials() {
    let err = join_token("", "", "room-1", "sibyl-worker", Duration::from_secs(60)).unwrap_err();
    assert!(matches!(err, SibylError::Authentication(_)));
}

#[tokio::test]
async fn wait_for_participant_resolves_after_join() {
    let room = LoopbackRoom::new("r1");
    let waiter = {
        let room = room.clone() as Arc<dyn RoomSession>;
        tokio::spawn(async move { room.wait_for_participant().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    room.join("visitor");

    let participant = waiter.await.unwrap().unwrap();
    assert_eq!(participant.identity, "visitor");
}

#[tokio::test]
async fn audio_stream_ends_when_audio_is_closed() {
    let room = LoopbackRoom::new("r1");
    room.speak(AudioFrame {
        samples: vec![0.1; 160],
        sample_rate: 16_000,
    });
    room.end_audio();

    let frames: Vec<AudioFrame> = room.audio_input().collect().await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples.len(), 160);
}

#[tokio::test]
async fn published_audio_is_collected_in_order() {
    let room = LoopbackRoom::new("r1");
    let session = room.clone() as Arc<dyn RoomSession>;
    session.publish_audio(b"one").await.unwrap();
    session.publish_audio(b"two").await.unwrap();

    assert_eq!(room.published(), vec![b"one".to_vec(), b"two".to_vec()]);
}

#[tokio::test]
async fn connector_resolves_registered_rooms_only() {
    let connector = LoopbackConnector::new();
    connector.register(LoopbackRoom::new("known"));

    assert!(connector.connect("known").await.is_ok());
    assert!(matches!(
        connector.connect("unknown").await.unwrap_err(),
        SibylError::InvalidState(_)
    ));
}
