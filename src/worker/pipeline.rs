//! The live speech pipeline.
//!
//! Voice-activity segmentation → speech-to-text → chat completion →
//! text-to-speech, fed by a room's audio stream. The pipeline has no end
//! condition of its own: it runs until the room audio stream closes or a
//! collaborator call fails.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info};

use crate::audio::{pcm_f32_to_s16le, SpeechSegment, SpeechSegmenter, SpeechToText, TextToSpeech, VadConfig};
use crate::completion::ChatCompletion;
use crate::error::{Result, SibylError};
use crate::room::RoomSession;
use crate::types::Turn;

/// A running voice pipeline bound to one room.
pub struct VoicePipeline {
    room: Arc<dyn RoomSession>,
    stt: Arc<dyn SpeechToText>,
    completion: Arc<dyn ChatCompletion>,
    tts: Arc<dyn TextToSpeech>,
    vad: VadConfig,
    sample_rate: u32,
    greeting: String,
    turns: Vec<Turn>,
}

impl VoicePipeline {
    pub fn new(
        room: Arc<dyn RoomSession>,
        stt: Arc<dyn SpeechToText>,
        completion: Arc<dyn ChatCompletion>,
        tts: Arc<dyn TextToSpeech>,
        instructions: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            room,
            stt,
            completion,
            tts,
            vad: VadConfig::default(),
            sample_rate: 16_000,
            greeting: greeting.into(),
            turns: vec![Turn::system(instructions)],
        }
    }

    pub fn with_vad(mut self, vad: VadConfig) -> Self {
        self.vad = vad;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Conversation context accumulated so far.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Run until the room's audio stream ends.
    pub async fn run(mut self) -> Result<()> {
        info!(room = %self.room.name(), "starting voice pipeline");

        // Speak first: the greeting goes out before any user audio arrives,
        // and lands in the context so the model knows it already said hello.
        let greeting = self.greeting.clone();
        self.say(&greeting).await?;
        self.turns.push(Turn::assistant(greeting));

        let mut segmenter = SpeechSegmenter::new(self.sample_rate, self.vad.clone())?;
        let mut audio = self.room.audio_input();

        while let Some(frame) = audio.next().await {
            if frame.sample_rate != self.sample_rate {
                return Err(SibylError::InvalidArgument(format!(
                    "expected {} Hz audio, got {} Hz",
                    self.sample_rate, frame.sample_rate
                )));
            }
            for segment in segmenter.push(&frame.samples) {
                self.handle_segment(segment).await?;
            }
        }

        if let Some(segment) = segmenter.finalize() {
            self.handle_segment(segment).await?;
        }

        info!(room = %self.room.name(), "room audio ended, pipeline stopping");
        Ok(())
    }

    async fn handle_segment(&mut self, segment: SpeechSegment) -> Result<()> {
        let pcm = pcm_f32_to_s16le(&segment.samples);
        let text = self.stt.transcribe(&pcm, segment.sample_rate).await?;
        if text.trim().is_empty() {
            debug!("segment transcribed to nothing, skipping");
            return Ok(());
        }

        info!(room = %self.room.name(), "user said: {text}");
        self.turns.push(Turn::user(text));

        let reply = self.completion.complete(&self.turns).await?;
        self.turns.push(Turn::assistant(reply.clone()));
        self.say(&reply).await
    }

    async fn say(&self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        self.room.publish_audio(&audio).await
    }
}
