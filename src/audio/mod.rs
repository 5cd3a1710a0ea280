//! Speech collaborators: transcription, synthesis, and voice-activity
//! segmentation.

pub mod stt;
pub mod tts;
pub mod vad;

pub use stt::{DeepgramStt, SpeechToText};
pub use tts::{ElevenLabsTts, TextToSpeech};
pub use vad::{SegmentEnd, SpeechSegment, SpeechSegmenter, VadConfig};

/// Convert mono f32 samples in [-1, 1] to little-endian signed 16-bit PCM.
pub fn pcm_f32_to_s16le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_conversion_clamps_and_scales() {
        let bytes = pcm_f32_to_s16le(&[0.0, 1.0, -1.0, 2.0]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 0);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), i16::MAX);
        // full-scale negative and out-of-range input both clamp
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), -i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[6], bytes[7]]), i16::MAX);
    }
}
