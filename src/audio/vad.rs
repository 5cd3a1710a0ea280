//! Energy-based voice-activity segmentation.
//!
//! Buffers incoming mono samples into fixed windows, classifies each window
//! as speech or silence by RMS energy, and emits complete utterances bounded
//! by min-speech / min-silence / max-segment durations. A short pre-roll is
//! kept so the onset of an utterance is not clipped.

use crate::error::SibylError;

/// Segmentation parameters.
#[derive(Debug, Clone)]
pub struct VadConfig {
    pub window_ms: u32,
    /// Sustained speech required before a segment opens.
    pub min_speech_ms: u32,
    /// Sustained silence that closes an open segment.
    pub min_silence_ms: u32,
    /// Audio retained from before speech onset.
    pub pre_roll_ms: u32,
    /// Hard bound on a single segment.
    pub max_segment_ms: u32,
    /// RMS energy at or above which a window counts as speech.
    pub energy_threshold: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            window_ms: 100,
            min_speech_ms: 200,
            min_silence_ms: 500,
            pre_roll_ms: 200,
            max_segment_ms: 30_000,
            energy_threshold: 0.015,
        }
    }
}

impl VadConfig {
    pub fn with_window_ms(mut self, ms: u32) -> Self {
        self.window_ms = ms;
        self
    }

    pub fn with_min_speech_ms(mut self, ms: u32) -> Self {
        self.min_speech_ms = ms;
        self
    }

    pub fn with_min_silence_ms(mut self, ms: u32) -> Self {
        self.min_silence_ms = ms;
        self
    }

    pub fn with_pre_roll_ms(mut self, ms: u32) -> Self {
        self.pre_roll_ms = ms;
        self
    }

    pub fn with_max_segment_ms(mut self, ms: u32) -> Self {
        self.max_segment_ms = ms;
        self
    }

    pub fn with_energy_threshold(mut self, threshold: f32) -> Self {
        self.energy_threshold = threshold;
        self
    }
}

/// Why a segment was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEnd {
    Silence,
    MaxDuration,
    EndOfStream,
}

/// One detected utterance.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub end: SegmentEnd,
}

/// Stateful segmenter over a stream of mono samples at a fixed rate.
pub struct SpeechSegmenter {
    config: VadConfig,
    sample_rate: u32,
    window_samples: usize,
    pre_roll_max_samples: usize,
    pending_samples: Vec<f32>,
    pre_roll: std::collections::VecDeque<f32>,
    pending_speech: Vec<f32>,
    speech_buffer: Vec<f32>,
    in_speech: bool,
    pending_speech_ms: u32,
    silence_ms: u32,
    segment_ms: u32,
}

impl SpeechSegmenter {
    pub fn new(sample_rate: u32, config: VadConfig) -> Result<Self, SibylError> {
        if sample_rate == 0 {
            return Err(SibylError::InvalidArgument(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        if config.window_ms == 0 {
            return Err(SibylError::InvalidArgument(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        if config.max_segment_ms < config.window_ms {
            return Err(SibylError::InvalidArgument(
                "max_segment_ms must be >= window_ms".to_string(),
            ));
        }

        let window_samples =
            ((sample_rate as f32 * config.window_ms as f32 / 1000.0).round() as usize).max(1);
        let pre_roll_max_samples =
            ((sample_rate as f32 * config.pre_roll_ms as f32) / 1000.0) as usize;

        Ok(Self {
            config,
            sample_rate,
            window_samples,
            pre_roll_max_samples,
            pending_samples: Vec::new(),
            pre_roll: std::collections::VecDeque::new(),
            pending_speech: Vec::new(),
            speech_buffer: Vec::new(),
            in_speech: false,
            pending_speech_ms: 0,
            silence_ms: 0,
            segment_ms: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    /// True while speech is actively being accumulated.
    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed samples; returns any segments completed by this chunk.
    pub fn push(&mut self, samples: &[f32]) -> Vec<SpeechSegment> {
        if samples.is_empty() {
            return Vec::new();
        }

        self.pending_samples.extend_from_slice(samples);
        let mut segments = Vec::new();

        while self.pending_samples.len() >= self.window_samples {
            let window: Vec<f32> = self.pending_samples.drain(..self.window_samples).collect();
            if let Some(segment) = self.process_window(&window) {
                segments.push(segment);
            }
        }

        segments
    }

    /// Flush any in-progress segment at end of stream.
    pub fn finalize(&mut self) -> Option<SpeechSegment> {
        if !self.in_speech || self.speech_buffer.is_empty() {
            self.reset_state();
            return None;
        }

        if !self.pending_samples.is_empty() {
            let tail = std::mem::take(&mut self.pending_samples);
            self.speech_buffer.extend_from_slice(&tail);
        }
        let segment = SpeechSegment {
            samples: std::mem::take(&mut self.speech_buffer),
            sample_rate: self.sample_rate,
            end: SegmentEnd::EndOfStream,
        };

        self.reset_state();
        Some(segment)
    }

    fn process_window(&mut self, window: &[f32]) -> Option<SpeechSegment> {
        if !self.in_speech {
            self.push_pre_roll(window);
        }

        if rms_energy(window) >= self.config.energy_threshold {
            self.on_speech(window)
        } else {
            self.on_silence(window)
        }
    }

    fn on_speech(&mut self, window: &[f32]) -> Option<SpeechSegment> {
        self.silence_ms = 0;
        if !self.in_speech {
            self.pending_speech_ms = self.pending_speech_ms.saturating_add(self.config.window_ms);
            self.pending_speech.extend_from_slice(window);

            if self.pending_speech_ms >= self.config.min_speech_ms {
                self.start_segment();
            }

            return None;
        }

        self.speech_buffer.extend_from_slice(window);
        self.segment_ms = self.segment_ms.saturating_add(self.config.window_ms);
        if self.segment_ms >= self.config.max_segment_ms {
            return self.finish_segment(SegmentEnd::MaxDuration);
        }

        None
    }

    fn on_silence(&mut self, window: &[f32]) -> Option<SpeechSegment> {
        if !self.in_speech {
            self.pending_speech.clear();
            self.pending_speech_ms = 0;
            return None;
        }

        self.silence_ms = self.silence_ms.saturating_add(self.config.window_ms);
        self.segment_ms = self.segment_ms.saturating_add(self.config.window_ms);
        self.speech_buffer.extend_from_slice(window);

        if self.segment_ms >= self.config.max_segment_ms {
            return self.finish_segment(SegmentEnd::MaxDuration);
        }

        if self.silence_ms >= self.config.min_silence_ms {
            return self.finish_segment(SegmentEnd::Silence);
        }

        None
    }

    fn start_segment(&mut self) {
        self.in_speech = true;
        self.segment_ms = self.pending_speech_ms;
        self.pending_speech_ms = 0;
        self.speech_buffer.clear();
        self.speech_buffer.extend(self.pre_roll.drain(..));
        let pending = std::mem::take(&mut self.pending_speech);
        self.speech_buffer.extend_from_slice(&pending);
    }

    fn finish_segment(&mut self, end: SegmentEnd) -> Option<SpeechSegment> {
        if self.speech_buffer.is_empty() {
            self.reset_state();
            return None;
        }

        let segment = SpeechSegment {
            samples: std::mem::take(&mut self.speech_buffer),
            sample_rate: self.sample_rate,
            end,
        };

        self.reset_state();
        Some(segment)
    }

    fn push_pre_roll(&mut self, window: &[f32]) {
        if self.pre_roll_max_samples == 0 {
            return;
        }

        self.pre_roll.extend(window.iter().copied());
        while self.pre_roll.len() > self.pre_roll_max_samples {
            self.pre_roll.pop_front();
        }
    }

    fn reset_state(&mut self) {
        self.in_speech = false;
        self.pending_speech_ms = 0;
        self.silence_ms = 0;
        self.segment_ms = 0;
        self.pending_speech.clear();
        self.pre_roll.clear();
        self.speech_buffer.clear();
    }
}

fn rms_energy(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = window.iter().map(|v| v * v).sum();
    (sum_squares / window.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> SpeechSegmenter {
        let config = VadConfig::default()
            .with_window_ms(100)
            .with_min_speech_ms(200)
            .with_min_silence_ms(200)
            .with_pre_roll_ms(100)
            .with_max_segment_ms(2_000)
            .with_energy_threshold(0.2);
        SpeechSegmenter::new(16_000, config).unwrap()
    }

    #[test]
    fn segments_speech_between_silences() {
        let mut segmenter = segmenter();
        let window = segmenter.window_samples();
        let silence = vec![0.0; window];
        let speech = vec![0.8; window];

        let mut segments = Vec::new();
        segments.extend(segmenter.push(&silence));
        segments.extend(segmenter.push(&speech));
        segments.extend(segmenter.push(&speech));
        segments.extend(segmenter.push(&silence));
        segments.extend(segmenter.push(&silence));

        assert_eq!(segments.len(), 1);
        let segment = &segments[0];
        assert_eq!(segment.end, SegmentEnd::Silence);
        assert!(segment.samples.len() >= window);
        assert_eq!(segment.sample_rate, 16_000);
    }

    #[test]
    fn short_blips_do_not_open_a_segment() {
        let mut segmenter = segmenter();
        let window = segmenter.window_samples();
        let silence = vec![0.0; window];
        let speech = vec![0.8; window];

        // one speech window < min_speech_ms, then silence
        let mut segments = Vec::new();
        segments.extend(segmenter.push(&speech));
        segments.extend(segmenter.push(&silence));
        segments.extend(segmenter.push(&silence));
        segments.extend(segmenter.push(&silence));

        assert!(segments.is_empty());
        assert!(segmenter.finalize().is_none());
    }

    #[test]
    fn finalize_flushes_open_segment() {
        let mut segmenter = segmenter();
        let speech = vec![0.8; segmenter.window_samples()];

        segmenter.push(&speech);
        segmenter.push(&speech);
        assert!(segmenter.in_speech());

        let segment = segmenter.finalize().unwrap();
        assert_eq!(segment.end, SegmentEnd::EndOfStream);
        assert!(!segment.samples.is_empty());
        assert!(!segmenter.in_speech());
    }

    #[test]
    fn long_speech_is_cut_at_max_duration() {
        let mut segmenter = segmenter();
        let speech = vec![0.8; segmenter.window_samples()];

        let mut segments = Vec::new();
        for _ in 0..25 {
            segments.extend(segmenter.push(&speech));
        }

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, SegmentEnd::MaxDuration);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(SpeechSegmenter::new(0, VadConfig::default()).is_err());
    }
}
