use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::StreamFormat;

/// One fixed-length block of interleaved PCM samples.
///
/// Frames are the only thing that crosses from capture to playback; neither
/// side shares its buffer with the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    pub sample_rate: u32,
    pub channel_count: u16,
    /// Interleaved samples, `frame_count() * channel_count` long.
    pub samples: Vec<f32>,
    /// Clock reading when the framer cut this frame, if known.
    pub captured_at: Option<Duration>,
    /// Framer sequence number, starting at 1. Zero for hand-built frames.
    pub sequence: u64,
}

impl AudioFrame {
    pub fn new(sample_rate: u32, channel_count: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channel_count,
            samples,
            captured_at: None,
            sequence: 0,
        }
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        if self.channel_count == 0 {
            return 0;
        }
        self.samples.len() / self.channel_count as usize
    }

    /// Duration of this frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channel_count: self.channel_count,
            frame_len: self.samples.len(),
        }
    }
}
