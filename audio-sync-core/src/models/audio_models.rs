use serde::{Deserialize, Serialize};

/// Shape of the audio a buffer was allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
    /// Interleaved samples per frame.
    pub frame_len: usize,
}

impl StreamFormat {
    /// Interleaved samples per second of audio.
    pub fn samples_per_second(&self) -> f64 {
        self.sample_rate as f64 * self.channel_count as f64
    }

    /// Seconds of audio covered by `samples` interleaved samples.
    pub fn samples_to_secs(&self, samples: u64) -> f64 {
        let rate = self.samples_per_second();
        if rate <= 0.0 {
            return 0.0;
        }
        samples as f64 / rate
    }
}

/// A capture device and the sample rates it accepts.
///
/// A `min_frequency`/`max_frequency` pair of `0`/`0` means the device takes
/// any rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub min_frequency: u32,
    pub max_frequency: u32,
}

impl DeviceInfo {
    pub fn supports_any_frequency(&self) -> bool {
        self.min_frequency == 0 && self.max_frequency == 0
    }

    pub fn supports_frequency(&self, sample_rate: u32) -> bool {
        self.supports_any_frequency()
            || (self.min_frequency..=self.max_frequency).contains(&sample_rate)
    }

    /// Rate to record at when the caller has no preference.
    pub fn preferred_frequency(&self) -> u32 {
        if self.supports_any_frequency() {
            48000
        } else {
            self.max_frequency
        }
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureDiagnostics {
    pub ticks: u64,
    pub frames_emitted: u64,
    pub samples_read: u64,
    pub wraparounds: u64,
    pub overruns: u64,
    pub format_changes: u64,
}

/// Counters and last controller readings for the playback jitter buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackDiagnostics {
    pub frames_fed: u64,
    pub samples_fed: u64,
    pub starts: u64,
    pub underruns: u64,
    pub stale_resets: u64,
    pub overflows: u64,
    pub reinitializations: u64,
    pub last_latency_secs: f32,
    pub last_playback_rate: f32,
}
