use serde::{Deserialize, Serialize};

use super::error::SyncError;

/// Default capture frame length in milliseconds.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 20;

/// Smallest accepted playback buffer multiplier.
pub const MIN_BUFFER_FACTOR: u32 = 3;

/// Upper bound on the pitch correction (as a fraction of nominal rate).
pub const MAX_PITCH_CORRECTION: f32 = 0.5;

/// How much faster than nominal a capture clock may run before a poll gap
/// is treated as a lapped buffer.
pub const CAPTURE_DRIFT_TOLERANCE: f64 = 0.1;

/// Configuration for a capture session.
///
/// The frame length derived from this is fixed for the life of the session;
/// changing either field requires restarting capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Sample rate requested from the capture source, in Hz (default: 48000).
    pub sample_rate: u32,

    /// Duration of one emitted frame in milliseconds (default: 20).
    pub frame_duration_ms: u32,

    /// Gain applied to every emitted sample (default: 1.0).
    pub volume_multiplier: f32,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.frame_duration_ms == 0 {
            return Err("frame duration must be positive".into());
        }
        if !self.volume_multiplier.is_finite() || self.volume_multiplier < 0.0 {
            return Err(format!("invalid volume multiplier: {}", self.volume_multiplier));
        }
        Ok(())
    }

    /// Number of interleaved samples in one frame for `channels` channels.
    pub fn frame_len(&self, channels: u16) -> usize {
        let per_channel = self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000;
        per_channel as usize * channels as usize
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::InvalidConfigFile(e.to_string()))?;
        config.validate().map_err(SyncError::Configuration)?;
        Ok(config)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            volume_multiplier: 1.0,
        }
    }
}

/// Tuning for the playback jitter buffer and its drift controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfiguration {
    /// Latency the controller steers toward, in seconds (default: 0.25).
    /// Playback starts once this much audio has been buffered.
    pub target_latency_secs: f32,

    /// Maximum time without a new frame before buffered audio is considered
    /// stale, in seconds (default: 0.5, recommended 0.1–0.75).
    pub frame_lifetime_secs: f32,

    /// Multiplier applied to `target_latency + frame_lifetime` when sizing the
    /// ring buffer (default: 4, minimum 3).
    pub buffer_factor: u32,

    /// Proportional gain of the pitch controller, per second of latency error
    /// (default: 1.0, recommended 0–10).
    pub pitch_proportional_gain: f32,

    /// Clamp on the playback rate deviation from 1.0 (default: 0.15, 0–0.5).
    pub pitch_max_correction: f32,
}

impl PlaybackConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !self.target_latency_secs.is_finite() || self.target_latency_secs <= 0.0 {
            return Err(format!("target latency must be positive: {}", self.target_latency_secs));
        }
        if !self.frame_lifetime_secs.is_finite() || self.frame_lifetime_secs <= 0.0 {
            return Err(format!("frame lifetime must be positive: {}", self.frame_lifetime_secs));
        }
        if self.buffer_factor < MIN_BUFFER_FACTOR {
            return Err(format!(
                "buffer factor must be {} or more: {}",
                MIN_BUFFER_FACTOR, self.buffer_factor
            ));
        }
        if !self.pitch_proportional_gain.is_finite() || self.pitch_proportional_gain < 0.0 {
            return Err(format!("invalid pitch gain: {}", self.pitch_proportional_gain));
        }
        if !(0.0..=MAX_PITCH_CORRECTION).contains(&self.pitch_max_correction) {
            return Err(format!(
                "pitch max correction must be within [0, {}]: {}",
                MAX_PITCH_CORRECTION, self.pitch_max_correction
            ));
        }
        Ok(())
    }

    /// Ring buffer capacity, in interleaved samples, for the given format.
    pub fn capacity_for(&self, sample_rate: u32, channels: u16) -> usize {
        let window = (self.target_latency_secs as f64 + self.frame_lifetime_secs as f64)
            * self.buffer_factor as f64
            * sample_rate as f64;
        window.ceil() as usize * channels as usize
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::InvalidConfigFile(e.to_string()))?;
        config.validate().map_err(SyncError::Configuration)?;
        Ok(config)
    }
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self {
            target_latency_secs: 0.25,
            frame_lifetime_secs: 0.5,
            buffer_factor: 4,
            pitch_proportional_gain: 1.0,
            pitch_max_correction: 0.15,
        }
    }
}
