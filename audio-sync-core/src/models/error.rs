use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the sync engine at its call boundaries.
///
/// Transient runtime conditions on the playback side (underrun, staleness,
/// overflow, format changes) are never reported here; they reset the jitter
/// buffer and show up as [`StopReason`](super::state::StopReason) events.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("configuration rejected: {0}")]
    Configuration(String),

    #[error("sample rate {requested} Hz outside device range {min}..={max} Hz")]
    UnsupportedSampleRate { requested: u32, min: u32, max: u32 },

    /// The capture cursor lapped the reader: at least one full buffer of
    /// unread audio was overwritten between two polls.
    #[error("capture overrun: {elapsed:?} since last poll, buffer holds {buffer_duration:?}")]
    CaptureOverrun {
        elapsed: Duration,
        buffer_duration: Duration,
    },

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("device error: {0}")]
    Device(String),

    #[error("invalid config file: {0}")]
    InvalidConfigFile(String),
}

impl SyncError {
    /// Whether the caller can keep ticking after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CaptureOverrun { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
