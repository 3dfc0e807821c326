use serde::{Deserialize, Serialize};

/// Playback jitter buffer state machine.
///
/// ```text
/// idle → buffering → playing
///            ↑          │  underrun / stale / overflow / reset
///            └──────────┘
/// ```
/// Idle means no buffer is allocated yet. Any reallocation passes back
/// through buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Buffering,
    Playing,
}

impl PlaybackStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self, Self::Buffering)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Why playback stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// The playback cursor overtook the write position.
    Underrun,
    /// No frame arrived within the frame lifetime.
    Stale,
    /// The writer lapped the playback cursor by more than one buffer.
    Overflow,
    /// Explicit stop, reconfiguration or format change.
    Reset,
}
