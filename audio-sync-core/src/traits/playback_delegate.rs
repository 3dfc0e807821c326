use crate::models::audio_models::StreamFormat;
use crate::models::state::StopReason;

/// Event delegate for jitter buffer notifications.
///
/// Called synchronously from `feed`, `on_tick` and `stop`.
pub trait PlaybackDelegate: Send + Sync {
    /// Enough audio is buffered and the sink started playing.
    fn on_playback_started(&self);

    /// The sink stopped; buffered audio was discarded.
    fn on_playback_stopped(&self, reason: StopReason);

    /// The sink buffer was reallocated for a new format or configuration.
    fn on_reinitialized(&self, _format: &StreamFormat) {}
}
