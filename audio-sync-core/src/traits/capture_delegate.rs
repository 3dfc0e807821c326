use crate::models::audio_frame::AudioFrame;
use crate::models::audio_models::StreamFormat;

/// Event delegate for capture framer notifications.
///
/// Called synchronously from `start`, `stop` and `on_tick`, on whatever
/// thread drives the framer. Implementations should hand work off rather
/// than block.
pub trait CaptureDelegate: Send + Sync {
    /// Called once per emitted frame, in sequence order.
    fn on_frame_collected(&self, frame: &AudioFrame);

    /// Called when a capture session starts.
    fn on_recording_started(&self, _format: &StreamFormat) {}

    /// Called when the device changed channel count mid-session.
    fn on_format_changed(&self, _format: &StreamFormat) {}

    /// Called when a capture session stops.
    fn on_recording_stopped(&self) {}
}
