use crate::models::audio_models::DeviceInfo;
use crate::models::error::SyncError;

/// A capture device that records into a looping buffer and exposes its
/// write cursor.
///
/// The device keeps overwriting the buffer whether or not anyone reads it;
/// the [`CaptureFramer`](crate::session::capture_framer::CaptureFramer) polls
/// the cursor and pulls out whatever is new. Positions and counts are in
/// interleaved samples.
///
/// Implemented by:
/// - `VirtualCaptureDevice` (in-memory, `audio-sync-virtual`)
/// - Platform backends wrapping a hardware loop buffer
pub trait CaptureSource: Send {
    /// Current write cursor, in `[0, buffer_capacity_samples())`.
    fn current_position(&self) -> usize;

    /// Length of the loop buffer in interleaved samples.
    fn buffer_capacity_samples(&self) -> usize;

    /// Copy `count` samples starting at `start_offset`.
    ///
    /// The framer never asks for a span that crosses the end of the buffer.
    fn read_samples(&self, start_offset: usize, count: usize) -> Vec<f32>;

    /// Whether the device is currently recording.
    fn is_active(&self) -> bool;

    /// Channels in the loop buffer. May change while recording on some
    /// devices; the framer treats that as a format change.
    fn channel_count(&self) -> u16;

    /// Start recording at `sample_rate`, cursor at 0.
    fn start(&mut self, sample_rate: u32) -> Result<(), SyncError>;

    /// Stop recording.
    fn stop(&mut self);

    /// Name and supported rate range of the device.
    fn device_info(&self) -> DeviceInfo;
}
