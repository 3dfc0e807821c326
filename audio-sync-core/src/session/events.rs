use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use crate::models::audio_frame::AudioFrame;
use crate::models::audio_models::StreamFormat;
use crate::models::state::StopReason;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::playback_delegate::PlaybackDelegate;

/// Capture and playback notifications as plain values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SyncEvent {
    FrameCollected(AudioFrame),
    RecordingStarted(StreamFormat),
    FormatChanged(StreamFormat),
    RecordingStopped,
    PlaybackStarted,
    PlaybackStopped(StopReason),
    PlaybackReinitialized(StreamFormat),
}

/// Delegate that forwards every callback into a channel.
///
/// Lets a host wire the framer straight into a jitter buffer on another
/// thread: the capture side installs this as its delegate, the playback side
/// drains the receiver and feeds [`SyncEvent::FrameCollected`] frames.
/// Sends to a disconnected receiver are dropped.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    tx: Sender<SyncEvent>,
}

impl ChannelDelegate {
    pub fn new(tx: Sender<SyncEvent>) -> Self {
        Self { tx }
    }

    /// Unbounded channel with a delegate on the sending end.
    pub fn channel() -> (Self, Receiver<SyncEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("Event receiver gone, dropping event");
        }
    }
}

impl CaptureDelegate for ChannelDelegate {
    fn on_frame_collected(&self, frame: &AudioFrame) {
        self.send(SyncEvent::FrameCollected(frame.clone()));
    }

    fn on_recording_started(&self, format: &StreamFormat) {
        self.send(SyncEvent::RecordingStarted(*format));
    }

    fn on_format_changed(&self, format: &StreamFormat) {
        self.send(SyncEvent::FormatChanged(*format));
    }

    fn on_recording_stopped(&self) {
        self.send(SyncEvent::RecordingStopped);
    }
}

impl PlaybackDelegate for ChannelDelegate {
    fn on_playback_started(&self) {
        self.send(SyncEvent::PlaybackStarted);
    }

    fn on_playback_stopped(&self, reason: StopReason) {
        self.send(SyncEvent::PlaybackStopped(reason));
    }

    fn on_reinitialized(&self, format: &StreamFormat) {
        self.send(SyncEvent::PlaybackReinitialized(*format));
    }
}
