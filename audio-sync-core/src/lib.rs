//! # audio-sync-core
//!
//! Platform-agnostic core for carrying audio from a looping capture buffer to
//! a looping playback buffer whose clock drifts from the capture clock.
//!
//! Capture devices implement [`CaptureSource`] and are polled by a
//! [`CaptureFramer`], which cuts fixed-length [`AudioFrame`]s. Frames are fed
//! to a [`PlaybackJitterBuffer`] that writes into a [`PlaybackSink`] and
//! adjusts the sink's playback rate to hold a target latency.
//!
//! ## Architecture
//!
//! ```text
//! audio-sync-core (this crate)
//! ├── traits/       ← CaptureSource, PlaybackSink, Clock, CaptureDelegate, PlaybackDelegate
//! ├── models/       ← SyncError, AudioFrame, configs, StreamFormat, PlaybackStatus
//! ├── processing/   ← CircularPositionTracker, RingBuffer, drift math
//! └── session/      ← CaptureFramer, PlaybackJitterBuffer, ChannelDelegate
//! ```
//!
//! Both sessions are driven from the host's tick (`on_tick`) and are not
//! internally synchronized; share them across threads via
//! [`SharedFramer`] / [`SharedJitterBuffer`].

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_frame::AudioFrame;
pub use models::audio_models::{
    CaptureDiagnostics, DeviceInfo, PlaybackDiagnostics, StreamFormat,
};
pub use models::config::{CaptureConfiguration, PlaybackConfiguration};
pub use models::error::{Result, SyncError};
pub use models::state::{PlaybackStatus, StopReason};
pub use processing::position_tracker::CircularPositionTracker;
pub use processing::ring_buffer::RingBuffer;
pub use session::capture_framer::{CaptureFramer, SharedFramer};
pub use session::events::{ChannelDelegate, SyncEvent};
pub use session::jitter_buffer::{PlaybackJitterBuffer, SharedJitterBuffer};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_source::CaptureSource;
pub use traits::clock::{Clock, SystemClock};
pub use traits::playback_delegate::PlaybackDelegate;
pub use traits::playback_sink::PlaybackSink;
