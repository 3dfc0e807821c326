//! # audio-sync-virtual
//!
//! In-memory devices for audio-sync-core.
//!
//! Provides:
//! - `VirtualCaptureDevice` — loop-buffer capture source recording a synthetic [`Signal`]
//! - `VirtualPlaybackSink` — loop-buffer sink whose cursor follows simulated time
//! - `ManualClock` — shared clock advanced by hand
//! - `simulation` — a tick loop wiring all of the above through a framer and jitter buffer
//!
//! Both devices take an optional clock skew so capture and playback can be
//! made to drift apart.
//!
//! ## Usage
//! ```ignore
//! use audio_sync_core::{CaptureFramer, PlaybackJitterBuffer, PlaybackConfiguration};
//! use audio_sync_virtual::{ManualClock, VirtualCaptureDevice, VirtualPlaybackSink};
//!
//! let clock = ManualClock::new();
//! let mut framer = CaptureFramer::new(VirtualCaptureDevice::new("mic", 1, 1.0), clock.clone());
//! let mut jitter = PlaybackJitterBuffer::new(
//!     VirtualPlaybackSink::new(),
//!     clock.clone(),
//!     PlaybackConfiguration::default(),
//! )?;
//! ```

pub mod capture_device;
pub mod clock;
pub mod playback_sink;
pub mod signal;
pub mod simulation;

pub use capture_device::VirtualCaptureDevice;
pub use clock::ManualClock;
pub use playback_sink::VirtualPlaybackSink;
pub use signal::Signal;
pub use simulation::{LoopbackSimulation, SimulationConfig, SimulationReport};
