//! In-memory capture device backed by a [`RingBuffer`].
//!
//! Stands in for a hardware loop buffer: [`advance`](VirtualCaptureDevice::advance)
//! records `elapsed × sample_rate × skew` frames of the configured signal,
//! overwriting the oldest audio once the buffer is full.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use audio_sync_core::models::audio_models::DeviceInfo;
use audio_sync_core::models::error::SyncError;
use audio_sync_core::processing::ring_buffer::RingBuffer;
use audio_sync_core::traits::capture_source::CaptureSource;

use crate::signal::Signal;

struct CaptureState {
    info: DeviceInfo,
    signal: Signal,
    channels: u16,
    buffer_secs: f64,
    skew: f64,
    sample_rate: u32,
    active: bool,
    connected: bool,
    ring: RingBuffer,
    frames_recorded: u64,
    fractional_frames: f64,
}

impl CaptureState {
    fn allocate(&mut self) {
        let frames = (self.buffer_secs * self.sample_rate as f64).ceil() as usize;
        self.ring = RingBuffer::new(frames.max(1) * self.channels as usize);
        self.frames_recorded = 0;
        self.fractional_frames = 0.0;
    }
}

/// A capture device that records a synthetic signal into a loop buffer.
///
/// Cheap to clone; clones share the same device so a test can keep a handle
/// while a [`CaptureFramer`](audio_sync_core::CaptureFramer) owns another.
#[derive(Clone)]
pub struct VirtualCaptureDevice {
    inner: Arc<Mutex<CaptureState>>,
}

impl VirtualCaptureDevice {
    /// A device with a loop buffer of `buffer_secs` seconds that accepts any
    /// sample rate.
    pub fn new(name: impl Into<String>, channels: u16, buffer_secs: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureState {
                info: DeviceInfo {
                    name: name.into(),
                    min_frequency: 0,
                    max_frequency: 0,
                },
                signal: Signal::default(),
                channels: channels.max(1),
                buffer_secs,
                skew: 1.0,
                sample_rate: 0,
                active: false,
                connected: true,
                ring: RingBuffer::new(0),
                frames_recorded: 0,
                fractional_frames: 0.0,
            })),
        }
    }

    pub fn with_rate_range(self, min_frequency: u32, max_frequency: u32) -> Self {
        {
            let mut state = self.inner.lock();
            state.info.min_frequency = min_frequency;
            state.info.max_frequency = max_frequency;
        }
        self
    }

    pub fn with_signal(self, signal: Signal) -> Self {
        self.inner.lock().signal = signal;
        self
    }

    /// Record `skew` times faster than nominal, e.g. `1.001` for a device
    /// clock running 1000 ppm fast.
    pub fn with_clock_skew(self, skew: f64) -> Self {
        self.inner.lock().skew = skew;
        self
    }

    /// Record for `elapsed` of simulated time. Does nothing while stopped.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.inner.lock();
        if !state.active {
            return;
        }
        let exact =
            elapsed.as_secs_f64() * state.sample_rate as f64 * state.skew + state.fractional_frames;
        let frames = exact.floor();
        state.fractional_frames = exact - frames;

        let frames = frames as usize;
        let samples = state
            .signal
            .render(state.frames_recorded, frames, state.channels, state.sample_rate);
        state.ring.write(&samples);
        state.frames_recorded += frames as u64;
    }

    /// Write samples at the cursor directly, bypassing the signal.
    pub fn push_samples(&self, samples: &[f32]) {
        let mut state = self.inner.lock();
        state.ring.write(samples);
        state.frames_recorded += (samples.len() / state.channels as usize) as u64;
    }

    /// Change the channel layout mid-recording. The loop buffer is
    /// reallocated and the cursor restarts at 0.
    pub fn set_channel_count(&self, channels: u16) {
        let mut state = self.inner.lock();
        state.channels = channels.max(1);
        if state.active {
            state.allocate();
        }
        log::debug!("{}: now {} channels", state.info.name, state.channels);
    }

    /// Plug the device in or pull it out. Unplugging stops recording and
    /// makes [`start`](CaptureSource::start) fail until it is plugged back in.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.inner.lock();
        state.connected = connected;
        if !connected {
            state.active = false;
        }
        log::debug!(
            "{}: {}",
            state.info.name,
            if connected { "connected" } else { "disconnected" }
        );
    }

    /// Interleaved samples recorded since the last start.
    pub fn samples_recorded(&self) -> u64 {
        self.inner.lock().ring.abs_write_pos()
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.lock().sample_rate
    }
}

impl CaptureSource for VirtualCaptureDevice {
    fn current_position(&self) -> usize {
        self.inner.lock().ring.write_offset()
    }

    fn buffer_capacity_samples(&self) -> usize {
        self.inner.lock().ring.capacity()
    }

    fn read_samples(&self, start_offset: usize, count: usize) -> Vec<f32> {
        self.inner.lock().ring.read_span(start_offset, count)
    }

    fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    fn channel_count(&self) -> u16 {
        self.inner.lock().channels
    }

    fn start(&mut self, sample_rate: u32) -> Result<(), SyncError> {
        let mut state = self.inner.lock();
        if !state.connected {
            return Err(SyncError::DeviceNotAvailable);
        }
        if !state.info.supports_frequency(sample_rate) {
            return Err(SyncError::UnsupportedSampleRate {
                requested: sample_rate,
                min: state.info.min_frequency,
                max: state.info.max_frequency,
            });
        }
        if !state.buffer_secs.is_finite() || state.buffer_secs <= 0.0 {
            return Err(SyncError::Device(format!(
                "{}: invalid buffer length {}",
                state.info.name, state.buffer_secs
            )));
        }
        state.sample_rate = sample_rate;
        state.allocate();
        state.active = true;
        log::debug!(
            "{}: recording at {} Hz into {} samples",
            state.info.name,
            sample_rate,
            state.ring.capacity()
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.inner.lock().active = false;
    }

    fn device_info(&self) -> DeviceInfo {
        self.inner.lock().info.clone()
    }
}
