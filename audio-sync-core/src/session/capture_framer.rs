use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_frame::AudioFrame;
use crate::models::audio_models::{CaptureDiagnostics, StreamFormat};
use crate::models::config::{CaptureConfiguration, CAPTURE_DRIFT_TOLERANCE};
use crate::models::error::SyncError;
use crate::processing::position_tracker::CircularPositionTracker;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_source::CaptureSource;
use crate::traits::clock::Clock;

/// A framer shared between threads behind a lock.
pub type SharedFramer<S, C> = Arc<Mutex<CaptureFramer<S, C>>>;

/// Per-session capture state. Created on start, dropped on stop or
/// device change.
struct CaptureState {
    tracker: CircularPositionTracker,
    abs_read_pos: u64,
    pending: VecDeque<f32>,
    format: StreamFormat,
    last_poll: Duration,
}

impl CaptureState {
    fn new(format: StreamFormat, now: Duration) -> Self {
        Self {
            tracker: CircularPositionTracker::new(),
            abs_read_pos: 0,
            pending: VecDeque::with_capacity(format.frame_len * 2),
            format,
            last_poll: now,
        }
    }

    /// Drop everything pending and continue from `cursor`.
    fn resync(&mut self, cursor: usize, capacity: usize) {
        self.pending.clear();
        self.tracker.reset();
        self.tracker.seek(cursor as u64, capacity);
        self.abs_read_pos = cursor as u64;
    }
}

/// Recovers fixed-length frames from a continuously overwritten capture
/// buffer.
///
/// Poll once per host tick with [`on_tick`](Self::on_tick). Each poll reads
/// everything the device wrote since the previous one (in one span, or two
/// when the cursor wrapped), queues it, and cuts as many whole frames as the
/// queue holds. Ticks need not be evenly spaced, but must come more often
/// than the device fills its buffer ([`max_poll_interval`](Self::max_poll_interval));
/// a slower poll is reported as [`SyncError::CaptureOverrun`].
///
/// ```text
/// [CaptureSource loop buffer] → (cursor poll) → [FIFO] → AudioFrame × n → delegate / caller
/// ```
pub struct CaptureFramer<S: CaptureSource, C: Clock> {
    source: S,
    clock: C,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    config: Option<CaptureConfiguration>,
    session: Option<CaptureState>,
    volume_multiplier: f32,
    sequence: u64,
    diagnostics: CaptureDiagnostics,
}

impl<S: CaptureSource, C: Clock> CaptureFramer<S, C> {
    pub fn new(source: S, clock: C) -> Self {
        Self {
            source,
            clock,
            delegate: None,
            config: None,
            session: None,
            volume_multiplier: 1.0,
            sequence: 0,
            diagnostics: CaptureDiagnostics::default(),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Start a capture session. Restarting with the same rate and frame
    /// duration while recording only updates the volume.
    pub fn start(&mut self, config: CaptureConfiguration) -> Result<(), SyncError> {
        config.validate().map_err(SyncError::Configuration)?;

        let device = self.source.device_info();
        if !device.supports_frequency(config.sample_rate) {
            return Err(SyncError::UnsupportedSampleRate {
                requested: config.sample_rate,
                min: device.min_frequency,
                max: device.max_frequency,
            });
        }

        if self.is_recording() {
            if let Some(current) = &self.config {
                if current.sample_rate == config.sample_rate
                    && current.frame_duration_ms == config.frame_duration_ms
                {
                    self.volume_multiplier = config.volume_multiplier;
                    self.config = Some(config);
                    return Ok(());
                }
            }
        }

        self.stop();
        self.source.start(config.sample_rate)?;

        let channel_count = self.source.channel_count();
        let format = StreamFormat {
            sample_rate: config.sample_rate,
            channel_count,
            frame_len: config.frame_len(channel_count),
        };
        if format.frame_len == 0 {
            self.source.stop();
            return Err(SyncError::Configuration(format!(
                "frame of {} ms at {} Hz x {} channels holds no samples",
                config.frame_duration_ms, config.sample_rate, channel_count
            )));
        }

        log::info!(
            "Capture started on '{}': {} Hz, {} ch, {} samples/frame",
            device.name,
            format.sample_rate,
            format.channel_count,
            format.frame_len
        );

        self.session = Some(CaptureState::new(format, self.clock.now()));
        self.volume_multiplier = config.volume_multiplier;
        self.config = Some(config);

        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_started(&format);
        }
        Ok(())
    }

    /// Start at the device's preferred rate with default volume.
    pub fn start_default(&mut self, frame_duration_ms: u32) -> Result<(), SyncError> {
        let sample_rate = self.source.device_info().preferred_frequency();
        self.start(CaptureConfiguration {
            sample_rate,
            frame_duration_ms,
            ..CaptureConfiguration::default()
        })
    }

    /// Stop the session and discard anything not yet framed.
    pub fn stop(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        self.source.stop();
        log::info!("Capture stopped after {} frames", self.sequence);

        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_stopped();
        }
    }

    /// Swap the capture device. Stops any running session; call
    /// [`start`](Self::start) again to record from the new device.
    pub fn replace_source(&mut self, source: S) -> S {
        self.stop();
        std::mem::replace(&mut self.source, source)
    }

    /// Poll the device and return the frames completed by this tick.
    ///
    /// Returns an empty list when nothing new was written, when not
    /// recording, or after a channel-count change (which restarts framing).
    pub fn on_tick(&mut self) -> Result<Vec<AudioFrame>, SyncError> {
        let volume = self.volume_multiplier;
        let Some(session) = self.session.as_mut() else {
            return Ok(Vec::new());
        };
        // Idle ticks still count as polls so a paused device does not
        // read as a lapped buffer once it resumes.
        let now = self.clock.now();
        if !self.source.is_active() {
            session.last_poll = now;
            return Ok(Vec::new());
        }
        self.diagnostics.ticks += 1;

        let capacity = self.source.buffer_capacity_samples();
        let cursor = self.source.current_position();
        if capacity == 0 {
            session.last_poll = now;
            return Ok(Vec::new());
        }

        let channel_count = self.source.channel_count();
        if channel_count != session.format.channel_count {
            let config = self.config.clone().unwrap_or_default();
            session.format = StreamFormat {
                channel_count,
                frame_len: config.frame_len(channel_count),
                ..session.format
            };
            session.resync(cursor, capacity);
            session.last_poll = now;
            self.diagnostics.format_changes += 1;
            let format = session.format;

            log::debug!(
                "Capture channel count changed to {}, framing restarted",
                channel_count
            );
            if let Some(ref delegate) = self.delegate {
                delegate.on_format_changed(&format);
            }
            return Ok(Vec::new());
        }

        let elapsed = now.saturating_sub(session.last_poll);
        session.last_poll = now;
        let buffer_duration =
            Duration::from_secs_f64(session.format.samples_to_secs(capacity as u64));
        // A fast device clock fills the loop before the nominal duration.
        let worst_case_written = elapsed.as_secs_f64()
            * session.format.samples_per_second()
            * (1.0 + CAPTURE_DRIFT_TOLERANCE);
        if worst_case_written >= capacity as f64 {
            session.resync(cursor, capacity);
            self.diagnostics.overruns += 1;
            log::warn!(
                "Capture overrun: polled after {:?}, buffer holds {:?}",
                elapsed,
                buffer_duration
            );
            return Err(SyncError::CaptureOverrun {
                elapsed,
                buffer_duration,
            });
        }

        let prev = session.tracker.prev_cursor();
        if cursor == prev {
            return Ok(Vec::new());
        }

        let wrapped = session.tracker.wrapped_since(cursor);
        let curr_abs = session.tracker.advance(cursor, capacity);
        let fresh = if wrapped {
            self.diagnostics.wraparounds += 1;
            let mut tail = self.source.read_samples(prev, capacity - prev);
            tail.extend(self.source.read_samples(0, cursor));
            tail
        } else {
            self.source.read_samples(prev, cursor - prev)
        };
        self.diagnostics.samples_read += fresh.len() as u64;
        session.pending.extend(fresh);
        session.abs_read_pos = curr_abs;

        let format = session.format;
        let mut frames = Vec::new();
        while session.pending.len() >= format.frame_len {
            let mut samples: Vec<f32> = session.pending.drain(..format.frame_len).collect();
            if volume != 1.0 {
                samples.iter_mut().for_each(|s| *s *= volume);
            }
            self.sequence += 1;
            frames.push(AudioFrame {
                sample_rate: format.sample_rate,
                channel_count: format.channel_count,
                samples,
                captured_at: Some(now),
                sequence: self.sequence,
            });
        }
        self.diagnostics.frames_emitted += frames.len() as u64;

        if let Some(ref delegate) = self.delegate {
            for frame in &frames {
                delegate.on_frame_collected(frame);
            }
        }
        Ok(frames)
    }

    pub fn set_volume_multiplier(&mut self, volume: f32) -> Result<(), SyncError> {
        if !volume.is_finite() || volume < 0.0 {
            return Err(SyncError::Configuration(format!(
                "invalid volume multiplier: {}",
                volume
            )));
        }
        self.volume_multiplier = volume;
        if let Some(ref mut config) = self.config {
            config.volume_multiplier = volume;
        }
        Ok(())
    }

    /// Longest gap between ticks that cannot lose audio, allowing for a
    /// device clock up to [`CAPTURE_DRIFT_TOLERANCE`] fast.
    pub fn max_poll_interval(&self) -> Option<Duration> {
        let session = self.session.as_ref()?;
        let capacity = self.source.buffer_capacity_samples() as u64;
        Some(Duration::from_secs_f64(
            session.format.samples_to_secs(capacity) / (1.0 + CAPTURE_DRIFT_TOLERANCE),
        ))
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Interleaved samples per frame in the current session.
    pub fn frame_len(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.format.frame_len)
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.session.as_ref().map(|s| s.format)
    }

    /// Samples read from the device but not yet framed.
    pub fn pending_samples(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pending.len())
    }

    /// Absolute position up to which the device buffer has been drained.
    pub fn abs_read_pos(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.abs_read_pos)
    }

    /// Sequence number of the last emitted frame.
    pub fn frames_emitted(&self) -> u64 {
        self.sequence
    }

    pub fn configuration(&self) -> Option<&CaptureConfiguration> {
        self.config.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.diagnostics.clone()
    }
}

impl<S: CaptureSource, C: Clock> Drop for CaptureFramer<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}
