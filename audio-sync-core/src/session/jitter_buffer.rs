use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_frame::AudioFrame;
use crate::models::audio_models::{PlaybackDiagnostics, StreamFormat};
use crate::models::config::PlaybackConfiguration;
use crate::models::error::SyncError;
use crate::models::state::{PlaybackStatus, StopReason};
use crate::processing::drift;
use crate::processing::position_tracker::CircularPositionTracker;
use crate::traits::clock::Clock;
use crate::traits::playback_delegate::PlaybackDelegate;
use crate::traits::playback_sink::PlaybackSink;

/// A jitter buffer shared between a feeding thread and a ticking thread.
pub type SharedJitterBuffer<S, C> = Arc<Mutex<PlaybackJitterBuffer<S, C>>>;

/// Re-buffers incoming frames into a looping playback sink and steers the
/// sink's speed to hold a target latency.
///
/// Frames are written at an absolute write position; the sink's cursor is
/// tracked as an absolute read position. Playback starts once
/// `target_latency_secs` of audio has accumulated, one frame behind the
/// write head. From then on every [`on_tick`](Self::on_tick) measures the
/// write/read distance and nudges the playback rate proportionally.
///
/// Underrun (reader passed writer), overflow (writer lapped reader) and
/// staleness (no frame for `frame_lifetime_secs`) all stop playback, discard
/// what was buffered and go back to accumulating. None of them is an error.
pub struct PlaybackJitterBuffer<S: PlaybackSink, C: Clock> {
    sink: S,
    clock: C,
    config: PlaybackConfiguration,
    delegate: Option<Arc<dyn PlaybackDelegate>>,
    status: PlaybackStatus,
    format: Option<StreamFormat>,
    capacity: usize,
    abs_write_pos: u64,
    abs_read_pos: u64,
    read_tracker: CircularPositionTracker,
    last_frame_at: Option<Duration>,
    latency_secs: f32,
    playback_rate: f32,
    diagnostics: PlaybackDiagnostics,
}

impl<S: PlaybackSink, C: Clock> PlaybackJitterBuffer<S, C> {
    pub fn new(sink: S, clock: C, config: PlaybackConfiguration) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Configuration)?;
        Ok(Self {
            sink,
            clock,
            config,
            delegate: None,
            status: PlaybackStatus::Idle,
            format: None,
            capacity: 0,
            abs_write_pos: 0,
            abs_read_pos: 0,
            read_tracker: CircularPositionTracker::new(),
            last_frame_at: None,
            latency_secs: 0.0,
            playback_rate: 1.0,
            diagnostics: PlaybackDiagnostics {
                last_playback_rate: 1.0,
                ..Default::default()
            },
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PlaybackDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Replace the tuning. Rejected configurations leave everything as it
    /// was. A change that alters the buffer size reallocates on the next
    /// [`feed`](Self::feed).
    pub fn set_config(&mut self, config: PlaybackConfiguration) -> Result<(), SyncError> {
        config.validate().map_err(SyncError::Configuration)?;
        self.config = config;
        Ok(())
    }

    /// Write one frame into the sink, reallocating first if its format
    /// differs from the current buffer, and start playback once enough
    /// audio is buffered.
    pub fn feed(&mut self, frame: &AudioFrame) {
        if frame.is_empty() || frame.sample_rate == 0 || frame.channel_count == 0 {
            log::warn!(
                "Ignoring unplayable frame #{}: {} Hz, {} ch, {} samples",
                frame.sequence,
                frame.sample_rate,
                frame.channel_count,
                frame.samples.len()
            );
            return;
        }

        let format = frame.format();
        let capacity = self
            .config
            .capacity_for(frame.sample_rate, frame.channel_count);
        if self.format != Some(format) || self.capacity != capacity {
            self.reinitialize(format, capacity);
        }

        let offset = (self.abs_write_pos % self.capacity as u64) as usize;
        self.sink.write_samples(&frame.samples, offset);
        self.abs_write_pos += frame.samples.len() as u64;
        self.last_frame_at = Some(self.clock.now());

        self.diagnostics.frames_fed += 1;
        self.diagnostics.samples_fed += frame.samples.len() as u64;

        if self.status.is_playing() {
            return;
        }
        self.status = PlaybackStatus::Buffering;

        let buffered_secs = format.samples_to_secs(self.abs_write_pos);
        if buffered_secs >= self.config.target_latency_secs as f64 {
            self.start_playback(format.frame_len);
        }
    }

    /// Track the sink's cursor, correct drift, and stop on underrun,
    /// overflow or staleness. Does nothing unless playing.
    pub fn on_tick(&mut self) {
        if !self.status.is_playing() {
            return;
        }
        let Some(format) = self.format else {
            return;
        };

        let cursor = self.sink.current_position();
        self.abs_read_pos = self.read_tracker.advance(cursor, self.capacity);

        if self.abs_read_pos > self.abs_write_pos {
            log::warn!(
                "Playback underrun: read {} passed write {}",
                self.abs_read_pos,
                self.abs_write_pos
            );
            self.stop_playback(StopReason::Underrun);
            return;
        }
        if self.abs_write_pos - self.abs_read_pos > self.capacity as u64 {
            log::warn!(
                "Playback overflow: write {} lapped read {} (capacity {})",
                self.abs_write_pos,
                self.abs_read_pos,
                self.capacity
            );
            self.stop_playback(StopReason::Overflow);
            return;
        }

        let latency = drift::measure_latency(
            self.abs_write_pos,
            self.abs_read_pos,
            self.capacity,
            format.samples_per_second(),
        ) as f32;
        let rate = drift::pitch_correction(
            latency,
            self.config.target_latency_secs,
            self.config.pitch_proportional_gain,
            self.config.pitch_max_correction,
        );
        self.latency_secs = latency;
        self.playback_rate = rate;
        self.sink.set_playback_rate(rate);
        self.diagnostics.last_latency_secs = latency;
        self.diagnostics.last_playback_rate = rate;

        let since_last_frame = self.time_since_last_frame();
        if since_last_frame.as_secs_f32() > self.config.frame_lifetime_secs {
            log::warn!(
                "Playback stale: no frame for {:?}, discarding buffered audio",
                since_last_frame
            );
            self.stop_playback(StopReason::Stale);
        }
    }

    /// Stop playback immediately and drop everything buffered.
    pub fn stop(&mut self) {
        if self.status.is_playing() {
            self.stop_playback(StopReason::Reset);
        } else {
            self.reset_positions();
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub fn is_buffering(&self) -> bool {
        self.status.is_buffering()
    }

    /// Latency measured on the last tick, in seconds.
    pub fn latency_secs(&self) -> f32 {
        self.latency_secs
    }

    /// Rate last applied to the sink.
    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Audio written but not yet played, in seconds.
    pub fn buffered_secs(&self) -> f64 {
        let Some(format) = self.format else {
            return 0.0;
        };
        let unread = if self.status.is_playing() {
            self.abs_write_pos.saturating_sub(self.abs_read_pos)
        } else {
            self.abs_write_pos
        };
        format.samples_to_secs(unread)
    }

    /// Length of the sink's loop buffer in seconds.
    pub fn buffer_duration_secs(&self) -> f64 {
        self.format
            .map_or(0.0, |f| f.samples_to_secs(self.capacity as u64))
    }

    pub fn time_since_last_frame(&self) -> Duration {
        self.last_frame_at
            .map_or(Duration::ZERO, |at| self.clock.now().saturating_sub(at))
    }

    pub fn abs_write_pos(&self) -> u64 {
        self.abs_write_pos
    }

    pub fn abs_read_pos(&self) -> u64 {
        self.abs_read_pos
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    pub fn config(&self) -> &PlaybackConfiguration {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn diagnostics(&self) -> PlaybackDiagnostics {
        self.diagnostics.clone()
    }

    // --- Internal helpers ---

    fn reinitialize(&mut self, format: StreamFormat, capacity: usize) {
        if self.status.is_playing() {
            self.stop_playback(StopReason::Reset);
        }

        self.sink
            .allocate(capacity, format.channel_count, format.sample_rate);
        self.format = Some(format);
        self.capacity = capacity;
        self.reset_positions();
        self.status = PlaybackStatus::Buffering;
        self.diagnostics.reinitializations += 1;

        log::debug!(
            "Playback buffer allocated: {} samples ({:.3} s) for {} Hz, {} ch, {} samples/frame",
            capacity,
            format.samples_to_secs(capacity as u64),
            format.sample_rate,
            format.channel_count,
            format.frame_len
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_reinitialized(&format);
        }
    }

    /// Begin playing one frame behind the write head.
    fn start_playback(&mut self, frame_len: usize) {
        let start = self.abs_write_pos.saturating_sub(frame_len as u64);
        self.sink
            .set_position((start % self.capacity as u64) as usize);
        self.read_tracker.seek(start, self.capacity);
        self.abs_read_pos = start;

        self.playback_rate = 1.0;
        self.sink.set_playback_rate(1.0);
        self.sink.play();
        self.status = PlaybackStatus::Playing;
        self.diagnostics.starts += 1;

        log::debug!(
            "Playback started with {:.3} s buffered",
            self.buffered_secs()
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_playback_started();
        }
    }

    fn stop_playback(&mut self, reason: StopReason) {
        self.sink.stop();
        self.reset_positions();
        self.status = PlaybackStatus::Buffering;
        match reason {
            StopReason::Underrun => self.diagnostics.underruns += 1,
            StopReason::Stale => self.diagnostics.stale_resets += 1,
            StopReason::Overflow => self.diagnostics.overflows += 1,
            StopReason::Reset => {}
        }

        log::debug!("Playback stopped: {:?}", reason);
        if let Some(ref delegate) = self.delegate {
            delegate.on_playback_stopped(reason);
        }
    }

    fn reset_positions(&mut self) {
        self.abs_write_pos = 0;
        self.abs_read_pos = 0;
        self.read_tracker.reset();
        self.latency_secs = 0.0;
    }
}
