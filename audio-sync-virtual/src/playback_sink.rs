use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use audio_sync_core::traits::playback_sink::PlaybackSink;

struct SinkState {
    buffer: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    /// Read cursor in frames, fractional so rates other than 1.0 accumulate.
    frame_pos: f64,
    rate: f32,
    skew: f64,
    playing: bool,
    record: bool,
    played: Vec<f32>,
    frames_played: u64,
}

impl SinkState {
    fn frames_capacity(&self) -> usize {
        self.buffer.len() / self.channels.max(1) as usize
    }
}

/// A playback device that consumes its loop buffer as simulated time passes.
///
/// Each [`advance`](Self::advance) moves the cursor by
/// `elapsed × sample_rate × rate × skew` frames. With recording enabled every
/// frame passed over is appended to [`played`](Self::played). Clones share
/// the device.
#[derive(Clone)]
pub struct VirtualPlaybackSink {
    inner: Arc<Mutex<SinkState>>,
}

impl Default for VirtualPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualPlaybackSink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkState {
                buffer: Vec::new(),
                channels: 1,
                sample_rate: 0,
                frame_pos: 0.0,
                rate: 1.0,
                skew: 1.0,
                playing: false,
                record: false,
                played: Vec::new(),
                frames_played: 0,
            })),
        }
    }

    /// Play `skew` times faster than nominal, independent of the rate the
    /// jitter buffer sets.
    pub fn with_clock_skew(self, skew: f64) -> Self {
        self.inner.lock().skew = skew;
        self
    }

    /// Keep a copy of everything played.
    pub fn recording(self) -> Self {
        self.inner.lock().record = true;
        self
    }

    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.inner.lock();
        let frames_cap = state.frames_capacity();
        if !state.playing || frames_cap == 0 {
            return;
        }

        let step = elapsed.as_secs_f64() * state.sample_rate as f64 * state.rate as f64 * state.skew;
        let start = state.frame_pos;
        let end = start + step;
        let channels = state.channels as usize;

        let first = start.floor() as u64;
        let last = end.floor() as u64;
        for frame in first..last {
            let offset = (frame % frames_cap as u64) as usize * channels;
            if state.record {
                let samples = state.buffer[offset..offset + channels].to_vec();
                state.played.extend_from_slice(&samples);
            }
        }
        state.frames_played += last - first;
        state.frame_pos = end % frames_cap as f64;
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn playback_rate(&self) -> f32 {
        self.inner.lock().rate
    }

    /// Frames consumed since creation.
    pub fn frames_played(&self) -> u64 {
        self.inner.lock().frames_played
    }

    /// Everything played so far, if recording.
    pub fn played(&self) -> Vec<f32> {
        self.inner.lock().played.clone()
    }

    pub fn take_played(&self) -> Vec<f32> {
        std::mem::take(&mut self.inner.lock().played)
    }
}

impl PlaybackSink for VirtualPlaybackSink {
    fn allocate(&mut self, capacity: usize, channel_count: u16, sample_rate: u32) {
        let mut state = self.inner.lock();
        state.buffer = vec![0.0; capacity];
        state.channels = channel_count.max(1);
        state.sample_rate = sample_rate;
        state.frame_pos = 0.0;
        state.playing = false;
    }

    fn current_position(&self) -> usize {
        let state = self.inner.lock();
        let frame = state.frame_pos.floor() as usize % state.frames_capacity().max(1);
        frame * state.channels as usize
    }

    fn set_position(&mut self, offset: usize) {
        let mut state = self.inner.lock();
        let frames_cap = state.frames_capacity().max(1);
        state.frame_pos = ((offset / state.channels as usize) % frames_cap) as f64;
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.inner.lock().rate = rate;
    }

    fn play(&mut self) {
        self.inner.lock().playing = true;
    }

    fn stop(&mut self) {
        self.inner.lock().playing = false;
    }

    fn write_samples(&mut self, samples: &[f32], offset: usize) {
        let mut state = self.inner.lock();
        let len = state.buffer.len();
        if len == 0 {
            return;
        }
        for (i, &sample) in samples.iter().enumerate() {
            state.buffer[(offset + i) % len] = sample;
        }
    }

    fn total_capacity_samples(&self) -> usize {
        self.inner.lock().buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves_only_while_playing() {
        let mut sink = VirtualPlaybackSink::new();
        sink.allocate(100, 1, 1000);
        sink.advance(Duration::from_millis(10));
        assert_eq!(sink.current_position(), 0);

        sink.play();
        sink.advance(Duration::from_millis(10));
        assert_eq!(sink.current_position(), 10);
    }

    #[test]
    fn rate_scales_consumption() {
        let mut sink = VirtualPlaybackSink::new();
        sink.allocate(1000, 2, 1000);
        sink.play();
        sink.set_playback_rate(0.5);
        sink.advance(Duration::from_millis(100));
        assert_eq!(sink.frames_played(), 50);
        assert_eq!(sink.current_position(), 100);
    }

    #[test]
    fn records_what_it_plays_across_wrap() {
        let mut sink = VirtualPlaybackSink::new().recording();
        sink.allocate(4, 1, 1000);
        sink.write_samples(&[1.0, 2.0, 3.0, 4.0], 0);
        sink.set_position(2);
        sink.play();
        sink.advance(Duration::from_millis(4));

        assert_eq!(sink.played(), vec![3.0, 4.0, 1.0, 2.0]);
        assert_eq!(sink.current_position(), 2);
    }

    #[test]
    fn allocate_resets_cursor_and_stops() {
        let mut sink = VirtualPlaybackSink::new();
        sink.allocate(100, 1, 1000);
        sink.play();
        sink.advance(Duration::from_millis(30));
        sink.allocate(200, 2, 1000);
        assert!(!sink.is_playing());
        assert_eq!(sink.current_position(), 0);
        assert_eq!(sink.total_capacity_samples(), 200);
    }
}
