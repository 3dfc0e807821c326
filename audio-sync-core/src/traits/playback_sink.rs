/// An output device that plays a looping buffer from a moving read cursor.
///
/// The jitter buffer writes into the sink's buffer and steers the cursor's
/// speed. Positions and capacities are in interleaved samples.
pub trait PlaybackSink: Send {
    /// Replace the loop buffer with a silent one of `capacity` samples.
    /// Stops playback and resets the cursor to 0.
    fn allocate(&mut self, capacity: usize, channel_count: u16, sample_rate: u32);

    /// Current read cursor, in `[0, total_capacity_samples())`.
    fn current_position(&self) -> usize;

    /// Move the read cursor.
    fn set_position(&mut self, offset: usize);

    /// Playback speed relative to nominal; 1.0 plays at the sample rate.
    fn set_playback_rate(&mut self, rate: f32);

    fn play(&mut self);

    fn stop(&mut self);

    /// Write samples into the loop buffer at `offset`, wrapping at the end.
    fn write_samples(&mut self, samples: &[f32], offset: usize);

    fn total_capacity_samples(&self) -> usize;
}
