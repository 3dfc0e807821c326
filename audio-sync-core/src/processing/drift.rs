//! Latency measurement and the proportional pitch controller.
//!
//! Pure math on positions and seconds; the jitter buffer owns the state.

/// Position of an absolute sample counter within the loop buffer, in seconds.
pub fn wrapped_time(abs_pos: u64, capacity: usize, samples_per_second: f64) -> f64 {
    if capacity == 0 || samples_per_second <= 0.0 {
        return 0.0;
    }
    (abs_pos % capacity as u64) as f64 / samples_per_second
}

/// Fold a raw `write_time - read_time` difference into `[0, buffer_duration)`.
///
/// A negative difference means the write head has wrapped and the read head
/// has not yet; a difference of a full buffer or more is a wrap in the other
/// direction.
pub fn normalize_latency(raw: f64, buffer_duration: f64) -> f64 {
    if buffer_duration <= 0.0 {
        return 0.0;
    }
    let mut latency = raw;
    if latency < 0.0 {
        latency += buffer_duration;
    }
    if latency >= buffer_duration {
        latency -= buffer_duration;
    }
    latency.clamp(0.0, buffer_duration)
}

/// Latency between the write and read heads of a loop buffer, in seconds.
pub fn measure_latency(
    abs_write_pos: u64,
    abs_read_pos: u64,
    capacity: usize,
    samples_per_second: f64,
) -> f64 {
    let write_time = wrapped_time(abs_write_pos, capacity, samples_per_second);
    let read_time = wrapped_time(abs_read_pos, capacity, samples_per_second);
    let buffer_duration = if samples_per_second > 0.0 {
        capacity as f64 / samples_per_second
    } else {
        0.0
    };
    normalize_latency(write_time - read_time, buffer_duration)
}

/// Playback rate that steers `latency` toward `target`.
///
/// Too much latency speeds playback up, too little slows it down. The
/// deviation from 1.0 never exceeds `max_correction`.
pub fn pitch_correction(latency: f32, target: f32, gain: f32, max_correction: f32) -> f32 {
    let error = target - latency;
    let adjustment = (-error * gain).clamp(-max_correction, max_correction);
    1.0 + adjustment
}
