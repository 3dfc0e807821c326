/// Fixed-capacity circular sample store with absolute read/write counters.
///
/// This is the loop buffer a device backend keeps behind its cursor: capture
/// sources write into it continuously, playback sinks read out of it. The
/// absolute counters never wrap, so `unread()` is exact. In Rust, wrap in
/// `Arc<parking_lot::Mutex<RingBuffer>>` for cross-thread access.
///
/// Overflow behavior: writes always land (the store is continuously
/// overwritten, like a hardware loop buffer), but once the writer is more
/// than `capacity` samples ahead of the reader the buffer reports
/// `is_overrun()` and `read` refuses to hand out overwritten data.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    abs_write_pos: u64,
    abs_read_pos: u64,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            abs_write_pos: 0,
            abs_read_pos: 0,
            capacity,
        }
    }

    /// Append samples at the write head, wrapping at the end of the store.
    pub fn write(&mut self, samples: &[f32]) {
        if samples.is_empty() || self.capacity == 0 {
            return;
        }
        let offset = self.write_offset();
        self.write_at(offset, samples);
        self.abs_write_pos += samples.len() as u64;
    }

    /// Write samples at a raw offset, wrapping. Does not move the counters.
    ///
    /// If `samples` is longer than the store, only the last `capacity`
    /// samples survive.
    pub fn write_at(&mut self, offset: usize, samples: &[f32]) {
        if self.capacity == 0 {
            return;
        }
        for (i, &sample) in samples.iter().enumerate() {
            self.buffer[(offset + i) % self.capacity] = sample;
        }
    }

    /// Copy `count` samples starting at a raw offset, wrapping.
    pub fn read_span(&self, offset: usize, count: usize) -> Vec<f32> {
        if self.capacity == 0 {
            return Vec::new();
        }
        (0..count)
            .map(|i| self.buffer[(offset + i) % self.capacity])
            .collect()
    }

    /// Read and consume up to `count` unread samples.
    ///
    /// Returns `None` when the reader has been lapped; call [`reset`](Self::reset)
    /// to recover.
    pub fn read(&mut self, count: usize) -> Option<Vec<f32>> {
        if self.is_overrun() {
            return None;
        }
        let to_read = count.min(self.unread() as usize);
        let offset = self.read_offset();
        let result = self.read_span(offset, to_read);
        self.abs_read_pos += to_read as u64;
        Some(result)
    }

    /// Samples written but not yet read. May exceed capacity after an overrun.
    pub fn unread(&self) -> u64 {
        self.abs_write_pos.saturating_sub(self.abs_read_pos)
    }

    /// Whether unread data has been overwritten.
    pub fn is_overrun(&self) -> bool {
        self.unread() > self.capacity as u64
    }

    pub fn write_offset(&self) -> usize {
        self.wrap(self.abs_write_pos)
    }

    pub fn read_offset(&self) -> usize {
        self.wrap(self.abs_read_pos)
    }

    pub fn abs_write_pos(&self) -> u64 {
        self.abs_write_pos
    }

    pub fn abs_read_pos(&self) -> u64 {
        self.abs_read_pos
    }

    /// Zero the counters and silence the store.
    pub fn reset(&mut self) {
        self.abs_write_pos = 0;
        self.abs_read_pos = 0;
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
    }

    /// The total capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn wrap(&self, abs_pos: u64) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        (abs_pos % self.capacity as u64) as usize
    }
}
