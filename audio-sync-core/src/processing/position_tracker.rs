/// Turns a wrapping device cursor into an unbounded absolute position.
///
/// Devices report their read or write head as an offset into a looping
/// buffer. Polling that offset and counting every decrease as one wrap yields
/// `loop_count * buffer_len + cursor`, which never goes backwards.
///
/// Only one wrap between two polls can be seen. If the device laps the buffer
/// more than once, the cursor alone cannot tell; callers that need to know
/// (the capture framer) check elapsed time against the buffer duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircularPositionTracker {
    loop_count: u64,
    prev_cursor: usize,
}

impl CircularPositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest cursor reading and return the new absolute position.
    ///
    /// `current_cursor == prev_cursor` returns the previous absolute position
    /// unchanged; there is nothing new to read.
    pub fn advance(&mut self, current_cursor: usize, buffer_len: usize) -> u64 {
        if current_cursor < self.prev_cursor {
            self.loop_count += 1;
        }
        self.prev_cursor = current_cursor;
        self.absolute_position(buffer_len)
    }

    /// Whether `cursor` would be counted as a wraparound by [`advance`](Self::advance).
    pub fn wrapped_since(&self, cursor: usize) -> bool {
        cursor < self.prev_cursor
    }

    pub fn absolute_position(&self, buffer_len: usize) -> u64 {
        self.loop_count * buffer_len as u64 + self.prev_cursor as u64
    }

    /// Re-seat the tracker so it reports `abs_position` and keeps counting
    /// wraps from there.
    pub fn seek(&mut self, abs_position: u64, buffer_len: usize) {
        if buffer_len == 0 {
            self.reset();
            return;
        }
        self.loop_count = abs_position / buffer_len as u64;
        self.prev_cursor = (abs_position % buffer_len as u64) as usize;
    }

    pub fn reset(&mut self) {
        self.loop_count = 0;
        self.prev_cursor = 0;
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    pub fn prev_cursor(&self) -> usize {
        self.prev_cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_motion_without_wrap() {
        let mut tracker = CircularPositionTracker::new();
        assert_eq!(tracker.advance(100, 1000), 100);
        assert_eq!(tracker.advance(400, 1000), 400);
        assert_eq!(tracker.loop_count(), 0);
    }

    #[test]
    fn decreasing_cursor_counts_a_loop() {
        let mut tracker = CircularPositionTracker::new();
        tracker.advance(900, 1000);
        assert!(tracker.wrapped_since(50));
        assert_eq!(tracker.advance(50, 1000), 1050);
        assert_eq!(tracker.loop_count(), 1);

        tracker.advance(999, 1000);
        assert_eq!(tracker.advance(0, 1000), 2000);
    }

    #[test]
    fn unchanged_cursor_is_a_no_op() {
        let mut tracker = CircularPositionTracker::new();
        let first = tracker.advance(300, 1000);
        let second = tracker.advance(300, 1000);
        assert_eq!(first, second);
        assert_eq!(tracker.loop_count(), 0);
    }

    #[test]
    fn seek_continues_counting_from_absolute_position() {
        let mut tracker = CircularPositionTracker::new();
        tracker.seek(2_350, 1000);
        assert_eq!(tracker.loop_count(), 2);
        assert_eq!(tracker.prev_cursor(), 350);
        assert_eq!(tracker.absolute_position(1000), 2_350);

        assert_eq!(tracker.advance(10, 1000), 3_010);
    }

    #[test]
    fn reset_returns_to_origin() {
        let mut tracker = CircularPositionTracker::new();
        tracker.advance(800, 1000);
        tracker.advance(5, 1000);
        tracker.reset();
        assert_eq!(tracker, CircularPositionTracker::new());
        assert_eq!(tracker.advance(5, 1000), 5);
    }
}
