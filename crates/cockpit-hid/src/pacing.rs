//! Adaptive display refresh pacing
//!
//! Display updates are large (a full CDU page is 16 reports), so each device
//! gets a refresh interval that grows with the amount of data it was sent in
//! the previous window. LED frames are never paced.

/// Interval in ticks for a window that wrote `bytes`
pub fn interval_for_bytes(bytes: u64) -> u32 {
    match bytes {
        0..=49 => 2,
        50..=249 => 4,
        250..=499 => 8,
        500..=999 => 16,
        1000..=1999 => 32,
        _ => 100,
    }
}

/// Per-device display flush scheduler
#[derive(Debug, Clone)]
pub struct DisplayPacer {
    min_interval: u32,
    interval: u32,
    ticks_since_flush: u32,
    /// Byte counter of the connection at the last flush
    bytes_at_flush: u64,
}

impl DisplayPacer {
    pub fn new(min_interval: u32) -> Self {
        let min_interval = min_interval.max(1);
        Self {
            min_interval,
            interval: min_interval,
            // First tick after connect may flush right away
            ticks_since_flush: min_interval,
            bytes_at_flush: 0,
        }
    }

    /// Count one tick; `true` when the display may be flushed now
    pub fn tick(&mut self) -> bool {
        self.ticks_since_flush = self.ticks_since_flush.saturating_add(1);
        self.ticks_since_flush >= self.interval
    }

    /// Record a flush; `total_bytes` is the connection's running byte count
    pub fn flushed(&mut self, total_bytes: u64) {
        let window = total_bytes.saturating_sub(self.bytes_at_flush);
        self.interval = interval_for_bytes(window).max(self.min_interval);
        self.bytes_at_flush = total_bytes;
        self.ticks_since_flush = 0;
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_thresholds() {
        assert_eq!(interval_for_bytes(0), 2);
        assert_eq!(interval_for_bytes(49), 2);
        assert_eq!(interval_for_bytes(50), 4);
        assert_eq!(interval_for_bytes(249), 4);
        assert_eq!(interval_for_bytes(250), 8);
        assert_eq!(interval_for_bytes(999), 16);
        assert_eq!(interval_for_bytes(1000), 32);
        assert_eq!(interval_for_bytes(1999), 32);
        assert_eq!(interval_for_bytes(2000), 100);
    }

    #[test]
    fn test_first_tick_flushes() {
        let mut pacer = DisplayPacer::new(2);
        assert!(pacer.tick());
    }

    #[test]
    fn test_large_window_slows_refresh() {
        let mut pacer = DisplayPacer::new(2);
        // A full CDU page: 16 reports of 64 bytes
        pacer.flushed(1024);
        assert_eq!(pacer.interval(), 32);
        for _ in 0..31 {
            assert!(!pacer.tick());
        }
        assert!(pacer.tick());

        // Quiet window brings it back down
        pacer.flushed(1024 + 14);
        assert_eq!(pacer.interval(), 2);
    }

    #[test]
    fn test_minimum_interval_wins() {
        let mut pacer = DisplayPacer::new(10);
        pacer.flushed(0);
        assert_eq!(pacer.interval(), 10);
        pacer.flushed(600);
        assert_eq!(pacer.interval(), 16);
    }
}
