//! Rolling packet sequence number
//!
//! Multi-frame display commands carry a sequence byte at offset 2 so the
//! panel firmware can group the data frame with its commit frame. Zero is
//! reserved by the firmware and never emitted.

/// Per-device 8-bit sequence counter (1..=255, wraps 255 → 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    value: u8,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self { value: 1 }
    }
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value the next frame will be tagged with, without advancing
    pub fn current(&self) -> u8 {
        if self.value == 0 { 1 } else { self.value }
    }

    /// Return the current value and advance, skipping 0 on wrap
    pub fn next(&mut self) -> u8 {
        let seq = self.current();
        self.value = seq.wrapping_add(1);
        if self.value == 0 {
            self.value = 1;
        }
        seq
    }

    /// Advance without using the value (frames that share one sequence
    /// number are stamped with `current()` and then advanced once)
    pub fn advance(&mut self) {
        self.next();
    }

    pub fn reset(&mut self) {
        self.value = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        let mut seq = SequenceCounter::new();
        assert_eq!(seq.current(), 1);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
    }

    #[test]
    fn test_never_emits_zero() {
        let mut seq = SequenceCounter::new();
        for _ in 0..1000 {
            assert_ne!(seq.next(), 0);
        }
    }

    #[test]
    fn test_wraps_to_one() {
        let mut seq = SequenceCounter::new();
        for _ in 0..254 {
            seq.next();
        }
        assert_eq!(seq.next(), 255);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
    }

    #[test]
    fn test_advance_and_reset() {
        let mut seq = SequenceCounter::new();
        seq.advance();
        seq.advance();
        assert_eq!(seq.current(), 3);
        seq.reset();
        assert_eq!(seq.current(), 1);
    }
}
