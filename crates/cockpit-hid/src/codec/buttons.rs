//! Button bitfield decoding and edge detection
//!
//! Every panel in the family reports its buttons as a little-endian bitfield
//! following the report id byte:
//!
//! | Bytes | Buttons |
//! |-------|---------|
//! | 1-8   | 0-63    |
//! | 9-12  | 64-95   |
//!
//! Edges are synthesized by comparing the new snapshot against the set of
//! buttons currently held down.

use std::fmt;

/// Report id carried by all button reports
pub const INPUT_REPORT_ID: u8 = 1;

/// Number of buttons addressable through the bitfield
pub const MAX_BUTTONS: u16 = 96;

/// Number of bitfield bytes following the report id
const BITFIELD_BYTES: usize = (MAX_BUTTONS as usize) / 8;

/// Edge phase synthesized from successive snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonPhase {
    /// Button went down since the previous snapshot
    Begin,
    /// Button is still down
    Continue,
    /// Button was released
    End,
}

/// Fixed-size set of button indices (0..96)
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonBits(u128);

impl ButtonBits {
    pub const EMPTY: ButtonBits = ButtonBits(0);

    pub fn from_indices(indices: impl IntoIterator<Item = u16>) -> Self {
        let mut bits = Self::EMPTY;
        for index in indices {
            bits.insert(index);
        }
        bits
    }

    /// Mask covering buttons `0..count`
    pub fn first(count: u16) -> Self {
        let count = count.min(MAX_BUTTONS) as u32;
        if count == 0 {
            return Self::EMPTY;
        }
        ButtonBits(u128::MAX >> (128 - count))
    }

    pub fn insert(&mut self, index: u16) {
        if index < MAX_BUTTONS {
            self.0 |= 1u128 << index;
        }
    }

    pub fn remove(&mut self, index: u16) {
        if index < MAX_BUTTONS {
            self.0 &= !(1u128 << index);
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        index < MAX_BUTTONS && self.0 & (1u128 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn intersection(&self, other: ButtonBits) -> ButtonBits {
        ButtonBits(self.0 & other.0)
    }

    /// Set indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..MAX_BUTTONS).filter(move |&i| self.contains(i))
    }
}

impl fmt::Debug for ButtonBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Decode the button bitfield of an input report
///
/// `report` is the raw report including its leading id byte; `report_id` is
/// the id the transport received it with. Returns `None` when the id is not
/// [`INPUT_REPORT_ID`] or the report is shorter than `min_len`. Bitfield
/// bytes past the end of a short report read as zero.
pub fn decode_button_bitfield(report: &[u8], report_id: u8, min_len: usize) -> Option<ButtonBits> {
    if report_id != INPUT_REPORT_ID || report.len() < min_len {
        return None;
    }

    let mut bits = 0u128;
    for i in 0..BITFIELD_BYTES {
        let byte = report.get(i + 1).copied().unwrap_or(0);
        bits |= (byte as u128) << (8 * i);
    }
    Some(ButtonBits(bits))
}

/// Compare two snapshots and emit one edge per button that is or was down
pub fn diff_buttons(previous: &ButtonBits, current: &ButtonBits) -> Vec<(u16, ButtonPhase)> {
    let union = ButtonBits(previous.0 | current.0);
    union
        .iter()
        .map(|index| {
            let phase = match (previous.contains(index), current.contains(index)) {
                (false, true) => ButtonPhase::Begin,
                (true, true) => ButtonPhase::Continue,
                _ => ButtonPhase::End,
            };
            (index, phase)
        })
        .collect()
}

/// Buttons currently held down on one device
#[derive(Debug, Clone, Default)]
pub struct PressedButtonSet {
    pressed: ButtonBits,
}

impl PressedButtonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the held set, then adopt it
    pub fn apply(&mut self, current: ButtonBits) -> Vec<(u16, ButtonPhase)> {
        let edges = diff_buttons(&self.pressed, &current);
        self.pressed = current;
        edges
    }

    pub fn is_pressed(&self, index: u16) -> bool {
        self.pressed.contains(index)
    }

    pub fn len(&self) -> usize {
        self.pressed.count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    pub fn clear(&mut self) {
        self.pressed = ButtonBits::EMPTY;
    }
}
