//! MCDU / PFP driver
//!
//! Keyboard with a 14 × 24 character screen. The MCDU and the three PFP
//! variants speak the same protocol; they differ in the identifier byte and
//! in which annunciator LEDs they carry.
//!
//! # Input Report
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0     | Report ID (0x01) |
//! | 1-12  | Button bitmask (96 bits, LE) |
//! | 13-24 | Unused |
//!
//! Reports of any other length are ignored.
//!
//! # Screen Update
//!
//! Every cell is a little-endian colour word followed by the UTF-8 glyph.
//! The byte stream is cut into 63-byte chunks, each sent as `F2 <chunk>`.

use super::{frames_from_reports, ButtonInput, CockpitDevice, DisplayState, ReportLength};
use crate::codec::{build_led_frame, chunk_frames, pad_report, SequenceCounter, FAMILY_BB, REPORT_SIZE};
use crate::config::{CduBackground, HidConfig};
use crate::display::{CduCell, CduPage, DisplayFields};
use crate::types::{DeviceEvent, DeviceId, DeviceKind, InputReport, OutputFrame, ScheduledFrame};
use crate::CockpitError;
use std::time::Duration;

/// Identifier byte the init frames are written for
const MCDU_ID: u8 = 0x32;

/// Exact input report length
const INPUT_LEN: usize = 25;

/// Marker byte of screen data frames
const SCREEN_MARKER: u8 = 0xF2;

/// Added to the colour word for the small font
const SMALL_FONT_OFFSET: u16 = 0x016B;

/// LED addresses shared by every model
pub mod led {
    pub const BACKLIGHT: u16 = 0;
    pub const SCREEN_BACKLIGHT: u16 = 1;
}

/// MCDU annunciators
pub mod mcdu_led {
    pub const FAIL: u16 = 8;
    pub const FM: u16 = 9;
    pub const MCDU: u16 = 10;
    pub const MENU: u16 = 11;
    pub const FM1: u16 = 12;
    pub const IND: u16 = 13;
    pub const RDY: u16 = 14;
    pub const STATUS: u16 = 15;
    pub const FM2: u16 = 16;
}

/// PFP annunciators
pub mod pfp_led {
    pub const CALL: u16 = 3;
    pub const FAIL: u16 = 4;
    pub const MSG: u16 = 5;
    pub const OFST: u16 = 6;
    pub const EXEC: u16 = 7;
}

const MCDU_LEDS: &[u16] = &[
    led::BACKLIGHT,
    led::SCREEN_BACKLIGHT,
    mcdu_led::FAIL,
    mcdu_led::FM,
    mcdu_led::MCDU,
    mcdu_led::MENU,
    mcdu_led::FM1,
    mcdu_led::IND,
    mcdu_led::RDY,
    mcdu_led::STATUS,
    mcdu_led::FM2,
];

const PFP_LEDS: &[u16] = &[
    led::BACKLIGHT,
    led::SCREEN_BACKLIGHT,
    pfp_led::CALL,
    pfp_led::FAIL,
    pfp_led::MSG,
    pfp_led::OFST,
    pfp_led::EXEC,
];

const MCDU_CONNECT_LEDS: &[(u16, u8)] = &[
    (led::BACKLIGHT, 128),
    (led::SCREEN_BACKLIGHT, 128),
    (mcdu_led::FM, 0),
    (mcdu_led::MCDU, 0),
    (mcdu_led::FM1, 0),
    (mcdu_led::IND, 0),
    (mcdu_led::RDY, 0),
    (mcdu_led::STATUS, 0),
    (mcdu_led::FM2, 0),
    (mcdu_led::FAIL, 1),
    (mcdu_led::MENU, 1),
];

const PFP_CONNECT_LEDS: &[(u16, u8)] = &[
    (led::BACKLIGHT, 128),
    (led::SCREEN_BACKLIGHT, 128),
    (pfp_led::CALL, 0),
    (pfp_led::FAIL, 0),
    (pfp_led::MSG, 0),
    (pfp_led::OFST, 0),
    (pfp_led::EXEC, 0),
];

/// Hardware variant behind one of the CDU product ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CduModel {
    Mcdu,
    Pfp3n,
    Pfp4,
    Pfp7,
}

impl CduModel {
    pub fn for_product(product_id: u16) -> Self {
        match product_id {
            0xBB35 | 0xBB39 | 0xBB3D => CduModel::Pfp3n,
            0xBB38 | 0xBB40 | 0xBB3C => CduModel::Pfp4,
            0xBB37 | 0xBB3F | 0xBB3B => CduModel::Pfp7,
            _ => CduModel::Mcdu,
        }
    }

    pub fn leds(self) -> &'static [u16] {
        match self {
            CduModel::Mcdu => MCDU_LEDS,
            _ => PFP_LEDS,
        }
    }

    fn connect_leds(self) -> &'static [(u16, u8)] {
        match self {
            CduModel::Mcdu => MCDU_CONNECT_LEDS,
            _ => PFP_CONNECT_LEDS,
        }
    }
}

/// Screen controller setup; the ninth frame carries the base colour at
/// bytes 20-22 (black)
const INIT_FRAMES: [[u8; REPORT_SIZE]; 17] = [
    [
        0xF0, 0x00, 0x01, 0x38, 0x32, 0xBB, 0x00, 0x00, 0x1E, 0x01, 0x00, 0x00, 0xC4, 0x24, 0x0A, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x18, 0x01, 0x00, 0x00, 0xC4, 0x24, 0x0A,
        0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x34, 0x00, 0x18, 0x00, 0x0E, 0x00, 0x18, 0x00, 0x32, 0xBB,
        0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0xC4, 0x24, 0x0A, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x02, 0x38, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0xC4, 0x24, 0x0A,
        0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x03, 0x38, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
        0x00, 0x00, 0xFF, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19,
        0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0xA5,
        0xFF, 0xFF, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x04, 0x38, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E,
        0x00, 0x00, 0x00, 0x02, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00,
        0x00, 0x00, 0x02, 0x00, 0xFF, 0xFF, 0x00, 0xFF, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x05, 0x38, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00,
        0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x3D, 0xFF, 0x00, 0xFF, 0x08,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76,
        0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0xFF, 0x63, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x06, 0x38, 0xFF, 0xFF, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB,
        0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02,
        0x00, 0x00, 0x00, 0xFF, 0xFF, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00,
        0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x07, 0x38, 0x00, 0x00, 0x02, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x0B, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00,
        0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x42, 0x5C, 0x61, 0xFF, 0x0C, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x08, 0x38, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x77, 0x77,
        0x77, 0xFF, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01,
        0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x5E, 0x73, 0x79,
        0xFF, 0x0E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x09, 0x38, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00,
        0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00,
        0x00, 0x03, 0x00, 0x00, 0xA5, 0xFF, 0xFF, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0A, 0x38, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76,
        0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x11, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72,
        0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x03, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0B, 0x38, 0xFF, 0x12, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00,
        0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x03, 0x00,
        0x3D, 0xFF, 0x00, 0xFF, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00,
        0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0C, 0x38, 0x00, 0x03, 0x00, 0xFF, 0x63, 0xFF, 0xFF, 0x14, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00,
        0x0E, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0D, 0x38, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0xFF, 0xFF,
        0xFF, 0x16, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00,
        0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x03, 0x00, 0x42, 0x5C, 0x61, 0xFF,
        0x17, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0E, 0x38, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00,
        0x00, 0x03, 0x00, 0x77, 0x77, 0x77, 0xFF, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32,
        0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00,
        0x03, 0x00, 0x5E, 0x73, 0x79, 0xFF, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x0F, 0x38, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72,
        0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1A, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19,
        0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x10, 0x38, 0x1B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00,
        0x19, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02,
        0x00, 0x00, 0x00, 0x1C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0xBB, 0x00, 0x00, 0x1A,
        0x01, 0x00, 0x00, 0x76, 0x72, 0x19, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    [
        0xF0, 0x00, 0x11, 0x12, 0x02, 0x32, 0xBB, 0x00, 0x00, 0x1C, 0x01, 0x00, 0x00, 0x76, 0x72, 0x19,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
];

/// Point every `32 BB` address pair in `frame` at `identifier`
fn retarget(frame: &mut [u8], identifier: u8) {
    if identifier == MCDU_ID {
        return;
    }
    for i in 0..frame.len().saturating_sub(1) {
        if frame[i] == MCDU_ID && frame[i + 1] == FAMILY_BB {
            frame[i] = identifier;
        }
    }
}

/// Wallpaper command: `(variant, sequence byte, three parameter bytes)`
fn background_params(background: CduBackground) -> (u8, u8, [u8; 3]) {
    match background {
        CduBackground::Gray => (1, 0x02, [0x53, 0x20, 0x07]),
        CduBackground::Black => (2, 0x03, [0xFD, 0x24, 0x07]),
        CduBackground::Red => (3, 0x04, [0x55, 0x29, 0x07]),
        CduBackground::Green => (4, 0x06, [0xAD, 0x95, 0x09]),
        CduBackground::Blue => (5, 0x07, [0xA7, 0x9B, 0x09]),
        CduBackground::Yellow => (6, 0x08, [0x09, 0xA1, 0x09]),
        CduBackground::Purple => (7, 0x09, [0x05, 0xA7, 0x09]),
        CduBackground::Logo => (8, 0x0A, [0xD4, 0xAC, 0x09]),
    }
}

pub fn build_background_frame(identifier: u8, background: CduBackground) -> OutputFrame {
    let (variant, seq, [a, b, c]) = background_params(background);
    let mut frame = pad_report(&[
        0xF0, 0x00, seq, 0x12, identifier, FAMILY_BB, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, a, b, c,
        0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
    ]);
    frame[21] = 0x0C + variant;
    frame.to_vec()
}

fn color_word(color: char, small: bool) -> u16 {
    let base = match color.to_ascii_uppercase() {
        'L' => 0x0000,
        'A' => 0x0021,
        'W' => 0x0042,
        'B' => 0x0063,
        'G' => 0x0084,
        'M' => 0x00A5,
        'R' => 0x00C6,
        'Y' => 0x00E7,
        'E' => 0x0108,
        _ => 0x0042,
    };
    if small {
        base + SMALL_FONT_OFFSET
    } else {
        base
    }
}

fn push_cell(buf: &mut Vec<u8>, cell: &CduCell) {
    buf.extend_from_slice(&color_word(cell.color, cell.small).to_le_bytes());
    match (cell.ch, cell.small) {
        (b'#', _) => buf.extend_from_slice(&[0xE2, 0x98, 0x90]),
        (b'<', true) => buf.extend_from_slice(&[0xE2, 0x86, 0x90]),
        (b'>', true) => buf.extend_from_slice(&[0xE2, 0x86, 0x92]),
        (0x1E, true) => buf.extend_from_slice(&[0xE2, 0x86, 0x91]),
        (0x1F, true) => buf.extend_from_slice(&[0xE2, 0x86, 0x93]),
        (b'`', _) => buf.extend_from_slice(&[0xC2, 0xB0]),
        (ch, _) => buf.push(ch),
    }
}

/// Serialize a full page into its screen stream
pub fn encode_page(page: &CduPage) -> Vec<u8> {
    let mut buf = Vec::new();
    for cell in page.cells() {
        push_cell(&mut buf, cell);
    }
    buf
}

pub struct Cdu {
    model: CduModel,
    identifier: u8,
    background: CduBackground,
    seq: SequenceCounter,
    buttons: ButtonInput,
    screen: DisplayState<CduPage>,
}

impl Cdu {
    pub fn new(id: DeviceId, model: CduModel, identifier: u8, config: &HidConfig) -> Self {
        Self {
            model,
            identifier,
            background: config.cdu_background,
            seq: SequenceCounter::new(),
            buttons: ButtonInput::new(id, DeviceKind::Cdu, ReportLength::Exactly(INPUT_LEN), 96),
            screen: DisplayState::default(),
        }
    }

    pub fn model(&self) -> CduModel {
        self.model
    }

    fn led_frame(&self, led: u16, brightness: i32) -> OutputFrame {
        build_led_frame(self.identifier, led as u8, brightness).to_vec()
    }

    fn init_frames(&mut self) -> Vec<OutputFrame> {
        INIT_FRAMES
            .iter()
            .map(|template| {
                let mut frame = *template;
                retarget(&mut frame, self.identifier);
                frame[2] = self.seq.next();
                frame.to_vec()
            })
            .collect()
    }

    fn page_frames(page: &CduPage) -> Vec<OutputFrame> {
        frames_from_reports(chunk_frames(&[SCREEN_MARKER], &encode_page(page)))
    }
}

impl CockpitDevice for Cdu {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Cdu
    }

    fn identifier(&self) -> u8 {
        self.identifier
    }

    fn connect_frames(&mut self) -> Vec<OutputFrame> {
        let mut frames = self.init_frames();
        for &(led, brightness) in self.model.connect_leds() {
            frames.push(self.led_frame(led, brightness as i32));
        }
        frames.push(build_background_frame(self.identifier, self.background));

        let blank = CduPage::new();
        frames.extend(Self::page_frames(&blank));
        self.screen.mark_shown(blank);
        frames
    }

    fn did_receive_data(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) {
        self.buttons.accept(report, emit);
    }

    fn set_display(&mut self, fields: DisplayFields) -> Result<(), CockpitError> {
        match fields {
            DisplayFields::Cdu(page) => {
                self.screen.set(page);
                Ok(())
            }
            _ => Err(CockpitError::UnsupportedDisplay { kind: DeviceKind::Cdu }),
        }
    }

    fn set_led(&mut self, led: u16, brightness: i32) -> Result<OutputFrame, CockpitError> {
        if !self.model.leds().contains(&led) {
            return Err(CockpitError::UnknownLed { led, kind: DeviceKind::Cdu });
        }
        Ok(self.led_frame(led, brightness))
    }

    fn build_output(&mut self) -> Vec<OutputFrame> {
        match self.screen.take_changed() {
            Some(page) => Self::page_frames(&page),
            None => Vec::new(),
        }
    }

    fn shutdown_frames(&mut self) -> Vec<OutputFrame> {
        self.model.leds().iter().map(|&led| self.led_frame(led, 0)).collect()
    }

    fn identify_sequence(&self) -> Vec<ScheduledFrame> {
        vec![
            ScheduledFrame::now(self.led_frame(led::BACKLIGHT, 255)),
            ScheduledFrame::after(Duration::from_secs(1), self.led_frame(led::BACKLIGHT, 0)),
            ScheduledFrame::after(Duration::from_secs(2), self.led_frame(led::BACKLIGHT, 128)),
        ]
    }

    fn force_state_sync(&mut self) {
        self.buttons.clear();
        self.screen.invalidate();
    }
}
