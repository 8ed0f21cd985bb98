//! Pure protocol transforms
//!
//! Nothing in here performs I/O or keeps state beyond the value types it
//! hands back. Device modules combine these into their frame sequences.

pub mod buttons;
pub mod frames;
pub mod segments;
pub mod sequence;

pub use buttons::{
    decode_button_bitfield, diff_buttons, ButtonBits, ButtonPhase, PressedButtonSet,
    INPUT_REPORT_ID, MAX_BUTTONS,
};
pub use frames::{
    build_commit_frame, build_display_frame, build_led_frame, build_led_frame_with_family,
    chunk_frames, clamp_brightness, pad_report, Report, FAMILY_BB, FAMILY_BF, LED_FRAME_LEN,
    REPORT_SIZE,
};
pub use segments::{encode_efis_segments, encode_segments, encode_segments_swapped, fit_text, glyph};
pub use sequence::SequenceCounter;
