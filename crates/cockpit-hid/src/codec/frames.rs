//! Output frame builders
//!
//! Two framing families share the 64-byte output report:
//!
//! ```text
//! LED:      02 <id> <family> 00 00 03 49 <led> <value> 00 00 00 00 00
//! Display:  F0 00 <seq> <opcode> <id> <family> 00 00 <sub> 01 00 00 ... payload ... 00 pad
//! ```
//!
//! LED commands are written as short 14-byte reports. Display frames are
//! always exactly [`REPORT_SIZE`] bytes.

/// Fixed HID output report size for this hardware family
pub const REPORT_SIZE: usize = 64;

/// Length of an LED-set command
pub const LED_FRAME_LEN: usize = 14;

/// Offset of the sequence byte in `F0 00 <seq>` display headers
pub const SEQ_OFFSET: usize = 2;

/// Family byte used by the FCU, CDU and PDC panels
pub const FAMILY_BB: u8 = 0xBB;
/// Family byte used by the EFIS sides and the PAP3 MCP
pub const FAMILY_BF: u8 = 0xBF;

/// One 64-byte output report
pub type Report = [u8; REPORT_SIZE];

/// Clamp an arbitrary brightness value into the byte the firmware expects
pub fn clamp_brightness(brightness: i32) -> u8 {
    brightness.clamp(0, 255) as u8
}

/// Build an LED-set command for the `0xBB` family
pub fn build_led_frame(identifier: u8, led: u8, brightness: i32) -> [u8; LED_FRAME_LEN] {
    build_led_frame_with_family(identifier, FAMILY_BB, led, brightness)
}

/// Build an LED-set command with an explicit family byte
pub fn build_led_frame_with_family(
    identifier: u8,
    family: u8,
    led: u8,
    brightness: i32,
) -> [u8; LED_FRAME_LEN] {
    [
        0x02,
        identifier,
        family,
        0x00,
        0x00,
        0x03,
        0x49,
        led,
        clamp_brightness(brightness),
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Copy `bytes` into a zero-padded report (extra bytes are cut off)
pub fn pad_report(bytes: &[u8]) -> Report {
    let mut report = [0u8; REPORT_SIZE];
    let n = bytes.len().min(REPORT_SIZE);
    report[..n].copy_from_slice(&bytes[..n]);
    report
}

/// Split `payload` into reports that each start with `prefix`
///
/// Every report carries `REPORT_SIZE - prefix.len()` payload bytes; the last
/// one is zero padded. An empty payload still produces one report so that
/// header-only commands go out.
pub fn chunk_frames(prefix: &[u8], payload: &[u8]) -> Vec<Report> {
    debug_assert!(prefix.len() < REPORT_SIZE);
    let capacity = REPORT_SIZE - prefix.len();

    if payload.is_empty() {
        return vec![pad_report(prefix)];
    }

    payload
        .chunks(capacity)
        .map(|chunk| {
            let mut report = [0u8; REPORT_SIZE];
            report[..prefix.len()].copy_from_slice(prefix);
            report[prefix.len()..prefix.len() + chunk.len()].copy_from_slice(chunk);
            report
        })
        .collect()
}

/// Assemble a display update from a fixed header and encoded fields
///
/// `seq` is stamped into the header at [`SEQ_OFFSET`]. Fields are laid out
/// back to back after the header. Updates that do not fit in one report are
/// continued in further reports that repeat the header, so every frame of
/// one update carries the same sequence number.
///
/// Trailing zero bytes of the payload are padding: they never cause a
/// continuation report on their own.
pub fn build_display_frame(header: &[u8], seq: u8, fields: &[&[u8]]) -> Vec<Report> {
    let mut prefix = header.to_vec();
    if prefix.len() > SEQ_OFFSET {
        prefix[SEQ_OFFSET] = seq;
    }
    let mut payload: Vec<u8> = fields.iter().flat_map(|f| f.iter().copied()).collect();
    let used = payload.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    payload.truncate(used);
    chunk_frames(&prefix, &payload)
}

/// Header-only commit frame that closes a multi-frame display update
pub fn build_commit_frame(header: &[u8], seq: u8) -> Report {
    let mut report = pad_report(header);
    report[SEQ_OFFSET] = seq;
    report
}
