//! FCU driver with optional EFIS side panels
//!
//! One USB device carries the FCU and up to two EFIS panels. They share
//! the input report and the sequence counter but answer to their own
//! identifier bytes in output frames.
//!
//! # Input Report
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0     | Report ID (0x01) |
//! | 1-4   | FCU buttons 0-31 |
//! | 5-8   | EFIS-L buttons 32-63 |
//! | 9-12  | EFIS-R buttons 64-95 |
//!
//! # Display Update
//!
//! ```text
//! FCU:   F0 00 <seq> 31 10 BB ... 17 data bytes    (data)
//!        F0 00 <seq> 11 10 BB ...                  (commit, same seq)
//! EFIS:  F0 00 <seq> 1A <0E|0D> BF ... 5 data bytes 0E BF .. 4C 0C 1D
//! ```

use super::{ButtonInput, CockpitDevice, DisplayState, ReportLength};
use crate::codec::{
    build_commit_frame, build_display_frame, build_led_frame, build_led_frame_with_family,
    encode_efis_segments, encode_segments, encode_segments_swapped, glyph, pad_report,
    SequenceCounter, FAMILY_BF,
};
use crate::config::HidConfig;
use crate::display::{DisplayFields, EfisDisplay, EfisSide, FcuDisplay};
use crate::types::{DeviceEvent, DeviceId, DeviceKind, InputReport, OutputFrame, ScheduledFrame};
use crate::CockpitError;
use std::time::Duration;

/// Identifier byte of the FCU
pub const FCU_ID: u8 = 0x10;
/// Identifier byte of the right EFIS panel
pub const EFIS_RIGHT_ID: u8 = 0x0E;
/// Identifier byte of the left EFIS panel
pub const EFIS_LEFT_ID: u8 = 0x0D;

/// LED addresses (EFIS-R at 100+n, EFIS-L at 200+n)
pub mod led {
    pub const BACKLIGHT: u16 = 0;
    pub const SCREEN_BACKLIGHT: u16 = 1;
    pub const OVERALL_GREEN: u16 = 2;
    pub const LOC_GREEN: u16 = 3;
    pub const AP1_GREEN: u16 = 5;
    pub const AP2_GREEN: u16 = 7;
    pub const ATHR_GREEN: u16 = 9;
    pub const EXPED_GREEN: u16 = 11;
    pub const APPR_GREEN: u16 = 13;
    pub const EXPED_BACKLIGHT: u16 = 30;

    pub const EFISR_BACKLIGHT: u16 = 100;
    pub const EFISR_SCREEN_BACKLIGHT: u16 = 101;
    pub const EFISR_OVERALL_GREEN: u16 = 102;
    pub const EFISR_FD_GREEN: u16 = 103;
    pub const EFISR_LS_GREEN: u16 = 104;
    pub const EFISR_CSTR_GREEN: u16 = 105;
    pub const EFISR_WPT_GREEN: u16 = 106;
    pub const EFISR_VORD_GREEN: u16 = 107;
    pub const EFISR_NDB_GREEN: u16 = 108;
    pub const EFISR_ARPT_GREEN: u16 = 109;

    pub const EFISL_BACKLIGHT: u16 = 200;
    pub const EFISL_SCREEN_BACKLIGHT: u16 = 201;
    pub const EFISL_OVERALL_GREEN: u16 = 202;
    pub const EFISL_FD_GREEN: u16 = 203;
    pub const EFISL_LS_GREEN: u16 = 204;
    pub const EFISL_CSTR_GREEN: u16 = 205;
    pub const EFISL_WPT_GREEN: u16 = 206;
    pub const EFISL_VORD_GREEN: u16 = 207;
    pub const EFISL_NDB_GREEN: u16 = 208;
    pub const EFISL_ARPT_GREEN: u16 = 209;
}

const FCU_LEDS: [u16; 10] = [
    led::BACKLIGHT,
    led::SCREEN_BACKLIGHT,
    led::OVERALL_GREEN,
    led::LOC_GREEN,
    led::AP1_GREEN,
    led::AP2_GREEN,
    led::ATHR_GREEN,
    led::EXPED_GREEN,
    led::APPR_GREEN,
    led::EXPED_BACKLIGHT,
];

const BACKLIGHTS: [u16; 6] = [
    led::BACKLIGHT,
    led::SCREEN_BACKLIGHT,
    led::EFISL_BACKLIGHT,
    led::EFISL_SCREEN_BACKLIGHT,
    led::EFISR_BACKLIGHT,
    led::EFISR_SCREEN_BACKLIGHT,
];

const OVERALL_GREENS: [u16; 3] = [
    led::OVERALL_GREEN,
    led::EFISR_OVERALL_GREEN,
    led::EFISL_OVERALL_GREEN,
];

/// Minimum input report length
const INPUT_MIN_LEN: usize = 13;

const FCU_DATA_HEADER: [u8; 25] = [
    0xF0, 0x00, 0x00, 0x31, FCU_ID, 0xBB, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x02,
    0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const FCU_COMMIT_HEADER: [u8; 16] = [
    0xF0, 0x00, 0x00, 0x11, FCU_ID, 0xBB, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x02,
    0x00,
];

/// Second command carried in every EFIS frame
const EFIS_TRAILER: [u8; 11] = [0x0E, 0xBF, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x4C, 0x0C, 0x1D];

/// Check if `led` is in the FCU-EFIS LED table
pub fn is_valid_led(led: u16) -> bool {
    FCU_LEDS.contains(&led) || (100..=109).contains(&led) || (200..=209).contains(&led)
}

/// Every LED address in table order
fn all_leds() -> impl Iterator<Item = u16> {
    FCU_LEDS.into_iter().chain(100..=109).chain(200..=209)
}

/// Annunciator LEDs switched by identify (no backlights, no overall greens)
fn indicator_leds() -> impl Iterator<Item = u16> {
    [
        led::LOC_GREEN,
        led::AP1_GREEN,
        led::AP2_GREEN,
        led::ATHR_GREEN,
        led::EXPED_GREEN,
        led::APPR_GREEN,
    ]
    .into_iter()
    .chain(led::EFISR_FD_GREEN..=led::EFISR_ARPT_GREEN)
    .chain(led::EFISL_FD_GREEN..=led::EFISL_ARPT_GREEN)
}

/// Build the LED-set frame for a table address, routed to its panel
fn led_frame(led: u16, brightness: i32) -> Option<OutputFrame> {
    if !is_valid_led(led) {
        return None;
    }
    let frame = match led {
        0..=99 => build_led_frame(FCU_ID, led as u8, brightness),
        100..=199 => build_led_frame_with_family(EFIS_RIGHT_ID, FAMILY_BF, (led - 100) as u8, brightness),
        _ => build_led_frame_with_family(EFIS_LEFT_ID, FAMILY_BF, (led - 200) as u8, brightness),
    };
    Some(frame.to_vec())
}

fn led_frames(leds: impl IntoIterator<Item = u16>, brightness: i32) -> Vec<OutputFrame> {
    leds.into_iter().filter_map(|led| led_frame(led, brightness)).collect()
}

/// EFIS panels present on a product: `(left, right)`
pub fn efis_sides(product_id: u16) -> (bool, bool) {
    match product_id {
        0xBC1E => (false, true),
        0xBC1D => (true, false),
        0xBA01 => (true, true),
        _ => (false, false),
    }
}

/// Encode the 17 data bytes of an FCU display frame
///
/// Annunciator flags share bytes with the digit cells they sit next to.
pub fn encode_fcu_body(display: &FcuDisplay) -> [u8; 17] {
    if !display.enabled || display.test {
        return [if display.test { 0xFF } else { 0x00 }; 17];
    }

    let spd = encode_segments(&display.speed, 3);
    let hdg = encode_segments_swapped(&display.heading, 3);
    let alt = encode_segments_swapped(&display.altitude, 5);
    let vs = encode_segments_swapped(&display.vertical_speed, 4);

    let (mut s1, mut h3, mut h0) = (0u8, 0u8, 0u8);
    let (mut a0, mut a1, mut a2, mut a3, mut a4, mut a5) = (0u8, 0u8, 0u8, 0u8, 0u8, 0u8);
    let (mut v0, mut v1, mut v2, mut v3) = (0u8, 0u8, 0u8, 0u8);

    if display.spd_mach {
        h3 |= 0x04;
        s1 |= 0x01; // Mach decimal point
    } else {
        h3 |= 0x08;
    }
    if display.spd_managed {
        h3 |= 0x02;
    }

    if display.hdg_trk {
        h0 |= 0x40;
        a5 |= 0x02;
    } else {
        h0 |= 0x80;
        a5 |= 0x08;
    }
    if display.hdg_managed {
        h0 |= 0x10;
    }
    if display.lat_mode {
        h0 |= 0x20;
    }

    if display.alt_indication {
        a4 |= 0x10;
    }
    if display.alt_managed {
        v1 |= 0x10;
    }
    if display.vs_mode {
        a5 |= 0x04;
    }
    if display.fpa_mode {
        a5 |= 0x01;
    }
    if display.vs_horizontal_line {
        a0 |= 0x10;
    }
    if display.vs_vertical_line {
        v2 |= 0x20;
    }
    if display.lvl_change {
        a2 |= 0x10;
    }
    if display.lvl_change_left {
        a3 |= 0x10;
    }
    if display.lvl_change_right {
        a1 |= 0x10;
    }
    if display.vs_indication {
        v0 |= 0x40;
    }
    if display.fpa_indication {
        v0 |= 0x80;
    }
    if display.fpa_comma {
        v3 |= 0x10;
    }
    if display.vs_sign {
        v2 |= 0x10;
    }

    [
        spd[2],
        spd[1] | s1,
        spd[0],
        hdg[3] | h3,
        hdg[2],
        hdg[1],
        hdg[0] | h0,
        alt[5] | a5,
        alt[4] | a4,
        alt[3] | a3,
        alt[2] | a2,
        alt[1] | a1,
        alt[0] | vs[4] | a0,
        vs[3] | v3,
        vs[2] | v2,
        vs[1] | v1,
        vs[0] | v0,
    ]
}

/// Encode the 5 data bytes of an EFIS baro frame
pub fn encode_efis_body(display: &EfisDisplay) -> [u8; 5] {
    if display.test {
        let eight = glyph('8');
        return [eight, eight | 0x80, eight, eight, 0xFF];
    }
    if !display.enabled {
        return [0; 5];
    }

    let text = if display.std { "STD " } else { display.baro.as_str() };
    let baro = encode_efis_segments(text, 4);
    let comma = if display.inhg { 0x80 } else { 0x00 };
    let mode = if display.std {
        0x00
    } else if display.qfe {
        0x01
    } else {
        0x02
    };

    [baro[3], baro[2] | comma, baro[1], baro[0], mode]
}

pub struct FcuEfis {
    has_left: bool,
    has_right: bool,
    backlight: u8,
    seq: SequenceCounter,
    buttons: ButtonInput,
    fcu: DisplayState<FcuDisplay>,
    efis_left: DisplayState<EfisDisplay>,
    efis_right: DisplayState<EfisDisplay>,
}

impl FcuEfis {
    pub fn new(id: DeviceId, product_id: u16, config: &HidConfig) -> Self {
        let (has_left, has_right) = efis_sides(product_id);
        Self {
            has_left,
            has_right,
            backlight: config.fcu_backlight,
            seq: SequenceCounter::new(),
            buttons: ButtonInput::new(id, DeviceKind::FcuEfis, ReportLength::AtLeast(INPUT_MIN_LEN), 96),
            fcu: DisplayState::default(),
            efis_left: DisplayState::default(),
            efis_right: DisplayState::default(),
        }
    }

    pub fn has_efis(&self, side: EfisSide) -> bool {
        match side {
            EfisSide::Left => self.has_left,
            EfisSide::Right => self.has_right,
        }
    }

    /// Data frame plus commit frame, both tagged with one sequence number
    fn fcu_frames(&mut self, display: &FcuDisplay) -> Vec<OutputFrame> {
        let seq = self.seq.current();
        let body = encode_fcu_body(display);
        let mut frames: Vec<OutputFrame> = build_display_frame(&FCU_DATA_HEADER, seq, &[&body])
            .into_iter()
            .map(|r| r.to_vec())
            .collect();
        frames.push(build_commit_frame(&FCU_COMMIT_HEADER, seq).to_vec());
        self.seq.advance();
        frames
    }

    fn efis_frames(&mut self, side: EfisSide, display: &EfisDisplay) -> Vec<OutputFrame> {
        let identifier = match side {
            EfisSide::Left => EFIS_LEFT_ID,
            EfisSide::Right => EFIS_RIGHT_ID,
        };
        let header = [
            0xF0, 0x00, 0x00, 0x1A, identifier, FAMILY_BF, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0xFF,
            0xFF, 0x1D, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let seq = self.seq.next();
        let body = encode_efis_body(display);
        build_display_frame(&header, seq, &[&body, &EFIS_TRAILER])
            .into_iter()
            .map(|r| r.to_vec())
            .collect()
    }
}

impl CockpitDevice for FcuEfis {
    fn kind(&self) -> DeviceKind {
        DeviceKind::FcuEfis
    }

    fn identifier(&self) -> u8 {
        FCU_ID
    }

    fn connect_frames(&mut self) -> Vec<OutputFrame> {
        let mut frames = vec![pad_report(&[0xF0, 0x02]).to_vec()];
        frames.extend(led_frames(BACKLIGHTS, self.backlight as i32));
        frames.extend(led_frame(led::EXPED_GREEN, 0));
        frames.extend(led_frame(led::EXPED_BACKLIGHT, 255));
        frames
    }

    fn did_receive_data(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) {
        self.buttons.accept(report, emit);
    }

    fn set_display(&mut self, fields: DisplayFields) -> Result<(), CockpitError> {
        match fields {
            DisplayFields::Fcu(display) => self.fcu.set(display),
            DisplayFields::Efis { side, display } if self.has_efis(side) => match side {
                EfisSide::Left => self.efis_left.set(display),
                EfisSide::Right => self.efis_right.set(display),
            },
            DisplayFields::Efis { side, .. } => {
                log::debug!("[FCU-EFIS] No EFIS panel on the {:?} side", side);
                return Err(CockpitError::UnsupportedDisplay { kind: DeviceKind::FcuEfis });
            }
            _ => return Err(CockpitError::UnsupportedDisplay { kind: DeviceKind::FcuEfis }),
        }
        Ok(())
    }

    fn set_led(&mut self, led: u16, brightness: i32) -> Result<OutputFrame, CockpitError> {
        led_frame(led, brightness).ok_or(CockpitError::UnknownLed {
            led,
            kind: DeviceKind::FcuEfis,
        })
    }

    fn build_output(&mut self) -> Vec<OutputFrame> {
        let mut frames = Vec::new();
        if let Some(display) = self.fcu.take_changed() {
            frames.extend(self.fcu_frames(&display));
        }
        if let Some(display) = self.efis_right.take_changed() {
            frames.extend(self.efis_frames(EfisSide::Right, &display));
        }
        if let Some(display) = self.efis_left.take_changed() {
            frames.extend(self.efis_frames(EfisSide::Left, &display));
        }
        frames
    }

    fn shutdown_frames(&mut self) -> Vec<OutputFrame> {
        let first: Vec<u16> = BACKLIGHTS.into_iter().chain(OVERALL_GREENS).collect();
        let mut frames = led_frames(first.iter().copied(), 0);
        frames.extend(led_frames(all_leds().filter(|l| !first.contains(l)), 0));

        let blank = FcuDisplay::blank();
        frames.extend(self.fcu_frames(&blank));
        self.fcu.mark_shown(blank);

        let blank = EfisDisplay::blank();
        if self.has_right {
            frames.extend(self.efis_frames(EfisSide::Right, &blank));
            self.efis_right.mark_shown(blank.clone());
        }
        if self.has_left {
            frames.extend(self.efis_frames(EfisSide::Left, &blank));
            self.efis_left.mark_shown(blank);
        }
        frames
    }

    fn identify_sequence(&self) -> Vec<ScheduledFrame> {
        let now = led_frames(BACKLIGHTS, self.backlight as i32)
            .into_iter()
            .chain(led_frames(OVERALL_GREENS, 255))
            .chain(led_frames(indicator_leds(), 1))
            .map(ScheduledFrame::now);
        let later = led_frames(indicator_leds(), 0)
            .into_iter()
            .map(|f| ScheduledFrame::after(Duration::from_secs(2), f));
        now.chain(later).collect()
    }

    fn force_state_sync(&mut self) {
        self.buttons.clear();
        self.fcu.invalidate();
        self.efis_left.invalidate();
        self.efis_right.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ButtonPhase, REPORT_SIZE};

    fn make_fcu(product_id: u16) -> FcuEfis {
        FcuEfis::new(DeviceId(2), product_id, &HidConfig::default())
    }

    fn efis(baro: &str) -> EfisDisplay {
        EfisDisplay {
            baro: baro.to_string(),
            ..EfisDisplay::default()
        }
    }

    #[test]
    fn test_connect_frames() {
        let mut fcu = make_fcu(0xBA01);
        let frames = fcu.connect_frames();
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[0].len(), REPORT_SIZE);
        assert_eq!(&frames[0][..2], &[0xF0, 0x02]);
        assert!(frames[0][2..].iter().all(|&b| b == 0));

        // Backlights on every panel
        let targets: Vec<(u8, u8, u8)> = frames[1..7].iter().map(|f| (f[1], f[7], f[8])).collect();
        assert_eq!(
            targets,
            vec![
                (FCU_ID, 0, 180),
                (FCU_ID, 1, 180),
                (EFIS_LEFT_ID, 0, 180),
                (EFIS_LEFT_ID, 1, 180),
                (EFIS_RIGHT_ID, 0, 180),
                (EFIS_RIGHT_ID, 1, 180),
            ]
        );
        assert_eq!((frames[7][7], frames[7][8]), (11, 0));
        assert_eq!((frames[8][7], frames[8][8]), (30, 255));
    }

    #[test]
    fn test_default_display_flags() {
        let body = encode_fcu_body(&FcuDisplay::default());
        assert_eq!(
            body,
            [
                0x00, 0x00, 0x00, // speed
                0x08, 0x00, 0x00, 0x80, // heading: SPD, HDG
                0x08, 0x10, 0x10, 0x10, 0x10, 0x10, // altitude: HDG, ALT, level change, VS line
                0x00, 0x10, 0x00, 0x00, // vertical speed: sign
            ]
        );
    }

    #[test]
    fn test_speed_and_heading_cells() {
        let display = FcuDisplay {
            speed: "250".into(),
            heading: "123".into(),
            spd_mach: true,
            hdg_trk: true,
            ..FcuDisplay::default()
        };
        let body = encode_fcu_body(&display);
        // "250" plain = [FA, BC, D6], sent high cell first, Mach dot on the middle cell
        assert_eq!(&body[0..3], &[0xD6, 0xBD, 0xFA]);
        // "123" swapped = [0F, 4D, 66, 00]; MACH in H3, TRK in H0
        assert_eq!(&body[3..7], &[0x04, 0x66, 0x4D, 0x4F]);
        // TRK label in A5
        assert_eq!(body[7], 0x02);
    }

    #[test]
    fn test_test_and_disabled_modes() {
        let test = FcuDisplay {
            test: true,
            ..FcuDisplay::default()
        };
        assert_eq!(encode_fcu_body(&test), [0xFF; 17]);
        assert_eq!(encode_fcu_body(&FcuDisplay::blank()), [0x00; 17]);
    }

    #[test]
    fn test_fcu_data_and_commit_share_sequence() {
        let mut fcu = make_fcu(0xBB10);
        fcu.set_display(DisplayFields::Fcu(FcuDisplay::default())).unwrap();
        let frames = fcu.build_output();
        assert_eq!(frames.len(), 2);

        let data = &frames[0];
        assert_eq!(data.len(), REPORT_SIZE);
        assert_eq!(&data[..5], &[0xF0, 0x00, 1, 0x31, 0x10]);
        assert_eq!(&data[12..18], &[0xFF, 0xFF, 0x02, 0x00, 0x00, 0x20]);
        assert_eq!(data[28], 0x08);
        assert!(data[42..].iter().all(|&b| b == 0));

        let commit = &frames[1];
        assert_eq!(&commit[..10], &[0xF0, 0x00, 1, 0x11, 0x10, 0xBB, 0x00, 0x00, 0x03, 0x01]);
        assert!(commit[16..].iter().all(|&b| b == 0));

        fcu.set_display(DisplayFields::Fcu(FcuDisplay {
            speed: "100".into(),
            ..FcuDisplay::default()
        }))
        .unwrap();
        let frames = fcu.build_output();
        assert_eq!(frames[0][2], 2);
        assert_eq!(frames[1][2], 2);
    }

    #[test]
    fn test_unchanged_display_not_resent() {
        let mut fcu = make_fcu(0xBB10);
        fcu.set_display(DisplayFields::Fcu(FcuDisplay::default())).unwrap();
        assert_eq!(fcu.build_output().len(), 2);
        fcu.set_display(DisplayFields::Fcu(FcuDisplay::default())).unwrap();
        assert!(fcu.build_output().is_empty());

        fcu.force_state_sync();
        assert_eq!(fcu.build_output().len(), 2);
    }

    #[test]
    fn test_efis_body() {
        // '1' → 60, '0' → 7D, '3' → 7A on the EFIS wiring; 2 = QNH
        assert_eq!(encode_efis_body(&efis("1013")), [0x60, 0x7D, 0x60, 0x7A, 0x02]);

        let inhg = EfisDisplay {
            inhg: true,
            qfe: true,
            ..efis("1013")
        };
        assert_eq!(encode_efis_body(&inhg), [0x60, 0xFD, 0x60, 0x7A, 0x01]);

        // "STD " replaces the value: S → 5B, T → 0F, D → 6E
        let std_mode = EfisDisplay {
            std: true,
            ..efis("1013")
        };
        assert_eq!(encode_efis_body(&std_mode), [0x5B, 0x0F, 0x6E, 0x00, 0x00]);
    }

    #[test]
    fn test_efis_test_and_disabled() {
        let test = EfisDisplay {
            test: true,
            ..EfisDisplay::default()
        };
        assert_eq!(encode_efis_body(&test), [0xFE, 0xFE, 0xFE, 0xFE, 0xFF]);
        assert_eq!(encode_efis_body(&EfisDisplay::blank()), [0; 5]);
    }

    #[test]
    fn test_efis_frame_layout() {
        let mut fcu = make_fcu(0xBC1D);
        fcu.set_display(DisplayFields::Efis {
            side: EfisSide::Left,
            display: efis("1013"),
        })
        .unwrap();
        let frames = fcu.build_output();
        assert_eq!(frames.len(), 1);

        let frame = &frames[0];
        assert_eq!(frame.len(), REPORT_SIZE);
        assert_eq!(&frame[..6], &[0xF0, 0x00, 1, 0x1A, EFIS_LEFT_ID, 0xBF]);
        assert_eq!(&frame[14..18], &[0x1D, 0x00, 0x00, 0x09]);
        assert_eq!(&frame[25..30], &[0x60, 0x7D, 0x60, 0x7A, 0x02]);
        assert_eq!(&frame[30..41], &EFIS_TRAILER);
        assert!(frame[41..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_efis_on_absent_side_rejected() {
        let mut fcu = make_fcu(0xBB10);
        let result = fcu.set_display(DisplayFields::Efis {
            side: EfisSide::Right,
            display: efis("1013"),
        });
        assert!(matches!(result, Err(CockpitError::UnsupportedDisplay { .. })));
        assert!(fcu.build_output().is_empty());

        let mut right = make_fcu(0xBC1E);
        assert!(right.has_efis(EfisSide::Right));
        assert!(!right.has_efis(EfisSide::Left));
    }

    #[test]
    fn test_led_routing() {
        let mut fcu = make_fcu(0xBA01);
        assert_eq!(
            fcu.set_led(led::EFISR_CSTR_GREEN, 1).unwrap(),
            vec![0x02, EFIS_RIGHT_ID, 0xBF, 0, 0, 0x03, 0x49, 5, 1, 0, 0, 0, 0, 0]
        );
        let left = fcu.set_led(led::EFISL_FD_GREEN, 1).unwrap();
        assert_eq!((left[1], left[2], left[7]), (EFIS_LEFT_ID, 0xBF, 3));
        let exped = fcu.set_led(led::EXPED_BACKLIGHT, 999).unwrap();
        assert_eq!((exped[1], exped[2], exped[7], exped[8]), (FCU_ID, 0xBB, 30, 255));

        for bad in [4, 12, 31, 110, 199, 210] {
            assert!(matches!(
                fcu.set_led(bad, 1),
                Err(CockpitError::UnknownLed { led, .. }) if led == bad
            ));
        }
    }

    #[test]
    fn test_shutdown_blacks_out() {
        let mut fcu = make_fcu(0xBA01);
        let frames = fcu.shutdown_frames();
        // 30 LEDs, FCU data + commit, EFIS-R, EFIS-L
        assert_eq!(frames.len(), 34);

        let leds = &frames[..30];
        assert!(leds.iter().all(|f| f.len() == 14 && f[8] == 0));
        assert_eq!((leds[0][1], leds[0][7]), (FCU_ID, 0));
        assert_eq!((leds[8][1], leds[8][7]), (EFIS_LEFT_ID, 2));

        assert_eq!(frames[30][3], 0x31);
        assert!(frames[30][25..].iter().all(|&b| b == 0));
        assert_eq!(frames[31][3], 0x11);
        assert_eq!(frames[32][4], EFIS_RIGHT_ID);
        assert_eq!(frames[33][4], EFIS_LEFT_ID);
        assert_eq!(&frames[33][25..30], &[0; 5]);

        // Blank content is now shown; setting it again sends nothing
        fcu.set_display(DisplayFields::Fcu(FcuDisplay::blank())).unwrap();
        assert!(fcu.build_output().is_empty());
    }

    #[test]
    fn test_shutdown_skips_absent_efis() {
        let mut fcu = make_fcu(0xBB10);
        assert_eq!(fcu.shutdown_frames().len(), 32);
    }

    #[test]
    fn test_identify_sequence() {
        let fcu = make_fcu(0xBB10);
        let seq = fcu.identify_sequence();
        let (now, later): (Vec<_>, Vec<_>) = seq.iter().partition(|s| s.after.is_zero());
        assert_eq!(now.len(), 6 + 3 + 20);
        assert_eq!(later.len(), 20);
        assert!(later.iter().all(|s| s.after == Duration::from_secs(2) && s.frame[8] == 0));
        assert!(now[6..9].iter().all(|s| s.frame[8] == 255));
        assert!(now[9..].iter().all(|s| s.frame[8] == 1));
    }

    #[test]
    fn test_buttons_across_panels() {
        let mut fcu = make_fcu(0xBA01);
        let mut data = vec![0u8; 13];
        data[0] = 1;
        data[1] = 0x01; // FCU 0
        data[5] = 0x01; // EFIS-L 32
        data[9] = 0x01; // EFIS-R 64
        let report = InputReport::from_bytes(&data).unwrap();
        let mut events = Vec::new();
        fcu.did_receive_data(&report, &mut |e| events.push(e));

        let buttons: Vec<u16> = events
            .iter()
            .map(|e| match e {
                DeviceEvent::Button { button, phase, .. } => {
                    assert_eq!(*phase, ButtonPhase::Begin);
                    *button
                }
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(buttons, vec![0, 32, 64]);
    }
}
