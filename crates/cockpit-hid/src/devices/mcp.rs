//! PAP3 MCP driver
//!
//! Autopilot mode control panel: 48 buttons and switches, six rotary
//! encoders, 20 LED channels plus the A/T arm solenoid, and one segment LCD
//! for speed, course, heading, altitude and vertical speed.
//!
//! # Input Report
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0     | Report ID (0x01) |
//! | 1-6   | Buttons and switch positions (48 bits, LE) |
//! | 0x15, 0x17, 0x19, 0x1B, 0x1D, 0x1F | Encoder positions (free running u8) |
//!
//! # LCD Update
//!
//! ```text
//! F0 00 <s>   38 0F BF .. DF A2 50 00 00 B0 ..  32-byte segment payload
//! F0 00 <s+1> 38
//! F0 00 <s+2> 38
//! F0 00 <s+2> 2A .. commit
//! ```
//!
//! The payload is a segment bitmap, not text: every digit position owns one
//! bit, and the seven segments of all digits in a group live in seven
//! payload bytes.

use super::{ButtonInput, CockpitDevice, DisplayState, ReportLength};
use crate::codec::{
    build_display_frame, build_led_frame_with_family, pad_report, Report, SequenceCounter,
    FAMILY_BF, REPORT_SIZE,
};
use crate::display::{DisplayFields, McpDisplay};
use crate::types::{DeviceEvent, DeviceId, DeviceKind, InputReport, OutputFrame, ScheduledFrame};
use crate::CockpitError;

/// Identifier byte of the MCP
pub const MCP_ID: u8 = 0x0F;

/// LED and dimming channel addresses
pub mod led {
    /// Dimming channels (0-255)
    pub const BACKLIGHT: u16 = 0;
    pub const LCD_BACKLIGHT: u16 = 1;
    pub const OVERALL_LED_BRIGHTNESS: u16 = 2;

    /// On/off LEDs
    pub const N1: u16 = 3;
    pub const SPEED: u16 = 4;
    pub const VNAV: u16 = 5;
    pub const LVL_CHG: u16 = 6;
    pub const HDG_SEL: u16 = 7;
    pub const LNAV: u16 = 8;
    pub const VORLOC: u16 = 9;
    pub const APP: u16 = 10;
    pub const ALT_HLD: u16 = 11;
    pub const VS: u16 = 12;
    pub const CMD_A: u16 = 13;
    pub const CWS_A: u16 = 14;
    pub const CMD_B: u16 = 15;
    pub const CWS_B: u16 = 16;
    pub const AT_ARM: u16 = 17;
    pub const MA_CAPT: u16 = 18;
    pub const MA_FO: u16 = 19;

    /// A/T arm switch holding solenoid
    pub const AT_SOLENOID: u16 = 0x1E;
}

/// Minimum input report length
const INPUT_MIN_LEN: usize = 32;

/// Buttons and switches in bytes 1-6
const BUTTON_COUNT: u16 = 48;

/// Byte offsets of the six encoder counters
pub const ENCODER_OFFSETS: [usize; 6] = [0x15, 0x17, 0x19, 0x1B, 0x1D, 0x1F];

/// LCD payload size (frame offsets 0x19..=0x38)
pub const LCD_PAYLOAD_LEN: usize = 32;

/// Frame offset of the first payload byte
const LCD_PAYLOAD_START: u8 = 0x19;

const LCD_HEADER: [u8; 25] = [
    0xF0, 0x00, 0x00, 0x38, MCP_ID, FAMILY_BF, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0xDF, 0xA2, 0x50,
    0x00, 0x00, 0xB0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const INIT_FRAME: [u8; 24] = [
    0xF0, 0x00, 0x00, 0x12, MCP_ID, FAMILY_BF, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, 0x26, 0xCC, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00,
];

// Segment bits of a digit mask
const SEG_A: u8 = 0x01; // top
const SEG_B: u8 = 0x02; // top right
const SEG_C: u8 = 0x04; // bottom right
const SEG_D: u8 = 0x08; // bottom
const SEG_E: u8 = 0x10; // bottom left
const SEG_F: u8 = 0x20; // top left
const SEG_G: u8 = 0x40; // middle

const DIGIT_MASKS: [u8; 10] = [
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
    SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_G,
    SEG_F | SEG_G | SEG_B | SEG_C,
    SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
    SEG_A | SEG_F | SEG_E | SEG_D | SEG_C | SEG_G,
    SEG_A | SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
];

const LETTER_A: u8 = SEG_A | SEG_B | SEG_C | SEG_E | SEG_F | SEG_G;

/// Frame offsets of the seven segment bytes of one digit group
struct SegmentGroup {
    mid: u8,
    top_left: u8,
    bottom_left: u8,
    bottom: u8,
    bottom_right: u8,
    top_right: u8,
    top: u8,
}

/// Speed and captain course
const G0: SegmentGroup = SegmentGroup {
    mid: 0x1D,
    top_left: 0x21,
    bottom_left: 0x25,
    bottom: 0x29,
    bottom_right: 0x2D,
    top_right: 0x31,
    top: 0x35,
};
/// Heading and altitude high digits
const G1: SegmentGroup = SegmentGroup {
    mid: 0x1E,
    top_left: 0x22,
    bottom_left: 0x26,
    bottom: 0x2A,
    bottom_right: 0x2E,
    top_right: 0x32,
    top: 0x36,
};
/// Vertical speed and altitude low digits
const G2: SegmentGroup = SegmentGroup {
    mid: 0x1F,
    top_left: 0x23,
    bottom_left: 0x27,
    bottom: 0x2B,
    bottom_right: 0x2F,
    top_right: 0x33,
    top: 0x37,
};
/// F/O course
const G3: SegmentGroup = SegmentGroup {
    mid: 0x20,
    top_left: 0x24,
    bottom_left: 0x28,
    bottom: 0x2C,
    bottom_right: 0x30,
    top_right: 0x34,
    top: 0x38,
};

// G0 digit positions
const SPD_UNITS: u8 = 0x01;
const SPD_TENS: u8 = 0x02;
const SPD_HUNDREDS: u8 = 0x04;
const SPD_KILO: u8 = 0x08;
const CPT_CRS_UNITS: u8 = 0x20;
const CPT_CRS_TENS: u8 = 0x40;
const CPT_CRS_HUNDREDS: u8 = 0x80;

// G1 digit positions
const ALT_HUNDREDS: u8 = 0x01;
const ALT_KILO: u8 = 0x02;
const ALT_TENS_KILO: u8 = 0x04;
const HDG_UNITS: u8 = 0x10;
const HDG_TENS: u8 = 0x20;
const HDG_HUNDREDS: u8 = 0x40;

// G2 digit positions
const VSPD_UNITS: u8 = 0x01;
const VSPD_TENS: u8 = 0x02;
const VSPD_HUNDREDS: u8 = 0x04;
const VSPD_KILO: u8 = 0x08;
const ALT_UNITS: u8 = 0x40;
const ALT_TENS: u8 = 0x80;

// G3 digit positions
const FO_CRS_UNITS: u8 = 0x10;
const FO_CRS_TENS: u8 = 0x20;
const FO_CRS_HUNDREDS: u8 = 0x40;

// Dots, bars, signs and labels: (frame offset, bit)
const DOT_SPD: (u8, u8) = (0x19, 0x04);
const SPD_BAR_TOP: (u8, u8) = (0x22, 0x80);
const SPD_BAR_BOTTOM: (u8, u8) = (0x1E, 0x80);
const VSPD_MINUS: (u8, u8) = (0x1F, 0x10);
const VSPD_PLUS_TOP: (u8, u8) = (0x2C, 0x80);
const VSPD_PLUS_BOTTOM: (u8, u8) = (0x28, 0x80);
const LBL_IAS: (u8, u8) = (0x36, 0x80);
const LBL_MACH_L: (u8, u8) = (0x32, 0x80);
const LBL_MACH_R: (u8, u8) = (0x2E, 0x80);
const LBL_HDG_L: (u8, u8) = (0x36, 0x08);
const LBL_HDG_R: (u8, u8) = (0x32, 0x08);
const LBL_VS: (u8, u8) = (0x38, 0x80);

/// Segment payload under construction
struct Lcd([u8; LCD_PAYLOAD_LEN]);

impl Lcd {
    fn set(&mut self, (offset, bit): (u8, u8)) {
        let Some(index) = offset.checked_sub(LCD_PAYLOAD_START) else {
            return;
        };
        if let Some(byte) = self.0.get_mut(index as usize) {
            *byte |= bit;
        }
    }

    fn draw_mask(&mut self, group: &SegmentGroup, position: u8, mask: u8) {
        let segments = [
            (group.mid, SEG_G),
            (group.top_left, SEG_F),
            (group.bottom_left, SEG_E),
            (group.bottom, SEG_D),
            (group.bottom_right, SEG_C),
            (group.top_right, SEG_B),
            (group.top, SEG_A),
        ];
        for (offset, segment) in segments {
            if mask & segment != 0 {
                self.set((offset, position));
            }
        }
    }

    fn draw_digit(&mut self, group: &SegmentGroup, position: u8, digit: i32) {
        self.draw_mask(group, position, DIGIT_MASKS[digit.clamp(0, 9) as usize]);
    }

    fn draw_dash(&mut self, group: &SegmentGroup, position: u8) {
        self.draw_mask(group, position, SEG_G);
    }
}

/// Split into (thousands, hundreds, tens, units), clamped to 0..=9999
fn digits4(value: i32) -> [i32; 4] {
    let v = value.clamp(0, 9999);
    [v / 1000 % 10, v / 100 % 10, v / 10 % 10, v % 10]
}

/// Split into (ten-thousands, thousands, hundreds, tens, units), clamped to 0..=99999
fn digits5(value: i32) -> [i32; 5] {
    let v = value.clamp(0, 99999);
    [v / 10000 % 10, v / 1000 % 10, v / 100 % 10, v / 10 % 10, v % 10]
}

/// Split into (hundreds, tens, units), clamped to 0..=999
fn digits3(value: i32) -> [i32; 3] {
    let v = value.clamp(0, 999);
    [v / 100 % 10, v / 10 % 10, v % 10]
}

/// Render the 32-byte LCD segment payload
///
/// Speeds below 100 are shown as Mach. Altitude is always shown; the other
/// windows follow their visibility flags and can show dashes when hidden.
pub fn render_lcd_payload(display: &McpDisplay) -> [u8; LCD_PAYLOAD_LEN] {
    if !display.enabled {
        return [0x00; LCD_PAYLOAD_LEN];
    }
    if display.test {
        return [0xFF; LCD_PAYLOAD_LEN];
    }

    let mut lcd = Lcd([0; LCD_PAYLOAD_LEN]);
    let labels = display.show_labels;
    let spd = display.speed;

    if display.speed_visible && spd < 100.0 {
        let mach = if spd < 1.0 {
            spd.clamp(0.0, 0.9999)
        } else {
            (spd / 100.0).clamp(0.0, 0.9999)
        };
        let two_digits = ((mach * 1000.0 / 10.0 + 0.5).floor() as i32).clamp(0, 99);
        lcd.draw_digit(&G0, SPD_TENS, two_digits / 10 % 10);
        lcd.draw_digit(&G0, SPD_UNITS, two_digits % 10);

        if labels {
            lcd.set(LBL_MACH_L);
            lcd.set(LBL_MACH_R);
        }
        lcd.set(DOT_SPD);
        if display.digit_a {
            lcd.set(SPD_BAR_TOP);
            lcd.set(SPD_BAR_BOTTOM);
        }
    } else if display.speed_visible {
        let ias = ((spd + 0.5).floor() as i32).max(0);
        let [k, h, t, u] = digits4(ias);
        let show_kilo = k != 0;

        if show_kilo {
            lcd.draw_digit(&G0, SPD_KILO, k);
        }
        if show_kilo || h != 0 {
            lcd.draw_digit(&G0, SPD_HUNDREDS, h);
        }
        lcd.draw_digit(&G0, SPD_TENS, t);
        lcd.draw_digit(&G0, SPD_UNITS, u);

        if labels {
            lcd.set(LBL_IAS);
        }
        if display.digit_a {
            lcd.set(SPD_BAR_TOP);
            lcd.set(SPD_BAR_BOTTOM);
        }

        if !show_kilo {
            if display.digit_a {
                lcd.draw_mask(&G0, SPD_KILO, LETTER_A);
            }
            if display.digit_b {
                lcd.draw_digit(&G0, SPD_KILO, 8);
            }
        }
    }

    if display.show_course {
        let [h, t, u] = digits3(display.crs_capt.max(0));
        lcd.draw_digit(&G0, CPT_CRS_HUNDREDS, h);
        lcd.draw_digit(&G0, CPT_CRS_TENS, t);
        lcd.draw_digit(&G0, CPT_CRS_UNITS, u);
    }

    if display.heading_visible {
        let [h, t, u] = digits3(display.heading.clamp(0, 359));
        lcd.draw_digit(&G1, HDG_HUNDREDS, h);
        lcd.draw_digit(&G1, HDG_TENS, t);
        lcd.draw_digit(&G1, HDG_UNITS, u);
        if labels {
            lcd.set(LBL_HDG_L);
            lcd.set(LBL_HDG_R);
        }
    }

    let [d10k, dk, dh, dt, du] = digits5(display.altitude.max(0));
    if d10k != 0 {
        lcd.draw_digit(&G1, ALT_TENS_KILO, d10k);
    }
    lcd.draw_digit(&G1, ALT_KILO, dk);
    lcd.draw_digit(&G1, ALT_HUNDREDS, dh);
    lcd.draw_digit(&G2, ALT_TENS, dt);
    lcd.draw_digit(&G2, ALT_UNITS, du);

    if display.vertical_speed_visible {
        let v = display.vertical_speed as i32;
        let abs_v = v.saturating_abs().min(9999);
        let [k, h, t, u] = digits4(abs_v);

        if abs_v >= 1000 {
            lcd.draw_digit(&G2, VSPD_KILO, k);
        }
        if abs_v >= 100 {
            lcd.draw_digit(&G2, VSPD_HUNDREDS, h);
        }
        if abs_v >= 10 {
            lcd.draw_digit(&G2, VSPD_TENS, t);
        }
        if abs_v >= 1 {
            lcd.draw_digit(&G2, VSPD_UNITS, u);
        }

        // The plus sign is the minus bar with a vertical stroke added
        if v != 0 {
            lcd.set(VSPD_MINUS);
        }
        if v > 0 {
            lcd.set(VSPD_PLUS_TOP);
            lcd.set(VSPD_PLUS_BOTTOM);
        }
        if abs_v >= 1 && labels {
            lcd.set(LBL_VS);
        }
    }

    if display.show_course {
        let [h, t, u] = digits3(display.crs_fo.max(0));
        lcd.draw_digit(&G3, FO_CRS_HUNDREDS, h);
        lcd.draw_digit(&G3, FO_CRS_TENS, t);
        lcd.draw_digit(&G3, FO_CRS_UNITS, u);
    }

    if display.show_dashes_when_inactive {
        let inactive_labels = display.show_labels_when_inactive;
        if !display.speed_visible {
            for position in [SPD_HUNDREDS, SPD_TENS, SPD_UNITS] {
                lcd.draw_dash(&G0, position);
            }
            if inactive_labels {
                lcd.set(LBL_IAS);
            }
        }
        if !display.heading_visible {
            for position in [HDG_HUNDREDS, HDG_TENS, HDG_UNITS] {
                lcd.draw_dash(&G1, position);
            }
            if inactive_labels {
                lcd.set(LBL_HDG_L);
                lcd.set(LBL_HDG_R);
            }
        }
        if !display.vertical_speed_visible {
            for position in [VSPD_KILO, VSPD_HUNDREDS, VSPD_TENS, VSPD_UNITS] {
                lcd.draw_dash(&G2, position);
            }
            if inactive_labels {
                lcd.set(LBL_VS);
            }
        }
    }

    lcd.0
}

/// Check if `led` is an MCP LED or dimming channel
pub fn is_valid_led(led: u16) -> bool {
    led <= led::MA_FO || led == led::AT_SOLENOID
}

/// LED-set frame; channels from 3 up are on/off only
fn led_frame(led: u16, brightness: i32) -> Option<OutputFrame> {
    if !is_valid_led(led) {
        return None;
    }
    let value = if led >= led::N1 {
        i32::from(brightness > 0)
    } else {
        brightness
    };
    Some(build_led_frame_with_family(MCP_ID, FAMILY_BF, led as u8, value).to_vec())
}

pub struct Mcp {
    id: DeviceId,
    seq: SequenceCounter,
    buttons: ButtonInput,
    /// Last encoder counters; `None` until the first report sets the baseline
    encoders: Option<[u8; 6]>,
    lcd: DisplayState<McpDisplay>,
}

impl Mcp {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            seq: SequenceCounter::new(),
            buttons: ButtonInput::new(id, DeviceKind::Mcp, ReportLength::AtLeast(INPUT_MIN_LEN), BUTTON_COUNT),
            encoders: None,
            lcd: DisplayState::default(),
        }
    }

    fn commit_frame(seq: u8) -> Report {
        let mut frame = [0u8; REPORT_SIZE];
        frame[..4].copy_from_slice(&[0xF0, 0x00, seq, 0x2A]);
        frame[0x1D] = MCP_ID;
        frame[0x1E] = FAMILY_BF;
        frame[0x21] = 0x03;
        frame[0x22] = 0x01;
        frame[0x25] = 0xDF;
        frame[0x26] = 0xA2;
        frame[0x27] = 0x50;
        frame
    }

    /// Payload frame, two empty frames and the commit frame
    fn lcd_frames(&mut self, display: &McpDisplay) -> Vec<OutputFrame> {
        let payload = render_lcd_payload(display);
        let mut frames: Vec<OutputFrame> = build_display_frame(&LCD_HEADER, self.seq.current(), &[&payload])
            .into_iter()
            .map(|r| r.to_vec())
            .collect();

        for _ in 0..2 {
            self.seq.advance();
            frames.push(pad_report(&[0xF0, 0x00, self.seq.current(), 0x38]).to_vec());
        }

        frames.push(Self::commit_frame(self.seq.current()).to_vec());
        self.seq.advance();
        frames
    }

    fn decode_encoders(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) {
        let current = ENCODER_OFFSETS.map(|offset| report.data.get(offset).copied().unwrap_or_default());

        let Some(last) = self.encoders.replace(current) else {
            return;
        };

        for (encoder, (now, before)) in current.iter().zip(last.iter()).enumerate() {
            let delta = now.wrapping_sub(*before) as i8;
            if delta != 0 {
                emit(DeviceEvent::Encoder {
                    device: self.id,
                    encoder: encoder as u8,
                    delta: delta as i32,
                });
            }
        }
    }
}

impl CockpitDevice for Mcp {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Mcp
    }

    fn identifier(&self) -> u8 {
        MCP_ID
    }

    fn connect_frames(&mut self) -> Vec<OutputFrame> {
        let mut init = pad_report(&INIT_FRAME);
        init[2] = self.seq.next();

        let mut frames = vec![init.to_vec()];
        for channel in [led::BACKLIGHT, led::LCD_BACKLIGHT, led::OVERALL_LED_BRIGHTNESS] {
            frames.extend(led_frame(channel, 0));
        }
        frames
    }

    fn did_receive_data(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) {
        if self.buttons.accept(report, emit) {
            self.decode_encoders(report, emit);
        }
    }

    fn set_display(&mut self, fields: DisplayFields) -> Result<(), CockpitError> {
        match fields {
            DisplayFields::Mcp(display) => {
                self.lcd.set(display);
                Ok(())
            }
            _ => Err(CockpitError::UnsupportedDisplay { kind: DeviceKind::Mcp }),
        }
    }

    fn set_led(&mut self, led: u16, brightness: i32) -> Result<OutputFrame, CockpitError> {
        led_frame(led, brightness).ok_or(CockpitError::UnknownLed {
            led,
            kind: DeviceKind::Mcp,
        })
    }

    fn build_output(&mut self) -> Vec<OutputFrame> {
        match self.lcd.take_changed() {
            Some(display) => self.lcd_frames(&display),
            None => Vec::new(),
        }
    }

    fn shutdown_frames(&mut self) -> Vec<OutputFrame> {
        let mut frames: Vec<OutputFrame> = (led::BACKLIGHT..=led::MA_FO)
            .chain([led::AT_SOLENOID])
            .filter_map(|led| led_frame(led, 0))
            .collect();

        let blank = McpDisplay::blank();
        frames.extend(self.lcd_frames(&blank));
        self.lcd.mark_shown(blank);
        frames
    }

    fn identify_sequence(&self) -> Vec<ScheduledFrame> {
        Vec::new()
    }

    fn force_state_sync(&mut self) {
        self.buttons.clear();
        self.encoders = None;
        self.lcd.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ButtonPhase;

    /// Display with every optional window hidden; only altitude remains
    fn altitude_only(altitude: i32) -> McpDisplay {
        McpDisplay {
            altitude,
            speed_visible: false,
            heading_visible: false,
            vertical_speed_visible: false,
            show_course: false,
            ..McpDisplay::default()
        }
    }

    fn at(payload: &[u8; LCD_PAYLOAD_LEN], offset: u8) -> u8 {
        payload[(offset - LCD_PAYLOAD_START) as usize]
    }

    fn make_report(encoders: [u8; 6]) -> InputReport {
        let mut data = vec![0u8; 32];
        data[0] = 1;
        for (offset, value) in ENCODER_OFFSETS.iter().zip(encoders) {
            data[*offset] = value;
        }
        InputReport::from_bytes(&data).unwrap()
    }

    fn feed(mcp: &mut Mcp, report: &InputReport) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        mcp.did_receive_data(report, &mut |e| events.push(e));
        events
    }

    #[test]
    fn test_connect_frames() {
        let mut mcp = Mcp::new(DeviceId(4));
        let frames = mcp.connect_frames();
        assert_eq!(frames.len(), 4);

        let init = &frames[0];
        assert_eq!(init.len(), REPORT_SIZE);
        assert_eq!(&init[..6], &[0xF0, 0x00, 1, 0x12, 0x0F, 0xBF]);
        assert_eq!(&init[12..14], &[0x26, 0xCC]);
        assert_eq!(init[17], 0x01);
        assert_eq!(init[21], 0x03);
        assert!(init[24..].iter().all(|&b| b == 0));

        for (channel, frame) in frames[1..].iter().enumerate() {
            assert_eq!(
                frame,
                &vec![0x02, 0x0F, 0xBF, 0, 0, 0x03, 0x49, channel as u8, 0, 0, 0, 0, 0, 0]
            );
        }
    }

    #[test]
    fn test_led_values() {
        let mut mcp = Mcp::new(DeviceId(0));
        assert_eq!(mcp.set_led(led::LCD_BACKLIGHT, 200).unwrap()[8], 200);
        assert_eq!(mcp.set_led(led::VNAV, 200).unwrap()[8], 1);
        assert_eq!(mcp.set_led(led::VNAV, 0).unwrap()[8], 0);
        assert_eq!(mcp.set_led(led::VNAV, -5).unwrap()[8], 0);
        let solenoid = mcp.set_led(led::AT_SOLENOID, 1).unwrap();
        assert_eq!((solenoid[7], solenoid[8]), (0x1E, 1));

        for bad in [20, 0x1D, 0x1F, 300] {
            assert!(matches!(
                mcp.set_led(bad, 1),
                Err(CockpitError::UnknownLed { kind: DeviceKind::Mcp, .. })
            ));
        }
    }

    #[test]
    fn test_lcd_frame_sequence() {
        let mut mcp = Mcp::new(DeviceId(0));
        mcp.set_display(DisplayFields::Mcp(altitude_only(0))).unwrap();
        let frames = mcp.build_output();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.len() == REPORT_SIZE));

        let data = &frames[0];
        assert_eq!(&data[..4], &[0xF0, 0x00, 1, 0x38]);
        assert_eq!(
            &data[4..18],
            &[0x0F, 0xBF, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0xDF, 0xA2, 0x50, 0x00, 0x00, 0xB0]
        );
        assert!(data[18..25].iter().all(|&b| b == 0));

        assert_eq!(&frames[1][..4], &[0xF0, 0x00, 2, 0x38]);
        assert!(frames[1][4..].iter().all(|&b| b == 0));
        assert_eq!(&frames[2][..4], &[0xF0, 0x00, 3, 0x38]);

        let commit = &frames[3];
        assert_eq!(&commit[..4], &[0xF0, 0x00, 3, 0x2A]);
        assert_eq!((commit[0x1D], commit[0x1E]), (0x0F, 0xBF));
        assert_eq!((commit[0x21], commit[0x22]), (0x03, 0x01));
        assert_eq!(&commit[0x25..0x28], &[0xDF, 0xA2, 0x50]);

        mcp.set_display(DisplayFields::Mcp(altitude_only(100))).unwrap();
        assert_eq!(mcp.build_output()[0][2], 4);
    }

    #[test]
    fn test_altitude_zero() {
        let payload = render_lcd_payload(&altitude_only(0));
        // '0' lights every segment but the middle one, at kilo + hundreds in G1
        assert_eq!(at(&payload, 0x1E), 0x00);
        for offset in [0x22, 0x26, 0x2A, 0x2E, 0x32, 0x36] {
            assert_eq!(at(&payload, offset), ALT_KILO | ALT_HUNDREDS, "{:#x}", offset);
        }
        // tens + units in G2
        assert_eq!(at(&payload, 0x1F), 0x00);
        for offset in [0x23, 0x27, 0x2B, 0x2F, 0x33, 0x37] {
            assert_eq!(at(&payload, offset), ALT_TENS | ALT_UNITS, "{:#x}", offset);
        }
        // Nothing in G0 or G3
        assert_eq!(at(&payload, 0x19), 0x00);
        assert_eq!(at(&payload, 0x35), 0x00);
        assert_eq!(at(&payload, 0x38), 0x00);
    }

    #[test]
    fn test_altitude_ten_thousands_digit() {
        let low = render_lcd_payload(&altitude_only(9999));
        assert_eq!(at(&low, 0x2E) & ALT_TENS_KILO, 0);

        // '1' = top right + bottom right only
        let high = render_lcd_payload(&altitude_only(12345));
        assert_ne!(at(&high, 0x2E) & ALT_TENS_KILO, 0);
        assert_ne!(at(&high, 0x32) & ALT_TENS_KILO, 0);
        assert_eq!(at(&high, 0x36) & ALT_TENS_KILO, 0);
        assert_eq!(at(&high, 0x1E) & ALT_TENS_KILO, 0);
    }

    #[test]
    fn test_heading_digits() {
        let display = McpDisplay {
            heading: 180,
            heading_visible: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&display);
        // '1' hundreds: right segments only
        assert_ne!(at(&payload, 0x32) & HDG_HUNDREDS, 0);
        assert_eq!(at(&payload, 0x36) & HDG_HUNDREDS, 0);
        // '8' tens lights the middle, '0' units does not
        assert_ne!(at(&payload, 0x1E) & HDG_TENS, 0);
        assert_eq!(at(&payload, 0x1E) & HDG_UNITS, 0);
        assert_ne!(at(&payload, 0x36) & HDG_UNITS, 0);

        let clamped = McpDisplay {
            heading: 720,
            ..display.clone()
        };
        let max = McpDisplay {
            heading: 359,
            ..display
        };
        assert_eq!(render_lcd_payload(&clamped), render_lcd_payload(&max));
    }

    #[test]
    fn test_vertical_speed_signs() {
        let down = McpDisplay {
            vertical_speed: -1200.0,
            vertical_speed_visible: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&down);
        // minus bar plus the middle segment of the '2'
        assert_eq!(at(&payload, 0x1F), VSPD_MINUS.1 | VSPD_HUNDREDS);
        assert_eq!(at(&payload, 0x2C) & 0x80, 0);

        let up = McpDisplay {
            vertical_speed: 500.0,
            show_labels: true,
            ..down.clone()
        };
        let payload = render_lcd_payload(&up);
        assert_ne!(at(&payload, 0x2C) & 0x80, 0);
        assert_ne!(at(&payload, 0x28) & 0x80, 0);
        assert_ne!(at(&payload, 0x38) & 0x80, 0);
        // leading zeros stay dark
        assert_eq!(at(&payload, 0x37) & VSPD_KILO, 0);

        let level = McpDisplay {
            vertical_speed: 0.4,
            ..up
        };
        let payload = render_lcd_payload(&level);
        assert_eq!(at(&payload, 0x1F), 0x00);
        assert_eq!(at(&payload, 0x38), 0x00);
    }

    #[test]
    fn test_mach_speed() {
        let display = McpDisplay {
            speed: 0.78,
            speed_visible: true,
            show_labels: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&display);
        assert_eq!(at(&payload, 0x19), DOT_SPD.1);
        // '7' tens: no middle; '8' units: middle
        assert_eq!(at(&payload, 0x1D) & SPD_TENS, 0);
        assert_ne!(at(&payload, 0x1D) & SPD_UNITS, 0);
        assert_ne!(at(&payload, 0x35) & SPD_TENS, 0);
        assert_ne!(at(&payload, 0x32) & 0x80, 0);
        assert_ne!(at(&payload, 0x2E) & 0x80, 0);
        assert_eq!(at(&payload, 0x36) & 0x80, 0);

        // Mach given as a percentage renders the same
        let percent = McpDisplay {
            speed: 78.0,
            ..display.clone()
        };
        assert_eq!(render_lcd_payload(&percent), payload);
    }

    #[test]
    fn test_ias_with_letter_a() {
        let display = McpDisplay {
            speed: 250.0,
            speed_visible: true,
            digit_a: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&display);
        assert_eq!(at(&payload, 0x19), 0x00);
        // Letter A: everything but the bottom segment
        assert_ne!(at(&payload, 0x1D) & SPD_KILO, 0);
        assert_eq!(at(&payload, 0x29) & SPD_KILO, 0);
        // Bars
        assert_ne!(at(&payload, 0x22) & 0x80, 0);
        assert_ne!(at(&payload, 0x1E) & 0x80, 0);
        // Hundreds '2' shown
        assert_ne!(at(&payload, 0x35) & SPD_HUNDREDS, 0);
    }

    #[test]
    fn test_ias_hides_leading_zeros() {
        let display = McpDisplay {
            speed: 120.0,
            speed_visible: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&display);
        assert_eq!(at(&payload, 0x35) & SPD_KILO, 0);
        assert_ne!(at(&payload, 0x31) & SPD_HUNDREDS, 0);
    }

    #[test]
    fn test_dashes_when_inactive() {
        let display = McpDisplay {
            show_dashes_when_inactive: true,
            show_labels_when_inactive: true,
            ..altitude_only(0)
        };
        let payload = render_lcd_payload(&display);
        assert_eq!(at(&payload, 0x1D), SPD_HUNDREDS | SPD_TENS | SPD_UNITS);
        assert_eq!(at(&payload, 0x35), 0x00);
        assert_eq!(at(&payload, 0x1E), HDG_HUNDREDS | HDG_TENS | HDG_UNITS);
        assert_eq!(
            at(&payload, 0x1F),
            VSPD_KILO | VSPD_HUNDREDS | VSPD_TENS | VSPD_UNITS
        );
        assert_eq!(at(&payload, 0x36) & 0x88, 0x88);
        assert_ne!(at(&payload, 0x38) & 0x80, 0);
    }

    #[test]
    fn test_test_and_disabled() {
        let test = McpDisplay {
            test: true,
            ..McpDisplay::default()
        };
        assert_eq!(render_lcd_payload(&test), [0xFF; LCD_PAYLOAD_LEN]);

        let disabled_test = McpDisplay {
            enabled: false,
            ..test
        };
        assert_eq!(render_lcd_payload(&disabled_test), [0x00; LCD_PAYLOAD_LEN]);
    }

    #[test]
    fn test_encoder_baseline_and_deltas() {
        let mut mcp = Mcp::new(DeviceId(9));
        assert!(feed(&mut mcp, &make_report([0x10, 0xFF, 0, 0, 0, 0])).is_empty());

        let events = feed(&mut mcp, &make_report([0x12, 0x01, 0, 0, 0, 0]));
        assert_eq!(
            events,
            vec![
                DeviceEvent::Encoder { device: DeviceId(9), encoder: 0, delta: 2 },
                DeviceEvent::Encoder { device: DeviceId(9), encoder: 1, delta: 2 },
            ]
        );

        let events = feed(&mut mcp, &make_report([0x12, 0xFE, 0, 0, 0, 0x05]));
        assert_eq!(
            events,
            vec![
                DeviceEvent::Encoder { device: DeviceId(9), encoder: 1, delta: -3 },
                DeviceEvent::Encoder { device: DeviceId(9), encoder: 5, delta: 5 },
            ]
        );

        mcp.force_state_sync();
        assert!(feed(&mut mcp, &make_report([0x40, 0, 0, 0, 0, 0])).is_empty());
    }

    #[test]
    fn test_buttons_limited_to_six_bytes() {
        let mut mcp = Mcp::new(DeviceId(1));
        let mut data = vec![0u8; 32];
        data[0] = 1;
        data[6] = 0x80; // button 47
        data[7] = 0xFF; // outside the button range
        let report = InputReport::from_bytes(&data).unwrap();
        assert_eq!(
            feed(&mut mcp, &report),
            vec![DeviceEvent::Button { device: DeviceId(1), button: 47, phase: ButtonPhase::Begin }]
        );

        let short = InputReport::from_bytes(&data[..31]).unwrap();
        assert!(feed(&mut mcp, &short).is_empty());
    }

    #[test]
    fn test_shutdown_frames() {
        let mut mcp = Mcp::new(DeviceId(0));
        let frames = mcp.shutdown_frames();
        assert_eq!(frames.len(), 21 + 4);
        assert!(frames[..21].iter().all(|f| f.len() == 14 && f[8] == 0));
        assert_eq!(frames[20][7], 0x1E);
        assert!(frames[21][25..].iter().all(|&b| b == 0));
        assert!(mcp.identify_sequence().is_empty());
    }
}
