//! PDC (display control panel) driver
//!
//! Buttons only, plus one backlight channel.
//!
//! # Input Report
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0     | Report ID (0x01) |
//! | 1-12  | Button bitmask (96 bits, LE) |

use super::{ButtonInput, CockpitDevice, ReportLength};
use crate::codec::build_led_frame;
use crate::config::HidConfig;
use crate::display::DisplayFields;
use crate::types::{DeviceEvent, DeviceId, DeviceKind, InputReport, OutputFrame, ScheduledFrame};
use crate::CockpitError;
use std::time::Duration;

/// Backlight LED address
pub const LED_BACKLIGHT: u16 = 0;

/// Minimum input report length
const INPUT_MIN_LEN: usize = 13;

pub struct Pdc {
    identifier: u8,
    backlight: u8,
    buttons: ButtonInput,
}

impl Pdc {
    pub fn new(id: DeviceId, identifier: u8, config: &HidConfig) -> Self {
        Self {
            identifier,
            backlight: config.pdc_backlight,
            buttons: ButtonInput::new(id, DeviceKind::Pdc, ReportLength::AtLeast(INPUT_MIN_LEN), 96),
        }
    }

    fn backlight_frame(&self, brightness: i32) -> OutputFrame {
        build_led_frame(self.identifier, LED_BACKLIGHT as u8, brightness).to_vec()
    }
}

impl CockpitDevice for Pdc {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Pdc
    }

    fn identifier(&self) -> u8 {
        self.identifier
    }

    fn connect_frames(&mut self) -> Vec<OutputFrame> {
        vec![self.backlight_frame(self.backlight as i32)]
    }

    fn did_receive_data(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) {
        self.buttons.accept(report, emit);
    }

    fn set_display(&mut self, _fields: DisplayFields) -> Result<(), CockpitError> {
        Err(CockpitError::UnsupportedDisplay { kind: DeviceKind::Pdc })
    }

    fn set_led(&mut self, led: u16, brightness: i32) -> Result<OutputFrame, CockpitError> {
        if led != LED_BACKLIGHT {
            return Err(CockpitError::UnknownLed { led, kind: DeviceKind::Pdc });
        }
        Ok(self.backlight_frame(brightness))
    }

    fn build_output(&mut self) -> Vec<OutputFrame> {
        Vec::new()
    }

    fn shutdown_frames(&mut self) -> Vec<OutputFrame> {
        vec![self.backlight_frame(0)]
    }

    fn identify_sequence(&self) -> Vec<ScheduledFrame> {
        vec![
            ScheduledFrame::now(self.backlight_frame(255)),
            ScheduledFrame::after(Duration::from_secs(1), self.backlight_frame(0)),
            ScheduledFrame::after(Duration::from_secs(2), self.backlight_frame(self.backlight as i32)),
        ]
    }

    fn force_state_sync(&mut self) {
        self.buttons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ButtonPhase;

    fn make_pdc() -> Pdc {
        Pdc::new(DeviceId(7), 0x60, &HidConfig::default())
    }

    fn make_report(len: usize) -> Vec<u8> {
        let mut report = vec![0u8; len];
        report[0] = 1;
        report
    }

    fn feed(pdc: &mut Pdc, data: &[u8]) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        let report = InputReport::from_bytes(data).unwrap();
        pdc.did_receive_data(&report, &mut |e| events.push(e));
        events
    }

    fn button(button: u16, phase: ButtonPhase) -> DeviceEvent {
        DeviceEvent::Button { device: DeviceId(7), button, phase }
    }

    #[test]
    fn test_connect_sets_backlight() {
        let mut pdc = make_pdc();
        assert_eq!(
            pdc.connect_frames(),
            vec![vec![0x02, 0x60, 0xBB, 0, 0, 0x03, 0x49, 0x00, 128, 0, 0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_press_hold_release() {
        let mut pdc = make_pdc();
        let mut report = make_report(13);
        report[1] = 0x01;
        assert_eq!(feed(&mut pdc, &report), vec![button(0, ButtonPhase::Begin)]);
        assert_eq!(feed(&mut pdc, &report), vec![button(0, ButtonPhase::Continue)]);
        assert_eq!(feed(&mut pdc, &make_report(13)), vec![button(0, ButtonPhase::End)]);
        assert!(feed(&mut pdc, &make_report(13)).is_empty());
    }

    #[test]
    fn test_short_report_ignored() {
        let mut pdc = make_pdc();
        let mut report = make_report(12);
        report[1] = 0xFF;
        assert!(feed(&mut pdc, &report).is_empty());
    }

    #[test]
    fn test_force_state_sync_restarts_with_begin() {
        let mut pdc = make_pdc();
        let mut report = make_report(13);
        report[12] = 0x80;
        feed(&mut pdc, &report);
        pdc.force_state_sync();
        assert_eq!(feed(&mut pdc, &report), vec![button(95, ButtonPhase::Begin)]);
    }

    #[test]
    fn test_unknown_led_rejected() {
        let mut pdc = make_pdc();
        assert!(matches!(
            pdc.set_led(1, 10),
            Err(CockpitError::UnknownLed { led: 1, kind: DeviceKind::Pdc })
        ));
        assert_eq!(pdc.set_led(0, 300).unwrap()[8], 255);
    }

    #[test]
    fn test_identify_sequence() {
        let pdc = make_pdc();
        let seq = pdc.identify_sequence();
        let steps: Vec<(Duration, u8)> = seq.iter().map(|s| (s.after, s.frame[8])).collect();
        assert_eq!(
            steps,
            vec![
                (Duration::ZERO, 255),
                (Duration::from_secs(1), 0),
                (Duration::from_secs(2), 128),
            ]
        );
    }

    #[test]
    fn test_shutdown_turns_backlight_off() {
        let mut pdc = make_pdc();
        let frames = pdc.shutdown_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][8], 0);
    }
}
