//! Device-independent transport types
//!
//! These are the values that cross the boundary between the transport core
//! and the profile code driving it: device identities, raw input reports,
//! decoded input events and the sink that receives them.

use crate::codec::ButtonPhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Vendor id shared by every panel in the hardware family
pub const VENDOR_ID: u16 = 0x4098;

/// Registry-assigned handle for one connected device
///
/// Ids increase monotonically and are never reused within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev-{}", self.0)
    }
}

/// A HID device as seen during enumeration
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Manufacturer string from the USB descriptor
    pub manufacturer: String,
    /// Product string from the USB descriptor
    pub product_name: String,
    /// OS device path; the key used to open the device and to match removals
    pub path: String,
    /// Device serial number (if available)
    pub serial: Option<String>,
}

impl DeviceIdentity {
    /// Short label for log lines
    pub fn label(&self) -> String {
        if self.product_name.is_empty() {
            format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
        } else {
            self.product_name.clone()
        }
    }
}

/// One raw input report as read by a device's reader thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputReport {
    /// Report id (first byte on the wire)
    pub report_id: u8,
    /// Full report including the id byte, so wire byte `n` is `data[n]`
    pub data: Vec<u8>,
}

impl InputReport {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let report_id = *bytes.first()?;
        Some(Self {
            report_id,
            data: bytes.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Bytes to write to a device: 14-byte LED commands or 64-byte display frames
pub type OutputFrame = Vec<u8>;

/// An output frame that should go out after a delay (identify sequences)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledFrame {
    pub after: Duration,
    pub frame: OutputFrame,
}

impl ScheduledFrame {
    pub fn now(frame: impl Into<OutputFrame>) -> Self {
        Self::after(Duration::ZERO, frame)
    }

    pub fn after(after: Duration, frame: impl Into<OutputFrame>) -> Self {
        Self {
            after,
            frame: frame.into(),
        }
    }
}

/// Closed set of supported panel kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// MCDU / PFP keyboard with character display
    Cdu,
    /// FCU with optional EFIS side panels
    FcuEfis,
    /// PAP3 autopilot mode control panel
    Mcp,
    /// Display control panel (button-only)
    Pdc,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Cdu => "CDU",
            DeviceKind::FcuEfis => "FCU-EFIS",
            DeviceKind::Mcp => "MCP",
            DeviceKind::Pdc => "PDC",
        };
        f.write_str(name)
    }
}

/// Decoded input event ready for profile code
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Button {
        device: DeviceId,
        button: u16,
        phase: ButtonPhase,
    },
    Encoder {
        device: DeviceId,
        encoder: u8,
        /// Detents turned since the previous report (positive = clockwise)
        delta: i32,
    },
}

/// Receiver of decoded input events
///
/// Called only from the thread that drives `DeviceRegistry::update()`.
pub trait EventSink {
    fn on_button_event(&mut self, device: DeviceId, button: u16, phase: ButtonPhase);
    fn on_encoder_event(&mut self, device: DeviceId, encoder: u8, delta: i32);

    fn deliver(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Button { device, button, phase } => {
                self.on_button_event(device, button, phase)
            }
            DeviceEvent::Encoder { device, encoder, delta } => {
                self.on_encoder_event(device, encoder, delta)
            }
        }
    }
}

/// Collect events in order (tests, batch consumers)
impl EventSink for Vec<DeviceEvent> {
    fn on_button_event(&mut self, device: DeviceId, button: u16, phase: ButtonPhase) {
        self.push(DeviceEvent::Button { device, button, phase });
    }

    fn on_encoder_event(&mut self, device: DeviceId, encoder: u8, delta: i32) {
        self.push(DeviceEvent::Encoder { device, encoder, delta });
    }
}

/// Forward events to another thread (e.g. an async UI subscription)
impl EventSink for flume::Sender<DeviceEvent> {
    fn on_button_event(&mut self, device: DeviceId, button: u16, phase: ButtonPhase) {
        if self.try_send(DeviceEvent::Button { device, button, phase }).is_err() {
            log::warn!("HID: Event channel full, dropping button {} on {}", button, device);
        }
    }

    fn on_encoder_event(&mut self, device: DeviceId, encoder: u8, delta: i32) {
        if self.try_send(DeviceEvent::Encoder { device, encoder, delta }).is_err() {
            log::warn!("HID: Event channel full, dropping encoder {} on {}", encoder, device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_report_from_bytes() {
        let report = InputReport::from_bytes(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(report.report_id, 1);
        assert_eq!(report.data[1], 0x02);
        assert_eq!(report.len(), 3);
        assert!(InputReport::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_device_kind_yaml_roundtrip() {
        let yaml = serde_yaml::to_string(&DeviceKind::FcuEfis).unwrap();
        assert_eq!(yaml.trim(), "fcu_efis");
        let kind: DeviceKind = serde_yaml::from_str("cdu").unwrap();
        assert_eq!(kind, DeviceKind::Cdu);
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<DeviceEvent> = Vec::new();
        sink.on_button_event(DeviceId(1), 4, ButtonPhase::Begin);
        sink.on_encoder_event(DeviceId(1), 2, -3);
        assert_eq!(
            sink,
            vec![
                DeviceEvent::Button { device: DeviceId(1), button: 4, phase: ButtonPhase::Begin },
                DeviceEvent::Encoder { device: DeviceId(1), encoder: 2, delta: -3 },
            ]
        );
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (tx, rx) = flume::bounded(1);
        let mut sink = tx;
        sink.on_button_event(DeviceId(0), 1, ButtonPhase::Begin);
        sink.on_button_event(DeviceId(0), 1, ButtonPhase::End);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_identity_label_fallback() {
        let identity = DeviceIdentity {
            vendor_id: VENDOR_ID,
            product_id: 0xBB10,
            manufacturer: String::new(),
            product_name: String::new(),
            path: "/dev/hidraw0".into(),
            serial: None,
        };
        assert_eq!(identity.label(), "4098:bb10");
    }
}
