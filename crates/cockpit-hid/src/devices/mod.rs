//! Panel protocol drivers
//!
//! Maps product ids to device-specific protocol drivers. Each driver turns
//! input reports into button/encoder events and builds the frames for LED
//! and display feedback. Drivers never touch the HID handle: they hand
//! frames back to the registry, which writes them.

pub mod cdu;
pub mod fcu_efis;
pub mod mcp;
pub mod pdc;

use crate::codec::{decode_button_bitfield, ButtonBits, PressedButtonSet, REPORT_SIZE};
use crate::config::HidConfig;
use crate::display::DisplayFields;
use crate::types::{DeviceEvent, DeviceId, DeviceKind, InputReport, OutputFrame, ScheduledFrame};
use crate::CockpitError;

/// Trait for panel protocol drivers
///
/// One instance per connected device, owned by the registry and only ever
/// called from the tick thread.
pub trait CockpitDevice: Send {
    fn kind(&self) -> DeviceKind;

    /// Identifier byte this panel answers to in output frames
    fn identifier(&self) -> u8;

    /// Init sequence and initial LED state, written right after the open
    fn connect_frames(&mut self) -> Vec<OutputFrame>;

    /// Decode one input report and emit the resulting events in order
    ///
    /// Reports with the wrong id or length are logged and ignored.
    fn did_receive_data(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent));

    /// Store the desired display content; frames follow from `build_output`
    fn set_display(&mut self, fields: DisplayFields) -> Result<(), CockpitError>;

    /// Build the LED-set frame for one LED address
    fn set_led(&mut self, led: u16, brightness: i32) -> Result<OutputFrame, CockpitError>;

    /// Frames for display content that changed since the last call
    fn build_output(&mut self) -> Vec<OutputFrame>;

    /// LEDs off and displays blanked, written before the handle is closed
    fn shutdown_frames(&mut self) -> Vec<OutputFrame>;

    /// LED sequence that makes this unit easy to spot
    fn identify_sequence(&self) -> Vec<ScheduledFrame>;

    /// Forget held buttons and the shown display so both are re-sent
    fn force_state_sync(&mut self);
}

/// Known device entry
pub struct KnownDevice {
    pub product_id: u16,
    pub name: &'static str,
    pub kind: DeviceKind,
    pub identifier: u8,
    create: fn(DeviceId, &KnownDevice, &HidConfig) -> Box<dyn CockpitDevice>,
}

impl KnownDevice {
    pub fn create(&self, id: DeviceId, config: &HidConfig) -> Box<dyn CockpitDevice> {
        (self.create)(id, self, config)
    }
}

fn create_cdu(id: DeviceId, known: &KnownDevice, config: &HidConfig) -> Box<dyn CockpitDevice> {
    Box::new(cdu::Cdu::new(id, cdu::CduModel::for_product(known.product_id), known.identifier, config))
}

fn create_fcu_efis(id: DeviceId, known: &KnownDevice, config: &HidConfig) -> Box<dyn CockpitDevice> {
    Box::new(fcu_efis::FcuEfis::new(id, known.product_id, config))
}

fn create_mcp(id: DeviceId, _known: &KnownDevice, _config: &HidConfig) -> Box<dyn CockpitDevice> {
    Box::new(mcp::Mcp::new(id))
}

fn create_pdc(id: DeviceId, known: &KnownDevice, config: &HidConfig) -> Box<dyn CockpitDevice> {
    Box::new(pdc::Pdc::new(id, known.identifier, config))
}

macro_rules! known {
    ($pid:expr, $name:expr, $kind:ident, $id:expr, $create:ident) => {
        KnownDevice {
            product_id: $pid,
            name: $name,
            kind: DeviceKind::$kind,
            identifier: $id,
            create: $create,
        }
    };
}

/// Registry of supported panels (all share [`crate::VENDOR_ID`])
pub static KNOWN_DEVICES: &[KnownDevice] = &[
    known!(0xBB36, "MCDU-32 (Captain)", Cdu, 0x32, create_cdu),
    known!(0xBB3E, "MCDU-32 (First Officer)", Cdu, 0x32, create_cdu),
    known!(0xBB3A, "MCDU-32 (Observer)", Cdu, 0x32, create_cdu),
    known!(0xBB35, "PFP 3N (Captain)", Cdu, 0x31, create_cdu),
    known!(0xBB39, "PFP 3N (First Officer)", Cdu, 0x31, create_cdu),
    known!(0xBB3D, "PFP 3N (Observer)", Cdu, 0x31, create_cdu),
    known!(0xBB38, "PFP 4 (Captain)", Cdu, 0x34, create_cdu),
    known!(0xBB40, "PFP 4 (First Officer)", Cdu, 0x34, create_cdu),
    known!(0xBB3C, "PFP 4 (Observer)", Cdu, 0x34, create_cdu),
    known!(0xBB37, "PFP 7 (Captain)", Cdu, 0x33, create_cdu),
    known!(0xBB3F, "PFP 7 (First Officer)", Cdu, 0x33, create_cdu),
    known!(0xBB3B, "PFP 7 (Observer)", Cdu, 0x33, create_cdu),
    known!(0xBB10, "FCU", FcuEfis, fcu_efis::FCU_ID, create_fcu_efis),
    known!(0xBC1E, "FCU + EFIS-R", FcuEfis, fcu_efis::FCU_ID, create_fcu_efis),
    known!(0xBC1D, "FCU + EFIS-L", FcuEfis, fcu_efis::FCU_ID, create_fcu_efis),
    known!(0xBA01, "FCU + EFIS-L + EFIS-R", FcuEfis, fcu_efis::FCU_ID, create_fcu_efis),
    known!(0xBF0F, "PAP3 MCP", Mcp, mcp::MCP_ID, create_mcp),
    known!(0xBB61, "PDC 3N (Left)", Pdc, 0x60, create_pdc),
    known!(0xBB62, "PDC 3N (Right)", Pdc, 0x60, create_pdc),
    known!(0xBB51, "PDC 3M (Left)", Pdc, 0x50, create_pdc),
    known!(0xBB52, "PDC 3M (Right)", Pdc, 0x50, create_pdc),
];

/// Look up a supported panel by product id
pub fn find_known_device(product_id: u16) -> Option<&'static KnownDevice> {
    KNOWN_DEVICES.iter().find(|d| d.product_id == product_id)
}

/// Check if a product id is a supported panel
pub fn is_known_device(product_id: u16) -> bool {
    find_known_device(product_id).is_some()
}

/// Get the name for a known device
pub fn device_name(product_id: u16) -> Option<&'static str> {
    find_known_device(product_id).map(|d| d.name)
}

/// Report length rule of one panel family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportLength {
    AtLeast(usize),
    Exactly(usize),
}

/// Button bitfield decoding plus edge tracking, shared by all drivers
pub(crate) struct ButtonInput {
    device: DeviceId,
    kind: DeviceKind,
    length: ReportLength,
    mask: ButtonBits,
    pressed: PressedButtonSet,
}

impl ButtonInput {
    pub(crate) fn new(device: DeviceId, kind: DeviceKind, length: ReportLength, buttons: u16) -> Self {
        Self {
            device,
            kind,
            length,
            mask: ButtonBits::first(buttons),
            pressed: PressedButtonSet::new(),
        }
    }

    /// Diff the report's buttons against the held set and emit the edges
    ///
    /// Returns `false` when the report was rejected.
    pub(crate) fn accept(&mut self, report: &InputReport, emit: &mut dyn FnMut(DeviceEvent)) -> bool {
        let min_len = match self.length {
            ReportLength::AtLeast(n) => n,
            ReportLength::Exactly(n) => {
                if report.len() != n {
                    self.reject(report);
                    return false;
                }
                n
            }
        };

        let Some(bits) = decode_button_bitfield(&report.data, report.report_id, min_len) else {
            self.reject(report);
            return false;
        };

        for (button, phase) in self.pressed.apply(bits.intersection(self.mask)) {
            emit(DeviceEvent::Button {
                device: self.device,
                button,
                phase,
            });
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.pressed.clear();
    }

    fn reject(&self, report: &InputReport) {
        log::debug!(
            "[{}] Ignoring report id {}, length {}",
            self.kind,
            report.report_id,
            report.len()
        );
    }
}

/// Desired vs. shown state of one display
#[derive(Debug, Clone)]
pub(crate) struct DisplayState<T> {
    pending: Option<T>,
    shown: Option<T>,
}

impl<T> Default for DisplayState<T> {
    fn default() -> Self {
        Self {
            pending: None,
            shown: None,
        }
    }
}

impl<T: Clone + PartialEq> DisplayState<T> {
    pub(crate) fn set(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Take the pending value if it differs from what is shown
    pub(crate) fn take_changed(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        if self.shown.as_ref() == Some(&pending) {
            return None;
        }
        self.shown = Some(pending.clone());
        Some(pending)
    }

    /// Record content written outside `take_changed` (connect, shutdown)
    pub(crate) fn mark_shown(&mut self, value: T) {
        self.pending = None;
        self.shown = Some(value);
    }

    /// Make the shown content go out again on the next flush
    pub(crate) fn invalidate(&mut self) {
        if let Some(shown) = self.shown.take() {
            if self.pending.is_none() {
                self.pending = Some(shown);
            }
        }
    }
}

pub(crate) fn frames_from_reports<I>(reports: I) -> Vec<OutputFrame>
where
    I: IntoIterator<Item = [u8; REPORT_SIZE]>,
{
    reports.into_iter().map(|r| r.to_vec()).collect()
}
