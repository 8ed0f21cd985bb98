//! USB HID transport and protocol layer for cockpit panel hardware
//!
//! This crate provides:
//! - Device enumeration, open and hot-plug detection via hidapi
//! - One reader thread per device feeding a bounded report queue
//! - A single-threaded registry that turns reports into button/encoder events
//! - Frame codecs for the CDU, FCU/EFIS, PAP3 MCP and PDC panels
//! - LED feedback, display updates and identify sequences
//! - An in-memory backend for tests and hardware-free runs
//!
//! # Architecture
//!
//! ```text
//! HidHandle → reader thread → flume FIFO → DeviceRegistry::update() → device → EventSink
//!                                                    │
//!            HidHandle ← DeviceConnection::write() ←─┘ (LED / display frames)
//! ```
//!
//! `update()` is meant to be called once per tick of the host loop. It is the
//! only place where background input becomes ordered state changes, so no
//! device state is ever touched from more than one thread.

pub mod backend;
pub mod codec;
pub mod config;
pub mod connection;
pub mod devices;
pub mod display;
pub mod hotplug;
pub mod pacing;
pub mod registry;
pub mod types;

pub use backend::{BackendError, HidBackend, HidHandle, HotplugEvent, MockBackend, MockDevice, ReadError};
#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
pub use backend::HidApiBackend;
pub use codec::ButtonPhase;
pub use config::{
    default_config_path, load_config, save_config, try_load_config, CduBackground, ConfigError,
    HidConfig,
};
pub use devices::{device_name, find_known_device, is_known_device, KnownDevice, KNOWN_DEVICES};
pub use display::{CduCell, CduPage, DisplayFields, EfisDisplay, EfisSide, FcuDisplay, McpDisplay};
pub use registry::{DeviceInfo, DeviceRegistry};
pub use types::{
    DeviceEvent, DeviceId, DeviceIdentity, DeviceKind, EventSink, InputReport, OutputFrame,
    ScheduledFrame, VENDOR_ID,
};

/// Error type for registry and device operations
#[derive(Debug, thiserror::Error)]
pub enum CockpitError {
    #[error("HID backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to spawn reader thread: {0}")]
    Spawn(std::io::Error),

    #[error("No connected device with id {0}")]
    UnknownDevice(DeviceId),

    #[error("{kind} has no LED at address {led}")]
    UnknownLed { led: u16, kind: DeviceKind },

    #[error("{kind} does not accept this display content")]
    UnsupportedDisplay { kind: DeviceKind },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
