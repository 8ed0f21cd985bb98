//! HID backend abstraction
//!
//! Provides device enumeration and raw report I/O behind one interface so
//! the connection and registry layers never touch an OS API directly.
//!
//! - [`HidApiBackend`]: hidapi, with the platform backend (hidraw, Windows
//!   HID, IOKit) selected at compile time through target-specific
//!   dependencies.
//! - [`MockBackend`]: in-memory devices for tests and `--simulate` runs.

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
mod native;
pub mod mock;

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
pub use native::HidApiBackend;
pub use mock::{MockBackend, MockDevice};

use crate::types::DeviceIdentity;
use std::sync::Arc;
use std::time::Duration;

/// Enumeration or open failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The OS HID subsystem could not be initialized
    #[error("failed to initialize HID subsystem: {0}")]
    Init(String),

    #[error("failed to enumerate HID devices: {0}")]
    Enumerate(String),

    #[error("failed to open HID device at {path}: {reason}")]
    Open { path: String, reason: String },
}

/// Outcome of a read that produced no report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// Nothing available within the timeout; retry
    #[error("no report available")]
    WouldBlock,

    /// Device removed or handle unusable; the read loop must stop
    #[error("device read failed: {0}")]
    Fatal(String),
}

/// Hot-plug notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugEvent {
    DeviceAdded(DeviceIdentity),
    DeviceRemoved(DeviceIdentity),
}

/// OS-level HID access
pub trait HidBackend: Send + Sync {
    /// List present devices with the given vendor id
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<DeviceIdentity>, BackendError>;

    /// Open a device for reading and writing
    fn open(&self, identity: &DeviceIdentity) -> Result<Arc<dyn HidHandle>, BackendError>;
}

/// An open device
///
/// The reader thread calls `read_report` while the tick thread calls
/// `write_report`, so implementations must allow both concurrently.
pub trait HidHandle: Send + Sync {
    /// Read one input report into `buf`, waiting at most `timeout`
    ///
    /// Returns the number of bytes written into `buf`, including the report
    /// id byte.
    fn read_report(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError>;

    /// Write one output report; `false` on OS failure or a short write
    fn write_report(&self, data: &[u8]) -> bool;

    /// Release the OS handle. Later reads fail fatally and writes return
    /// `false`. Calling it twice is harmless.
    fn close(&self);
}
