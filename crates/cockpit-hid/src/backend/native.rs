//! hidapi backend
//!
//! Uses hidraw on Linux, the HID class driver on Windows and IOKit on macOS.
//! The hidapi device handle is not `Sync`, so each open device sits behind a
//! mutex shared by the reader thread and the tick thread. The reader only
//! holds it for one non-blocking read and waits for data with it released,
//! so a write on the tick thread waits at most for one read syscall.

use super::{BackendError, HidBackend, HidHandle, ReadError};
use crate::types::DeviceIdentity;
use hidapi::{HidApi, HidDevice};
use std::ffi::CString;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Longest idle wait between two reads when no report is pending
const IDLE_POLL: Duration = Duration::from_millis(1);

fn lock_slot<T>(slot: &Mutex<Option<T>>) -> MutexGuard<'_, Option<T>> {
    // A panic while holding the lock cannot leave the handle half-updated
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `read` under the lock, then on `WouldBlock` wait `idle` with the lock
/// released
fn read_then_idle<T, F>(slot: &Mutex<Option<T>>, idle: Duration, read: F) -> Result<usize, ReadError>
where
    F: FnOnce(Option<&T>) -> Result<usize, ReadError>,
{
    let result = {
        let guard = lock_slot(slot);
        read(guard.as_ref())
    };
    if result == Err(ReadError::WouldBlock) {
        thread::sleep(idle);
    }
    result
}

/// Production backend built on hidapi
#[derive(Debug, Default, Clone, Copy)]
pub struct HidApiBackend;

impl HidApiBackend {
    pub fn new() -> Self {
        Self
    }

    fn api() -> Result<HidApi, BackendError> {
        let api = HidApi::new().map_err(|e| BackendError::Init(e.to_string()))?;
        // Shared access so the vendor's own utilities can stay connected
        #[cfg(target_os = "macos")]
        api.set_open_exclusive(false);
        Ok(api)
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<DeviceIdentity>, BackendError> {
        let api = Self::api()?;
        let mut found: Vec<DeviceIdentity> = Vec::new();

        for info in api.device_list() {
            if info.vendor_id() != vendor_id {
                continue;
            }

            let path = info.path().to_string_lossy().to_string();
            // Composite devices list one entry per interface on some platforms
            if found.iter().any(|d| d.path == path) {
                continue;
            }

            let identity = DeviceIdentity {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                manufacturer: info.manufacturer_string().unwrap_or_default().to_string(),
                product_name: info.product_string().unwrap_or_default().to_string(),
                path,
                serial: info
                    .serial_number()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string()),
            };

            log::debug!(
                "HID: Found '{}' (VID={:#06x} PID={:#06x}) at {}",
                identity.product_name,
                identity.vendor_id,
                identity.product_id,
                identity.path
            );
            found.push(identity);
        }

        Ok(found)
    }

    fn open(&self, identity: &DeviceIdentity) -> Result<Arc<dyn HidHandle>, BackendError> {
        let open_err = |reason: String| BackendError::Open {
            path: identity.path.clone(),
            reason,
        };

        let api = Self::api()?;
        let path = CString::new(identity.path.clone()).map_err(|e| open_err(e.to_string()))?;
        let device = api.open_path(&path).map_err(|e| open_err(e.to_string()))?;

        // Reads are driven by read_timeout, never by a blocking read
        device
            .set_blocking_mode(false)
            .map_err(|e| open_err(format!("failed to set non-blocking mode: {}", e)))?;

        Ok(Arc::new(HidApiHandle {
            device: Mutex::new(Some(device)),
            path: identity.path.clone(),
        }))
    }
}

/// One open hidapi device
struct HidApiHandle {
    /// `None` once closed
    device: Mutex<Option<HidDevice>>,
    path: String,
}

impl HidApiHandle {
    fn lock(&self) -> MutexGuard<'_, Option<HidDevice>> {
        lock_slot(&self.device)
    }
}

impl HidHandle for HidApiHandle {
    fn read_report(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError> {
        read_then_idle(&self.device, timeout.min(IDLE_POLL), |device| {
            let device = device.ok_or_else(|| ReadError::Fatal(format!("{} is closed", self.path)))?;
            // Non-blocking mode: returns 0 at once when nothing is pending
            match device.read(buf) {
                Ok(0) => Err(ReadError::WouldBlock),
                Ok(n) => Ok(n),
                Err(e) => Err(ReadError::Fatal(e.to_string())),
            }
        })
    }

    fn write_report(&self, data: &[u8]) -> bool {
        let guard = self.lock();
        let Some(device) = guard.as_ref() else {
            return false;
        };

        match device.write(data) {
            Ok(n) if n >= data.len() => true,
            Ok(n) => {
                log::debug!("HID: Short write on {} ({} of {} bytes)", self.path, n, data.len());
                false
            }
            Err(e) => {
                log::debug!("HID: Write error on {}: {}", self.path, e);
                false
            }
        }
    }

    fn close(&self) {
        if self.lock().take().is_some() {
            log::debug!("HID: Closed {}", self.path);
        }
    }
}
