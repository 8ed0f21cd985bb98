//! In-memory HID backend
//!
//! Devices are plain structs: tests push input reports into them, inspect
//! every frame written, and unplug them to simulate removal. `cockpit-probe`'s
//! `--simulate` mode uses the same backend to run without hardware.

use super::{BackendError, HidBackend, HidHandle, ReadError};
use crate::types::{DeviceIdentity, VENDOR_ID};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Longest a mock read sleeps when no report is queued
const IDLE_READ_SLEEP: Duration = Duration::from_millis(2);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One simulated device
pub struct MockDevice {
    identity: DeviceIdentity,
    input: Mutex<VecDeque<Vec<u8>>>,
    written: Mutex<Vec<Vec<u8>>>,
    unplugged: AtomicBool,
    fail_open: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    open_handles: AtomicUsize,
    reads_in_flight: AtomicUsize,
    closed_while_reading: AtomicBool,
}

impl MockDevice {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            input: Mutex::new(VecDeque::new()),
            written: Mutex::new(Vec::new()),
            unplugged: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            open_handles: AtomicUsize::new(0),
            reads_in_flight: AtomicUsize::new(0),
            closed_while_reading: AtomicBool::new(false),
        }
    }

    /// Identity with the family vendor id and a synthetic path
    pub fn identity_for(product_id: u16, path: &str) -> DeviceIdentity {
        DeviceIdentity {
            vendor_id: VENDOR_ID,
            product_id,
            manufacturer: "Mock".to_string(),
            product_name: format!("Mock {:04X}", product_id),
            path: path.to_string(),
            serial: None,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Queue an input report (first byte is the report id)
    pub fn push_report(&self, report: &[u8]) {
        lock(&self.input).push_back(report.to_vec());
    }

    /// Reports not yet picked up by a reader
    pub fn pending_input(&self) -> usize {
        lock(&self.input).len()
    }

    /// Every frame written so far, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        lock(&self.written).clone()
    }

    /// Remove and return the frames written so far
    pub fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *lock(&self.written))
    }

    /// Simulate removal: reads fail fatally and writes fail from now on
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }

    pub fn is_unplugged(&self) -> bool {
        self.unplugged.load(Ordering::SeqCst)
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make reads fail fatally while the device stays enumerated
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Handles opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// True if any handle was closed while a read on it was in progress
    pub fn closed_while_reading(&self) -> bool {
        self.closed_while_reading.load(Ordering::SeqCst)
    }
}

/// Simulated HID subsystem
#[derive(Default)]
pub struct MockBackend {
    devices: Mutex<Vec<Arc<MockDevice>>>,
    fail_init: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug in a device; it shows up in the next enumeration
    pub fn add_device(&self, identity: DeviceIdentity) -> Arc<MockDevice> {
        let device = Arc::new(MockDevice::new(identity));
        lock(&self.devices).push(device.clone());
        device
    }

    /// Shorthand for [`MockBackend::add_device`] with a synthetic identity
    pub fn plug(&self, product_id: u16, path: &str) -> Arc<MockDevice> {
        self.add_device(MockDevice::identity_for(product_id, path))
    }

    /// Unplug a device: it disappears from enumeration and its open handles
    /// start failing
    pub fn unplug(&self, path: &str) -> Option<Arc<MockDevice>> {
        let mut devices = lock(&self.devices);
        let index = devices.iter().position(|d| d.identity.path == path)?;
        let device = devices.remove(index);
        device.unplug();
        Some(device)
    }

    pub fn device(&self, path: &str) -> Option<Arc<MockDevice>> {
        lock(&self.devices)
            .iter()
            .find(|d| d.identity.path == path)
            .cloned()
    }

    /// Make the next enumerations fail as if the HID subsystem were missing
    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }
}

impl HidBackend for MockBackend {
    fn enumerate(&self, vendor_id: u16) -> Result<Vec<DeviceIdentity>, BackendError> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(BackendError::Init("mock HID subsystem unavailable".to_string()));
        }

        Ok(lock(&self.devices)
            .iter()
            .filter(|d| d.identity.vendor_id == vendor_id)
            .map(|d| d.identity.clone())
            .collect())
    }

    fn open(&self, identity: &DeviceIdentity) -> Result<Arc<dyn HidHandle>, BackendError> {
        let device = self.device(&identity.path).ok_or_else(|| BackendError::Open {
            path: identity.path.clone(),
            reason: "no such device".to_string(),
        })?;

        if device.fail_open.load(Ordering::SeqCst) {
            return Err(BackendError::Open {
                path: identity.path.clone(),
                reason: "permission denied".to_string(),
            });
        }

        device.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockHandle {
            device,
            closed: AtomicBool::new(false),
        }))
    }
}

struct MockHandle {
    device: Arc<MockDevice>,
    closed: AtomicBool,
}

impl HidHandle for MockHandle {
    fn read_report(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError> {
        let device = &self.device;
        device.reads_in_flight.fetch_add(1, Ordering::SeqCst);

        let result = if self.closed.load(Ordering::SeqCst) {
            Err(ReadError::Fatal("handle closed".to_string()))
        } else if device.is_unplugged() {
            Err(ReadError::Fatal("device removed".to_string()))
        } else if device.fail_reads.load(Ordering::SeqCst) {
            Err(ReadError::Fatal("I/O error".to_string()))
        } else {
            let next = lock(&device.input).pop_front();
            match next {
                Some(report) => {
                    let n = report.len().min(buf.len());
                    buf[..n].copy_from_slice(&report[..n]);
                    Ok(n)
                }
                None => {
                    std::thread::sleep(timeout.min(IDLE_READ_SLEEP));
                    Err(ReadError::WouldBlock)
                }
            }
        };

        device.reads_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn write_report(&self, data: &[u8]) -> bool {
        let device = &self.device;
        if self.closed.load(Ordering::SeqCst)
            || device.is_unplugged()
            || device.fail_writes.load(Ordering::SeqCst)
        {
            return false;
        }
        lock(&device.written).push(data.to_vec());
        true
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.device.reads_in_flight.load(Ordering::SeqCst) > 0 {
            self.device.closed_while_reading.store(true, Ordering::SeqCst);
        }
        self.device.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_filters_by_vendor() {
        let backend = MockBackend::new();
        backend.plug(0xBB10, "mock/0");
        let mut other = MockDevice::identity_for(0x1234, "mock/1");
        other.vendor_id = 0x17CC;
        backend.add_device(other);

        let found = backend.enumerate(VENDOR_ID).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_id, 0xBB10);
    }

    #[test]
    fn test_read_and_write_roundtrip_through_handle() {
        let backend = MockBackend::new();
        let device = backend.plug(0xBB61, "mock/pdc");
        let handle = backend.open(device.identity()).unwrap();

        let mut buf = [0u8; 65];
        assert_eq!(
            handle.read_report(&mut buf, Duration::from_millis(1)),
            Err(ReadError::WouldBlock)
        );

        device.push_report(&[1, 2, 3]);
        assert_eq!(handle.read_report(&mut buf, Duration::from_millis(1)), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);

        assert!(handle.write_report(&[0x02, 0x60]));
        assert_eq!(device.written(), vec![vec![0x02, 0x60]]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let backend = MockBackend::new();
        let device = backend.plug(0xBB61, "mock/pdc");
        let handle = backend.open(device.identity()).unwrap();
        assert_eq!(device.open_handles(), 1);

        handle.close();
        handle.close();
        assert_eq!(device.open_handles(), 0);
        assert!(!handle.write_report(&[0]));
        let mut buf = [0u8; 8];
        assert!(matches!(
            handle.read_report(&mut buf, Duration::ZERO),
            Err(ReadError::Fatal(_))
        ));
    }

    #[test]
    fn test_unplug_fails_reads_and_hides_device() {
        let backend = MockBackend::new();
        let device = backend.plug(0xBB10, "mock/fcu");
        let handle = backend.open(device.identity()).unwrap();

        backend.unplug("mock/fcu");
        assert!(backend.enumerate(VENDOR_ID).unwrap().is_empty());
        let mut buf = [0u8; 8];
        assert!(matches!(
            handle.read_report(&mut buf, Duration::ZERO),
            Err(ReadError::Fatal(_))
        ));
        assert!(!handle.write_report(&[0]));
    }

    #[test]
    fn test_read_failure_keeps_device_listed() {
        let backend = MockBackend::new();
        let device = backend.plug(0xBB61, "mock/pdc");
        let handle = backend.open(device.identity()).unwrap();

        device.set_fail_reads(true);
        let mut buf = [0u8; 8];
        assert!(matches!(
            handle.read_report(&mut buf, Duration::ZERO),
            Err(ReadError::Fatal(_))
        ));
        assert_eq!(backend.enumerate(VENDOR_ID).unwrap().len(), 1);

        device.set_fail_reads(false);
        assert_eq!(
            handle.read_report(&mut buf, Duration::ZERO),
            Err(ReadError::WouldBlock)
        );
    }

    #[test]
    fn test_open_failures() {
        let backend = MockBackend::new();
        let device = backend.plug(0xBB10, "mock/fcu");
        device.set_fail_open(true);
        assert!(matches!(
            backend.open(device.identity()),
            Err(BackendError::Open { .. })
        ));

        backend.set_fail_init(true);
        assert!(matches!(
            backend.enumerate(VENDOR_ID),
            Err(BackendError::Init(_))
        ));
    }
}
