//! Hot-plug detection
//!
//! hidapi has no device-arrival callback, so a background thread
//! re-enumerates the vendor's devices at a fixed interval and diffs the result
//! against the previous scan by OS path. Changes are sent as
//! [`HotplugEvent`]s over a flume channel; the registry applies them on its
//! next `update()`. The watcher never touches registry state itself.
//!
//! When the registry drops a connection whose reader died, it hands the path
//! back with [`HotplugWatcher::forget`]. The next scan then reports the device
//! as added again if it is still (or again) present, so a quick re-plug or a
//! transient read error does not lose the panel for good.

use crate::backend::{HidBackend, HotplugEvent};
use crate::types::DeviceIdentity;
use flume::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which the poll loop checks its shutdown flag
const SHUTDOWN_CHECK: Duration = Duration::from_millis(20);

/// Events that turn the `previous` scan into the `current` one
///
/// Removals come first so that a device re-plugged on the same path between
/// two scans is torn down before it is added again.
pub fn diff_devices(previous: &[DeviceIdentity], current: &[DeviceIdentity]) -> Vec<HotplugEvent> {
    let removed = previous
        .iter()
        .filter(|old| !current.iter().any(|new| new.path == old.path))
        .cloned()
        .map(HotplugEvent::DeviceRemoved);

    let added = current
        .iter()
        .filter(|new| !previous.iter().any(|old| old.path == new.path))
        .cloned()
        .map(HotplugEvent::DeviceAdded);

    removed.chain(added).collect()
}

/// Background enumeration poller
///
/// Stops (and joins its thread) when dropped.
pub struct HotplugWatcher {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    forget_tx: Sender<String>,
}

impl HotplugWatcher {
    /// Start polling
    ///
    /// `known` is the result of the scan the caller already acted on, so the
    /// first poll only reports changes since then.
    pub fn spawn(
        backend: Arc<dyn HidBackend>,
        vendor_id: u16,
        interval: Duration,
        known: Vec<DeviceIdentity>,
        event_tx: Sender<HotplugEvent>,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let (forget_tx, forget_rx) = flume::unbounded();

        let handle = thread::Builder::new()
            .name("hid-hotplug".to_string())
            .spawn(move || {
                Self::poll_loop(
                    &*backend,
                    vendor_id,
                    interval,
                    known,
                    event_tx,
                    forget_rx,
                    &shutdown_clone,
                );
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
            forget_tx,
        })
    }

    /// Drop `path` from the last scan so its next sighting counts as added
    pub fn forget(&self, path: &str) {
        // Fails only once the thread has exited, when nothing is left to forget
        let _ = self.forget_tx.send(path.to_string());
    }

    fn poll_loop(
        backend: &dyn HidBackend,
        vendor_id: u16,
        interval: Duration,
        mut known: Vec<DeviceIdentity>,
        event_tx: Sender<HotplugEvent>,
        forget_rx: Receiver<String>,
        shutdown: &AtomicBool,
    ) {
        log::debug!("HID: Hot-plug watcher started ({} ms interval)", interval.as_millis());

        'outer: loop {
            let deadline = Instant::now() + interval;
            while Instant::now() < deadline {
                if shutdown.load(Ordering::Relaxed) {
                    break 'outer;
                }
                thread::sleep(SHUTDOWN_CHECK.min(interval));
            }
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            for path in forget_rx.try_iter() {
                known.retain(|d| d.path != path);
            }

            let current = match backend.enumerate(vendor_id) {
                Ok(devices) => devices,
                Err(e) => {
                    // A failed scan says nothing about removals; keep the old view
                    log::warn!("HID: Hot-plug scan failed: {}", e);
                    continue;
                }
            };

            for event in diff_devices(&known, &current) {
                match &event {
                    HotplugEvent::DeviceAdded(d) => {
                        log::debug!("HID: Hot-plug added {} at {}", d.label(), d.path)
                    }
                    HotplugEvent::DeviceRemoved(d) => {
                        log::debug!("HID: Hot-plug removed {} at {}", d.label(), d.path)
                    }
                }
                if event_tx.send(event).is_err() {
                    // Registry is gone
                    break 'outer;
                }
            }
            known = current;
        }

        log::debug!("HID: Hot-plug watcher stopped");
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HotplugWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
