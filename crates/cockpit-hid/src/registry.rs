//! Device registry: the single owner of connections and drivers
//!
//! Everything that mutates device state runs inside [`DeviceRegistry::update`]
//! or the explicit calls from profile code, all on the caller's thread.
//! Background threads (readers, hot-plug watcher) only feed channels.
//!
//! # Tick order
//!
//! 1. Apply queued hot-plug events
//! 2. Drain each report queue into its driver and deliver the events
//! 3. Drop connections whose reader died, after their last reports went out
//! 4. Write scheduled LED frames that are due
//! 5. Flush changed display content, paced per device
//!
//! A dropped connection's path is handed back to the hot-plug watcher, which
//! reconnects the panel on its next scan if it is still there.

use crate::backend::{HidBackend, HotplugEvent};
use crate::config::HidConfig;
use crate::connection::DeviceConnection;
use crate::devices::{find_known_device, CockpitDevice};
use crate::display::DisplayFields;
use crate::hotplug::HotplugWatcher;
use crate::pacing::DisplayPacer;
use crate::types::{DeviceId, DeviceIdentity, DeviceKind, EventSink, OutputFrame, VENDOR_ID};
use crate::CockpitError;
use flume::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of one connected device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub identity: DeviceIdentity,
    pub kind: DeviceKind,
    pub name: &'static str,
}

/// One connected device
struct Entry {
    id: DeviceId,
    name: &'static str,
    connection: DeviceConnection,
    device: Box<dyn CockpitDevice>,
    pacer: DisplayPacer,
}

impl Entry {
    fn write_frames(&mut self, frames: &[OutputFrame]) -> bool {
        self.connection.write_all(frames.iter().map(|f| f.as_slice()))
    }
}

/// A frame waiting for its due time
struct PendingFrame {
    due: Instant,
    device: DeviceId,
    frame: OutputFrame,
}

/// Owner of every open panel
///
/// Create one per application; dropping it turns every panel's LEDs off and
/// joins all background threads.
pub struct DeviceRegistry {
    backend: Arc<dyn HidBackend>,
    config: HidConfig,
    entries: Vec<Entry>,
    next_id: u32,
    scheduled: Vec<PendingFrame>,
    /// Result of the last full scan, handed to the watcher as its baseline
    last_scan: Vec<DeviceIdentity>,
    hotplug_tx: Sender<HotplugEvent>,
    hotplug_rx: Receiver<HotplugEvent>,
    watcher: Option<HotplugWatcher>,
}

impl DeviceRegistry {
    pub fn new(backend: Arc<dyn HidBackend>, config: HidConfig) -> Self {
        let (hotplug_tx, hotplug_rx) = flume::unbounded();
        Self {
            backend,
            config,
            entries: Vec::new(),
            next_id: 0,
            scheduled: Vec::new(),
            last_scan: Vec::new(),
            hotplug_tx,
            hotplug_rx,
            watcher: None,
        }
    }

    pub fn config(&self) -> &HidConfig {
        &self.config
    }

    /// Scan for panels and connect every supported one
    ///
    /// Returns the number of devices connected by this scan. Devices that
    /// fail to open are logged and skipped.
    pub fn enumerate(&mut self) -> Result<usize, CockpitError> {
        let found = self.backend.enumerate(VENDOR_ID)?;
        log::info!("HID: Found {} device(s) with vendor id {:04x}", found.len(), VENDOR_ID);

        let mut added = 0;
        for identity in &found {
            if self.add_device(identity).is_some() {
                added += 1;
            }
        }
        self.last_scan = found;
        Ok(added)
    }

    /// Start watching for plugged and unplugged panels
    ///
    /// Changes are applied on the following `update()` calls.
    pub fn start_hotplug(&mut self) -> Result<(), CockpitError> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let watcher = HotplugWatcher::spawn(
            self.backend.clone(),
            VENDOR_ID,
            Duration::from_millis(self.config.hotplug_poll_ms),
            self.last_scan.clone(),
            self.hotplug_tx.clone(),
        )
        .map_err(CockpitError::Spawn)?;
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Run one tick: hot-plug, input, scheduled LEDs, display output
    pub fn update(&mut self, sink: &mut dyn EventSink) {
        while let Ok(event) = self.hotplug_rx.try_recv() {
            match event {
                HotplugEvent::DeviceAdded(identity) => {
                    self.add_device(&identity);
                }
                HotplugEvent::DeviceRemoved(identity) => {
                    let index = self
                        .entries
                        .iter()
                        .position(|e| e.connection.identity().path == identity.path);
                    if let Some(index) = index {
                        self.remove_at(index);
                    }
                }
            }
        }

        let mut index = 0;
        while index < self.entries.len() {
            let entry = &mut self.entries[index];
            // Checked first: once the reader is gone, its queue holds everything it read
            let lost = entry.connection.is_lost();
            for report in entry.connection.poll_events() {
                entry.device.did_receive_data(&report, &mut |event| sink.deliver(event));
            }

            if !lost {
                index += 1;
                continue;
            }
            log::warn!("HID: Lost connection to {}", entry.name);
            let path = entry.connection.identity().path.clone();
            self.remove_at(index);
            if let Some(watcher) = &self.watcher {
                watcher.forget(&path);
            }
        }

        self.flush_scheduled(Instant::now());

        for entry in &mut self.entries {
            if !entry.pacer.tick() {
                continue;
            }
            let frames = entry.device.build_output();
            if frames.is_empty() {
                continue;
            }
            if !entry.write_frames(&frames) {
                log::debug!("HID: Display update for {} incomplete", entry.name);
            }
            entry.pacer.flushed(entry.connection.bytes_written());
        }
    }

    /// Store new display content; it goes out on a later paced flush
    pub fn set_display(&mut self, id: DeviceId, fields: DisplayFields) -> Result<(), CockpitError> {
        self.entry_mut(id)?.device.set_display(fields)
    }

    /// Write one LED frame immediately
    ///
    /// Returns whether the write succeeded. Unknown LED addresses are an
    /// error; a failed write is not.
    pub fn set_led(&mut self, id: DeviceId, led: u16, brightness: i32) -> Result<bool, CockpitError> {
        let entry = self.entry_mut(id)?;
        let frame = entry.device.set_led(led, brightness)?;
        Ok(entry.connection.write(&frame))
    }

    /// Queue the device's identify LED sequence
    pub fn identify(&mut self, id: DeviceId) -> Result<(), CockpitError> {
        let sequence = self.entry_mut(id)?.device.identify_sequence();
        let now = Instant::now();
        self.scheduled.extend(sequence.into_iter().map(|step| PendingFrame {
            due: now + step.after,
            device: id,
            frame: step.frame,
        }));
        Ok(())
    }

    /// Forget held buttons and shown display content of one device
    ///
    /// Held buttons report `Begin` again on the next report and the display
    /// is re-sent on the next flush.
    pub fn force_state_sync(&mut self, id: DeviceId) -> Result<(), CockpitError> {
        self.entry_mut(id)?.device.force_state_sync();
        Ok(())
    }

    /// Disconnect one device, turning its LEDs off first
    pub fn remove(&mut self, id: DeviceId) -> Result<(), CockpitError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(CockpitError::UnknownDevice(id))?;
        self.remove_at(index);
        Ok(())
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.entries
            .iter()
            .map(|e| DeviceInfo {
                id: e.id,
                identity: e.connection.identity().clone(),
                kind: e.device.kind(),
                name: e.name,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stop hot-plug watching and disconnect every device
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        while !self.entries.is_empty() {
            self.remove_at(self.entries.len() - 1);
        }
        self.scheduled.clear();
    }

    fn entry_mut(&mut self, id: DeviceId) -> Result<&mut Entry, CockpitError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CockpitError::UnknownDevice(id))
    }

    fn add_device(&mut self, identity: &DeviceIdentity) -> Option<DeviceId> {
        if self.entries.iter().any(|e| e.connection.identity().path == identity.path) {
            return None;
        }

        let Some(known) = find_known_device(identity.product_id) else {
            log::info!(
                "HID: Ignoring unsupported product {:04x} ({})",
                identity.product_id,
                identity.label()
            );
            return None;
        };

        if self.config.is_disabled(identity.product_id) {
            log::info!("HID: {} is disabled in config, not opening", known.name);
            return None;
        }

        let connection = match DeviceConnection::connect(&*self.backend, identity, &self.config) {
            Ok(connection) => connection,
            Err(e) => {
                log::warn!("HID: Failed to connect to {}: {}", known.name, e);
                return None;
            }
        };

        let id = DeviceId(self.next_id);
        self.next_id += 1;

        let mut entry = Entry {
            id,
            name: known.name,
            connection,
            device: known.create(id, &self.config),
            pacer: DisplayPacer::new(self.config.min_display_interval_ticks),
        };

        let frames = entry.device.connect_frames();
        if !entry.write_frames(&frames) {
            log::warn!("HID: Init sequence for {} was not fully written", known.name);
        }

        log::info!("HID: {} ready as {} ({})", known.name, id, entry.device.kind());
        self.entries.push(entry);
        Some(id)
    }

    fn remove_at(&mut self, index: usize) {
        let mut entry = self.entries.remove(index);

        let frames = entry.device.shutdown_frames();
        if !entry.write_frames(&frames) {
            log::debug!("HID: {} not writable, skipping LED teardown", entry.name);
        }
        entry.device.force_state_sync();
        entry.connection.disconnect();

        self.scheduled.retain(|p| p.device != entry.id);
        log::info!("HID: Removed {} ({})", entry.name, entry.id);
    }

    fn flush_scheduled(&mut self, now: Instant) {
        if self.scheduled.is_empty() {
            return;
        }

        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.scheduled).into_iter().partition(|p| p.due <= now);
        self.scheduled = pending;
        due.sort_by_key(|p| p.due);

        for pending in due {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == pending.device) {
                entry.connection.write(&pending.frame);
            }
        }
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
