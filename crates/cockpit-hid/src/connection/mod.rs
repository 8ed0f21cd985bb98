//! One open device: handle, reader thread and report queue
//!
//! ```text
//! HidHandle ── reader thread ── bounded FIFO ── poll_events() (tick thread)
//!     ▲
//!     └──────────── write() (tick thread) ────────────
//! ```

mod queue;
mod thread;

pub use queue::{report_queue, ReportSender};
pub use thread::{ReaderThread, INPUT_BUFFER_SIZE};

use crate::backend::{HidBackend, HidHandle};
use crate::config::HidConfig;
use crate::types::{DeviceIdentity, InputReport};
use crate::CockpitError;
use flume::Receiver;
use std::sync::Arc;
use std::time::Duration;

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Live connection to one device
pub struct DeviceConnection {
    identity: DeviceIdentity,
    handle: Arc<dyn HidHandle>,
    reader: Option<ReaderThread>,
    /// Producer half, held until the reader takes it over
    pending_sender: Option<ReportSender>,
    reports: Receiver<InputReport>,
    state: ConnectionState,
    frames_written: u64,
    bytes_written: u64,
}

impl DeviceConnection {
    /// Open `identity` and start its reader thread
    pub fn connect(
        backend: &dyn HidBackend,
        identity: &DeviceIdentity,
        config: &HidConfig,
    ) -> Result<Self, CockpitError> {
        let mut connection = Self::open(backend, identity, config)?;
        connection.start_reader(Duration::from_millis(config.read_timeout_ms))?;
        log::info!("HID: Connected to {} at {}", identity.label(), identity.path);
        Ok(connection)
    }

    /// Open the handle; the connection stays `Connecting` until its reader runs
    fn open(
        backend: &dyn HidBackend,
        identity: &DeviceIdentity,
        config: &HidConfig,
    ) -> Result<Self, CockpitError> {
        log::debug!("HID: Connecting to {} at {}", identity.label(), identity.path);

        let handle = backend.open(identity)?;
        let (sender, reports) = report_queue(config.queue_depth);

        Ok(Self {
            identity: identity.clone(),
            handle,
            reader: None,
            pending_sender: Some(sender),
            reports,
            state: ConnectionState::Connecting,
            frames_written: 0,
            bytes_written: 0,
        })
    }

    /// Spawn the reader and move to `Connected`
    ///
    /// On spawn failure the handle is closed and the connection ends up
    /// `Disconnected`.
    fn start_reader(&mut self, read_timeout: Duration) -> Result<(), CockpitError> {
        let Some(sender) = self.pending_sender.take() else {
            return Ok(());
        };

        match ReaderThread::spawn(
            self.handle.clone(),
            sender,
            read_timeout,
            format!("{:04x}", self.identity.product_id),
        ) {
            Ok(reader) => {
                self.reader = Some(reader);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(CockpitError::Spawn(e))
            }
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The reader exited on its own (fatal read error, device gone)
    pub fn is_lost(&self) -> bool {
        self.state == ConnectionState::Connected
            && self.reader.as_ref().is_some_and(|r| !r.is_alive())
    }

    /// Drain every queued report in arrival order
    pub fn poll_events(&self) -> Vec<InputReport> {
        self.reports.try_iter().collect()
    }

    /// Write one output frame; `false` on failure or when disconnected
    pub fn write(&mut self, frame: &[u8]) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }

        if log::log_enabled!(log::Level::Trace) {
            let hex: Vec<String> = frame.iter().map(|b| format!("{:02X}", b)).collect();
            log::trace!("[HID {:04x}] Output: {}", self.identity.product_id, hex.join(" "));
        }

        if self.handle.write_report(frame) {
            self.frames_written += 1;
            self.bytes_written += frame.len() as u64;
            true
        } else {
            log::debug!(
                "HID: Write of {} bytes to {} failed",
                frame.len(),
                self.identity.label()
            );
            false
        }
    }

    /// Write frames in order, stopping at the first failure
    pub fn write_all<'a, I>(&mut self, frames: I) -> bool
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        frames.into_iter().all(|frame| self.write(frame))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Total bytes successfully written (feeds display pacing)
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Stop the reader, wait for it, then close the handle
    ///
    /// Safe to call more than once.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }

        if let Some(mut reader) = self.reader.take() {
            reader.stop();
        }
        self.pending_sender = None;
        self.handle.close();
        self.state = ConnectionState::Disconnected;

        log::info!("HID: Disconnected from {}", self.identity.label());
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
