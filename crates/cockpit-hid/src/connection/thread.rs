//! HID reader thread
//!
//! Dedicated thread per connected device. Reads input reports with a short
//! timeout and pushes them into the connection's report queue. Output is
//! written from the tick thread, never from here.

use super::queue::ReportSender;
use crate::backend::{HidHandle, ReadError};
use crate::types::InputReport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Input buffer size: 64-byte report plus a leading report id on platforms
/// that prepend one
pub const INPUT_BUFFER_SIZE: usize = 65;

/// Reader thread handle
///
/// Owns the thread join handle and a shutdown flag.
/// When dropped, signals the thread to stop and waits for it.
pub struct ReaderThread {
    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
    /// Thread join handle
    handle: Option<thread::JoinHandle<()>>,
    /// Device name (for logging)
    device_name: String,
    /// Whether the read loop is still running (set to false on exit)
    alive: Arc<AtomicBool>,
}

impl ReaderThread {
    /// Spawn a reader for an open device
    ///
    /// - `device`: the open handle, shared with the tick thread for writes
    /// - `queue`: producer half of the connection's report queue
    /// - `read_timeout`: upper bound on one read, and so on how long
    ///   `stop()` waits
    /// - `device_name`: human-readable name for logging
    pub fn spawn(
        device: Arc<dyn HidHandle>,
        queue: ReportSender,
        read_timeout: Duration,
        device_name: String,
    ) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let alive = Arc::new(AtomicBool::new(true));
        let alive_clone = alive.clone();
        let name = device_name.clone();

        let spawned = thread::Builder::new()
            .name(format!("hid-rd-{}", device_name))
            .spawn(move || {
                Self::read_loop(&*device, queue, read_timeout, &shutdown_clone, &name);
                alive_clone.store(false, Ordering::Release);
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                alive.store(false, Ordering::Release);
                return Err(e);
            }
        };

        Ok(Self {
            shutdown,
            handle: Some(handle),
            device_name,
            alive,
        })
    }

    /// Check if the read loop is still running
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Main read loop running on the dedicated thread
    fn read_loop(
        device: &dyn HidHandle,
        mut queue: ReportSender,
        read_timeout: Duration,
        shutdown: &AtomicBool,
        name: &str,
    ) {
        log::info!("[HID {}] Reader thread started", name);

        let mut input_buf = [0u8; INPUT_BUFFER_SIZE];

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            match device.read_report(&mut input_buf, read_timeout) {
                Ok(n) => {
                    if log::log_enabled!(log::Level::Trace) {
                        let hex: Vec<String> =
                            input_buf[..n].iter().map(|b| format!("{:02X}", b)).collect();
                        log::trace!("[HID {}] Input: {}", name, hex.join(" "));
                    }
                    let Some(report) = InputReport::from_bytes(&input_buf[..n]) else {
                        continue;
                    };
                    if !queue.push(report) {
                        log::warn!("[HID {}] Report queue closed, stopping reader", name);
                        break;
                    }
                }
                Err(ReadError::WouldBlock) => {} // Timeout, no data (expected)
                Err(ReadError::Fatal(e)) => {
                    log::error!("[HID {}] Read error: {}", name, e);
                    break; // Device disconnected
                }
            }
        }

        log::info!("[HID {}] Reader thread stopped", name);
    }

    /// Signal the loop to stop and wait for the thread to exit
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            log::debug!("[HID {}] Waiting for reader thread to stop...", self.device_name);
            if handle.join().is_err() {
                log::error!("[HID {}] Reader thread panicked", self.device_name);
            }
        }
        self.alive.store(false, Ordering::Release);
    }
}

impl Drop for ReaderThread {
    fn drop(&mut self) {
        self.stop();
    }
}
