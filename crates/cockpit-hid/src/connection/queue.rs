//! Bounded report FIFO with drop-oldest overflow
//!
//! The reader thread is the only producer and the tick thread the only
//! consumer. When the tick falls behind, the oldest queued report is
//! discarded so the newest button snapshot always gets through.

use crate::types::InputReport;
use flume::{Receiver, Sender, TrySendError};

/// Create a queue holding at most `depth` reports (at least one)
pub fn report_queue(depth: usize) -> (ReportSender, Receiver<InputReport>) {
    let (tx, rx) = flume::bounded(depth.max(1));
    let sender = ReportSender {
        tx,
        rx: rx.clone(),
        dropped: 0,
    };
    (sender, rx)
}

/// Producer half, owned by the reader thread
pub struct ReportSender {
    tx: Sender<InputReport>,
    /// Used only to evict the oldest report on overflow
    rx: Receiver<InputReport>,
    dropped: u64,
}

impl ReportSender {
    /// Enqueue a report, evicting the oldest one if the queue is full
    ///
    /// Returns `false` once the consumer half is gone.
    pub fn push(&mut self, report: InputReport) -> bool {
        // Our own eviction handle keeps the channel open, so count receivers
        if self.tx.receiver_count() <= 1 {
            return false;
        }

        match self.tx.try_send(report) {
            Ok(()) => true,
            Err(TrySendError::Full(report)) => {
                let _ = self.rx.try_recv();
                self.dropped += 1;
                log::warn!(
                    "HID: Report queue full ({} reports), dropped oldest ({} dropped so far)",
                    self.tx.capacity().unwrap_or(0),
                    self.dropped
                );
                self.tx.try_send(report).is_ok()
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Reports evicted since the queue was created
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
