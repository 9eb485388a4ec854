//! Progress reporting for batch scoring runs.
//!
//! The batch worker broadcasts events while it processes a folder so hosts
//! can render progress without polling shared state.

use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::debug;

/// Progress event types.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A file finished processing (successfully or not).
    Progress {
        /// Batch completion percentage, 0-100.
        percent: u8,
        /// Human-readable status line, e.g. `Processing: <file>`.
        message: String,
    },
    /// The run stopped early at a file boundary after a cancellation request.
    Cancelled,
    /// Errors were collected and written to a log file.
    ErrorSummary {
        /// Number of collected error entries.
        count: usize,
        /// Location of the written error log.
        log_path: PathBuf,
    },
    /// The run finished.
    Finished {
        /// Number of files with every enabled agent successful.
        successful: usize,
        /// Number of files with at least one agent failure.
        failed: usize,
    },
}

/// Progress reporter for batch scoring.
pub struct ProgressReporter {
    /// Broadcast sender for progress events.
    broadcast_tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressReporter {
    /// Creates a new progress reporter.
    #[must_use]
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(100);
        Self { broadcast_tx }
    }

    /// Subscribes to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Emits a per-file progress event.
    pub fn emit_progress(&self, percent: u8, message: String) {
        let event = ProgressEvent::Progress { percent, message };
        let _ = self.broadcast_tx.send(event.clone());
        debug!("Progress event: {:?}", event);
    }

    /// Emits a cancellation event.
    pub fn emit_cancelled(&self) {
        let event = ProgressEvent::Cancelled;
        let _ = self.broadcast_tx.send(event.clone());
        debug!("Progress event: {:?}", event);
    }

    /// Emits an error summary event.
    pub fn emit_error_summary(&self, count: usize, log_path: PathBuf) {
        let event = ProgressEvent::ErrorSummary { count, log_path };
        let _ = self.broadcast_tx.send(event.clone());
        debug!("Progress event: {:?}", event);
    }

    /// Emits the terminal finished event.
    pub fn emit_finished(&self, successful: usize, failed: usize) {
        let event = ProgressEvent::Finished { successful, failed };
        let _ = self.broadcast_tx.send(event.clone());
        debug!("Progress event: {:?}", event);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
