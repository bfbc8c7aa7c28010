//! Progress reporting and results for tree writes.

use std::path::PathBuf;

use humansize::{DECIMAL, format_size};
use serde::{Deserialize, Serialize};

use crate::operation::{OperationError, WriteAction};

/// Progress information for an ongoing write.
#[derive(Debug, Clone)]
pub struct WriteProgress {
    /// The action being applied.
    pub action: WriteAction,
    /// Whether changes are being made.
    pub execute: bool,
    /// Number of items processed, whatever their outcome.
    pub items_processed: usize,
    /// Total number of items in the tree.
    pub items_total: usize,
    /// Number of bytes written, copied or moved so far.
    pub bytes_processed: u64,
    /// The destination currently being processed.
    pub current_file: Option<PathBuf>,
    /// Failures recorded so far.
    pub errors: Vec<OperationError>,
}

impl WriteProgress {
    /// Create a new progress tracker.
    pub fn new(action: WriteAction, execute: bool, items_total: usize) -> Self {
        Self {
            action,
            execute,
            items_processed: 0,
            items_total,
            bytes_processed: 0,
            current_file: None,
            errors: Vec::new(),
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.items_total > 0 {
            (self.items_processed as f64 / self.items_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Check if any failure has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Record a failure.
    pub fn add_error(&mut self, error: OperationError) {
        self.errors.push(error);
    }

    /// Update the destination being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Count one processed item and its bytes.
    pub fn complete_item(&mut self, bytes: u64) {
        self.items_processed += 1;
        self.bytes_processed += bytes;
    }
}

/// Outcome of materializing a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// The action that was applied.
    pub action: WriteAction,
    /// Whether changes were made (false for a dry run).
    pub executed: bool,
    /// Items whose action succeeded (or would succeed, in a dry run).
    pub succeeded: usize,
    /// Items or folders that failed.
    pub failed: usize,
    /// Items left alone (existing file under `Skip`, nothing to delete, ...).
    pub skipped: usize,
    /// Total bytes written, copied or moved.
    pub bytes_processed: u64,
    /// Directories a delete pass removed (or would remove) once emptied.
    pub folders_removed: Vec<PathBuf>,
    /// Every failure with the destination path it happened at.
    pub failures: Vec<OperationError>,
}

impl WriteResult {
    /// Check if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} {} items", self.action.verb(), self.succeeded);
        if self.bytes_processed > 0 {
            summary.push_str(&format!(" ({})", format_size(self.bytes_processed, DECIMAL)));
        }
        if self.skipped > 0 {
            summary.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            summary.push_str(&format!(", {} failed", self.failed));
        }
        if !self.executed {
            summary.push_str(" (dry run)");
        }
        summary
    }
}
