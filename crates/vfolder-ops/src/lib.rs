//! Writes virtual folder trees back to the filesystem.
//!
//! A [`HierarchyWriter`] walks a [`vfolder_core::VirtualFolder`] depth-first
//! and applies one [`WriteAction`] to every item. Writes are dry runs unless
//! `execute` is set; a dry run walks and logs exactly like a real run but
//! leaves the filesystem alone. Item failures are collected in the
//! [`WriteResult`] instead of aborting the walk.
//!
//! [`start_write`] runs the same writer on a blocking task and reports
//! progress through a channel, for callers on a tokio runtime.

mod conflict;
mod executor;
mod operation;
mod progress;
mod writer;

pub use conflict::{ConflictPolicy, auto_rename_path};
pub use executor::{WriteEvent, start_write, wait_for_completion};
pub use operation::{OperationError, WriteAction, WriteOptions};
pub use progress::{WriteProgress, WriteResult};
pub use writer::{HierarchyWriter, planned_paths, write_folder_hierarchy};

/// Default channel buffer size for write progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
