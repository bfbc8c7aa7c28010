//! Write actions, writer options and per-item failure records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use vfolder_core::TreeError;

use crate::conflict::ConflictPolicy;

/// What the writer does with each item of a tree.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// Walk the tree without touching any file.
    #[default]
    NoAction,
    /// Create or overwrite each file with the item's content.
    Write,
    /// Copy each item's source file to its destination.
    Copy,
    /// Move each item's source file to its destination.
    Move,
    /// Remove each item's destination file.
    Delete,
    /// Truncate each destination file to zero length.
    Clear,
    /// Rename `<source file name>` to the item's name inside the destination.
    Rename,
    /// Create each destination file if absent, else bump its modification time.
    Touch,
}

impl WriteAction {
    /// Whether destination directories are created for this action.
    pub fn creates_folders(&self) -> bool {
        matches!(
            self,
            Self::Write | Self::Copy | Self::Move | Self::Clear | Self::Touch
        )
    }

    /// Whether items must carry a recorded source path.
    pub fn needs_source(&self) -> bool {
        matches!(self, Self::Copy | Self::Move | Self::Rename)
    }

    /// Past-tense verb used in summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::NoAction => "Visited",
            Self::Write => "Wrote",
            Self::Copy => "Copied",
            Self::Move => "Moved",
            Self::Delete => "Deleted",
            Self::Clear => "Cleared",
            Self::Rename => "Renamed",
            Self::Touch => "Touched",
        }
    }
}

/// Options for materializing a tree.
///
/// `execute` defaults to false: a writer built from default options only
/// reports what it would do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Action applied to every item.
    #[serde(default)]
    pub action: WriteAction,
    /// Perform filesystem changes; when false, only traverse and log.
    #[serde(default)]
    pub execute: bool,
    /// How to treat destination files that already exist.
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

impl WriteOptions {
    /// Options for `action`, as a dry run.
    pub fn new(action: WriteAction) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    /// Set whether changes are actually made.
    pub fn execute(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }

    /// Set the conflict policy.
    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }
}

/// An error that occurred while materializing one item or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The destination path that failed.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Record a tree error against the destination it happened at.
    pub fn from_tree_error(path: PathBuf, err: &TreeError) -> Self {
        Self::new(path, err.to_string())
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
