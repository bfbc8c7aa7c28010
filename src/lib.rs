//! vfolder - stage, filter, transform and compare directory trees in memory.
//!
//! A real directory is read into a [`VirtualFolder`] tree, reshaped with
//! pattern removals and extension renames, and then either written back to
//! disk or compared against an expected tree:
//!
//! ```no_run
//! use vfolder::{TransformPlan, WriteAction, WriteOptions, export_hierarchy};
//!
//! # fn main() -> Result<(), vfolder::TreeError> {
//! let plan = TransformPlan::builder()
//!     .exclude_items(vec!["*.tmp".to_string()])
//!     .build()
//!     .map_err(|e| vfolder::TreeError::invalid(e.to_string()))?;
//!
//! let options = WriteOptions::new(WriteAction::Write).execute(true);
//! let report = export_hierarchy("./project", "./export", &plan, options)?;
//! println!("{}", report.write.summary());
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks live in three crates re-exported here:
//! `vfolder-core` (the model, transforms and diff engine), `vfolder-scan`
//! (the reader) and `vfolder-ops` (the writer).

use std::path::Path;

pub use vfolder_core::{
    CloneDepth, ContentHash, DiffOptions, ExtRename, FolderStats, Mismatch, NamePattern, NodeId,
    ReadConfig, ReadConfigBuilder, RemovalReport, TransformPlan, TransformPlanBuilder,
    TransformSummary, TreeDiff, TreeError, VirtualFolder, VirtualItem, compare_sorted_collections,
    diff_folders, render_side_by_side, validate_name,
};
pub use vfolder_ops::{
    ConflictPolicy, HierarchyWriter, OperationError, WriteAction, WriteEvent, WriteOptions,
    WriteProgress, WriteResult, planned_paths, start_write, wait_for_completion,
    write_folder_hierarchy,
};
pub use vfolder_scan::{HierarchyReader, read_folder_hierarchy};

/// Outcome of [`export_hierarchy`].
#[derive(Debug)]
pub struct ExportReport {
    /// The transformed tree that was written.
    pub tree: VirtualFolder,
    /// What the transform plan removed and renamed.
    pub transform: TransformSummary,
    /// What the writer did.
    pub write: WriteResult,
}

/// Read `source`, apply `plan`, and write the result to `dest`.
///
/// Reading and transforming fail fast. Writing never fails as a whole:
/// per-item failures are in [`ExportReport::write`].
pub fn export_hierarchy(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    plan: &TransformPlan,
    options: WriteOptions,
) -> Result<ExportReport, TreeError> {
    let mut tree = read_folder_hierarchy(source.as_ref(), false)?;
    let transform = plan.apply(&mut tree)?;
    tracing::debug!(
        source = %source.as_ref().display(),
        folders_removed = transform.removed.folders_removed.len(),
        items_removed = transform.removed.items_removed.len(),
        extensions_changed = transform.extensions_changed,
        "applied transform plan"
    );

    let write = HierarchyWriter::new(options).write(dest.as_ref(), &tree);
    Ok(ExportReport {
        tree,
        transform,
        write,
    })
}
