//! Materializes virtual trees onto the filesystem.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tokio::sync::mpsc;

use vfolder_core::{TreeError, VirtualFolder, VirtualItem};

use crate::executor::WriteEvent;
use crate::operation::{OperationError, WriteAction, WriteOptions};
use crate::progress::{WriteProgress, WriteResult};

/// What happened to a single item.
enum Outcome {
    /// The action was applied (or would be), moving this many bytes.
    Done(u64),
    /// Nothing to do for this item.
    Skipped(&'static str),
}

/// Replays a [`VirtualFolder`] onto a destination directory.
///
/// The root folder's own directory is the destination itself. Folders are
/// visited depth-first; within a folder, items come before subfolders, both
/// in insertion order. A failing item is recorded and its siblings still run.
/// A folder whose directory cannot be created is recorded as one failure and
/// its subtree is skipped.
#[derive(Debug, Default)]
pub struct HierarchyWriter {
    options: WriteOptions,
    progress_tx: Option<mpsc::Sender<WriteEvent>>,
}

impl HierarchyWriter {
    /// Create a writer with the given options.
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            progress_tx: None,
        }
    }

    /// Stream progress updates to `tx` while writing.
    pub(crate) fn with_progress(mut self, tx: mpsc::Sender<WriteEvent>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// The options this writer applies.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Materialize `folder` at `dest`.
    pub fn write(&self, dest: &Path, folder: &VirtualFolder) -> WriteResult {
        let start = Instant::now();
        let WriteOptions {
            action, execute, ..
        } = self.options;

        tracing::info!(
            dest = %dest.display(),
            root = folder.name(),
            %action,
            execute,
            "writing folder hierarchy"
        );

        let mut run = WriteRun {
            progress: WriteProgress::new(action, execute, folder.stats().items as usize),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            folders_removed: Vec::new(),
        };
        self.write_folder(dest, folder, &mut run);

        let result = WriteResult {
            action,
            executed: execute,
            succeeded: run.succeeded,
            failed: run.failed,
            skipped: run.skipped,
            bytes_processed: run.progress.bytes_processed,
            folders_removed: run.folders_removed,
            failures: run.progress.errors,
        };

        tracing::info!(
            dest = %dest.display(),
            %action,
            execute,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "{}",
            result.summary()
        );
        result
    }

    /// Returns whether a delete pass leaves `dir` empty.
    fn write_folder(&self, dir: &Path, folder: &VirtualFolder, run: &mut WriteRun) -> bool {
        if self.options.action.creates_folders() {
            if let Err(err) = self.ensure_dir(dir) {
                tracing::warn!(path = %dir.display(), error = %err, "cannot create directory, skipping subtree");
                run.fail(OperationError::from_tree_error(dir.to_path_buf(), &err));
                return false;
            }
        }

        let deleting = self.options.action == WriteAction::Delete;
        // Entries of `dir` this pass removes, or would remove in a dry run.
        let mut removed: HashSet<OsString> = HashSet::new();

        for item in folder.items() {
            if self.write_item(dir, item, run) && deleting {
                removed.insert(item.name().into());
            }
        }

        for sub in folder.folders() {
            let sub_dir = dir.join(sub.name());
            let emptied = self.write_folder(&sub_dir, sub, run);
            if emptied && self.remove_empty_dir(&sub_dir, run) {
                removed.insert(sub.name().into());
            }
        }

        deleting && only_removed_entries(dir, &removed)
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), TreeError> {
        tracing::debug!(path = %dir.display(), execute = self.options.execute, "ensuring directory");
        if self.options.execute {
            fs::create_dir_all(dir).map_err(|e| TreeError::io(dir, e))?;
        } else if dir.exists() && !dir.is_dir() {
            // Would fail for real; report it the same way.
            return Err(TreeError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Remove a directory the delete pass has emptied.
    fn remove_empty_dir(&self, dir: &Path, run: &mut WriteRun) -> bool {
        tracing::debug!(path = %dir.display(), execute = self.options.execute, "removing empty directory");
        if self.options.execute {
            if let Err(e) = fs::remove_dir(dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove empty directory");
                return false;
            }
        }
        run.folders_removed.push(dir.to_path_buf());
        true
    }

    /// Returns whether the action was applied to the item.
    fn write_item(&self, dir: &Path, item: &VirtualItem, run: &mut WriteRun) -> bool {
        let dest = dir.join(item.name());
        let action = self.options.action;
        tracing::debug!(
            path = %dest.display(),
            %action,
            execute = self.options.execute,
            "materializing item"
        );

        run.progress.set_current_file(Some(dest.clone()));
        let applied = match self.apply(dir, &dest, item) {
            Ok(Outcome::Done(bytes)) => {
                run.succeeded += 1;
                run.progress.complete_item(bytes);
                true
            }
            Ok(Outcome::Skipped(reason)) => {
                tracing::debug!(path = %dest.display(), %action, reason, "item skipped");
                run.skipped += 1;
                run.progress.complete_item(0);
                false
            }
            Err(err) => {
                tracing::warn!(path = %dest.display(), %action, error = %err, "item failed");
                run.fail(OperationError::from_tree_error(dest, &err));
                run.progress.complete_item(0);
                false
            }
        };
        self.report(&run.progress);
        applied
    }

    /// The single dispatch point for write actions.
    fn apply(&self, dir: &Path, dest: &Path, item: &VirtualItem) -> Result<Outcome, TreeError> {
        let execute = self.options.execute;
        match self.options.action {
            WriteAction::NoAction => Ok(Outcome::Done(0)),

            WriteAction::Write => {
                let data = item.load_contents()?;
                let Some(target) = self.options.on_conflict.resolve(dest) else {
                    return Ok(Outcome::Skipped("destination exists"));
                };
                if execute {
                    fs::write(&target, &data).map_err(|e| TreeError::io(&target, e))?;
                }
                Ok(Outcome::Done(data.len() as u64))
            }

            WriteAction::Copy => {
                let source = required_source(item)?;
                let size = source_size(source)?;
                if is_same_file(source, dest) {
                    return Ok(Outcome::Skipped("already in place"));
                }
                let Some(target) = self.options.on_conflict.resolve(dest) else {
                    return Ok(Outcome::Skipped("destination exists"));
                };
                if execute {
                    fs::copy(source, &target).map_err(|e| TreeError::io(&target, e))?;
                }
                Ok(Outcome::Done(size))
            }

            WriteAction::Move => {
                let source = required_source(item)?;
                let size = source_size(source)?;
                if is_same_file(source, dest) {
                    return Ok(Outcome::Skipped("already in place"));
                }
                let Some(target) = self.options.on_conflict.resolve(dest) else {
                    return Ok(Outcome::Skipped("destination exists"));
                };
                if execute {
                    move_file(source, &target)?;
                }
                Ok(Outcome::Done(size))
            }

            WriteAction::Delete => match fs::symlink_metadata(dest) {
                Ok(meta) if meta.is_dir() => Err(TreeError::invalid(format!(
                    "Refusing to delete directory {}",
                    dest.display()
                ))),
                Ok(meta) => {
                    if execute {
                        fs::remove_file(dest).map_err(|e| TreeError::io(dest, e))?;
                    }
                    Ok(Outcome::Done(meta.len()))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(Outcome::Skipped("nothing to delete"))
                }
                Err(e) => Err(TreeError::io(dest, e)),
            },

            WriteAction::Clear => {
                if execute {
                    fs::File::create(dest).map_err(|e| TreeError::io(dest, e))?;
                }
                Ok(Outcome::Done(0))
            }

            WriteAction::Rename => {
                let source = required_source(item)?;
                let file_name = source.file_name().ok_or_else(|| {
                    TreeError::invalid(format!("Source path {} has no file name", source.display()))
                })?;
                let from = dir.join(file_name);
                if from == dest {
                    return Ok(Outcome::Skipped("name unchanged"));
                }
                fs::symlink_metadata(&from).map_err(|e| TreeError::io(&from, e))?;
                if dest.exists() {
                    return Err(TreeError::io(
                        dest,
                        std::io::Error::new(
                            std::io::ErrorKind::AlreadyExists,
                            "rename target already exists",
                        ),
                    ));
                }
                if execute {
                    fs::rename(&from, dest).map_err(|e| TreeError::io(&from, e))?;
                }
                Ok(Outcome::Done(0))
            }

            WriteAction::Touch => {
                if execute {
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(dest)
                        .map_err(|e| TreeError::io(dest, e))?;
                    file.set_modified(SystemTime::now())
                        .map_err(|e| TreeError::io(dest, e))?;
                }
                Ok(Outcome::Done(0))
            }
        }
    }

    fn report(&self, progress: &WriteProgress) {
        if let Some(tx) = &self.progress_tx {
            // Progress is best effort; a slow consumer only misses updates.
            let _ = tx.try_send(WriteEvent::Progress(progress.clone()));
        }
    }
}

/// Counters for one write pass.
struct WriteRun {
    progress: WriteProgress,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    folders_removed: Vec<PathBuf>,
}

impl WriteRun {
    fn fail(&mut self, error: OperationError) {
        self.failed += 1;
        self.progress.add_error(error);
    }
}

fn required_source(item: &VirtualItem) -> Result<&Path, TreeError> {
    item.source_path().ok_or_else(|| TreeError::MissingSource { name: item.name() })
}

fn source_size(source: &Path) -> Result<u64, TreeError> {
    let meta = fs::metadata(source).map_err(|e| TreeError::io(source, e))?;
    if meta.is_dir() {
        return Err(TreeError::invalid(format!(
            "Source {} is a directory",
            source.display()
        )));
    }
    Ok(meta.len())
}

/// Check whether two paths name the same existing file, however spelled.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Check whether every entry left in `dir` is one the pass removes.
fn only_removed_entries(dir: &Path, removed: &HashSet<OsString>) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.all(|entry| entry.is_ok_and(|e| removed.contains(&e.file_name()))),
        Err(_) => false,
    }
}

/// Move a file, falling back to copy and delete across filesystems.
fn move_file(source: &Path, dest: &Path) -> Result<(), TreeError> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest).map_err(|e| TreeError::io(dest, e))?;
    fs::remove_file(source).map_err(|e| TreeError::io(source, e))
}

/// Materialize `folder` at `dest_path` with `action`.
///
/// With `execute = false` the walk and its logging are identical but the
/// filesystem is left untouched.
pub fn write_folder_hierarchy(
    dest_path: impl AsRef<Path>,
    folder: &VirtualFolder,
    action: WriteAction,
    execute: bool,
) -> WriteResult {
    HierarchyWriter::new(WriteOptions::new(action).execute(execute)).write(dest_path.as_ref(), folder)
}

/// Paths of every item destination under `dest`, in write order.
pub fn planned_paths(dest: impl AsRef<Path>, folder: &VirtualFolder) -> Vec<PathBuf> {
    fn collect(dir: &Path, folder: &VirtualFolder, out: &mut Vec<PathBuf>) {
        out.extend(folder.items().iter().map(|i| dir.join(i.name())));
        for sub in folder.folders() {
            collect(&dir.join(sub.name()), sub, out);
        }
    }
    let mut out = Vec::new();
    collect(dest.as_ref(), folder, &mut out);
    out
}
