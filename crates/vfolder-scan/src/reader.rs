//! Builds virtual trees from real directories with jwalk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};

use vfolder_core::{NamePattern, ReadConfig, TreeError, VirtualFolder, VirtualItem};

/// Reads a real directory tree into a [`VirtualFolder`].
///
/// The walk is serial and depth-first. Any directory that cannot be
/// enumerated aborts the read, so a returned tree is always complete.
#[derive(Debug, Default)]
pub struct HierarchyReader;

impl HierarchyReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the directory named by `config.root`.
    pub fn read(&self, config: &ReadConfig) -> Result<VirtualFolder, TreeError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| TreeError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(TreeError::NotADirectory { path: root_path });
        }

        let root_name = root_path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .ok_or_else(|| {
                TreeError::invalid(format!(
                    "Cannot name the root folder of {}",
                    root_path.display()
                ))
            })?;

        let ignores = config.compiled_ignores()?;
        let mut entries = self.collect_entries(config, &root_path, ignores)?;
        let root = self.build_folder(&root_path, root_name, &mut entries, config.read_contents)?;

        let stats = root.stats();
        tracing::info!(
            path = %root_path.display(),
            items = stats.items,
            folders = stats.folders,
            read_contents = config.read_contents,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "read folder hierarchy"
        );
        Ok(root)
    }

    /// Walk the directory and group entries by parent path.
    fn collect_entries(
        &self,
        config: &ReadConfig,
        root_path: &Path,
        ignores: Vec<NamePattern>,
    ) -> Result<HashMap<PathBuf, Vec<EntryInfo>>, TreeError> {
        let walker = WalkDir::new(root_path)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                // Dropping ignored entries here keeps the walker out of them.
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name().to_string_lossy();
                        !ignores.iter().any(|p| p.is_match(&name))
                    }
                    Err(_) => true,
                });
            });

        let mut entries_by_parent: HashMap<PathBuf, Vec<EntryInfo>> = HashMap::new();

        for entry_result in walker {
            let entry = entry_result.map_err(|err| walk_error(&err, root_path))?;
            let path = entry.path();

            if let Some(err) = &entry.read_children_error {
                return Err(walk_error(err, &path));
            }

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            let name = entry.file_name().to_string_lossy().to_string();

            let kind = if file_type.is_dir() {
                EntryKind::Folder
            } else if file_type.is_file() {
                EntryKind::Item
            } else if file_type.is_symlink() {
                // Unfollowed links: keep links to files, their content reads through.
                if path.is_file() {
                    EntryKind::Item
                } else {
                    tracing::warn!(path = %path.display(), "skipping symlink that does not point to a file");
                    continue;
                }
            } else {
                tracing::debug!(path = %path.display(), "skipping special file");
                continue;
            };

            if let Some(parent) = path.parent() {
                entries_by_parent
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(EntryInfo {
                        name,
                        path: path.clone(),
                        kind,
                    });
            }
        }

        Ok(entries_by_parent)
    }

    /// Recursively build a folder and its children.
    fn build_folder(
        &self,
        path: &Path,
        name: CompactString,
        entries_by_parent: &mut HashMap<PathBuf, Vec<EntryInfo>>,
        read_contents: bool,
    ) -> Result<VirtualFolder, TreeError> {
        let mut folder = VirtualFolder::new(name)?;
        let children = entries_by_parent.remove(path).unwrap_or_default();

        for entry in children {
            match entry.kind {
                EntryKind::Folder => {
                    let child = self.build_folder(
                        &entry.path,
                        CompactString::new(&entry.name),
                        entries_by_parent,
                        read_contents,
                    )?;
                    folder.add_sub_folder(child)?;
                }
                EntryKind::Item => {
                    let contents = if read_contents {
                        Some(std::fs::read(&entry.path).map_err(|e| TreeError::io(&entry.path, e))?)
                    } else {
                        None
                    };
                    let item = VirtualItem::from_file_name(&entry.name, contents)?
                        .with_source(&entry.path);
                    folder.add_item(item)?;
                }
            }
        }

        Ok(folder)
    }
}

/// Read `path` into a virtual tree with default settings.
///
/// With `read_contents`, file bytes are loaded now; otherwise each item keeps
/// its source path and is read when its content is first needed.
pub fn read_folder_hierarchy(
    path: impl AsRef<Path>,
    read_contents: bool,
) -> Result<VirtualFolder, TreeError> {
    let mut config = ReadConfig::new(path.as_ref());
    config.read_contents = read_contents;
    HierarchyReader::new().read(&config)
}

/// Temporary struct for collecting entry information.
struct EntryInfo {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

enum EntryKind {
    Folder,
    Item,
}

/// Convert a walk error, falling back to `path` when jwalk has none.
fn walk_error(err: &jwalk::Error, path: &Path) -> TreeError {
    let path = err.path().unwrap_or(path);
    match err.io_error() {
        Some(io) => io_error_at(path, io),
        None => TreeError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(err.to_string()),
        },
    }
}

/// Classify a borrowed I/O error; jwalk keeps ownership of the original.
fn io_error_at(path: &Path, io: &std::io::Error) -> TreeError {
    TreeError::io(path, std::io::Error::new(io.kind(), io.to_string()))
}
