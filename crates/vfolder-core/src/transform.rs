//! Recursive structural transforms: pattern removal and extension renaming.
//!
//! Patterns use a single glob dialect, matched case-insensitively against the
//! whole name of a folder or item:
//!
//! - `*` matches any run of characters
//! - `?` matches exactly one character
//! - `[abc]` / `[!abc]` match one character from (or outside) a class
//!
//! A pattern without wildcards therefore matches one name exactly, ignoring
//! case. Substring matching is spelled `*part*`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::folder::VirtualFolder;
use crate::item::normalize_extension;

/// A compiled, case-insensitive name pattern.
#[derive(Debug, Clone)]
pub struct NamePattern {
    raw: String,
    matcher: GlobMatcher,
}

impl NamePattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> Result<Self, TreeError> {
        if pattern.is_empty() {
            return Err(TreeError::invalid("Pattern cannot be empty"));
        }

        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| TreeError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Check whether a name matches.
    pub fn is_match(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for NamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What [`VirtualFolder::remove_matches`] took out of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    /// Relative paths of pruned folders.
    pub folders_removed: Vec<PathBuf>,
    /// Relative paths of removed items (not counting items inside pruned folders).
    pub items_removed: Vec<PathBuf>,
}

impl RemovalReport {
    /// Total number of removed nodes.
    pub fn total(&self) -> usize {
        self.folders_removed.len() + self.items_removed.len()
    }

    /// Check whether nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn merge(&mut self, other: RemovalReport) {
        self.folders_removed.extend(other.folders_removed);
        self.items_removed.extend(other.items_removed);
    }
}

impl VirtualFolder {
    /// Remove every folder and/or item below this one whose name matches `pattern`.
    ///
    /// A matching folder is dropped with its whole subtree; its contents are
    /// never visited. This folder itself is never removed.
    pub fn remove_matches(
        &mut self,
        pattern: &str,
        match_folders: bool,
        match_items: bool,
    ) -> Result<RemovalReport, TreeError> {
        let pattern = NamePattern::new(pattern)?;
        Ok(self.remove_matching(&pattern, match_folders, match_items))
    }

    /// [`VirtualFolder::remove_matches`] with a precompiled pattern.
    pub fn remove_matching(
        &mut self,
        pattern: &NamePattern,
        match_folders: bool,
        match_items: bool,
    ) -> RemovalReport {
        let mut report = RemovalReport::default();
        if match_folders || match_items {
            self.prune(pattern, match_folders, match_items, Path::new(""), &mut report);
        }
        tracing::info!(
            folder = %self.name,
            %pattern,
            folders = report.folders_removed.len(),
            items = report.items_removed.len(),
            "removed matching nodes"
        );
        report
    }

    fn prune(
        &mut self,
        pattern: &NamePattern,
        match_folders: bool,
        match_items: bool,
        rel: &Path,
        report: &mut RemovalReport,
    ) {
        if match_items {
            self.items.retain(|item| {
                let name = item.name();
                if pattern.is_match(&name) {
                    let path = rel.join(&name);
                    tracing::debug!(path = %path.display(), %pattern, "removing item");
                    report.items_removed.push(path);
                    false
                } else {
                    true
                }
            });
        }

        if match_folders {
            self.folders.retain(|folder| {
                if pattern.is_match(&folder.name) {
                    let path = rel.join(folder.name.as_str());
                    tracing::debug!(path = %path.display(), %pattern, "pruning folder");
                    report.folders_removed.push(path);
                    false
                } else {
                    true
                }
            });
        }

        for folder in &mut self.folders {
            let child_rel = rel.join(folder.name.as_str());
            folder.prune(pattern, match_folders, match_items, &child_rel, report);
        }
    }

    /// Change the extension of every item whose extension equals `old_ext`
    /// (ignoring case) to `new_ext`. Folder names are never touched.
    ///
    /// Leading dots on either extension are ignored. Fails with
    /// `DuplicateChild`, before changing anything, if a rename would make two
    /// siblings collide.
    pub fn change_item_exts(
        &mut self,
        old_ext: &str,
        new_ext: &str,
        recursive: bool,
    ) -> Result<usize, TreeError> {
        let old_ext = normalize_extension(old_ext)?;
        let new_ext = normalize_extension(new_ext)?;

        self.check_ext_collisions(&old_ext, &new_ext, recursive)?;
        let changed = self.rename_exts(&old_ext, &new_ext, recursive);

        tracing::info!(
            folder = %self.name,
            from = %old_ext,
            to = %new_ext,
            recursive,
            changed,
            "changed item extensions"
        );
        Ok(changed)
    }

    fn check_ext_collisions(
        &self,
        old_ext: &str,
        new_ext: &CompactString,
        recursive: bool,
    ) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            let ext = if item.extension_matches(old_ext) {
                new_ext
            } else {
                &item.extension
            };
            if !seen.insert((item.base_name.as_str(), ext.as_str())) {
                let name = if ext.is_empty() {
                    item.base_name.to_string()
                } else {
                    format!("{}.{}", item.base_name, ext)
                };
                return Err(TreeError::duplicate(self.name.as_str(), name));
            }
        }

        if recursive {
            for folder in &self.folders {
                folder.check_ext_collisions(old_ext, new_ext, recursive)?;
            }
        }
        Ok(())
    }

    fn rename_exts(&mut self, old_ext: &str, new_ext: &CompactString, recursive: bool) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            if item.extension_matches(old_ext) {
                tracing::debug!(item = %item.name(), to = %new_ext, "changing extension");
                item.extension = new_ext.clone();
                changed += 1;
            }
        }

        if recursive {
            for folder in &mut self.folders {
                changed += folder.rename_exts(old_ext, new_ext, recursive);
            }
        }
        changed
    }
}

/// An extension rename step of a [`crate::TransformPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtRename {
    /// Extension to match (case-insensitive).
    pub from: String,
    /// Replacement extension.
    pub to: String,
}

impl ExtRename {
    /// Create a rename step.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// What a full transform pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSummary {
    /// Nodes removed by the exclusion patterns.
    pub removed: RemovalReport,
    /// Items whose extension changed.
    pub extensions_changed: usize,
}

pub(crate) fn apply_plan(
    folder: &mut VirtualFolder,
    exclude_folders: &[String],
    exclude_items: &[String],
    ext_renames: &[ExtRename],
    recursive: bool,
) -> Result<TransformSummary, TreeError> {
    // Compile everything first so a bad pattern leaves the tree untouched.
    let folder_patterns = exclude_folders
        .iter()
        .map(|p| NamePattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;
    let item_patterns = exclude_items
        .iter()
        .map(|p| NamePattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = TransformSummary::default();
    for pattern in &folder_patterns {
        summary.removed.merge(folder.remove_matching(pattern, true, false));
    }
    for pattern in &item_patterns {
        summary.removed.merge(folder.remove_matching(pattern, false, true));
    }
    for rename in ext_renames {
        summary.extensions_changed += folder.change_item_exts(&rename.from, &rename.to, recursive)?;
    }
    Ok(summary)
}
