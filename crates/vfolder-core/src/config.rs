//! Reader and transform configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::folder::VirtualFolder;
use crate::transform::{ExtRename, NamePattern, TransformSummary, apply_plan};

/// Configuration for reading a real directory into a virtual tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ReadConfig {
    /// Root directory to read.
    pub root: PathBuf,

    /// Load file bytes eagerly instead of reading them on demand.
    #[builder(default = "false")]
    #[serde(default)]
    pub read_contents: bool,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to read (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Names to leave out of the tree (case-insensitive globs).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ReadConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if let Some(ref patterns) = self.ignore_patterns {
            for pattern in patterns {
                NamePattern::new(pattern).map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }
}

impl ReadConfig {
    /// Create a new read config builder.
    pub fn builder() -> ReadConfigBuilder {
        ReadConfigBuilder::default()
    }

    /// Create a simple config for reading a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_contents: false,
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            ignore_patterns: Vec::new(),
        }
    }

    /// Compile the ignore patterns.
    pub fn compiled_ignores(&self) -> Result<Vec<NamePattern>, TreeError> {
        self.ignore_patterns
            .iter()
            .map(|p| NamePattern::new(p))
            .collect()
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

/// An ordered set of transforms that turns a read tree into an export tree.
///
/// Applied in a fixed order: folder exclusions, item exclusions, then
/// extension renames.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct TransformPlan {
    /// Folder name patterns to prune.
    #[serde(default)]
    pub exclude_folders: Vec<String>,

    /// Item name patterns to remove.
    #[serde(default)]
    pub exclude_items: Vec<String>,

    /// Extension renames, applied in order.
    #[serde(default)]
    pub ext_renames: Vec<ExtRename>,

    /// Apply renames to subfolders as well.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl Default for TransformPlan {
    fn default() -> Self {
        Self {
            exclude_folders: Vec::new(),
            exclude_items: Vec::new(),
            ext_renames: Vec::new(),
            recursive: true,
        }
    }
}

impl TransformPlan {
    /// Create a new plan builder.
    pub fn builder() -> TransformPlanBuilder {
        TransformPlanBuilder::default()
    }

    /// Check whether the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.exclude_folders.is_empty() && self.exclude_items.is_empty() && self.ext_renames.is_empty()
    }

    /// Apply the plan to a tree in place.
    ///
    /// All patterns are compiled before the tree is touched.
    pub fn apply(&self, folder: &mut VirtualFolder) -> Result<TransformSummary, TreeError> {
        apply_plan(
            folder,
            &self.exclude_folders,
            &self.exclude_items,
            &self.ext_renames,
            self.recursive,
        )
    }
}
