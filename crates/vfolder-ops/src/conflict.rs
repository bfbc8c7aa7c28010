//! Handling of destination files that already exist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What to do when an item's destination file already exists.
///
/// Only consulted by actions that produce a new file from item data
/// (`Write`, `Copy`, `Move`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Leave the existing file alone and count the item as skipped.
    Skip,
    /// Write next to it as "name (1).ext", "name (2).ext", ...
    AutoRename,
}

impl ConflictPolicy {
    /// Pick the path to write `dest` to, or `None` to skip the item.
    pub fn resolve(&self, dest: &Path) -> Option<PathBuf> {
        if !dest.exists() {
            return Some(dest.to_path_buf());
        }
        match self {
            Self::Overwrite => Some(dest.to_path_buf()),
            Self::Skip => None,
            Self::AutoRename => Some(auto_rename_path(dest)),
        }
    }
}

/// Generate a sibling path that does not exist yet.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let candidate = |suffix: &str| match &extension {
        Some(ext) => parent.join(format!("{stem} {suffix}.{ext}")),
        None => parent.join(format!("{stem} {suffix}")),
    };

    for i in 1..1000 {
        let new_path = candidate(&format!("({i})"));
        if !new_path.exists() {
            return new_path;
        }
    }

    // Fallback: use timestamp
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    candidate(&format!("({timestamp})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::str::FromStr;
    use tempfile::TempDir;

    #[test]
    fn test_auto_rename_path() {
        let path = PathBuf::from("/tmp/vfolder-missing-dir/test.txt");
        let renamed = auto_rename_path(&path);
        assert!(renamed.ends_with("test (1).txt"));
    }

    #[test]
    fn test_auto_rename_no_extension() {
        let path = PathBuf::from("/tmp/vfolder-missing-dir/testfile");
        let renamed = auto_rename_path(&path);
        assert!(renamed.ends_with("testfile (1)"));
    }

    #[test]
    fn test_auto_rename_skips_taken_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        fs::write(temp.path().join("a (1).txt"), "").unwrap();

        let renamed = auto_rename_path(&temp.path().join("a.txt"));
        assert_eq!(renamed, temp.path().join("a (2).txt"));
    }

    #[test]
    fn test_resolve() {
        let temp = TempDir::new().unwrap();
        let free = temp.path().join("free.txt");
        let taken = temp.path().join("taken.txt");
        fs::write(&taken, "x").unwrap();

        for policy in [ConflictPolicy::Overwrite, ConflictPolicy::Skip, ConflictPolicy::AutoRename] {
            assert_eq!(policy.resolve(&free), Some(free.clone()));
        }
        assert_eq!(ConflictPolicy::Overwrite.resolve(&taken), Some(taken.clone()));
        assert_eq!(ConflictPolicy::Skip.resolve(&taken), None);
        assert_eq!(
            ConflictPolicy::AutoRename.resolve(&taken),
            Some(temp.path().join("taken (1).txt"))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(ConflictPolicy::from_str("auto_rename").unwrap(), ConflictPolicy::AutoRename);
        assert_eq!(ConflictPolicy::from_str("SKIP").unwrap(), ConflictPolicy::Skip);
        assert_eq!(ConflictPolicy::default().to_string(), "overwrite");
    }
}
