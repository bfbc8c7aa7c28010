//! Order-insensitive structural comparison of virtual trees.
//!
//! Both sides of every child collection are sorted by a stable key and then
//! compared pairwise, recursively. Equality short-circuits on the first count
//! mismatch; [`diff_folders`] walks everything and reports each divergence.

use std::path::{Path, PathBuf};

use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};

use crate::folder::VirtualFolder;
use crate::item::VirtualItem;
use crate::node::ContentHash;

/// Compare two collections as multisets.
///
/// Both sides are sorted by `key`, then compared pairwise with `eq`. Returns
/// `false` immediately when the lengths differ. Two elements of one side with
/// the same key are a caller error and give an unspecified result.
pub fn compare_sorted_collections<T, K, F, E>(left: &[T], right: &[T], key: F, mut eq: E) -> bool
where
    K: Ord,
    F: Fn(&T) -> K,
    E: FnMut(&T, &T) -> bool,
{
    if left.len() != right.len() {
        return false;
    }

    let left = sorted_refs(left, &key);
    let right = sorted_refs(right, &key);
    left.iter().zip(right.iter()).all(|(l, r)| eq(l, r))
}

fn sorted_refs<'a, T, K: Ord>(items: &'a [T], key: &impl Fn(&T) -> K) -> Vec<&'a T> {
    let mut refs: Vec<&T> = items.iter().collect();
    refs.sort_by_cached_key(|t| key(t));
    refs
}

impl VirtualFolder {
    /// Deep structural equality, contents included.
    pub fn equals(&self, other: &VirtualFolder) -> bool {
        self.equals_with(other, true)
    }

    /// Deep structural equality; `compare_contents = false` compares shape only.
    pub fn equals_with(&self, other: &VirtualFolder, compare_contents: bool) -> bool {
        if self.name != other.name {
            tracing::debug!(expected = %self.name, actual = %other.name, "folder names differ");
            return false;
        }

        let items_match = compare_sorted_collections(
            &self.items,
            &other.items,
            VirtualItem::sort_key,
            |a, b| a.equals(b, compare_contents),
        );
        if !items_match {
            tracing::debug!(folder = %self.name, "folder items differ");
            return false;
        }

        let folders_match = compare_sorted_collections(
            &self.folders,
            &other.folders,
            |f| f.name.clone(),
            |a, b| a.equals_with(b, compare_contents),
        );
        if !folders_match {
            tracing::debug!(folder = %self.name, "subfolders differ");
        }
        folders_match
    }
}

/// Options for [`diff_folders`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Compare item content byte-for-byte.
    pub compare_contents: bool,
    /// Stop after this many mismatches (0 = report all).
    pub max_mismatches: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            compare_contents: true,
            max_mismatches: 0,
        }
    }
}

/// A single divergence between an expected and an actual tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mismatch {
    /// The two roots carry different names.
    RootName { expected: String, actual: String },
    /// A folder in the expected tree is absent from the actual tree.
    MissingFolder { path: PathBuf },
    /// A folder in the actual tree is absent from the expected tree.
    UnexpectedFolder { path: PathBuf },
    /// An item in the expected tree is absent from the actual tree.
    MissingItem { path: PathBuf },
    /// An item in the actual tree is absent from the expected tree.
    UnexpectedItem { path: PathBuf },
    /// Both trees hold the item but the bytes differ.
    ContentDiffers {
        path: PathBuf,
        expected: ContentHash,
        actual: ContentHash,
    },
    /// Content of one side could not be loaded.
    Unreadable { path: PathBuf, message: String },
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootName { expected, actual } => {
                write!(f, "root name differs: expected '{expected}', found '{actual}'")
            }
            Self::MissingFolder { path } => write!(f, "missing folder: {}", path.display()),
            Self::UnexpectedFolder { path } => write!(f, "unexpected folder: {}", path.display()),
            Self::MissingItem { path } => write!(f, "missing item: {}", path.display()),
            Self::UnexpectedItem { path } => write!(f, "unexpected item: {}", path.display()),
            Self::ContentDiffers {
                path,
                expected,
                actual,
            } => write!(
                f,
                "content differs: {} (expected {}, found {})",
                path.display(),
                expected.short_hex(),
                actual.short_hex()
            ),
            Self::Unreadable { path, message } => {
                write!(f, "unreadable: {}: {message}", path.display())
            }
        }
    }
}

/// Every mismatch found between two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDiff {
    /// Mismatches in traversal order (items before subfolders, sorted by name).
    pub mismatches: Vec<Mismatch>,
    /// Whether the walk stopped early because of `max_mismatches`.
    pub truncated: bool,
}

impl TreeDiff {
    /// Check whether the trees are structurally equal.
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Number of mismatches.
    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    /// Check whether there are no mismatches.
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// One mismatch per line.
    pub fn summary(&self) -> String {
        if self.is_match() {
            return "trees match".to_string();
        }
        let mut out = self
            .mismatches
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        if self.truncated {
            out.push_str("\n...");
        }
        out
    }

    fn push(&mut self, mismatch: Mismatch, options: &DiffOptions) -> bool {
        tracing::debug!(%mismatch, "tree mismatch");
        self.mismatches.push(mismatch);
        if options.max_mismatches > 0 && self.mismatches.len() >= options.max_mismatches {
            self.truncated = true;
        }
        !self.truncated
    }
}

/// Walk two trees and collect every structural divergence.
pub fn diff_folders(expected: &VirtualFolder, actual: &VirtualFolder, options: DiffOptions) -> TreeDiff {
    let mut diff = TreeDiff::default();
    if expected.name != actual.name {
        let keep_going = diff.push(
            Mismatch::RootName {
                expected: expected.name.to_string(),
                actual: actual.name.to_string(),
            },
            &options,
        );
        if !keep_going {
            return diff;
        }
    }
    diff_children(expected, actual, Path::new(""), &options, &mut diff);
    diff
}

/// Returns `false` once the mismatch limit is hit.
fn diff_children(
    expected: &VirtualFolder,
    actual: &VirtualFolder,
    rel: &Path,
    options: &DiffOptions,
    diff: &mut TreeDiff,
) -> bool {
    let expected_items = sorted_refs(&expected.items, &VirtualItem::sort_key);
    let actual_items = sorted_refs(&actual.items, &VirtualItem::sort_key);

    for pair in expected_items
        .into_iter()
        .merge_join_by(actual_items, |a, b| a.sort_key().cmp(&b.sort_key()))
    {
        let mismatch = match pair {
            EitherOrBoth::Left(item) => Some(Mismatch::MissingItem {
                path: rel.join(item.name()),
            }),
            EitherOrBoth::Right(item) => Some(Mismatch::UnexpectedItem {
                path: rel.join(item.name()),
            }),
            EitherOrBoth::Both(e, a) if options.compare_contents => {
                content_mismatch(e, a, &rel.join(e.name()))
            }
            EitherOrBoth::Both(..) => None,
        };
        if let Some(mismatch) = mismatch {
            if !diff.push(mismatch, options) {
                return false;
            }
        }
    }

    let folder_key = |f: &VirtualFolder| f.name.clone();
    let expected_folders = sorted_refs(&expected.folders, &folder_key);
    let actual_folders = sorted_refs(&actual.folders, &folder_key);

    for pair in expected_folders
        .into_iter()
        .merge_join_by(actual_folders, |a, b| a.name.cmp(&b.name))
    {
        let keep_going = match pair {
            EitherOrBoth::Left(folder) => diff.push(
                Mismatch::MissingFolder {
                    path: rel.join(folder.name.as_str()),
                },
                options,
            ),
            EitherOrBoth::Right(folder) => diff.push(
                Mismatch::UnexpectedFolder {
                    path: rel.join(folder.name.as_str()),
                },
                options,
            ),
            EitherOrBoth::Both(e, a) => {
                diff_children(e, a, &rel.join(e.name.as_str()), options, diff)
            }
        };
        if !keep_going {
            return false;
        }
    }
    true
}

fn content_mismatch(expected: &VirtualItem, actual: &VirtualItem, path: &Path) -> Option<Mismatch> {
    let loaded = expected
        .load_contents()
        .and_then(|e| actual.load_contents().map(|a| (e, a)));
    match loaded {
        Ok((e, a)) if e == a => None,
        Ok((e, a)) => Some(Mismatch::ContentDiffers {
            path: path.to_path_buf(),
            expected: ContentHash::of(&e),
            actual: ContentHash::of(&a),
        }),
        Err(err) => Some(Mismatch::Unreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, data: &str) -> VirtualItem {
        VirtualItem::from_file_name(name, Some(data.as_bytes().to_vec())).unwrap()
    }

    fn sample(order: &[&str]) -> VirtualFolder {
        let mut root = VirtualFolder::new("root").unwrap();
        for name in order {
            root.add_item(item(name, name)).unwrap();
        }
        let sub = root.add_sub_folder(VirtualFolder::new("sub").unwrap()).unwrap();
        sub.add_item(item("deep.txt", "deep")).unwrap();
        root
    }

    #[test]
    fn test_compare_sorted_collections() {
        let eq = |a: &i32, b: &i32| a == b;
        assert!(compare_sorted_collections(&[3, 1, 2], &[1, 2, 3], |x| *x, eq));
        assert!(!compare_sorted_collections(&[1, 2], &[1, 2, 3], |x| *x, eq));
        assert!(!compare_sorted_collections(&[1, 2, 4], &[1, 2, 3], |x| *x, eq));
        assert!(compare_sorted_collections::<i32, i32, _, _>(&[], &[], |x| *x, eq));
    }

    #[test]
    fn test_order_insensitive_equality() {
        let a = sample(&["a.txt", "b.txt", "c.ps1"]);
        let b = sample(&["c.ps1", "a.txt", "b.txt"]);
        assert!(a.equals(&b));
        assert!(diff_folders(&a, &b, DiffOptions::default()).is_match());
    }

    #[test]
    fn test_count_mismatch() {
        let a = sample(&["a.txt", "b.txt"]);
        let b = sample(&["a.txt"]);
        assert!(!a.equals(&b));

        let diff = diff_folders(&a, &b, DiffOptions::default());
        assert_eq!(
            diff.mismatches,
            vec![Mismatch::MissingItem {
                path: PathBuf::from("b.txt")
            }]
        );
    }

    #[test]
    fn test_content_and_shape_modes() {
        let a = sample(&["a.txt"]);
        let mut b = sample(&["a.txt"]);
        b.item_mut("a.txt").unwrap().set_contents(b"changed".to_vec());

        assert!(!a.equals(&b));
        assert!(a.equals_with(&b, false));

        let diff = diff_folders(&a, &b, DiffOptions::default());
        assert!(matches!(diff.mismatches[0], Mismatch::ContentDiffers { .. }));

        let shape_only = DiffOptions {
            compare_contents: false,
            ..Default::default()
        };
        assert!(diff_folders(&a, &b, shape_only).is_match());
    }

    #[test]
    fn test_nested_folder_differences() {
        let a = sample(&["a.txt"]);
        let mut b = sample(&["a.txt"]);
        b.remove_folder("sub");
        b.add_sub_folder(VirtualFolder::new("other").unwrap()).unwrap();

        assert!(!a.equals(&b));
        let diff = diff_folders(&a, &b, DiffOptions::default());
        assert_eq!(
            diff.mismatches,
            vec![
                Mismatch::UnexpectedFolder {
                    path: PathBuf::from("other")
                },
                Mismatch::MissingFolder {
                    path: PathBuf::from("sub")
                },
            ]
        );
    }

    #[test]
    fn test_deep_mismatch_path() {
        let a = sample(&[]);
        let mut b = sample(&[]);
        b.folder_mut("sub")
            .unwrap()
            .add_item(item("extra.tmp", ""))
            .unwrap();

        let diff = diff_folders(&a, &b, DiffOptions::default());
        assert_eq!(
            diff.mismatches,
            vec![Mismatch::UnexpectedItem {
                path: PathBuf::from("sub").join("extra.tmp")
            }]
        );
        assert!(diff.summary().contains("unexpected item"));
    }

    #[test]
    fn test_root_name_and_limit() {
        let a = sample(&["a.txt", "b.txt"]);
        let mut b = VirtualFolder::new("other").unwrap();
        b.add_item(item("z.txt", "")).unwrap();

        assert!(!a.equals(&b));
        let limited = DiffOptions {
            max_mismatches: 2,
            ..Default::default()
        };
        let diff = diff_folders(&a, &b, limited);
        assert_eq!(diff.len(), 2);
        assert!(diff.truncated);
        assert!(matches!(diff.mismatches[0], Mismatch::RootName { .. }));
    }
}
