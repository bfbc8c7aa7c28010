//! Core types for vfolder.
//!
//! This crate provides the in-memory virtual folder model used throughout the
//! vfolder ecosystem: items and folders with identity, recursive transforms,
//! order-insensitive structural comparison and diagnostic rendering.
//!
//! # Example
//!
//! ```rust
//! use vfolder_core::{VirtualFolder, VirtualItem};
//!
//! let mut root = VirtualFolder::new("root").unwrap();
//! root.add_item(VirtualItem::new("a", "ps1", Some(b"Write-Host".to_vec())).unwrap()).unwrap();
//! root.add_item(VirtualItem::new("a", "tmp", None).unwrap()).unwrap();
//!
//! let mut export = root.clone();
//! export.remove_matches("*.tmp", false, true).unwrap();
//! export.change_item_exts("ps1", "txt", true).unwrap();
//!
//! assert!(export.item("a.txt").is_some());
//! assert!(!export.equals(&root));
//! ```

mod compare;
mod config;
mod error;
mod folder;
mod item;
mod node;
mod render;
mod transform;

pub use compare::{DiffOptions, Mismatch, TreeDiff, compare_sorted_collections, diff_folders};
pub use config::{ReadConfig, ReadConfigBuilder, TransformPlan, TransformPlanBuilder};
pub use error::{TreeError, validate_name};
pub use folder::{CloneDepth, FolderStats, VirtualFolder};
pub use item::VirtualItem;
pub use node::{ContentHash, NodeId};
pub use render::render_side_by_side;
pub use transform::{ExtRename, NamePattern, RemovalReport, TransformSummary};
