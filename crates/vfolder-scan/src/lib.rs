//! Directory reading for vfolder.
//!
//! This crate turns a real directory into a [`VirtualFolder`] tree using
//! jwalk for traversal.
//!
//! # Overview
//!
//! - **Complete or nothing**: an unreadable directory aborts the read
//! - **Lazy or eager content**: items always record their source path and
//!   optionally load their bytes up front
//! - **Configurable** depth limits, hidden-file handling and ignore patterns
//!
//! # Example
//!
//! ```rust,no_run
//! use vfolder_scan::{HierarchyReader, ReadConfig};
//!
//! let config = ReadConfig::builder()
//!     .root("/path/to/project")
//!     .ignore_patterns(vec!["target".to_string(), "*.tmp".to_string()])
//!     .build()
//!     .unwrap();
//!
//! let tree = HierarchyReader::new().read(&config).unwrap();
//! println!("{}", tree.print_folder(false, 0, None));
//! ```

mod reader;

pub use reader::{HierarchyReader, read_folder_hierarchy};

// Re-export core types for convenience
pub use vfolder_core::{ReadConfig, ReadConfigBuilder, TreeError, VirtualFolder, VirtualItem};
