//! Folder nodes and tree structure.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, validate_name};
use crate::item::VirtualItem;
use crate::node::NodeId;

/// How much of a folder to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneDepth {
    /// Name only, no children.
    Shallow,
    /// The whole subtree.
    Recursive,
}

/// Summary counts for a virtual tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStats {
    /// Total number of items in the subtree.
    pub items: u64,
    /// Total number of folders below the root.
    pub folders: u64,
    /// Deepest folder level (root is 0).
    pub max_depth: u32,
    /// Bytes held in memory by loaded items.
    pub loaded_bytes: u64,
    /// Items whose content would be read from disk.
    pub lazy_items: u64,
}

/// A named container of items and subfolders.
///
/// A folder owns its children outright. The `parent` field holds only the
/// parent's [`NodeId`] and is used to rebuild paths, never to reach children.
#[derive(Debug, Serialize)]
pub struct VirtualFolder {
    #[serde(skip)]
    pub(crate) id: NodeId,

    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,

    /// Directory leaf name.
    pub(crate) name: CompactString,

    /// Child items, in insertion order.
    pub(crate) items: Vec<VirtualItem>,

    /// Child folders, in insertion order.
    pub(crate) folders: Vec<VirtualFolder>,
}

impl VirtualFolder {
    /// Create an empty folder.
    pub fn new(name: impl Into<CompactString>) -> Result<Self, TreeError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            id: NodeId::next(),
            parent: None,
            name,
            items: Vec::new(),
            folders: Vec::new(),
        })
    }

    /// Record a parent link for a folder that is built before being attached.
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Get the node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the parent's id.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Get the folder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child items in insertion order.
    pub fn items(&self) -> &[VirtualItem] {
        &self.items
    }

    /// Child folders in insertion order.
    pub fn folders(&self) -> &[VirtualFolder] {
        &self.folders
    }

    /// Check whether the folder has no children.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.folders.is_empty()
    }

    /// Find a direct child item by full name.
    pub fn item(&self, name: &str) -> Option<&VirtualItem> {
        self.items.iter().find(|i| i.name() == name)
    }

    /// Find a direct child item by full name, mutably.
    pub fn item_mut(&mut self, name: &str) -> Option<&mut VirtualItem> {
        self.items.iter_mut().find(|i| i.name() == name)
    }

    /// Find a direct subfolder by name.
    pub fn folder(&self, name: &str) -> Option<&VirtualFolder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Find a direct subfolder by name, mutably.
    pub fn folder_mut(&mut self, name: &str) -> Option<&mut VirtualFolder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    /// Append an item, taking ownership and linking it to this folder.
    pub fn add_item(&mut self, mut item: VirtualItem) -> Result<&mut VirtualItem, TreeError> {
        if self
            .items
            .iter()
            .any(|i| i.base_name == item.base_name && i.extension == item.extension)
        {
            return Err(TreeError::duplicate(self.name.as_str(), item.name()));
        }

        item.parent = Some(self.id);
        self.items.push(item);
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Append a subfolder, taking ownership and linking it to this folder.
    pub fn add_sub_folder(
        &mut self,
        mut folder: VirtualFolder,
    ) -> Result<&mut VirtualFolder, TreeError> {
        if self.folders.iter().any(|f| f.name == folder.name) {
            return Err(TreeError::duplicate(self.name.as_str(), folder.name.as_str()));
        }

        folder.parent = Some(self.id);
        self.folders.push(folder);
        let last = self.folders.len() - 1;
        Ok(&mut self.folders[last])
    }

    /// Detach and return a direct child item.
    pub fn remove_item(&mut self, name: &str) -> Option<VirtualItem> {
        let index = self.items.iter().position(|i| i.name() == name)?;
        let mut item = self.items.remove(index);
        item.parent = None;
        Some(item)
    }

    /// Detach and return a direct subfolder with its subtree.
    pub fn remove_folder(&mut self, name: &str) -> Option<VirtualFolder> {
        let index = self.folders.iter().position(|f| f.name == name)?;
        let mut folder = self.folders.remove(index);
        folder.parent = None;
        Some(folder)
    }

    /// Copy this folder into a new, unattached tree with fresh identities.
    pub fn duplicate(&self, depth: CloneDepth) -> VirtualFolder {
        let id = NodeId::next();
        let (items, folders) = match depth {
            CloneDepth::Shallow => (Vec::new(), Vec::new()),
            CloneDepth::Recursive => {
                let items = self
                    .items
                    .iter()
                    .map(|item| {
                        let mut copy = item.clone();
                        copy.parent = Some(id);
                        copy
                    })
                    .collect();
                let folders = self
                    .folders
                    .iter()
                    .map(|folder| {
                        let mut copy = folder.duplicate(CloneDepth::Recursive);
                        copy.parent = Some(id);
                        copy
                    })
                    .collect();
                (items, folders)
            }
        };

        VirtualFolder {
            id,
            parent: None,
            name: self.name.clone(),
            items,
            folders,
        }
    }

    /// Find a folder by id anywhere in this subtree (including self).
    pub fn find_folder(&self, id: NodeId) -> Option<&VirtualFolder> {
        if self.id == id {
            return Some(self);
        }
        self.folders.iter().find_map(|f| f.find_folder(id))
    }

    /// Find an item by id anywhere in this subtree.
    pub fn find_item(&self, id: NodeId) -> Option<&VirtualItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .or_else(|| self.folders.iter().find_map(|f| f.find_item(id)))
    }

    /// Rebuild the path of a node relative to this folder.
    ///
    /// Walks parent links upward from the node until this folder is reached.
    /// Returns `None` if the node is not in this subtree; the folder itself
    /// maps to an empty path.
    pub fn path_of(&self, id: NodeId) -> Option<PathBuf> {
        let (mut segments, mut parent) = if let Some(item) = self.find_item(id) {
            (vec![item.name()], item.parent)
        } else {
            let folder = self.find_folder(id)?;
            if folder.id == self.id {
                return Some(PathBuf::new());
            }
            (vec![folder.name.to_string()], folder.parent)
        };

        loop {
            let parent_id = parent?;
            if parent_id == self.id {
                break;
            }
            let folder = self.find_folder(parent_id)?;
            segments.push(folder.name.to_string());
            parent = folder.parent;
        }

        Some(segments.iter().rev().collect())
    }

    /// Compute summary counts for this subtree.
    pub fn stats(&self) -> FolderStats {
        let mut stats = FolderStats::default();
        self.accumulate_stats(0, &mut stats);
        stats
    }

    fn accumulate_stats(&self, depth: u32, stats: &mut FolderStats) {
        stats.max_depth = stats.max_depth.max(depth);
        for item in &self.items {
            stats.items += 1;
            match item.contents() {
                Some(data) => stats.loaded_bytes += data.len() as u64,
                None if item.source_path().is_some() => stats.lazy_items += 1,
                None => {}
            }
        }
        for folder in &self.folders {
            stats.folders += 1;
            folder.accumulate_stats(depth + 1, stats);
        }
    }
}

impl Clone for VirtualFolder {
    /// Recursive copy with fresh identities.
    fn clone(&self) -> Self {
        self.duplicate(CloneDepth::Recursive)
    }
}
