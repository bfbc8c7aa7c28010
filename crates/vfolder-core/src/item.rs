//! Leaf nodes: a single virtual file.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::Serialize;

use crate::error::{TreeError, validate_name};
use crate::node::{ContentHash, NodeId};

/// A single file in a virtual tree.
///
/// Content is either held in memory or read on demand from `source_path`.
/// Lazy reads are not cached: every call to [`VirtualItem::load_contents`]
/// goes back to the filesystem.
#[derive(Debug, Serialize)]
pub struct VirtualItem {
    #[serde(skip)]
    pub(crate) id: NodeId,

    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,

    /// File name without extension.
    pub(crate) base_name: CompactString,

    /// Extension without the leading dot (may be empty).
    pub(crate) extension: CompactString,

    /// Loaded content, if any.
    #[serde(skip)]
    pub(crate) contents: Option<Vec<u8>>,

    /// Real file this item was read from.
    pub(crate) source_path: Option<PathBuf>,
}

impl VirtualItem {
    /// Create a new item.
    ///
    /// A leading dot on `extension` is stripped.
    pub fn new(
        base_name: impl Into<CompactString>,
        extension: impl Into<CompactString>,
        contents: Option<Vec<u8>>,
    ) -> Result<Self, TreeError> {
        let base_name = base_name.into();
        let extension = normalize_extension(&extension.into())?;

        validate_name(&base_name)?;

        Ok(Self {
            id: NodeId::next(),
            parent: None,
            base_name,
            extension,
            contents,
            source_path: None,
        })
    }

    /// Create an item by splitting a full file name into base name and extension.
    ///
    /// The split follows [`Path::file_stem`]/[`Path::extension`]: `archive.tar.gz`
    /// becomes `archive.tar` + `gz`, `.gitignore` has no extension. Without an
    /// extension the whole name is the base name, so `notes.` keeps its dot.
    pub fn from_file_name(file_name: &str, contents: Option<Vec<u8>>) -> Result<Self, TreeError> {
        validate_name(file_name)?;

        let path = Path::new(file_name);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_name = match path.file_stem() {
            Some(stem) if !extension.is_empty() => stem.to_string_lossy().into_owned(),
            _ => file_name.to_string(),
        };

        Self::new(base_name, extension, contents)
    }

    /// Record the real file backing this item.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Get the node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the id of the folder holding this item.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Get the base name.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Get the extension (no leading dot).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Composed file name.
    pub fn name(&self) -> String {
        if self.extension.is_empty() {
            self.base_name.to_string()
        } else {
            format!("{}.{}", self.base_name, self.extension)
        }
    }

    /// Get the recorded source path.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Replace the recorded source path.
    pub fn set_source_path(&mut self, path: Option<PathBuf>) {
        self.source_path = path;
    }

    /// Get in-memory content, if loaded.
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Check whether content is held in memory.
    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// Replace in-memory content. The source path is left untouched.
    pub fn set_contents(&mut self, data: impl Into<Vec<u8>>) {
        self.contents = Some(data.into());
    }

    /// Drop in-memory content, falling back to the source path.
    pub fn clear_contents(&mut self) {
        self.contents = None;
    }

    /// Get the item's content, reading the source file if nothing is loaded.
    ///
    /// Items with neither loaded content nor a source path are empty.
    pub fn load_contents(&self) -> Result<Cow<'_, [u8]>, TreeError> {
        if let Some(data) = &self.contents {
            return Ok(Cow::Borrowed(data));
        }
        match &self.source_path {
            Some(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| TreeError::io(path, e)),
            None => Ok(Cow::Borrowed(&[])),
        }
    }

    /// BLAKE3 digest of the content.
    pub fn content_hash(&self) -> Result<ContentHash, TreeError> {
        Ok(ContentHash::of(&self.load_contents()?))
    }

    /// Sort key used by structural comparison.
    pub fn sort_key(&self) -> (CompactString, CompactString) {
        (self.base_name.clone(), self.extension.clone())
    }

    /// Check whether two items have the same identity (and content).
    ///
    /// Names compare case-sensitively. A lazy item that cannot be read never
    /// equals anything when contents are compared.
    pub fn equals(&self, other: &VirtualItem, compare_contents: bool) -> bool {
        match self.try_equals(other, compare_contents) {
            Ok(equal) => equal,
            Err(e) => {
                tracing::warn!(item = %self.name(), error = %e, "could not load item content for comparison");
                false
            }
        }
    }

    /// Like [`VirtualItem::equals`], but surfaces content read failures.
    pub fn try_equals(&self, other: &VirtualItem, compare_contents: bool) -> Result<bool, TreeError> {
        if self.base_name != other.base_name || self.extension != other.extension {
            return Ok(false);
        }
        if !compare_contents {
            return Ok(true);
        }
        Ok(self.load_contents()? == other.load_contents()?)
    }

    pub(crate) fn extension_matches(&self, ext: &str) -> bool {
        self.extension.to_lowercase() == ext.to_lowercase()
    }
}

impl Clone for VirtualItem {
    /// Value copy with a fresh identity, detached from any folder.
    fn clone(&self) -> Self {
        Self {
            id: NodeId::next(),
            parent: None,
            base_name: self.base_name.clone(),
            extension: self.extension.clone(),
            contents: self.contents.clone(),
            source_path: self.source_path.clone(),
        }
    }
}

/// Strip a leading dot and validate an extension.
pub(crate) fn normalize_extension(ext: &str) -> Result<CompactString, TreeError> {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if !ext.is_empty() {
        validate_name(ext)?;
    }
    Ok(CompactString::new(ext))
}
