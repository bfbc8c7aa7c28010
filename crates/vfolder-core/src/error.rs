//! Error types for virtual tree construction, reading and materialization.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the virtual folder model and its readers/writers.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Malformed construction input.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A sibling with the same identity already exists.
    #[error("Duplicate child '{name}' in folder '{parent}'")]
    DuplicateChild { parent: String, name: String },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    AccessDenied { path: PathBuf },

    /// Item has no recorded source path to copy or move from.
    #[error("Item '{name}' has no source path")]
    MissingSource { name: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a duplicate child error.
    pub fn duplicate(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateChild {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// The filesystem path this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound { path }
            | Self::AccessDenied { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Validate a single file or folder name component.
///
/// Names come from the filesystem or from callers building expected trees, so
/// only rules every platform shares are enforced here.
pub fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() {
        return Err(TreeError::invalid("Name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(TreeError::invalid(format!(
            "Name is too long (max 255 bytes): {name}"
        )));
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(TreeError::invalid(format!(
                "Name cannot contain {c:?}: {name}"
            )));
        }
    }

    if name == "." || name == ".." {
        return Err(TreeError::invalid("'.' and '..' are reserved names"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_error_io() {
        let err = TreeError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TreeError::AccessDenied { .. }));

        let err = TreeError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, TreeError::NotFound { .. }));
        assert_eq!(err.path(), Some(std::path::Path::new("/test/path")));

        let err = TreeError::io("/test/path", std::io::Error::other("boom"));
        assert!(matches!(err, TreeError::Io { .. }));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("test").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert!(validate_name("file with spaces").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }
}
