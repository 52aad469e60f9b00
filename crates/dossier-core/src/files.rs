//! Project file references.
//!
//! Two flavors of file-backed content:
//!
//! - [`RepoFile`]: a file tracked by the project repository, addressed by a
//!   path relative to the project root. Comparable and orderable so tracked
//!   sets are deterministic.
//! - [`ExternalFile`]: an absolute path outside the project (a log file, a
//!   vendored dependency, a scratch buffer on disk).
//!
//! Reads are whole-file UTF-8 loads. A missing or unreadable backing file
//! surfaces as [`ContentError::Unavailable`]; callers drop the owning
//! fragment rather than failing the surrounding operation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ContentError;

/// A file tracked by the project repository.
///
/// Identity is the relative path; the project root is carried so the file
/// can be read without consulting global state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoFile {
    root: PathBuf,
    relative: PathBuf,
}

impl RepoFile {
    /// Create a repo file from a project root and a root-relative path.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// The root-relative path.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// The absolute path on disk.
    #[must_use]
    pub fn absolute(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// The file name without any directory components.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The parent directory relative to the root, empty string at top level.
    #[must_use]
    pub fn parent(&self) -> String {
        self.relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read the full file content.
    pub fn read(&self) -> Result<String, ContentError> {
        let path = self.absolute();
        std::fs::read_to_string(&path).map_err(|source| ContentError::Unavailable {
            path: path.display().to_string(),
            source,
        })
    }
}

impl fmt::Display for RepoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative.display())
    }
}

/// A file outside the project repository, addressed absolutely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalFile {
    path: PathBuf,
}

impl ExternalFile {
    /// Create an external file reference from an absolute path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The absolute path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full file content.
    pub fn read(&self) -> Result<String, ContentError> {
        std::fs::read_to_string(&self.path).map_err(|source| ContentError::Unavailable {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl fmt::Display for ExternalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
