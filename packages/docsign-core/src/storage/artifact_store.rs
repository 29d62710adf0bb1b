//! Filesystem-backed artifact store.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Artifact categories, one directory each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Private and public keys
    Keys,
    /// Self-signed certificates
    Certs,
    /// Signed document triples
    SignedDocs,
}

impl Category {
    /// All categories, in directory-creation order
    pub const ALL: [Category; 3] = [Category::Keys, Category::Certs, Category::SignedDocs];

    /// Directory name under the store root
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Keys => "keys",
            Category::Certs => "certs",
            Category::SignedDocs => "signed_docs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Persists and retrieves raw artifact bytes by category and name
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, creating the category directories
    /// if they do not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for category in Category::ALL {
            let dir = root.join(category.dir_name());
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| {
                    Error::StorageError(format!("cannot create {}: {}", dir.display(), e))
                })?;
                tracing::debug!(dir = %dir.display(), "Created artifact directory");
            }
        }
        Ok(Self { root })
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a category
    pub fn dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Full path of an artifact. The name is validated but the file need
    /// not exist.
    pub fn path(&self, category: Category, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir(category).join(name))
    }

    /// Write an artifact, replacing any previous content under the same name
    pub fn save(&self, category: Category, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(category, name)?;
        fs::write(&path, bytes).map_err(|e| {
            Error::StorageError(format!("cannot write {}: {}", path.display(), e))
        })?;
        tracing::debug!(%category, name, len = bytes.len(), "Saved artifact");
        Ok(path)
    }

    /// Read an artifact
    pub fn load(&self, category: Category, name: &str) -> Result<Vec<u8>> {
        let path = self.path(category, name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(Error::StorageError(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check whether an artifact exists
    pub fn exists(&self, category: Category, name: &str) -> Result<bool> {
        Ok(self.path(category, name)?.is_file())
    }

    /// Names of all artifacts in a category, sorted
    pub fn list(&self, category: Category) -> Result<Vec<String>> {
        let dir = self.dir(category);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::StorageError(format!(
                    "cannot list {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete an artifact. Returns whether it existed.
    pub fn remove(&self, category: Category, name: &str) -> Result<bool> {
        let path = self.path(category, name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(%category, name, "Removed artifact");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::StorageError(format!(
                "cannot remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Names must be exactly one normal path component
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(Error::InvalidArtifactName(name.to_string())),
    }
}

// ============================================================================
// TESTS
// ============================================================================
