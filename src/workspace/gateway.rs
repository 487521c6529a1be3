//! Filesystem access rooted at a workspace directory

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{EditError, Result};
use crate::utils::normalize_path;

/// Modification time and size of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mtime: DateTime<Utc>,
    pub size: u64,
}

/// File operations the ledger needs, addressed by workspace-relative path.
///
/// Implementations must reject absolute paths and paths escaping the
/// workspace with [`EditError::PathEscape`] before touching storage, and
/// report missing files as [`EditError::NotFound`].
pub trait FileGateway {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Read as text; invalid UTF-8 sequences become U+FFFD
    fn read(&self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }

    /// Write content, creating missing parent directories
    fn write(&self, path: &str, content: &str) -> Result<()>;

    fn unlink(&self, path: &str) -> Result<()>;

    /// Rename a file, creating the destination's parent directories.
    ///
    /// Fails with [`EditError::InvalidOperation`] if the destination exists.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    fn stat(&self, path: &str) -> Result<FileStat>;
}

/// [`FileGateway`] over the real filesystem under a root directory
#[derive(Debug, Clone)]
pub struct WorkspaceFs {
    root: PathBuf,
}

impl WorkspaceFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a workspace-relative path onto the filesystem
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = normalize_path(path)?;
        Ok(self.root.join(normalized))
    }

    fn ensure_parent(&self, path: &str, full: &Path) -> Result<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| EditError::io(path, e))?;
        }
        Ok(())
    }
}

impl FileGateway for WorkspaceFs {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| EditError::io(path, e))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        self.ensure_parent(path, &full)?;
        atomic_write(&full, content.as_bytes()).map_err(|e| EditError::io(path, e))
    }

    fn unlink(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| EditError::io(path, e))
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if !source.is_file() {
            return Err(EditError::NotFound(from.to_string()));
        }
        if target.symlink_metadata().is_ok() {
            return Err(EditError::invalid_operation(to, "destination already exists"));
        }
        self.ensure_parent(to, &target)?;
        fs::rename(&source, &target).map_err(|e| EditError::io(from, e))
    }

    fn stat(&self, path: &str) -> Result<FileStat> {
        let full = self.resolve(path)?;
        let metadata = fs::metadata(&full).map_err(|e| EditError::io(path, e))?;
        let modified = metadata.modified().map_err(|e| EditError::io(path, e))?;
        Ok(FileStat {
            mtime: DateTime::<Utc>::from(modified),
            size: metadata.len(),
        })
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial file
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.shadow-tmp", file_name));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_data()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
