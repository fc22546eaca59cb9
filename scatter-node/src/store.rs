//! Filesystem block store
//!
//! Blocks live at whatever path the caller names. With a configured root,
//! paths are normalized lexically and must stay under it; without one the
//! path is used verbatim.

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Block store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Block not found")]
    NotFound,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path outside storage root")]
    OutsideRoot,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads and writes blocks on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    root: Option<PathBuf>,
}

impl BlockStore {
    /// Store that accepts any path
    pub fn unconfined() -> Self {
        Self { root: None }
    }

    /// Store that rejects paths outside `root`
    pub fn confined(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(normalize(&root.into())),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Map a caller-supplied path to the file it names
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, StoreError> {
        if raw.trim().is_empty() {
            return Err(StoreError::InvalidPath("empty path".to_string()));
        }
        if raw.contains('\0') {
            return Err(StoreError::InvalidPath("path contains NUL".to_string()));
        }

        let path = PathBuf::from(raw);
        let Some(root) = &self.root else {
            return Ok(path);
        };

        if !path.is_absolute() {
            return Err(StoreError::OutsideRoot);
        }
        let normalized = normalize(&path);
        if normalized == *root || !normalized.starts_with(root) {
            return Err(StoreError::OutsideRoot);
        }
        Ok(normalized)
    }

    /// Write a block, creating parent directories and replacing any existing file
    pub async fn write(&self, raw: &str, data: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.resolve(raw)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), size = data.len(), "Block written");
        Ok(path)
    }

    /// Open a stored block for streaming, returning the file and its length
    pub async fn open(&self, raw: &str) -> Result<(tokio::fs::File, u64), StoreError> {
        let path = self.resolve(raw)?;
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StoreError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let file = tokio::fs::File::open(&path).await?;
        Ok((file, metadata.len()))
    }

    /// Read a whole block into memory
    pub async fn read(&self, raw: &str) -> Result<Bytes, StoreError> {
        let (mut file, len) = self.open(raw).await?;
        let mut data = Vec::with_capacity(len as usize);
        file.read_to_end(&mut data).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a block
    pub async fn delete(&self, raw: &str) -> Result<(), StoreError> {
        let path = self.resolve(raw)?;
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => return Err(StoreError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        }
        tokio::fs::remove_file(&path).await?;
        debug!(path = %path.display(), "Block deleted");
        Ok(())
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// File name of a block path, for `Content-Disposition`
pub fn attachment_name(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "block".to_string())
}
