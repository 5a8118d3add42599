//! Plain-text file access behind `/read`.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0} is outside the readable root")]
    Forbidden(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads regular files as text, optionally confined to one directory tree.
#[derive(Debug, Clone)]
pub struct FileReader {
    root: Option<PathBuf>,
}

impl FileReader {
    /// Confine reads to `root`. The root must exist.
    pub fn confined(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: Some(root.canonicalize()?),
        })
    }

    /// Any path on the host is readable.
    pub fn unrestricted() -> Self {
        Self { root: None }
    }

    /// Contents of `path` as UTF-8 text.
    ///
    /// Anything that is not an existing regular file is `NotFound` and is
    /// never opened. Symlinks are resolved before the root check, and the
    /// resolved path is the one that is read.
    pub async fn read(&self, path: &Path) -> Result<String, ReadError> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ReadError::NotFound(path.to_path_buf()));
        }

        // Confined reads open the checked canonical path, never `path` again.
        let target = match &self.root {
            Some(root) => {
                let resolved = tokio::fs::canonicalize(path).await?;
                if !resolved.starts_with(root) {
                    return Err(ReadError::Forbidden(path.to_path_buf()));
                }
                resolved
            }
            None => path.to_path_buf(),
        };

        Ok(tokio::fs::read_to_string(&target).await?)
    }
}
