//! Uploaded file storage on the local filesystem.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs::File;
use uuid::Uuid;

/// Longest sanitized original filename kept in the stored name.
const MAX_NAME_LEN: usize = 100;

/// Store for the files backing `file` content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write an upload and return the path it was stored under.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String>;

    /// Delete a stored file (returns false if it was already gone).
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Open a stored file for reading, `None` if it does not exist.
    async fn open(&self, path: &str) -> Result<Option<File>>;
}

/// Filesystem implementation of FileStore.
#[derive(Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if it does not exist.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// `{uuid}-{name}` with the client-supplied name reduced to a safe basename.
    fn stored_name(original_name: &str) -> String {
        let base = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        let mut safe: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        safe.truncate(MAX_NAME_LEN);

        format!("{}-{}", Uuid::new_v4(), safe)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.root.join(Self::stored_name(original_name));
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, path: &str) -> Result<Option<File>> {
        match File::open(path).await {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
