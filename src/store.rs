//! Text storage abstraction over the vault.
//!
//! The engine never touches the filesystem directly; every read and write
//! goes through a [TextStore] so operations stay testable against an
//! in-memory vault and embeddable behind a host application's own storage
//! layer. Paths are vault-relative, `/`-separated, with extensions.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::error::QualiError;

#[async_trait]
pub trait TextStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, QualiError>;
    async fn write(&self, path: &str, text: &str) -> Result<(), QualiError>;
    async fn append(&self, path: &str, text: &str) -> Result<(), QualiError>;
    /// Creates a new file. Fails with [QualiError::AlreadyExists] if `path`
    /// is already present.
    async fn create(&self, path: &str, text: &str) -> Result<(), QualiError>;
    async fn delete(&self, path: &str) -> Result<(), QualiError>;
    async fn copy(&self, path: &str, new_path: &str) -> Result<(), QualiError>;
    async fn exists(&self, path: &str) -> bool;
    /// All markdown files in the vault, vault-relative.
    async fn list(&self) -> Result<Vec<String>, QualiError>;
}

/// Production [TextStore] rooted at a vault directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn abs(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn ensure_parent(&self, path: &str) -> Result<(), QualiError> {
        if let Some(parent) = self.abs(path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TextStore for FsStore {
    async fn read(&self, path: &str) -> Result<String, QualiError> {
        tracing::debug!("Reading {path}");
        Ok(tokio::fs::read_to_string(self.abs(path)).await?)
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), QualiError> {
        tracing::debug!("Writing {path}");
        self.ensure_parent(path).await?;
        Ok(tokio::fs::write(self.abs(path), text).await?)
    }

    async fn append(&self, path: &str, text: &str) -> Result<(), QualiError> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(self.abs(path))
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn create(&self, path: &str, text: &str) -> Result<(), QualiError> {
        if self.exists(path).await {
            return Err(QualiError::AlreadyExists(path.to_string()));
        }
        self.write(path, text).await
    }

    async fn delete(&self, path: &str) -> Result<(), QualiError> {
        tracing::debug!("Deleting {path}");
        Ok(tokio::fs::remove_file(self.abs(path)).await?)
    }

    async fn copy(&self, path: &str, new_path: &str) -> Result<(), QualiError> {
        self.ensure_parent(new_path).await?;
        tokio::fs::copy(self.abs(path), self.abs(new_path)).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.abs(path).exists()
    }

    async fn list(&self) -> Result<Vec<String>, QualiError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            // Depth 0 is the vault root itself, which may legitimately be a
            // dotted directory; only entries inside the vault are filtered.
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
            })
        {
            let entry = entry.map_err(|e| QualiError::Io(format!("vault walk failed: {e}")))?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "md")
            {
                let rel = entry.path().strip_prefix(&self.root)?;
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory [TextStore] for tests and hosts without a filesystem.
#[derive(Debug, Default)]
pub struct MemStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    pub fn with_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MemStore {
            files: Mutex::new(
                files
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TextStore for MemStore {
    async fn read(&self, path: &str) -> Result<String, QualiError> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| QualiError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), QualiError> {
        self.lock().insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn append(&self, path: &str, text: &str) -> Result<(), QualiError> {
        let mut files = self.lock();
        let entry = files
            .get_mut(path)
            .ok_or_else(|| QualiError::NotFound(path.to_string()))?;
        entry.push_str(text);
        Ok(())
    }

    async fn create(&self, path: &str, text: &str) -> Result<(), QualiError> {
        let mut files = self.lock();
        if files.contains_key(path) {
            return Err(QualiError::AlreadyExists(path.to_string()));
        }
        files.insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), QualiError> {
        self.lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| QualiError::NotFound(path.to_string()))
    }

    async fn copy(&self, path: &str, new_path: &str) -> Result<(), QualiError> {
        let mut files = self.lock();
        let content = files
            .get(path)
            .cloned()
            .ok_or_else(|| QualiError::NotFound(path.to_string()))?;
        files.insert(new_path.to_string(), content);
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    async fn list(&self) -> Result<Vec<String>, QualiError> {
        Ok(self
            .lock()
            .keys()
            .filter(|p| p.ends_with(".md"))
            .cloned()
            .collect())
    }
}
