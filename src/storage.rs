use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

lazy_static! {
    static ref OBJECT_KEY_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*(\.[A-Za-z0-9]+)?$").unwrap();
}

/// Keys are single file names; anything that could walk out of the root is refused.
pub(crate) fn check_key(key: &str) -> anyhow::Result<()> {
    anyhow::ensure!(OBJECT_KEY_RE.is_match(key), "invalid object key {key:?}");
    Ok(())
}

/// Stores objects as plain files under one directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        debug!(key, content_type, size = body.len(), "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(key, "delete of missing object");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_key_accepts_generated_names() {
        assert!(check_key("1718000000000-123456789.png").is_ok());
        assert!(check_key("abc").is_ok());
    }

    #[test]
    fn check_key_rejects_traversal() {
        for key in ["", "../etc/passwd", "a/b.png", ".hidden", "a\\b", "x.png.exe/.."] {
            assert!(check_key(key).is_err(), "{key} should be rejected");
        }
    }

    #[tokio::test]
    async fn local_storage_writes_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads")).await.unwrap();

        storage
            .put_object("photo.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        let written = tokio::fs::read(storage.root().join("photo.jpg")).await.unwrap();
        assert_eq!(written, b"jpeg");

        storage.delete_object("photo.jpg").await.unwrap();
        assert!(!storage.root().join("photo.jpg").exists());

        // deleting twice is not an error
        storage.delete_object("photo.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn local_storage_refuses_bad_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let err = storage
            .put_object("../escape.txt", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid object key"));
    }
}
