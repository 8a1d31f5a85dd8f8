//! Object storage addressed by `s3://bucket/key`.
//!
//! `FsObjectStore` lays objects out as `{root}/{bucket}/{key}`. Keys are
//! relative paths; `..`, absolute keys and empty segments are rejected.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use wv_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// URIs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUri {
    pub bucket: String,
    pub key: String,
}

impl ObjectUri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| Error::Input(format!("not an s3 uri: {uri}")))?;
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(bucket, key))
            }
            _ => Err(Error::Input(format!("s3 uri needs bucket and key: {uri}"))),
        }
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, uri: &ObjectUri, bytes: &[u8]) -> Result<()>;
    async fn get(&self, uri: &ObjectUri) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, uri: &ObjectUri) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [uri.bucket.as_str(), uri.key.as_str()] {
            let rel = Path::new(part);
            let clean = rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if part.is_empty() || !clean || part.split('/').any(str::is_empty) {
                return Err(Error::Input(format!("invalid object path: {uri}")));
            }
            path.push(rel);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, uri: &ObjectUri, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(uri)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(%uri, bytes = bytes.len(), "object stored");
        Ok(())
    }

    async fn get(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
        let path = self.resolve(uri)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(uri.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
