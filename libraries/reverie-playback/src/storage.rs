//! Track source storage

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Read access to track source files
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check whether a file exists at `path`
    async fn exists(&self, path: &Path) -> bool;

    /// Read the whole file at `path`
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Local filesystem storage
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }
}
