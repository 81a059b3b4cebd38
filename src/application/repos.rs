//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use crewtag_api_types::{TagEntry, TagMap};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::tags::TagKind;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("stored document is invalid: {message}")]
    Corrupt { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// The stored object exactly as persisted, for serving to game servers.
    async fn document(&self, kind: TagKind) -> Result<Map<String, Value>, RepoError>;

    async fn list(&self, kind: TagKind) -> Result<TagMap, RepoError>;

    async fn find(&self, kind: TagKind, id: u64) -> Result<Option<TagEntry>, RepoError>;

    /// Insert or replace, returning the previous entry.
    async fn upsert(
        &self,
        kind: TagKind,
        id: u64,
        entry: TagEntry,
    ) -> Result<Option<TagEntry>, RepoError>;

    async fn remove(&self, kind: TagKind, id: u64) -> Result<Option<TagEntry>, RepoError>;

    async fn replace_all(&self, kind: TagKind, tags: TagMap) -> Result<(), RepoError>;
}
