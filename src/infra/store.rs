//! JSON document storage for tags, one file per tag kind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crewtag_api_types::{TagEntry, TagMap};
use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};
use tracing::warn;

use crate::application::repos::{RepoError, TagsRepo};
use crate::domain::tags::TagKind;

/// Filesystem-backed tag store.
///
/// Mutations are read-modify-write cycles over the whole document and are serialized per kind.
#[derive(Debug)]
pub struct JsonTagStore {
    root: PathBuf,
    group_lock: Mutex<()>,
    user_lock: Mutex<()>,
}

impl JsonTagStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            group_lock: Mutex::new(()),
            user_lock: Mutex::new(()),
        })
    }

    pub fn path_for(&self, kind: TagKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    fn lock_for(&self, kind: TagKind) -> &Mutex<()> {
        match kind {
            TagKind::Group => &self.group_lock,
            TagKind::User => &self.user_lock,
        }
    }

    /// Read for serving. The object is passed through untyped; anything that is not a
    /// JSON object is reported and served as empty.
    async fn read_served(&self, kind: TagKind) -> Result<Map<String, Value>, RepoError> {
        let path = self.path_for(kind);
        let Some(raw) = read_raw(&path).await? else {
            return Ok(Map::new());
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => {
                warn!(
                    target = "crewtag::store",
                    kind = %kind,
                    path = %path.display(),
                    "tag document is not a JSON object, serving empty set"
                );
                Ok(Map::new())
            }
            Err(err) => {
                warn!(
                    target = "crewtag::store",
                    kind = %kind,
                    path = %path.display(),
                    error = %err,
                    "tag document unreadable, serving empty set"
                );
                Ok(Map::new())
            }
        }
    }

    /// Apply `mutate` to the current document and write it back.
    async fn modify<T>(
        &self,
        kind: TagKind,
        mutate: impl FnOnce(&mut TagMap) -> T,
    ) -> Result<T, RepoError> {
        let _guard = self.lock_for(kind).lock().await;
        let path = self.path_for(kind);
        // A corrupt document is surfaced instead of being replaced by a partial one.
        let mut tags = read_document(&path).await?;
        let outcome = mutate(&mut tags);
        write_document(&path, &tags).await?;
        Ok(outcome)
    }
}

#[async_trait]
impl TagsRepo for JsonTagStore {
    async fn document(&self, kind: TagKind) -> Result<Map<String, Value>, RepoError> {
        self.read_served(kind).await
    }

    async fn list(&self, kind: TagKind) -> Result<TagMap, RepoError> {
        read_document(&self.path_for(kind)).await
    }

    async fn find(&self, kind: TagKind, id: u64) -> Result<Option<TagEntry>, RepoError> {
        let mut tags = read_document(&self.path_for(kind)).await?;
        Ok(tags.remove(&id))
    }

    async fn upsert(
        &self,
        kind: TagKind,
        id: u64,
        entry: TagEntry,
    ) -> Result<Option<TagEntry>, RepoError> {
        self.modify(kind, |tags| tags.insert(id, entry)).await
    }

    async fn remove(&self, kind: TagKind, id: u64) -> Result<Option<TagEntry>, RepoError> {
        self.modify(kind, |tags| tags.remove(&id)).await
    }

    async fn replace_all(&self, kind: TagKind, tags: TagMap) -> Result<(), RepoError> {
        self.modify(kind, |current| *current = tags).await
    }
}

/// File contents, or `None` when the file is missing or blank.
async fn read_raw(path: &Path) -> Result<Option<Vec<u8>>, RepoError> {
    match fs::read(path).await {
        Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Ok(None),
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(RepoError::from_persistence(err)),
    }
}

/// Typed read; missing files are an empty document.
async fn read_document(path: &Path) -> Result<TagMap, RepoError> {
    let Some(raw) = read_raw(path).await? else {
        return Ok(TagMap::new());
    };

    serde_json::from_slice(&raw).map_err(|err| RepoError::Corrupt {
        message: format!("{}: {err}", path.display()),
    })
}

async fn write_document(path: &Path, tags: &TagMap) -> Result<(), RepoError> {
    let mut body = serde_json::to_vec_pretty(tags).map_err(RepoError::from_persistence)?;
    body.push(b'\n');

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, &body)
        .await
        .map_err(RepoError::from_persistence)?;
    if let Err(err) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(RepoError::from_persistence(err));
    }
    Ok(())
}
