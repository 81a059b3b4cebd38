use std::fmt;
use std::sync::Arc;

use crewtag_api_types::{TagEntry, TagMap, TagStyleSnapshot};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::repos::{RepoError, TagsRepo};
use crate::domain::color::{ColorError, RgbTriple};
use crate::domain::markup::{self, StyleDescriptor};
use crate::domain::tags::{TagKind, literal_block};

pub const DEFAULT_ORDER: i64 = 0;
pub const DEFAULT_REQUIRED_RANK: i64 = 1;
pub const DEFAULT_TAG_STYLE: &str = "Discord";

#[derive(Debug, Error)]
pub enum TagError {
    #[error("{0}")]
    InvalidColors(ColorFailures),
    #[error("tag text must not be empty")]
    EmptyTag,
    #[error("tag `{tag}` already exists for {kind} {id}")]
    AlreadyExists { kind: TagKind, id: u64, tag: String },
    #[error("no tag stored for {kind} {id}")]
    NotFound { kind: TagKind, id: u64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Every color argument that failed validation, reported together.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorFailures(pub Vec<ColorFailure>);

#[derive(Debug, Clone, PartialEq)]
pub struct ColorFailure {
    pub argument: &'static str,
    pub error: ColorError,
}

impl fmt::Display for ColorFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid RGB")?;
        for (index, failure) in self.0.iter().enumerate() {
            let sep = if index == 0 { " (" } else { "; " };
            write!(f, "{sep}{}: {}", failure.argument, failure.error)?;
        }
        if !self.0.is_empty() {
            f.write_str(")")?;
        }
        f.write_str(". Use like \"0, 0, 139\" (0-255).")
    }
}

/// Values applied when a command leaves the optional fields unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDefaults {
    pub order: i64,
    pub required_rank: i64,
    pub tag_style: String,
}

impl Default for TagDefaults {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            required_rank: DEFAULT_REQUIRED_RANK,
            tag_style: DEFAULT_TAG_STYLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaveTagCommand {
    pub id: u64,
    pub tag: String,
    pub color: String,
    pub color2: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub rainbow: bool,
    pub order: Option<i64>,
    pub required_rank: Option<i64>,
    pub tag_style: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavedTag {
    pub id: u64,
    pub entry: TagEntry,
    pub replaced: bool,
}

/// Validate both color arguments, collecting every failure.
pub fn validate_colors(
    color: &str,
    color2: Option<&str>,
) -> Result<(RgbTriple, Option<RgbTriple>), TagError> {
    let primary = RgbTriple::parse(color);
    let secondary = color2.map(RgbTriple::parse).transpose();

    match (primary, secondary) {
        (Ok(primary), Ok(secondary)) => Ok((primary, secondary)),
        (primary, secondary) => {
            let mut failures = Vec::new();
            if let Err(error) = primary {
                failures.push(ColorFailure {
                    argument: "color",
                    error,
                });
            }
            if let Err(error) = secondary {
                failures.push(ColorFailure {
                    argument: "color2",
                    error,
                });
            }
            Err(TagError::InvalidColors(ColorFailures(failures)))
        }
    }
}

/// Re-derive markup from a stored snapshot.
pub fn render_snapshot(snapshot: &TagStyleSnapshot) -> Result<String, TagError> {
    let (primary, secondary) = validate_colors(&snapshot.color, Some(&snapshot.color2))?;
    Ok(markup::render(&StyleDescriptor {
        text: snapshot.tag.clone(),
        primary,
        secondary,
        bold: snapshot.bold,
        italic: snapshot.italic,
        rainbow: snapshot.rainbow,
    }))
}

#[derive(Clone)]
pub struct TagService {
    repo: Arc<dyn TagsRepo>,
    defaults: TagDefaults,
    write_lock: Arc<Mutex<()>>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagsRepo>, defaults: TagDefaults) -> Self {
        Self {
            repo,
            defaults,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn save(&self, kind: TagKind, command: SaveTagCommand) -> Result<SavedTag, TagError> {
        let SaveTagCommand {
            id,
            tag,
            color,
            color2,
            bold,
            italic,
            rainbow,
            order,
            required_rank,
            tag_style,
        } = command;

        let (primary, secondary) = validate_colors(&color, color2.as_deref())?;
        if tag.trim().is_empty() {
            return Err(TagError::EmptyTag);
        }

        let descriptor = StyleDescriptor {
            text: tag,
            primary,
            secondary,
            bold,
            italic,
            rainbow,
        };
        let tag_name = markup::render(&descriptor);

        let snapshot = TagStyleSnapshot {
            color: primary.to_string(),
            color2: secondary.unwrap_or(primary).to_string(),
            tag: descriptor.text,
            bold,
            italic,
            rainbow,
        };

        let tag_style = tag_style
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.defaults.tag_style.clone());

        let entry = TagEntry {
            order: order.unwrap_or(self.defaults.order),
            required_rank: required_rank.unwrap_or(self.defaults.required_rank),
            tag_name,
            tag_style,
            style: Some(snapshot),
        };

        let _guard = self.write_lock.lock().await;
        let existing_tag = self
            .repo
            .find(kind, id)
            .await?
            .and_then(|existing| existing.style)
            .map(|style| style.tag);
        if let Some(existing_tag) = existing_tag {
            let same_text = entry
                .style
                .as_ref()
                .is_some_and(|new| new.tag == existing_tag);
            if same_text {
                return Err(TagError::AlreadyExists {
                    kind,
                    id,
                    tag: existing_tag,
                });
            }
        }

        let previous = self.repo.upsert(kind, id, entry.clone()).await?;
        info!(
            target = "crewtag::tags",
            kind = %kind,
            id,
            replaced = previous.is_some(),
            "tag saved"
        );

        Ok(SavedTag {
            id,
            entry,
            replaced: previous.is_some(),
        })
    }

    pub async fn delete(&self, kind: TagKind, id: u64) -> Result<TagEntry, TagError> {
        let _guard = self.write_lock.lock().await;
        let removed = self
            .repo
            .remove(kind, id)
            .await?
            .ok_or(TagError::NotFound { kind, id })?;
        info!(target = "crewtag::tags", kind = %kind, id, "tag deleted");
        Ok(removed)
    }

    /// The persisted document for the game-server feed, untouched by typed decoding.
    pub async fn feed(&self, kind: TagKind) -> Result<Map<String, Value>, TagError> {
        self.repo.document(kind).await.map_err(TagError::from)
    }

    pub async fn list(&self, kind: TagKind) -> Result<TagMap, TagError> {
        self.repo.list(kind).await.map_err(TagError::from)
    }

    /// Literal table of every stored entry.
    pub async fn export(&self, kind: TagKind) -> Result<String, TagError> {
        let tags = self.list(kind).await?;
        Ok(literal_block(&tags))
    }

    /// Rebuild `tag_name` for every entry that carries a style snapshot.
    ///
    /// Entries whose markup is already current are left untouched; returns how many changed.
    pub async fn rerender(&self, kind: TagKind) -> Result<usize, TagError> {
        let _guard = self.write_lock.lock().await;
        let mut tags = self.repo.list(kind).await?;

        let mut updated = 0;
        for (id, entry) in tags.iter_mut() {
            let Some(snapshot) = entry.style.as_ref() else {
                debug!(target = "crewtag::tags", kind = %kind, id, "no style snapshot");
                continue;
            };
            let rendered = render_snapshot(snapshot)?;
            if rendered != entry.tag_name {
                entry.tag_name = rendered;
                updated += 1;
            }
        }

        if updated > 0 {
            self.repo.replace_all(kind, tags).await?;
        }
        info!(target = "crewtag::tags", kind = %kind, updated, "tags re-rendered");
        Ok(updated)
    }
}
