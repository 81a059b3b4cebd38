//! Read-only tag feed polled by game servers.

use axum::{Json, extract::State};
use serde_json::{Map, Value};

use crate::application::error::HttpError;
use crate::domain::tags::TagKind;

use super::HttpState;

pub(super) async fn health() -> &'static str {
    "ok"
}

pub(super) async fn list_group_tags(
    State(state): State<HttpState>,
) -> Result<Json<Map<String, Value>>, HttpError> {
    feed(&state, TagKind::Group).await
}

pub(super) async fn list_user_tags(
    State(state): State<HttpState>,
) -> Result<Json<Map<String, Value>>, HttpError> {
    feed(&state, TagKind::User).await
}

/// Served verbatim: entries are not re-encoded through the typed model.
async fn feed(state: &HttpState, kind: TagKind) -> Result<Json<Map<String, Value>>, HttpError> {
    let document = state.tags.feed(kind).await?;
    Ok(Json(document))
}
