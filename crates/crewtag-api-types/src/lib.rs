//! Record types shared between the crewtag bot and consumers of its tag feed.
//!
//! The feed is a JSON object keyed by the decimal Roblox group or user id:
//!
//! ```json
//! {
//!   "1234": {
//!     "order": 0,
//!     "requiredRank": 1,
//!     "tagName": "<font color=\"#FF0000\">VIP</font>",
//!     "tagStyle": "Discord"
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag documents keyed by owner id. Integer keys keep numeric ordering on output.
pub type TagMap = BTreeMap<u64, TagEntry>;

/// A persisted tag as served to game servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagEntry {
    pub order: i64,
    pub required_rank: i64,
    /// Rendered rich-text markup, embedded verbatim by the client.
    pub tag_name: String,
    pub tag_style: String,
    /// Raw style inputs kept so that `tag_name` can be re-derived later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TagStyleSnapshot>,
}

/// Validated style inputs captured at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStyleSnapshot {
    pub tag: String,
    /// Canonical `"R, G, B"` form.
    pub color: String,
    pub color2: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub rainbow: bool,
}
