//! Tag ownership kinds and the literal-table export format.

use std::fmt;
use std::str::FromStr;

use crewtag_api_types::{TagEntry, TagMap};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::markup::escape;

/// Who a tag is attached to. Each kind is stored in its own document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Group,
    User,
}

impl TagKind {
    pub const ALL: [TagKind; 2] = [TagKind::Group, TagKind::User];

    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Group => "group",
            TagKind::User => "user",
        }
    }

    /// Subcommand name used in Discord (`crew` for groups).
    pub fn subcommand(self) -> &'static str {
        match self {
            TagKind::Group => "crew",
            TagKind::User => "user",
        }
    }

    /// Name of the integer option carrying the owner id.
    pub fn id_option(self) -> &'static str {
        match self {
            TagKind::Group => "groupid",
            TagKind::User => "userid",
        }
    }

    /// Human label used in replies.
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Group => "Group ID",
            TagKind::User => "User ID",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            TagKind::Group => "group_tags.json",
            TagKind::User => "user_tags.json",
        }
    }

    pub fn from_subcommand(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.subcommand() == name)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" | "groups" | "crew" => Ok(TagKind::Group),
            "user" | "users" => Ok(TagKind::User),
            other => Err(DomainError::validation(format!("unknown tag kind `{other}`"))),
        }
    }
}

/// One line of the literal table, e.g.
/// `[42] = { order = 0, requiredRank = 1, tagName = '<b>..</b>', tagStyle = 'Discord' },`.
///
/// `tag_name` is already escaped by the renderer and is embedded as-is.
pub fn literal_line(id: u64, entry: &TagEntry) -> String {
    format!(
        "[{id}] = {{ order = {}, requiredRank = {}, tagName = '{}', tagStyle = '{}' }},",
        entry.order,
        entry.required_rank,
        entry.tag_name,
        escape(&entry.tag_style),
    )
}

/// Fenced block with one literal line per entry, ordered by id.
pub fn literal_block(tags: &TagMap) -> String {
    let mut block = String::from("```lua\n");
    for (id, entry) in tags {
        block.push_str(&literal_line(*id, entry));
        block.push('\n');
    }
    block.push_str("```");
    block
}
