//! Slash command definitions and dispatch onto the tag service.

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::tags::{SaveTagCommand, TagError, TagService};
use crate::domain::tags::TagKind;

use super::model::{
    CommandData, CommandOption, FLAG_EPHEMERAL, InteractionResponse, OPTION_BOOLEAN,
    OPTION_INTEGER, OPTION_STRING, OPTION_SUB_COMMAND,
};

pub const CREATE_TAG: &str = "createtag";
pub const DELETE_TAG: &str = "deletetag";
pub const EXPORT_TAGS: &str = "exporttags";

/// `MANAGE_GUILD`; members without it do not see the commands.
const MODERATOR_PERMISSIONS: &str = "32";
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command `{0}`.")]
    UnknownCommand(String),
    #[error("Unknown subcommand for `{0}`.")]
    UnknownSubcommand(&'static str),
    #[error("Missing required option `{0}`.")]
    MissingOption(&'static str),
    #[error("Option `{0}` has the wrong type.")]
    InvalidOption(&'static str),
}

/// Command payloads for the bulk-overwrite registration endpoint.
pub fn definitions() -> Vec<Value> {
    vec![
        json!({
            "name": CREATE_TAG,
            "description": "Create/update Roblox tags (auto-synced to your game)",
            "default_member_permissions": MODERATOR_PERMISSIONS,
            "options": TagKind::ALL.map(create_subcommand),
        }),
        json!({
            "name": DELETE_TAG,
            "description": "Delete a Roblox tag",
            "default_member_permissions": MODERATOR_PERMISSIONS,
            "options": TagKind::ALL.map(|kind| json!({
                "type": OPTION_SUB_COMMAND,
                "name": kind.subcommand(),
                "description": format!("Delete the tag for a Roblox {}", kind.as_str()),
                "options": [id_option(kind)],
            })),
        }),
        json!({
            "name": EXPORT_TAGS,
            "description": "Show stored tags as a literal table",
            "default_member_permissions": MODERATOR_PERMISSIONS,
            "options": TagKind::ALL.map(|kind| json!({
                "type": OPTION_SUB_COMMAND,
                "name": kind.subcommand(),
                "description": format!("Export every Roblox {} tag", kind.as_str()),
            })),
        }),
    ]
}

fn id_option(kind: TagKind) -> Value {
    let description = match kind {
        TagKind::Group => "Roblox GroupId",
        TagKind::User => "Roblox UserId",
    };
    json!({
        "type": OPTION_INTEGER,
        "name": kind.id_option(),
        "description": description,
        "required": true,
        "min_value": 1,
    })
}

fn create_subcommand(kind: TagKind) -> Value {
    let description = match kind {
        TagKind::Group => "Create/update a tag for a Roblox Group (crew)",
        TagKind::User => "Create/update a tag for a Roblox User",
    };
    json!({
        "type": OPTION_SUB_COMMAND,
        "name": kind.subcommand(),
        "description": description,
        "options": [
            id_option(kind),
            { "type": OPTION_STRING, "name": "tag", "description": "Tag text", "required": true },
            { "type": OPTION_STRING, "name": "color", "description": "RGB like \"0, 0, 139\"", "required": true },
            { "type": OPTION_STRING, "name": "color2", "description": "Gradient end RGB like \"177, 156, 217\"" },
            { "type": OPTION_BOOLEAN, "name": "bold", "description": "Bold text (true/false)" },
            { "type": OPTION_BOOLEAN, "name": "italic", "description": "Italic text (true/false)" },
            { "type": OPTION_BOOLEAN, "name": "rainbow", "description": "Rainbow per-letter (true/false)" },
            { "type": OPTION_INTEGER, "name": "requiredrank", "description": "Minimum group rank that shows the tag" },
            { "type": OPTION_INTEGER, "name": "order", "description": "Sort order among tags" },
            { "type": OPTION_STRING, "name": "tagstyle", "description": "Style label passed to the game" },
        ],
    })
}

/// Run an application command and build the reply. Never fails; errors become red embeds.
pub async fn dispatch(service: &TagService, data: &CommandData) -> InteractionResponse {
    match run(service, data).await {
        Ok(response) => response,
        Err(Failure::Command(err)) => {
            warn!(
                target = "crewtag::discord::commands",
                command = %data.name,
                error = %err,
                "rejected command"
            );
            InteractionResponse::failure(err.to_string())
        }
        Err(Failure::Tag(err)) => tag_failure(&data.name, err),
    }
}

enum Failure {
    Command(CommandError),
    Tag(TagError),
}

impl From<CommandError> for Failure {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<TagError> for Failure {
    fn from(err: TagError) -> Self {
        Self::Tag(err)
    }
}

async fn run(service: &TagService, data: &CommandData) -> Result<InteractionResponse, Failure> {
    let command: &'static str = match data.name.as_str() {
        CREATE_TAG => CREATE_TAG,
        DELETE_TAG => DELETE_TAG,
        EXPORT_TAGS => EXPORT_TAGS,
        other => return Err(CommandError::UnknownCommand(other.to_string()).into()),
    };

    let (kind, options) = subcommand(command, &data.options)?;
    let options = Options(options);

    match command {
        CREATE_TAG => {
            let save = SaveTagCommand {
                id: options.required_id(kind.id_option())?,
                tag: options.required_str("tag")?.to_string(),
                color: options.required_str("color")?.to_string(),
                color2: options.str("color2")?.map(str::to_string),
                bold: options.bool("bold")?.unwrap_or(false),
                italic: options.bool("italic")?.unwrap_or(false),
                rainbow: options.bool("rainbow")?.unwrap_or(false),
                order: options.int("order")?,
                required_rank: options.int("requiredrank")?,
                tag_style: options.str("tagstyle")?.map(str::to_string),
            };
            let saved = service.save(kind, save).await?;
            let verb = if saved.replaced { "updated" } else { "saved" };
            Ok(InteractionResponse::success(format!(
                "{} tag {verb} for {} {}. Roblox will auto-sync.",
                title(kind),
                kind.label(),
                saved.id
            )))
        }
        DELETE_TAG => {
            let id = options.required_id(kind.id_option())?;
            service.delete(kind, id).await?;
            Ok(InteractionResponse::success(format!(
                "{} tag deleted for {} {id}.",
                title(kind),
                kind.label()
            )))
        }
        _ => {
            let block = service.export(kind).await?;
            if block.chars().count() > EMBED_DESCRIPTION_LIMIT {
                return Ok(InteractionResponse::failure(
                    "Too many tags to show here. Run `crewtag export` on the host instead.",
                ));
            }
            let mut response = InteractionResponse::success(block);
            if let Some(data) = response.data.as_mut() {
                data.flags = Some(FLAG_EPHEMERAL);
            }
            Ok(response)
        }
    }
}

fn title(kind: TagKind) -> &'static str {
    match kind {
        TagKind::Group => "Crew",
        TagKind::User => "User",
    }
}

fn tag_failure(command: &str, err: TagError) -> InteractionResponse {
    match &err {
        TagError::Repo(repo) => {
            warn!(
                target = "crewtag::discord::commands",
                command,
                error = %repo,
                "tag storage failed"
            );
            InteractionResponse::failure("Could not save tags right now. Try again later.")
        }
        _ => {
            info!(
                target = "crewtag::discord::commands",
                command,
                error = %err,
                "tag request rejected"
            );
            InteractionResponse::failure(err.to_string())
        }
    }
}

fn subcommand<'a>(
    command: &'static str,
    options: &'a [CommandOption],
) -> Result<(TagKind, &'a [CommandOption]), CommandError> {
    options
        .iter()
        .find(|option| option.kind == OPTION_SUB_COMMAND)
        .and_then(|option| {
            TagKind::from_subcommand(&option.name).map(|kind| (kind, option.options.as_slice()))
        })
        .ok_or(CommandError::UnknownSubcommand(command))
}

struct Options<'a>(&'a [CommandOption]);

impl<'a> Options<'a> {
    fn value(&self, name: &str) -> Option<&'a serde_json::Value> {
        self.0
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_ref())
    }

    fn str(&self, name: &'static str) -> Result<Option<&'a str>, CommandError> {
        self.value(name)
            .map(|value| value.as_str().ok_or(CommandError::InvalidOption(name)))
            .transpose()
    }

    fn int(&self, name: &'static str) -> Result<Option<i64>, CommandError> {
        self.value(name)
            .map(|value| value.as_i64().ok_or(CommandError::InvalidOption(name)))
            .transpose()
    }

    fn bool(&self, name: &'static str) -> Result<Option<bool>, CommandError> {
        self.value(name)
            .map(|value| value.as_bool().ok_or(CommandError::InvalidOption(name)))
            .transpose()
    }

    fn required_str(&self, name: &'static str) -> Result<&'a str, CommandError> {
        self.str(name)?.ok_or(CommandError::MissingOption(name))
    }

    fn required_id(&self, name: &'static str) -> Result<u64, CommandError> {
        self.value(name)
            .ok_or(CommandError::MissingOption(name))?
            .as_u64()
            .filter(|id| *id > 0)
            .ok_or(CommandError::InvalidOption(name))
    }
}
