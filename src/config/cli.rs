use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::tags::TagKind;

/// Command-line arguments for the crewtag binary.
#[derive(Debug, Parser)]
#[command(
    name = "crewtag",
    version,
    about = "Discord bot serving styled Roblox group and user tags"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CREWTAG_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP listener (tag feed and Discord interactions).
    Serve(Box<ServeArgs>),
    /// Register the slash commands with the configured guild.
    Register(RegisterArgs),
    /// Print the rich-text markup for a tag without storing it.
    Preview(PreviewArgs),
    /// Print the stored tags as a pasteable Lua table.
    Export(KindArgs),
    /// Re-render stored tags from their saved style options.
    Rerender(KindArgs),
}

/// Overrides accepted by every subcommand. The legacy environment
/// variables from earlier deployments still apply as fallbacks.
#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the listener port.
    #[arg(long = "server-port", env = "PORT", value_name = "PORT", global = true)]
    pub server_port: Option<u16>,

    /// Override the directory holding the tag documents.
    #[arg(
        long = "store-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub store_directory: Option<PathBuf>,

    /// Bot token used for command registration.
    #[arg(
        long = "discord-token",
        env = "DISCORD_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub discord_token: Option<String>,

    /// Discord application (client) id.
    #[arg(
        long = "discord-application-id",
        env = "CLIENT_ID",
        value_name = "ID",
        global = true
    )]
    pub discord_application_id: Option<String>,

    /// Guild the slash commands are registered in.
    #[arg(
        long = "discord-guild-id",
        env = "GUILD_ID",
        value_name = "ID",
        global = true
    )]
    pub discord_guild_id: Option<String>,

    /// Hex-encoded application public key; enables the interactions endpoint.
    #[arg(
        long = "discord-public-key",
        env = "DISCORD_PUBLIC_KEY",
        value_name = "HEX",
        global = true
    )]
    pub discord_public_key: Option<String>,

    /// Override the Discord REST base URL.
    #[arg(long = "discord-api-base", value_name = "URL", global = true)]
    pub discord_api_base: Option<String>,

    /// Shared secret expected in the `x-api-key` header of feed requests.
    #[arg(
        long = "api-key",
        env = "API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RegisterArgs {
    /// Print the command definitions instead of sending them to Discord.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub print: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    /// Tag text.
    #[arg(long)]
    pub tag: String,

    /// Primary color as "R, G, B".
    #[arg(long)]
    pub color: String,

    /// Secondary color as "R, G, B"; switches to a gradient.
    #[arg(long)]
    pub color2: Option<String>,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub bold: bool,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub italic: bool,

    /// Rainbow gradient; overrides both colors.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub rainbow: bool,
}

#[derive(Debug, Args, Clone)]
pub struct KindArgs {
    /// Which tag document to operate on (group|user).
    #[arg(long, value_name = "KIND")]
    pub kind: TagKind,
}
