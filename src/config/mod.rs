//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::tags::TagDefaults;
use crate::infra::discord::client::DEFAULT_API_BASE as DEFAULT_DISCORD_API_BASE;

pub use cli::{CliArgs, Command, KindArgs, Overrides, PreviewArgs, RegisterArgs, ServeArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "crewtag";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 10;
const DEFAULT_STORE_DIR: &str = "data";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub discord: DiscordSettings,
    pub store: StoreSettings,
    pub api: ApiSettings,
    pub tags: TagDefaults,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DiscordSettings {
    pub token: Option<String>,
    pub application_id: Option<String>,
    pub guild_id: Option<String>,
    pub public_key: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// `None` leaves the tag feed unauthenticated.
    pub key: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("CREWTAG").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_overrides(&cli.overrides);
    if let Some(Command::Serve(args)) = cli.command.as_ref() {
        raw.apply_serve_overrides(args);
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    discord: RawDiscordSettings,
    store: RawStoreSettings,
    api: RawApiSettings,
    tags: RawTagSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(directory) = overrides.store_directory.as_ref() {
            self.store.directory = Some(directory.clone());
        }
        if let Some(token) = overrides.discord_token.as_ref() {
            self.discord.token = Some(token.clone());
        }
        if let Some(id) = overrides.discord_application_id.as_ref() {
            self.discord.application_id = Some(id.clone());
        }
        if let Some(id) = overrides.discord_guild_id.as_ref() {
            self.discord.guild_id = Some(id.clone());
        }
        if let Some(key) = overrides.discord_public_key.as_ref() {
            self.discord.public_key = Some(key.clone());
        }
        if let Some(base) = overrides.discord_api_base.as_ref() {
            self.discord.api_base = Some(base.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.api.key = Some(key.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeArgs) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            discord,
            store,
            api,
            tags,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            discord: build_discord_settings(discord)?,
            store: build_store_settings(store)?,
            api: ApiSettings {
                key: non_blank(api.key),
            },
            tags: build_tag_defaults(tags)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_discord_settings(discord: RawDiscordSettings) -> Result<DiscordSettings, LoadError> {
    let application_id = non_blank(discord.application_id);
    if let Some(id) = application_id.as_deref() {
        ensure_snowflake(id, "discord.application_id")?;
    }

    let guild_id = non_blank(discord.guild_id);
    if let Some(id) = guild_id.as_deref() {
        ensure_snowflake(id, "discord.guild_id")?;
    }

    let public_key = non_blank(discord.public_key);
    let malformed_key = public_key
        .as_deref()
        .is_some_and(|key| key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()));
    if malformed_key {
        return Err(LoadError::invalid(
            "discord.public_key",
            "expected 64 hexadecimal characters",
        ));
    }

    let api_base =
        non_blank(discord.api_base).unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string());

    Ok(DiscordSettings {
        token: non_blank(discord.token),
        application_id,
        guild_id,
        public_key,
        api_base,
    })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let directory = store
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "store.directory",
            "path must not be empty",
        ));
    }

    Ok(StoreSettings { directory })
}

fn build_tag_defaults(tags: RawTagSettings) -> Result<TagDefaults, LoadError> {
    let fallback = TagDefaults::default();

    let tag_style = match tags.default_tag_style {
        Some(style) if style.trim().is_empty() => {
            return Err(LoadError::invalid(
                "tags.default_tag_style",
                "must not be blank",
            ));
        }
        Some(style) => style.trim().to_string(),
        None => fallback.tag_style,
    };

    Ok(TagDefaults {
        order: tags.default_order.unwrap_or(fallback.order),
        required_rank: tags.default_required_rank.unwrap_or(fallback.required_rank),
        tag_style,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDiscordSettings {
    token: Option<String>,
    application_id: Option<String>,
    guild_id: Option<String>,
    public_key: Option<String>,
    api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTagSettings {
    default_order: Option<i64>,
    default_required_rank: Option<i64>,
    default_tag_style: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn ensure_snowflake(value: &str, key: &'static str) -> Result<(), LoadError> {
    match value.parse::<u64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(LoadError::invalid(key, "expected a numeric Discord id")),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
