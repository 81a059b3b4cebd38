use reqwest::{Client, StatusCode, Url, header::AUTHORIZATION};
use serde_json::Value;
use tracing::info;

use super::DiscordError;
use super::commands;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10/";

/// Minimal REST client for the application command endpoints.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: Client,
    base: Url,
    token: String,
}

impl DiscordClient {
    pub fn new(api_base: &str, token: impl Into<String>) -> Result<Self, DiscordError> {
        let mut base = Url::parse(api_base)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("DiscordBot (crewtag, ", env!("CARGO_PKG_VERSION"), ")")
    }

    pub fn commands_url(&self, application_id: &str, guild_id: &str) -> Result<Url, DiscordError> {
        let path = format!("applications/{application_id}/guilds/{guild_id}/commands");
        Ok(self.base.join(&path)?)
    }

    /// Replace the guild's command set with [`commands::definitions`].
    pub async fn register_guild_commands(
        &self,
        application_id: &str,
        guild_id: &str,
    ) -> Result<usize, DiscordError> {
        let url = self.commands_url(application_id, guild_id)?;
        let body = commands::definitions();

        let response = self
            .client
            .put(url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let registered: Vec<Value> = response.json().await?;
        info!(
            target = "crewtag::discord::client",
            application_id,
            guild_id,
            commands = registered.len(),
            "slash commands registered"
        );
        Ok(registered.len())
    }
}
