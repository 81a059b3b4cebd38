//! Discord HTTP interactions: request verification, slash commands and registration.

pub mod client;
pub mod commands;
pub mod model;
pub mod verify;

use thiserror::Error;

pub use client::DiscordClient;
pub use verify::InteractionVerifier;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("discord public key must be 32 hex-encoded bytes")]
    InvalidPublicKey,
    #[error("interaction signature is missing or invalid")]
    InvalidSignature,
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discord api returned {status}: {body}")]
    Api { status: u16, body: String },
}
