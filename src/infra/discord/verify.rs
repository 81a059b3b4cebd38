use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use super::DiscordError;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Checks the Ed25519 signature Discord puts on every interaction request.
#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Build from the hex-encoded application public key.
    pub fn from_hex(public_key: &str) -> Result<Self, DiscordError> {
        let bytes: [u8; 32] = hex::decode(public_key.trim())
            .ok()
            .and_then(|raw| raw.try_into().ok())
            .ok_or(DiscordError::InvalidPublicKey)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| DiscordError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// The signed message is the timestamp header followed by the raw body.
    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> Result<(), DiscordError> {
        let bytes: [u8; 64] = hex::decode(signature.trim())
            .ok()
            .and_then(|raw| raw.try_into().ok())
            .ok_or(DiscordError::InvalidSignature)?;
        let signature = Signature::from_bytes(&bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| DiscordError::InvalidSignature)
    }
}
