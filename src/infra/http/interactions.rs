use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;

use crate::application::error::HttpError;
use crate::infra::discord::{
    DiscordError, commands,
    model::{INTERACTION_APPLICATION_COMMAND, INTERACTION_PING, Interaction, InteractionResponse},
    verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
};

use super::HttpState;

const SOURCE: &str = "infra::http::interactions";

/// Discord interactions endpoint. The body is verified before it is parsed.
pub(super) async fn handle(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(verifier) = state.verifier.as_deref() else {
        return HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Not found",
            "interactions endpoint is disabled",
        )
        .into_response();
    };

    let verified = match (
        header_value(&headers, SIGNATURE_HEADER),
        header_value(&headers, TIMESTAMP_HEADER),
    ) {
        (Some(signature), Some(timestamp)) => verifier.verify(signature, timestamp, &body),
        _ => Err(DiscordError::InvalidSignature),
    };
    if let Err(err) = verified {
        return HttpError::from_error(
            SOURCE,
            StatusCode::UNAUTHORIZED,
            "invalid request signature",
            &err,
        )
        .into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Malformed interaction",
                &err,
            )
            .into_response();
        }
    };

    match (interaction.kind, interaction.data.as_ref()) {
        (INTERACTION_PING, _) => Json(InteractionResponse::pong()).into_response(),
        (INTERACTION_APPLICATION_COMMAND, Some(data)) => {
            info!(
                target = "crewtag::discord::interactions",
                command = %data.name,
                interaction_id = interaction.id.as_deref().unwrap_or(""),
                guild_id = interaction.guild_id.as_deref().unwrap_or(""),
                invoker = interaction.invoker_id().unwrap_or(""),
                "application command received"
            );
            Json(commands::dispatch(&state.tags, data).await).into_response()
        }
        (kind, _) => HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Unsupported interaction",
            format!("interaction type {kind} is not handled"),
        )
        .into_response(),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
