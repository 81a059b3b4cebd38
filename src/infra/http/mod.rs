mod feed;
mod interactions;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::tags::TagService;
use crate::infra::discord::InteractionVerifier;

#[derive(Clone)]
pub struct HttpState {
    pub tags: Arc<TagService>,
    /// Shared secret for the tag feed; `None` serves it unauthenticated.
    pub api_key: Option<Arc<str>>,
    /// Present when a Discord public key is configured.
    pub verifier: Option<Arc<InteractionVerifier>>,
}

pub fn build_router(state: HttpState) -> Router {
    let feed_routes = Router::new()
        .route("/tags/groups", get(feed::list_group_tags))
        .route("/tags/users", get(feed::list_user_tags))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    let mut router = Router::new()
        .route("/", get(feed::health))
        .merge(feed_routes);

    if state.verifier.is_some() {
        router = router.route("/interactions", post(interactions::handle));
    }

    router
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
