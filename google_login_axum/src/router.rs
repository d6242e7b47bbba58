//! Router for the login endpoints

use axum::Router;
use std::sync::Arc;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use google_login::GoogleLogin;

/// Create the router for the login flow
///
/// The endpoints are:
/// - `GET /` and `GET /auth`: start a login, optionally with `?url=<return destination>`
/// - `GET /auth/callback`: the provider's redirect target
///
/// The callback path must match the configured `redirect_uri`.
pub fn google_login_router(login: Arc<GoogleLogin>) -> Router {
    super::oauth2::router(login).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(true),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`google_login_router`] without the HTTP tracing middleware.
pub fn google_login_router_no_trace(login: Arc<GoogleLogin>) -> Router {
    super::oauth2::router(login)
}
