use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use std::sync::Arc;

use google_login::{
    AuthRequest, AuthResponse, DeliveryMode, GoogleLogin, OAuth2Error, UserProfile,
    redirect_with_profile,
};

use super::error::IntoResponseError;

pub(super) fn router(login: Arc<GoogleLogin>) -> Router {
    Router::new()
        .route("/", get(google_auth))
        .route("/auth", get(google_auth))
        .route("/auth/callback", get(get_authorized))
        .with_state(login)
}

#[derive(Template)]
#[template(path = "profile.j2", escape = "html")]
struct ProfileTemplate<'a> {
    user: &'a UserProfile,
}

async fn google_auth(
    State(login): State<Arc<GoogleLogin>>,
    Query(request): Query<AuthRequest>,
) -> Result<(HeaderMap, Redirect), (StatusCode, String)> {
    let (auth_url, headers) = login.prepare_auth_request(&request).into_response_error()?;

    Ok((headers, Redirect::temporary(&auth_url)))
}

/// Provider redirect target. The flow cookies are dropped whatever the outcome.
async fn get_authorized(
    State(login): State<Arc<GoogleLogin>>,
    Query(query): Query<AuthResponse>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Response), (StatusCode, HeaderMap, String)> {
    let cleared = login
        .clear_flow_cookies()
        .into_response_error()
        .map_err(|(status, message)| (status, HeaderMap::new(), message))?;

    match deliver_profile(&login, &query, &headers).await {
        Ok(response) => Ok((cleared, response)),
        Err((status, message)) => Err((status, cleared, message)),
    }
}

async fn deliver_profile(
    login: &GoogleLogin,
    query: &AuthResponse,
    headers: &HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    let user = login
        .get_user_profile(query, headers)
        .await
        .into_response_error()?;

    match login.delivery_mode() {
        DeliveryMode::Json => Ok(Json(user.profile).into_response()),
        DeliveryMode::Template => {
            let template = ProfileTemplate {
                user: &user.profile,
            };
            let html = Html(template.render().into_response_error()?);
            Ok(html.into_response())
        }
        DeliveryMode::Redirect => {
            let location = user
                .return_to
                .ok_or_else(|| OAuth2Error::Internal("Return url not recovered".to_string()))
                .and_then(|return_to| redirect_with_profile(&return_to, &user.profile))
                .into_response_error()?;
            tracing::debug!("Redirecting to {}", location);
            Ok(Redirect::temporary(&location).into_response())
        }
    }
}
