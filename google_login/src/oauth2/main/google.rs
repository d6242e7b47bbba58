use std::time::Duration;

use crate::oauth2::config::OAuth2Config;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{TokenResponse, UserProfile};

/// Creates the HTTP client used for every call to the provider.
///
/// - `timeout`: bounds each request so a stalled provider cannot hold the
///   inbound request open indefinitely.
/// - `pool_idle_timeout`: 90 seconds, the reqwest default.
/// - `pool_max_idle_per_host`: 32 idle connections per provider host.
pub(crate) fn get_client(timeout: Duration) -> Result<reqwest::Client, OAuth2Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| OAuth2Error::Internal(format!("Failed to create HTTP client: {e}")))
}

pub(crate) async fn exchange_code_for_token(
    client: &reqwest::Client,
    config: &OAuth2Config,
    code: &str,
) -> Result<TokenResponse, OAuth2Error> {
    let response = client
        .post(config.token_url.as_str())
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| OAuth2Error::TokenExchange(e.to_string()))?;

    let status = response.status();
    let response_body = response
        .text()
        .await
        .map_err(|e| OAuth2Error::TokenExchange(e.to_string()))?;

    if !status.is_success() {
        tracing::debug!("Token Exchange Response: {} {}", status, response_body);
        return Err(OAuth2Error::TokenExchange(format!(
            "{status}: {}",
            response_body.trim()
        )));
    }

    let token: TokenResponse = serde_json::from_str(&response_body)
        .map_err(|e| OAuth2Error::TokenExchange(format!("Invalid token response: {e}")))?;

    tracing::debug!(
        "Token received: type={:?}, expires_in={:?}, refresh_token={}",
        token.token_type,
        token.expires_in,
        token.refresh_token.is_some()
    );

    Ok(token)
}

pub(crate) async fn fetch_user_profile(
    client: &reqwest::Client,
    config: &OAuth2Config,
    access_token: &str,
) -> Result<UserProfile, OAuth2Error> {
    let response = client
        .get(config.userinfo_url.as_str())
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OAuth2Error::FetchUserInfo(e.to_string()))?;

    let status = response.status();
    let response_body = response
        .text()
        .await
        .map_err(|e| OAuth2Error::FetchUserInfo(e.to_string()))?;

    if !status.is_success() {
        tracing::debug!("Userinfo Response: {} {}", status, response_body);
        return Err(OAuth2Error::FetchUserInfo(format!(
            "{status}: {}",
            response_body.trim()
        )));
    }

    tracing::debug!("Response Body: {:#?}", response_body);
    let profile: UserProfile =
        serde_json::from_str(&response_body).map_err(|e| OAuth2Error::Decode(e.to_string()))?;

    Ok(profile)
}
