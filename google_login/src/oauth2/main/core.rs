use chrono::{Duration, Utc};
use http::header::HeaderMap;
use url::Url;

use crate::oauth2::config::OAuth2Config;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{
    AuthRequest, AuthResponse, DeliveryMode, StoredReturnUrl, UserProfile,
};
use crate::utils::{gen_random_string, header_set_cookie};

use super::cookie::{cookie_value, sign_return_url, states_match, verify_return_cookie};
use super::google::{exchange_code_for_token, fetch_user_profile, get_client};

/// A callback that passed every local check and is ready for the code exchange.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    pub code: String,
    /// Destination recovered from the return cookie, in redirect delivery mode
    pub return_to: Option<String>,
}

/// The outcome of a completed callback.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub profile: UserProfile,
    pub return_to: Option<String>,
}

/// The login service: configuration plus the outbound HTTP client.
///
/// Construct once at startup and share it between requests; it holds no
/// per-flow state.
#[derive(Debug, Clone)]
pub struct GoogleLogin {
    config: OAuth2Config,
    client: reqwest::Client,
}

impl GoogleLogin {
    pub fn new(config: OAuth2Config) -> Result<Self, OAuth2Error> {
        config.validate()?;
        let client = get_client(config.http_timeout)?;
        tracing::debug!("Login service configured: {:?}", config);
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.config.delivery_mode
    }

    /// Builds the provider redirect for a new flow.
    ///
    /// Returns the authorization URL and the `Set-Cookie` headers carrying the
    /// flow's `state` and, in redirect delivery mode, the signed return
    /// destination.
    pub fn prepare_auth_request(
        &self,
        request: &AuthRequest,
    ) -> Result<(String, HeaderMap), OAuth2Error> {
        let requested = request.url.as_deref().map(str::trim).filter(|u| !u.is_empty());

        let return_to = match (self.config.delivery_mode, requested) {
            (DeliveryMode::Redirect, Some(url)) => Some(self.validate_return_url(url)?),
            (DeliveryMode::Redirect, None) => {
                return Err(OAuth2Error::MissingParameter("url".to_string()));
            }
            (_, Some(url)) => {
                tracing::debug!("Ignoring return url {} outside redirect mode", url);
                None
            }
            (_, None) => None,
        };

        let state = gen_random_string(32)?;
        let max_age = i64::try_from(self.config.flow_cookie_max_age)
            .map_err(|e| OAuth2Error::Config(format!("Invalid flow_cookie_max_age: {e}")))?;
        let mut headers = HeaderMap::new();

        header_set_cookie(
            &mut headers,
            &self.config.state_cookie_name,
            &state,
            max_age,
            self.config.cookie_secure,
        )?;

        if let Some(url) = return_to {
            let stored = StoredReturnUrl {
                url,
                state: state.clone(),
                expires_at: Duration::try_seconds(max_age)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .ok_or_else(|| {
                        OAuth2Error::Config(format!("flow_cookie_max_age out of range: {max_age}"))
                    })?,
            };
            let value = sign_return_url(&self.config.cookie_secret, &stored)?;
            header_set_cookie(
                &mut headers,
                &self.config.return_cookie_name,
                &value,
                max_age,
                self.config.cookie_secure,
            )?;
        }

        let auth_url = self.authorization_url(&state)?;
        tracing::debug!("Auth URL: {:#?}", auth_url);

        Ok((auth_url, headers))
    }

    /// The provider authorization URL for a flow identified by `state`.
    pub fn authorization_url(&self, state: &str) -> Result<String, OAuth2Error> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| OAuth2Error::Config(format!("Invalid auth_url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.config.scopes.join(" "))
                .append_pair("state", state)
                .append_pair("access_type", "offline");
            if let Some(prompt) = &self.config.prompt {
                query.append_pair("prompt", prompt);
            }
        }
        Ok(url.into())
    }

    /// Accepts absolute http(s) URLs whose origin is allowed.
    pub fn validate_return_url(&self, return_url: &str) -> Result<String, OAuth2Error> {
        let parsed = Url::parse(return_url)
            .map_err(|e| OAuth2Error::InvalidReturnUrl(format!("{return_url}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(OAuth2Error::InvalidReturnUrl(format!(
                "{return_url}: must be an absolute http(s) URL"
            )));
        }

        let allowed = &self.config.allowed_return_origins;
        if !allowed.is_empty() {
            let origin = parsed.origin().ascii_serialization();
            if !allowed.iter().any(|a| *a == origin) {
                tracing::error!("Return url origin {} is not allowed", origin);
                return Err(OAuth2Error::InvalidReturnUrl(format!(
                    "{return_url}: origin not allowed"
                )));
            }
        }

        Ok(return_url.to_string())
    }

    /// Local checks on the provider callback, before any outbound call.
    pub fn verify_callback(
        &self,
        auth_response: &AuthResponse,
        headers: &HeaderMap,
    ) -> Result<VerifiedCallback, OAuth2Error> {
        if let Some(error) = &auth_response.error {
            let detail = match &auth_response.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error.clone(),
            };
            return Err(OAuth2Error::ProviderError(detail));
        }

        let code = auth_response
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuth2Error::MissingParameter("code".to_string()))?;

        let state = auth_response
            .state
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OAuth2Error::MissingParameter("state".to_string()))?;

        let expected_state = cookie_value(headers, &self.config.state_cookie_name)
            .ok_or_else(|| {
                OAuth2Error::SecurityTokenNotFound("No state cookie found".to_string())
            })?;

        if !states_match(&expected_state, state) {
            tracing::error!("State in callback does not match the state cookie");
            return Err(OAuth2Error::StateMismatch);
        }

        let return_to = if self.config.delivery_mode == DeliveryMode::Redirect {
            let value = cookie_value(headers, &self.config.return_cookie_name).ok_or_else(|| {
                OAuth2Error::SecurityTokenNotFound("No return url cookie found".to_string())
            })?;
            Some(verify_return_cookie(
                &self.config.cookie_secret,
                &value,
                state,
                Utc::now(),
            )?)
        } else {
            None
        };

        Ok(VerifiedCallback {
            code: code.to_string(),
            return_to,
        })
    }

    /// Exchanges the code for a token and uses it once to fetch the profile.
    pub async fn fetch_profile(&self, code: &str) -> Result<UserProfile, OAuth2Error> {
        tracing::debug!("Flow stage: exchanging token");
        let token = exchange_code_for_token(&self.client, &self.config, code).await?;

        tracing::debug!("Flow stage: fetching profile");
        let profile = fetch_user_profile(&self.client, &self.config, &token.access_token).await?;

        tracing::debug!("Profile received for user id {}", profile.id);
        Ok(profile)
    }

    /// Runs the whole callback: local checks, code exchange and profile fetch.
    pub async fn get_user_profile(
        &self,
        auth_response: &AuthResponse,
        headers: &HeaderMap,
    ) -> Result<AuthorizedUser, OAuth2Error> {
        let verified = self.verify_callback(auth_response, headers)?;
        let profile = self.fetch_profile(&verified.code).await?;

        tracing::debug!("Flow stage: delivering via {}", self.config.delivery_mode.as_str());
        Ok(AuthorizedUser {
            profile,
            return_to: verified.return_to,
        })
    }

    /// `Set-Cookie` headers that drop the flow cookies once the callback is handled.
    pub fn clear_flow_cookies(&self) -> Result<HeaderMap, OAuth2Error> {
        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            &self.config.state_cookie_name,
            "",
            0,
            self.config.cookie_secure,
        )?;
        if self.config.delivery_mode == DeliveryMode::Redirect {
            header_set_cookie(
                &mut headers,
                &self.config.return_cookie_name,
                "",
                0,
                self.config.cookie_secure,
            )?;
        }
        Ok(headers)
    }
}

/// `<return_to>?user=<url-encoded profile JSON>`
///
/// `user` is appended to any existing query; a fragment stays after the query.
pub fn redirect_with_profile(
    return_to: &str,
    profile: &UserProfile,
) -> Result<String, OAuth2Error> {
    let json = serde_json::to_string(profile).map_err(|e| OAuth2Error::Serde(e.to_string()))?;
    let mut url = Url::parse(return_to)
        .map_err(|e| OAuth2Error::InvalidReturnUrl(format!("{return_to}: {e}")))?;

    let user = format!("user={}", urlencoding::encode(&json));
    let query = match url.query().filter(|q| !q.is_empty()) {
        Some(existing) => format!("{existing}&{user}"),
        None => user,
    };
    url.set_query(Some(&query));

    Ok(url.into())
}
