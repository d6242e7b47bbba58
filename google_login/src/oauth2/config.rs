use std::{fmt, time::Duration};
use url::Url;

use super::errors::OAuth2Error;
use super::types::DeliveryMode;
use crate::utils::gen_random_string;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/auth/callback";
const DEFAULT_SCOPES: &str = "email profile";
const DEFAULT_STATE_COOKIE_NAME: &str = "oauth2_state";
const DEFAULT_RETURN_COOKIE_NAME: &str = "urlFe";
const DEFAULT_FLOW_COOKIE_MAX_AGE: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MAX_FLOW_COOKIE_MAX_AGE: u64 = 24 * 60 * 60;

/// Client registration and flow settings for one provider.
///
/// Built once at startup and owned by [`GoogleLogin`](crate::GoogleLogin).
#[derive(Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Optional `prompt` value (`none`, `consent`, `select_account`)
    pub prompt: Option<String>,
    /// Timeout applied to every outbound call to the provider
    pub http_timeout: Duration,
    pub delivery_mode: DeliveryMode,
    /// Origins a return destination may point at. Empty means any http(s) origin.
    pub allowed_return_origins: Vec<String>,
    pub state_cookie_name: String,
    pub return_cookie_name: String,
    /// Lifetime in seconds of the state and return-destination cookies
    pub flow_cookie_max_age: u64,
    pub cookie_secure: bool,
    /// HMAC key for the return-destination cookie
    pub cookie_secret: Vec<u8>,
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("prompt", &self.prompt)
            .field("http_timeout", &self.http_timeout)
            .field("delivery_mode", &self.delivery_mode)
            .field("allowed_return_origins", &self.allowed_return_origins)
            .field("state_cookie_name", &self.state_cookie_name)
            .field("return_cookie_name", &self.return_cookie_name)
            .field("flow_cookie_max_age", &self.flow_cookie_max_age)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_secret", &"<redacted>")
            .finish()
    }
}

impl OAuth2Config {
    /// Google endpoints and defaults for everything but the client credentials.
    ///
    /// The cookie signing key is random, so return-destination cookies only
    /// verify within this process.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, OAuth2Error> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: parse_scopes(DEFAULT_SCOPES),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            prompt: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            delivery_mode: DeliveryMode::default(),
            allowed_return_origins: Vec::new(),
            state_cookie_name: DEFAULT_STATE_COOKIE_NAME.to_string(),
            return_cookie_name: DEFAULT_RETURN_COOKIE_NAME.to_string(),
            flow_cookie_max_age: DEFAULT_FLOW_COOKIE_MAX_AGE,
            cookie_secure: false,
            cookie_secret: gen_random_string(32)?.into_bytes(),
        })
    }

    /// Creates a configuration from environment variables.
    pub fn from_env() -> Result<Self, OAuth2Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OAuth2Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("CLIENT_ID")
            .ok_or_else(|| OAuth2Error::Config("CLIENT_ID must be set".to_string()))?;
        let client_secret = lookup("CLIENT_SECRET")
            .ok_or_else(|| OAuth2Error::Config("CLIENT_SECRET must be set".to_string()))?;

        let mut config = Self::new(client_id, client_secret)?;

        if let Some(v) = lookup("OAUTH2_REDIRECT_URI") {
            config.redirect_uri = v;
        }
        if let Some(v) = lookup("OAUTH2_SCOPES") {
            config.scopes = parse_scopes(&v);
        }
        if let Some(v) = lookup("OAUTH2_AUTH_URL") {
            config.auth_url = v;
        }
        if let Some(v) = lookup("OAUTH2_TOKEN_URL") {
            config.token_url = v;
        }
        if let Some(v) = lookup("OAUTH2_USERINFO_URL") {
            config.userinfo_url = v;
        }
        config.prompt = lookup("OAUTH2_PROMPT").filter(|p| !p.is_empty());

        if let Some(v) = lookup("OAUTH2_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse_number("OAUTH2_HTTP_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("OAUTH2_DELIVERY_MODE") {
            config.delivery_mode = v.parse()?;
        }
        if let Some(v) = lookup("OAUTH2_ALLOWED_RETURN_ORIGINS") {
            config.allowed_return_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(normalize_origin)
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = lookup("OAUTH2_STATE_COOKIE_NAME") {
            config.state_cookie_name = v;
        }
        if let Some(v) = lookup("OAUTH2_RETURN_COOKIE_NAME") {
            config.return_cookie_name = v;
        }
        if let Some(v) = lookup("OAUTH2_FLOW_COOKIE_MAX_AGE") {
            config.flow_cookie_max_age = parse_number("OAUTH2_FLOW_COOKIE_MAX_AGE", &v)?;
        }
        if let Some(v) = lookup("OAUTH2_COOKIE_SECURE") {
            config.cookie_secure = parse_bool("OAUTH2_COOKIE_SECURE", &v)?;
        }

        match lookup("AUTH_SERVER_SECRET") {
            Some(secret) if !secret.is_empty() => config.cookie_secret = secret.into_bytes(),
            _ if config.delivery_mode == DeliveryMode::Redirect => {
                return Err(OAuth2Error::Config(
                    "AUTH_SERVER_SECRET must be set in redirect delivery mode".to_string(),
                ));
            }
            _ => {
                tracing::warn!("AUTH_SERVER_SECRET not set, using a per-process random key");
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that every endpoint is an absolute URL and the cookie names are usable.
    pub fn validate(&self) -> Result<(), OAuth2Error> {
        for (name, value) in [
            ("redirect_uri", &self.redirect_uri),
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("userinfo_url", &self.userinfo_url),
        ] {
            Url::parse(value)
                .map_err(|e| OAuth2Error::Config(format!("Invalid {name} '{value}': {e}")))?;
        }

        for name in [&self.state_cookie_name, &self.return_cookie_name] {
            if name.is_empty() || name.contains([';', '=', ' ', ',']) {
                return Err(OAuth2Error::Config(format!("Invalid cookie name '{name}'")));
            }
        }
        if self.state_cookie_name == self.return_cookie_name {
            return Err(OAuth2Error::Config(
                "State and return cookies must have different names".to_string(),
            ));
        }
        if self.flow_cookie_max_age == 0 || self.flow_cookie_max_age > MAX_FLOW_COOKIE_MAX_AGE {
            return Err(OAuth2Error::Config(format!(
                "Flow cookie max age must be between 1 and {MAX_FLOW_COOKIE_MAX_AGE} seconds, got {}",
                self.flow_cookie_max_age
            )));
        }
        if self.http_timeout.is_zero() {
            return Err(OAuth2Error::Config(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }
        if self.cookie_secret.is_empty() {
            return Err(OAuth2Error::Config("Cookie secret is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_scopes(value: &str) -> Vec<String> {
    value
        .split([' ', ',', '+'])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(key: &str, value: &str) -> Result<u64, OAuth2Error> {
    value
        .trim()
        .parse()
        .map_err(|e| OAuth2Error::Config(format!("Invalid {key} value '{value}': {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, OAuth2Error> {
    match value.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        invalid => Err(OAuth2Error::Config(format!(
            "Invalid {key}: {invalid}. Valid values are: true, false"
        ))),
    }
}

pub(crate) fn normalize_origin(value: &str) -> Result<String, OAuth2Error> {
    let url = Url::parse(value)
        .map_err(|e| OAuth2Error::Config(format!("Invalid origin '{value}': {e}")))?;
    Ok(url.origin().ascii_serialization())
}
