use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::OAuth2Error;

/// The user data we get back from the provider's user-info endpoint.
///
/// Fields the user has not shared are absent from the provider response and
/// decode to their empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(alias = "sub")]
    pub id: String,
    pub email: String,
    #[serde(alias = "email_verified")]
    pub verified_email: bool,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: String,
    pub locale: String,
}

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct AuthResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Query parameters accepted by the authorization initiator.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) token_type: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) scope: Option<String>,
    #[serde(default)]
    pub(crate) id_token: Option<String>,
}

/// Payload of the signed return-destination cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredReturnUrl {
    pub(crate) url: String,
    pub(crate) state: String,
    pub(crate) expires_at: DateTime<Utc>,
}

/// How the callback hands the profile back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Respond with the profile as a JSON body.
    #[default]
    Json,
    /// Render an HTML page from the profile.
    Template,
    /// Redirect to the stashed return destination with the profile in `user=`.
    Redirect,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Template => "template",
            Self::Redirect => "redirect",
        }
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "template" => Ok(Self::Template),
            "redirect" => Ok(Self::Redirect),
            _ => Err(OAuth2Error::Config(format!(
                "Invalid delivery mode '{s}'. Must be 'json', 'template' or 'redirect'."
            ))),
        }
    }
}
