use crate::utils::UtilError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OAuth2Error {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid return url: {0}")]
    InvalidReturnUrl(String),

    #[error("Security token not found: {0}")]
    SecurityTokenNotFound(String),

    #[error("State mismatch")]
    StateMismatch,

    #[error("Invalid return cookie: {0}")]
    InvalidReturnCookie(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Failed to exchange token: {0}")]
    TokenExchange(String),

    #[error("Failed to fetch user info: {0}")]
    FetchUserInfo(String),

    #[error("Failed to decode user info: {0}")]
    Decode(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl OAuth2Error {
    /// True for failures caused by the request or by the provider, as opposed
    /// to failures inside this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidReturnUrl(_)
                | Self::SecurityTokenNotFound(_)
                | Self::StateMismatch
                | Self::InvalidReturnCookie(_)
                | Self::ProviderError(_)
                | Self::TokenExchange(_)
                | Self::FetchUserInfo(_)
        )
    }
}
