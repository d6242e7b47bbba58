mod config;
mod errors;
mod main;
mod types;

pub use config::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL, OAuth2Config};
pub use errors::OAuth2Error;
pub use main::{AuthorizedUser, GoogleLogin, VerifiedCallback, redirect_with_profile};
pub use types::{AuthRequest, AuthResponse, DeliveryMode, UserProfile};
