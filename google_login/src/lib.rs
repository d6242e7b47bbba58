//! google_login - Google OAuth2 login flow
//!
//! Sends the browser to Google's consent page, receives the authorization
//! code on the callback, exchanges it for an access token and fetches the
//! user's profile. How the profile reaches the caller (JSON, an HTML page or
//! a redirect to a front-end) is decided by [`DeliveryMode`] and carried out
//! by the HTTP layer.
//!
//! Configuration is an explicit [`OAuth2Config`] owned by a [`GoogleLogin`]
//! service; nothing is read from the environment unless
//! [`OAuth2Config::from_env`] is called.

mod oauth2;
mod utils;

pub use oauth2::{
    AuthRequest, AuthResponse, AuthorizedUser, DeliveryMode, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL,
    GOOGLE_USERINFO_URL, GoogleLogin, OAuth2Config, OAuth2Error, UserProfile, VerifiedCallback,
    redirect_with_profile,
};

pub use utils::{UtilError, gen_random_string};
