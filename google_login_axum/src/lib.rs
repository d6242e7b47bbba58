mod error;
mod oauth2;
mod router;

pub use error::IntoResponseError;
pub use router::{google_login_router, google_login_router_no_trace};

// Re-export the service and its configuration from google_login crate
pub use google_login::{DeliveryMode, GoogleLogin, OAuth2Config, OAuth2Error, UserProfile};
