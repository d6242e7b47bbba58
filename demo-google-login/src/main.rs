use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use google_login_axum::{GoogleLogin, OAuth2Config, google_login_router};

mod server;

use crate::server::spawn_http_server;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,google_login=debug,google_login_axum=debug,tower_http=info",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = OAuth2Config::from_env()?;
    tracing::info!(
        "Delivering profiles as {}, callback at {}",
        config.delivery_mode.as_str(),
        config.redirect_uri
    );
    let login = Arc::new(GoogleLogin::new(config)?);

    let port = match std::env::var("PORT") {
        Ok(p) => p.parse()?,
        Err(_) => DEFAULT_PORT,
    };

    let app = google_login_router(login);
    spawn_http_server(port, app).await??;
    Ok(())
}
