use google_login_axum::{DeliveryMode, GoogleLogin, OAuth2Config, google_login_router};
use reqwest::{Client, Response, header::LOCATION, header::SET_COOKIE};
use std::sync::{Arc, Once};
use tokio::{net::TcpListener, task::JoinHandle};

use super::mock_provider::{MockProvider, ProviderBehavior, TEST_CLIENT_ID, TEST_CLIENT_SECRET};

/// Initialize tracing for tests, honouring RUST_LOG
fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// The login router served on an ephemeral port, wired to its own mock provider
pub struct TestServer {
    pub base_url: String,
    pub provider: MockProvider,
    client: Client,
    handle: JoinHandle<()>,
}

/// What the initiator handed to the browser for one flow
pub struct LoginFlow {
    pub auth_url: String,
    pub state: String,
    /// `Cookie` header value carrying the flow cookies back
    pub cookies: String,
}

impl TestServer {
    pub async fn start(mode: DeliveryMode) -> Self {
        Self::start_with(mode, ProviderBehavior::Succeed).await
    }

    pub async fn start_with(mode: DeliveryMode, behavior: ProviderBehavior) -> Self {
        init_test_tracing();
        let provider = MockProvider::start(behavior).await;

        let mut config =
            OAuth2Config::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET).expect("Failed to build config");
        config.token_url = provider.token_url();
        config.userinfo_url = provider.userinfo_url();
        config.delivery_mode = mode;
        config.cookie_secret = b"integration-test-secret".to_vec();

        let login = Arc::new(GoogleLogin::new(config).expect("Failed to build login service"));
        let app = google_login_router(login);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Test server has no address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server stopped");
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build client");

        Self {
            base_url: format!("http://{addr}"),
            provider,
            client,
            handle,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Calls the callback with the given query pairs and `Cookie` header
    pub async fn callback(&self, query: &[(&str, &str)], cookies: &str) -> Response {
        let mut request = self
            .client
            .get(format!("{}/auth/callback", self.base_url))
            .query(query);
        if !cookies.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookies);
        }
        request.send().await.expect("Request failed")
    }

    /// Runs the initiator and collects what a browser would keep from it
    pub async fn start_login(&self, return_url: Option<&str>) -> LoginFlow {
        let path = match return_url {
            Some(url) => format!("/auth?url={}", urlencoding::encode(url)),
            None => "/auth".to_string(),
        };
        let response = self.get(&path).await;
        assert_eq!(response.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);

        let auth_url = response
            .headers()
            .get(LOCATION)
            .expect("No location header")
            .to_str()
            .expect("Invalid location header")
            .to_string();
        let state = url::Url::parse(&auth_url)
            .expect("Invalid auth url")
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("No state in auth url");

        let cookies = set_cookie_headers(&response)
            .iter()
            .filter_map(|c| c.split(';').next())
            .map(str::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        LoginFlow {
            auth_url,
            state,
            cookies,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Raw `Set-Cookie` header values of a response
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
