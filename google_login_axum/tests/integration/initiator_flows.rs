use crate::common::{TestServer, set_cookie_headers};
use google_login_axum::DeliveryMode;
use reqwest::{StatusCode, header::LOCATION};
use std::collections::HashMap;

fn query_of(url: &str) -> HashMap<String, String> {
    url::Url::parse(url)
        .expect("Invalid url")
        .query_pairs()
        .into_owned()
        .collect()
}

/// Both entry paths redirect to the provider's authorization endpoint
#[tokio::test]
async fn test_initiator_redirects_to_provider() {
    let server = TestServer::start(DeliveryMode::Json).await;

    for path in ["/", "/auth"] {
        let response = server.get(path).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");

        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        let url = url::Url::parse(&location).unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/auth");

        let query = query_of(&location);
        assert_eq!(query["client_id"], "test-client-id");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["access_type"], "offline");
        assert_eq!(query["scope"], "email profile");
        assert_eq!(query["redirect_uri"], "http://localhost:8000/auth/callback");
        assert!(!query["state"].is_empty());
    }
}

/// The state in the redirect is the one stored in the state cookie
#[tokio::test]
async fn test_initiator_state_matches_cookie() {
    let server = TestServer::start(DeliveryMode::Json).await;
    let flow = server.start_login(None).await;

    assert_eq!(flow.cookies, format!("oauth2_state={}", flow.state));
    assert_eq!(query_of(&flow.auth_url)["state"], flow.state);
}

#[tokio::test]
async fn test_initiator_cookie_attributes() {
    let server = TestServer::start(DeliveryMode::Json).await;
    let response = server.get("/auth").await;

    let cookies = set_cookie_headers(&response);
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("oauth2_state="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=300"));
}

/// Every flow gets its own state
#[tokio::test]
async fn test_initiator_states_differ_between_flows() {
    let server = TestServer::start(DeliveryMode::Json).await;
    let first = server.start_login(None).await;
    let second = server.start_login(None).await;
    assert_ne!(first.state, second.state);
}

/// In redirect mode a missing return destination stops the flow before any cookie or redirect
#[tokio::test]
async fn test_redirect_mode_initiator_without_url_is_rejected() {
    let server = TestServer::start(DeliveryMode::Redirect).await;

    for path in ["/", "/auth", "/auth?url="] {
        let response = server.get(path).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        assert!(response.headers().get(LOCATION).is_none());
        assert!(set_cookie_headers(&response).is_empty());
        assert_eq!(response.text().await.unwrap(), "Missing parameter: url");
    }
}

#[tokio::test]
async fn test_redirect_mode_initiator_rejects_non_http_url() {
    let server = TestServer::start(DeliveryMode::Redirect).await;

    for url in ["javascript:alert(1)", "not-a-url", "/relative/path"] {
        let path = format!("/auth?url={}", urlencoding::encode(url));
        let response = server.get(&path).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url}");
        assert!(set_cookie_headers(&response).is_empty());
    }
}

/// Redirect mode stores a signed return destination next to the state cookie
#[tokio::test]
async fn test_redirect_mode_initiator_sets_return_cookie() {
    let server = TestServer::start(DeliveryMode::Redirect).await;
    let response = server
        .get(&format!(
            "/auth?url={}",
            urlencoding::encode("https://front.end/done")
        ))
        .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookies = set_cookie_headers(&response);
    assert_eq!(cookies.len(), 2);
    let return_cookie = cookies
        .iter()
        .find(|c| c.starts_with("urlFe="))
        .expect("No return cookie");
    assert!(return_cookie.contains("HttpOnly"));
    assert!(!return_cookie.contains("front.end"), "destination is not stored in clear text");
}

/// Outside redirect mode a supplied url is accepted but not stored
#[tokio::test]
async fn test_json_mode_initiator_ignores_url() {
    let server = TestServer::start(DeliveryMode::Json).await;
    let flow = server.start_login(Some("https://front.end/done")).await;
    assert!(!flow.cookies.contains("urlFe="));
}
