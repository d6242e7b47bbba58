//! Flow cookies: the per-flow `state` and the signed return destination.
//!
//! The return-destination cookie value is `<payload>.<mac>`, both base64url.
//! The payload is the JSON of [`StoredReturnUrl`], which binds the destination
//! to the flow's `state` and an expiry.

use chrono::{DateTime, Utc};
use headers::{Cookie, HeaderMapExt};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::StoredReturnUrl;
use crate::utils::{base64url_decode, base64url_encode};

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.typed_get::<Cookie>()?;
    cookies
        .get(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn states_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256, OAuth2Error> {
    HmacSha256::new_from_slice(secret).map_err(|e| OAuth2Error::Crypto(e.to_string()))
}

pub(crate) fn sign_return_url(
    secret: &[u8],
    stored: &StoredReturnUrl,
) -> Result<String, OAuth2Error> {
    let json = serde_json::to_string(stored).map_err(|e| OAuth2Error::Serde(e.to_string()))?;
    let payload = base64url_encode(json);

    let mut mac = new_mac(secret)?;
    mac.update(payload.as_bytes());
    let signature = base64url_encode(mac.finalize().into_bytes());

    Ok(format!("{payload}.{signature}"))
}

/// Returns the destination carried by a return cookie after checking its
/// signature, its expiry and that it belongs to the flow identified by `state`.
pub(crate) fn verify_return_cookie(
    secret: &[u8],
    value: &str,
    state: &str,
    now: DateTime<Utc>,
) -> Result<String, OAuth2Error> {
    let (payload, signature) = value
        .split_once('.')
        .ok_or_else(|| OAuth2Error::InvalidReturnCookie("Malformed cookie".to_string()))?;

    let signature = base64url_decode(signature)
        .map_err(|_| OAuth2Error::InvalidReturnCookie("Malformed signature".to_string()))?;
    let mut mac = new_mac(secret)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).map_err(|_| {
        tracing::error!("Return cookie signature mismatch");
        OAuth2Error::InvalidReturnCookie("Signature mismatch".to_string())
    })?;

    let json = base64url_decode(payload)
        .map_err(|_| OAuth2Error::InvalidReturnCookie("Malformed payload".to_string()))?;
    let stored: StoredReturnUrl =
        serde_json::from_slice(&json).map_err(|e| OAuth2Error::Serde(e.to_string()))?;

    if now > stored.expires_at {
        tracing::error!("Return cookie expired at {}", stored.expires_at);
        return Err(OAuth2Error::InvalidReturnCookie("Expired".to_string()));
    }
    if !states_match(&stored.state, state) {
        tracing::error!("Return cookie belongs to another flow");
        return Err(OAuth2Error::InvalidReturnCookie(
            "Issued for another login flow".to_string(),
        ));
    }

    Ok(stored.url)
}
