//! Scraping of the SSO login response.
//!
//! After a successful credential POST the login page embeds a JavaScript
//! assignment such as `var response_url = "https:\/\/connect.garmin.com\/modern\/?ticket=ST-...";`.
//! Following that URL upgrades the ticket-granting cookie into Connect session cookies.

use crate::common::error::AuthError;
use regex::bytes::Regex;
use reqwest::Url;
use std::sync::LazyLock;

static RESPONSE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bresponse_url\s*=\s*"([^"]*)""#).expect("response_url pattern is valid")
});

/// Extracts and unescapes the `response_url` redirect from a login response body.
pub fn extract_response_url(body: &[u8]) -> Result<Url, AuthError> {
    let captured = RESPONSE_URL
        .captures(body)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| {
            AuthError::LoginFailed("response URL not found - login probably failed".to_string())
        })?;

    let raw = String::from_utf8_lossy(captured.as_bytes());
    let unescaped = unescape(&raw);
    if unescaped.is_empty() {
        return Err(AuthError::LoginFailed("response URL is empty".to_string()));
    }

    Url::parse(&unescaped)
        .map_err(|e| AuthError::LoginFailed(format!("response URL {unescaped:?} is invalid: {e}")))
}

/// Drops each escaping backslash, keeping the character it escapes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
