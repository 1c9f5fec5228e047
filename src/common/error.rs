use std::time::Duration;
use thiserror::Error;

/// Failures while establishing a Garmin session or authorizing with Strava.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The SSO response carried no redirect URL: wrong credentials or a changed login page.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("{step}: unexpected status code {code}: {body}")]
    UnexpectedStatus {
        step: &'static str,
        code: u16,
        body: String,
    },

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Authorization was declined in the browser: {0}")]
    AccessDenied(String),

    #[error("No OAuth callback received within {0:?}")]
    TimedOut(Duration),

    #[error("Authorization cancelled")]
    Cancelled,

    #[error("OAuth callback listener failed: {0}")]
    Listener(#[source] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest_middleware::Error),
}

/// Failures listing or exporting Garmin activities.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{resource}: unexpected status code {code}: {body}")]
    UnexpectedStatus {
        resource: String,
        code: u16,
        body: String,
    },

    #[error("{resource}: failed to decode response: {reason}")]
    DecodeFailed { resource: String, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest_middleware::Error),
}

/// Failures pushing an activity to Strava.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload activity: unexpected status code {code}: {body}")]
    UnexpectedStatus { code: u16, body: String },

    #[error("Upload activity: failed to decode response: {0}")]
    DecodeFailed(#[from] serde_json::Error),

    /// A 2xx response whose body still reports an error.
    #[error("Upload activity rejected: {0}")]
    LogicalFailure(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest_middleware::Error),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(reqwest_middleware::Error::Reqwest(err))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(reqwest_middleware::Error::Reqwest(err))
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Network(reqwest_middleware::Error::Reqwest(err))
    }
}

/// Reads a failed response body for diagnostics; a body that cannot be read is reported as empty.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
