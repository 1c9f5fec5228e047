use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// One activity as listed by the Garmin Connect activity search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub id: i64,
    pub name: String,
    pub upload_date: DateTime<Utc>,
}

impl fmt::Display for ActivityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.name, self.upload_date)
    }
}

/// Raw TCX export of a single activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub activity_id: i64,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Queued,
    Processing,
    Ready,
    Error,
}

impl UploadStatus {
    /// Strava reports upload progress as free text; map it onto the four states.
    pub fn from_status_text(status: &str) -> Self {
        let status = status.to_ascii_lowercase();
        if status.contains("error") {
            UploadStatus::Error
        } else if status.contains("ready") {
            UploadStatus::Ready
        } else if status.contains("processed") || status.contains("processing") {
            UploadStatus::Processing
        } else {
            UploadStatus::Queued
        }
    }
}

/// Result of a successful upload POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub upload_id: i64,
    pub activity_id: Option<i64>,
    pub status: UploadStatus,
    pub status_text: String,
    pub error: Option<String>,
}

/// Opaque Strava bearer token. Immutable once obtained; there is no refresh flow.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Garmin Connect login.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Strava API application credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Most recent activity on the Strava side, used as a connectivity check.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DestinationActivity {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
}

impl fmt::Display for DestinationActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.name, self.start_date)
    }
}
