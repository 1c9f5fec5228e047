//! Interactive one-activity-at-a-time transfer from Garmin Connect to Strava.

mod job;
mod prompt;

pub use job::{SyncJob, SyncReport, SyncState};
pub use prompt::TerminalPrompt;

use crate::common::error::{FetchError, UploadError};
use crate::common::types::{ActivityRecord, ExportPayload, UploadOutcome};
use crate::garmin::{ActivityCatalog, GarminSession};
use crate::strava::StravaClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where activities come from.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn list_activities(&self) -> Result<ActivityCatalog, FetchError>;
    async fn export(&self, activity_id: i64) -> Result<ExportPayload, FetchError>;
}

/// Where activities go.
#[async_trait]
pub trait ActivityDestination: Send + Sync {
    async fn upload(
        &self,
        activity_name: &str,
        private: bool,
        payload: &ExportPayload,
    ) -> Result<UploadOutcome, UploadError>;
}

#[async_trait]
impl ActivitySource for GarminSession {
    async fn list_activities(&self) -> Result<ActivityCatalog, FetchError> {
        GarminSession::list_activities(self).await
    }

    async fn export(&self, activity_id: i64) -> Result<ExportPayload, FetchError> {
        self.export_tcx(activity_id).await
    }
}

#[async_trait]
impl ActivityDestination for StravaClient {
    async fn upload(
        &self,
        activity_name: &str,
        private: bool,
        payload: &ExportPayload,
    ) -> Result<UploadOutcome, UploadError> {
        self.upload_tcx(activity_name, private, payload).await
    }
}

/// The user's answer for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Upload,
    Skip,
    Exit,
}

/// Shows candidates to the user and collects decisions.
pub trait DecisionPrompt {
    fn present(&mut self, activity: &ActivityRecord);
    fn decide(&mut self) -> Decision;
}

/// What to do when exporting or uploading an approved activity fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadErrorPolicy {
    /// Stop the whole run on the first failure.
    #[default]
    Abort,
    /// Report the failure and move on to the next candidate.
    Continue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub private: bool,
    pub on_upload_error: UploadErrorPolicy,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
