use super::endpoints::StravaEndpoints;
use crate::common::error::{FetchError, UploadError, error_body};
use crate::common::transport;
use crate::common::types::{
    AccessToken, DestinationActivity, ExportPayload, UploadOutcome, UploadStatus,
};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// Strava's name for the export format.
pub const DATA_TYPE: &str = "tcx";
const UPLOAD_FILE_NAME: &str = "activity.tcx";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: i64,
    activity_id: Option<i64>,
    #[serde(default)]
    status: String,
    error: Option<String>,
}

impl UploadResponse {
    fn into_outcome(self) -> Result<UploadOutcome, UploadError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(UploadError::LogicalFailure(error));
        }
        Ok(UploadOutcome {
            upload_id: self.id,
            activity_id: self.activity_id,
            status: UploadStatus::from_status_text(&self.status),
            status_text: self.status,
            error: None,
        })
    }
}

/// Bearer-authenticated Strava API client.
pub struct StravaClient {
    client: ClientWithMiddleware,
    endpoints: StravaEndpoints,
    access_token: AccessToken,
}

impl StravaClient {
    pub fn new(
        endpoints: StravaEndpoints,
        access_token: AccessToken,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: transport::build_client("strava", timeout, None)?,
            endpoints,
            access_token,
        })
    }

    /// Uploads a TCX export as a new activity. Strava answers 201 once the
    /// file is accepted for processing.
    pub async fn upload_tcx(
        &self,
        activity_name: &str,
        private: bool,
        payload: &ExportPayload,
    ) -> Result<UploadOutcome, UploadError> {
        let file = Part::bytes(payload.bytes.clone())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("application/octet-stream")?;
        let mut form = Form::new()
            .part("file", file)
            .text("data_type", DATA_TYPE)
            .text("name", activity_name.to_string());
        if private {
            form = form.text("private", "1");
        }

        let response = self
            .client
            .post(&self.endpoints.uploads)
            .bearer_auth(self.access_token.as_str())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(UploadError::UnexpectedStatus {
                code: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let body = response.bytes().await?;
        let upload: UploadResponse = serde_json::from_slice(&body)?;
        let outcome = upload.into_outcome()?;

        info!(
            "Uploaded {:?} as upload {}: {}",
            activity_name, outcome.upload_id, outcome.status_text
        );
        Ok(outcome)
    }

    /// Most recent activity on the account, if any.
    pub async fn latest_activity(&self) -> Result<Option<DestinationActivity>, FetchError> {
        let resource = "GET activities";
        let response = self
            .client
            .get(&self.endpoints.activities)
            .query(&[("per_page", "1")])
            .bearer_auth(self.access_token.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                resource: resource.to_string(),
                code: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let body = response.bytes().await?;
        let activities: Vec<DestinationActivity> =
            serde_json::from_slice(&body).map_err(|e| FetchError::DecodeFailed {
                resource: resource.to_string(),
                reason: e.to_string(),
            })?;

        Ok(activities.into_iter().next())
    }
}
