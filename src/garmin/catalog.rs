use super::session::GarminSession;
use crate::common::error::{FetchError, error_body};
use crate::common::types::{ActivityRecord, ExportPayload};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{info, warn};

// Activity search envelope: results.activities[].activity
#[derive(Debug, Deserialize)]
struct ActivitiesPage {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    activities: Vec<ActivityWrapper>,
}

#[derive(Debug, Deserialize)]
struct ActivityWrapper {
    activity: GarminActivity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminActivity {
    activity_id: i64,
    #[serde(default)]
    activity_name: Option<String>,
    #[serde(default)]
    upload_date: Option<GregorianCalendarTime>,
}

#[derive(Debug, Deserialize)]
struct GregorianCalendarTime {
    #[serde(default)]
    millis: Option<Millis>,
}

// Usually a string, but tolerate a bare number too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Millis {
    Text(String),
    Number(i64),
}

impl GregorianCalendarTime {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let millis = match self.millis.as_ref()? {
            Millis::Text(text) => text.trim().parse::<i64>().ok()?,
            Millis::Number(n) => *n,
        };
        DateTime::from_timestamp_millis(millis)
    }
}

/// One page of activities in the order the server returned them.
///
/// Forward-only: each record is yielded once and the catalog cannot be
/// rewound. Listing again requires a fresh call to
/// [`GarminSession::list_activities`].
#[derive(Debug, Clone, Default)]
pub struct ActivityCatalog {
    remaining: VecDeque<ActivityRecord>,
    position: usize,
}

impl ActivityCatalog {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self {
            remaining: records.into(),
            position: 0,
        }
    }

    /// Number of records already handed out.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    fn decode(body: &[u8]) -> Result<Self, FetchError> {
        let resource = "Activity search";
        let page: ActivitiesPage =
            serde_json::from_slice(body).map_err(|e| FetchError::DecodeFailed {
                resource: resource.to_string(),
                reason: e.to_string(),
            })?;

        let records = page
            .results
            .activities
            .into_iter()
            .map(|wrapper| {
                let activity = wrapper.activity;
                let upload_date = activity
                    .upload_date
                    .as_ref()
                    .and_then(GregorianCalendarTime::to_datetime)
                    .unwrap_or_else(|| {
                        warn!(
                            "Activity {} has no usable upload date, showing the epoch",
                            activity.activity_id
                        );
                        DateTime::<Utc>::UNIX_EPOCH
                    });
                ActivityRecord {
                    id: activity.activity_id,
                    name: activity.activity_name.unwrap_or_default(),
                    upload_date,
                }
            })
            .collect();

        Ok(Self::new(records))
    }
}

impl Iterator for ActivityCatalog {
    type Item = ActivityRecord;

    fn next(&mut self) -> Option<ActivityRecord> {
        let record = self.remaining.pop_front()?;
        self.position += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining.len(), Some(self.remaining.len()))
    }
}

impl GarminSession {
    /// Fetches the first page of the activity search. Later pages are never requested.
    pub async fn list_activities(&self) -> Result<ActivityCatalog, FetchError> {
        let resource = "Activity search";
        let response = self
            .client
            .get(&self.endpoints.activity_search)
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
        let catalog = ActivityCatalog::decode(&body)?;
        info!("Found {} activities on Garmin Connect", catalog.remaining());
        Ok(catalog)
    }

    /// Downloads the TCX export of one activity.
    pub async fn export_tcx(&self, activity_id: i64) -> Result<ExportPayload, FetchError> {
        let response = self
            .client
            .get(self.endpoints.export_url(activity_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                resource: format!("Export TCX for activity {activity_id}"),
                code: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let payload = ExportPayload {
            activity_id,
            content_type,
            bytes: response.bytes().await?.to_vec(),
        };

        info!(
            "Exported activity {} ({} bytes of TCX)",
            activity_id,
            payload.len()
        );
        Ok(payload)
    }
}
