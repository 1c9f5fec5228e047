//! Fake Strava API: token exchange, uploads and the athlete activity list.

use super::{ACCESS_TOKEN, FakeServer, GOOD_CODE, bind_localhost, serve};
use axum::extract::{Multipart, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CLIENT_ID: &str = "12345";
pub const CLIENT_SECRET: &str = "s3cret";

pub struct StravaOptions {
    pub upload_status: StatusCode,
    pub upload_body: Value,
    pub activities: Value,
}

impl Default for StravaOptions {
    fn default() -> Self {
        Self {
            upload_status: StatusCode::CREATED,
            upload_body: json!({
                "id": 16486788,
                "external_id": null,
                "error": null,
                "status": "Your activity is still being processed.",
                "activity_id": null
            }),
            activities: json!([
                { "id": 987, "name": "Lunch Swim", "start_date": "2018-02-16T14:52:54Z" }
            ]),
        }
    }
}

/// Fields of one multipart upload as the server saw them.
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub file: Vec<u8>,
}

pub struct StravaState {
    options: StravaOptions,
    pub token_requests: Mutex<Vec<HashMap<String, String>>>,
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub activity_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl StravaState {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn activity_queries(&self) -> Vec<HashMap<String, String>> {
        self.activity_queries.lock().unwrap().clone()
    }
}

pub async fn spawn_strava(options: StravaOptions) -> FakeServer<StravaState> {
    let (listener, base) = bind_localhost().await;
    let state = Arc::new(StravaState {
        options,
        token_requests: Mutex::new(Vec::new()),
        uploads: Mutex::new(Vec::new()),
        activity_queries: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/api/v3/uploads", post(upload))
        .route("/api/v3/athlete/activities", get(activities))
        .with_state(state.clone());

    serve(listener, base, state, app)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {ACCESS_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Authorization Error" })),
    )
        .into_response()
}

async fn token(
    State(state): State<Arc<StravaState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.lock().unwrap().push(form.clone());

    let accepted = form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
        && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
        && form.get("code").map(String::as_str) == Some(GOOD_CODE)
        && form.get("grant_type").map(String::as_str) == Some("authorization_code");
    if !accepted {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Bad Request", "errors": [{ "field": "code", "code": "invalid" }] })),
        )
            .into_response();
    }

    Json(json!({
        "token_type": "Bearer",
        "access_token": ACCESS_TOKEN,
        "athlete": { "id": 1 }
    }))
    .into_response()
}

async fn upload(
    State(state): State<Arc<StravaState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut recorded = RecordedUpload::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            recorded.file_name = field.file_name().map(str::to_string);
            recorded.file = field.bytes().await.unwrap().to_vec();
        } else {
            let value = field.text().await.unwrap();
            recorded.fields.insert(name, value);
        }
    }
    state.uploads.lock().unwrap().push(recorded);

    (
        state.options.upload_status,
        Json(state.options.upload_body.clone()),
    )
        .into_response()
}

async fn activities(
    State(state): State<Arc<StravaState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.activity_queries.lock().unwrap().push(query);
    Json(state.options.activities.clone()).into_response()
}
