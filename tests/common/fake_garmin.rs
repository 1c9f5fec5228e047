//! Fake Garmin Connect that enforces the SSO cookie sequence.
//!
//! Each step hands out a cookie that the next step requires:
//! landing page -> credential form -> ticket redirect -> legacy session -> JSON APIs.

use super::{FakeServer, bind_localhost, sent_cookie, serve};
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "runner@example.com";
pub const PASSWORD: &str = "hunter2";
const TICKET: &str = "ST-0123-abc";

pub struct GarminOptions {
    pub landing_status: StatusCode,
    pub credentials_status: StatusCode,
    pub activities: Value,
    pub exports: HashMap<i64, String>,
}

impl Default for GarminOptions {
    fn default() -> Self {
        Self {
            landing_status: StatusCode::OK,
            credentials_status: StatusCode::OK,
            activities: activities_page(&[
                (101, "Morning Run", "1500000000000"),
                (102, "Evening Ride", "1500086400000"),
            ]),
            exports: HashMap::from([
                (101, tcx_document(101)),
                (102, tcx_document(102)),
            ]),
        }
    }
}

pub struct GarminState {
    base: String,
    options: GarminOptions,
    /// "METHOD path" for every request, in arrival order.
    pub requests: Mutex<Vec<String>>,
}

impl GarminState {
    fn record(&self, entry: String) {
        self.requests.lock().unwrap().push(entry);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn activities_page(activities: &[(i64, &str, &str)]) -> Value {
    let activities: Vec<Value> = activities
        .iter()
        .map(|(id, name, millis)| {
            json!({
                "activity": {
                    "activityId": id,
                    "activityName": name,
                    "activityType": { "key": "running" },
                    "uploadDate": { "display": "ignored", "millis": millis }
                }
            })
        })
        .collect();
    json!({ "results": { "activities": activities, "totalFound": activities.len() } })
}

pub fn tcx_document(id: i64) -> String {
    format!(
        "<?xml version=\"1.0\"?><TrainingCenterDatabase><Activities><Activity><Id>{id}</Id></Activity></Activities></TrainingCenterDatabase>"
    )
}

pub async fn spawn_garmin(options: GarminOptions) -> FakeServer<GarminState> {
    let (listener, base) = bind_localhost().await;
    let state = Arc::new(GarminState {
        base: base.clone(),
        options,
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/sso/signin", get(landing).post(signin))
        .route("/sso/ticket", get(ticket))
        .route("/legacy/session", get(legacy_session))
        .route(
            "/proxy/activity-search-service-1.2/json/activities",
            get(activities),
        )
        .route(
            "/modern/proxy/download-service/export/tcx/activity/{id}",
            get(export),
        )
        .with_state(state.clone());

    serve(listener, base, state, app)
}

fn with_cookie(cookie: &str, body: impl IntoResponse) -> Response {
    ([(SET_COOKIE, format!("{cookie}; Path=/"))], body).into_response()
}

fn forbidden(step: &str) -> Response {
    (StatusCode::FORBIDDEN, format!("{step} out of order")).into_response()
}

async fn landing(State(state): State<Arc<GarminState>>) -> Response {
    state.record("GET /sso/signin".to_string());
    if state.options.landing_status != StatusCode::OK {
        return (state.options.landing_status, "SSO unavailable").into_response();
    }
    with_cookie("SSO_SESSION=landing", "<html><form id=\"login-form\"></form></html>")
}

#[derive(Deserialize)]
struct SigninForm {
    username: String,
    password: String,
    embed: String,
}

async fn signin(
    State(state): State<Arc<GarminState>>,
    headers: HeaderMap,
    Form(form): Form<SigninForm>,
) -> Response {
    state.record("POST /sso/signin".to_string());
    if !sent_cookie(&headers, "SSO_SESSION", "landing") {
        return forbidden("Credential submission");
    }
    if form.username != USERNAME || form.password != PASSWORD || form.embed != "false" {
        return (StatusCode::OK, "<html><div id=\"status\">Invalid sign in</div></html>")
            .into_response();
    }

    // The live page escapes slashes inside the script block
    let ticket_url = format!("{}/sso/ticket?ticket={TICKET}", state.base).replace('/', "\\/");
    let page = format!(
        "<html><script type=\"text/javascript\">var response_url = \"{ticket_url}\";</script></html>"
    );
    (
        state.options.credentials_status,
        [(SET_COOKIE, "CASTGC=TGT-1-abc; Path=/".to_string())],
        page,
    )
        .into_response()
}

#[derive(Deserialize)]
struct TicketQuery {
    ticket: String,
}

async fn ticket(
    State(state): State<Arc<GarminState>>,
    headers: HeaderMap,
    Query(query): Query<TicketQuery>,
) -> Response {
    state.record("GET /sso/ticket".to_string());
    if !sent_cookie(&headers, "CASTGC", "TGT-1-abc") || query.ticket != TICKET {
        return forbidden("Ticket redirect");
    }
    with_cookie("GARMIN-SSO-GUID=guid-1", "<html>redirecting</html>")
}

async fn legacy_session(State(state): State<Arc<GarminState>>, headers: HeaderMap) -> Response {
    state.record("GET /legacy/session".to_string());
    if !sent_cookie(&headers, "GARMIN-SSO-GUID", "guid-1") {
        return forbidden("Legacy session");
    }
    with_cookie("SESSIONID=session-1", "<html>ok</html>")
}

async fn activities(State(state): State<Arc<GarminState>>, headers: HeaderMap) -> Response {
    state.record("GET activities".to_string());
    if !sent_cookie(&headers, "SESSIONID", "session-1") {
        return forbidden("Activity search");
    }
    axum::Json(state.options.activities.clone()).into_response()
}

async fn export(
    State(state): State<Arc<GarminState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record(format!("GET export {id}"));
    if !sent_cookie(&headers, "SESSIONID", "session-1") {
        return forbidden("Export");
    }
    match state.options.exports.get(&id) {
        Some(document) => (
            [(axum::http::header::CONTENT_TYPE, "application/vnd.garmin.tcx+xml")],
            document.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Activity not found").into_response(),
    }
}
