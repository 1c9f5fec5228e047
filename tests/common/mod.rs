#![allow(dead_code)]

pub mod fake_garmin;
pub mod fake_strava;

use axum::Router;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const ACCESS_TOKEN: &str = "tok-123";
pub const GOOD_CODE: &str = "good-code";

/// A fake service running on an ephemeral localhost port. Stops when dropped.
pub struct FakeServer<S> {
    pub base: String,
    pub state: Arc<S>,
    handle: JoinHandle<()>,
}

impl<S> Drop for FakeServer<S> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn bind_localhost() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    (listener, format!("http://{addr}"))
}

pub fn serve<S: Send + Sync + 'static>(
    listener: TcpListener,
    base: String,
    state: Arc<S>,
    app: Router,
) -> FakeServer<S> {
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake server failed");
    });
    FakeServer {
        base,
        state,
        handle,
    }
}

/// Whether the request carries cookie `name` with value `value`.
pub fn sent_cookie(headers: &HeaderMap, name: &str, value: &str) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(n, v)| n == name && v == value)
}

/// A port that was free a moment ago, for tests that must reuse a fixed address.
pub fn free_local_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to reserve a port");
    listener.local_addr().expect("Failed to read local addr")
}
