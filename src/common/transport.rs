//! Shared HTTP transport: one `reqwest` client per remote service, wrapped in
//! `reqwest-middleware` so every call is logged and counted the same way.
//!
//! Each call gets a single attempt. There is no retry middleware in the stack.

use crate::common::metrics;
use async_trait::async_trait;
use http::Extensions;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Request, Response, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:57.0) Gecko/20100101 Firefox/57.0";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Counts and logs every request sent through a service's client.
pub struct ApiMetrics {
    service: &'static str,
}

impl ApiMetrics {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Middleware for ApiMetrics {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        // Query strings can carry SSO tickets, so only the path is logged.
        let method = req.method().clone();
        let path = req.url().path().to_string();

        let result = next.run(req, extensions).await;
        match &result {
            Ok(response) if response.status().is_success() => {
                metrics::increment_api_success(self.service);
                debug!("{} {} {} -> {}", self.service, method, path, response.status());
            }
            Ok(response) => {
                metrics::increment_api_failure(self.service);
                debug!("{} {} {} -> {}", self.service, method, path, response.status());
            }
            Err(e) => {
                metrics::increment_api_failure(self.service);
                debug!("{} {} {} failed: {}", self.service, method, path, e);
            }
        }
        result
    }
}

/// Builds the client for one service. Pass a jar to keep cookies across calls.
pub fn build_client(
    service: &'static str,
    timeout: Duration,
    cookie_jar: Option<Arc<Jar>>,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout);
    if let Some(jar) = cookie_jar {
        builder = builder.cookie_provider(jar);
    }

    Ok(ClientBuilder::new(builder.build()?)
        .with(ApiMetrics::new(service))
        .build())
}

/// Whether the jar would send a cookie called `name` to `url`.
pub fn has_cookie(jar: &Jar, url: &Url, name: &str) -> bool {
    let Some(header) = jar.cookies(url) else {
        return false;
    };
    let Ok(header) = header.to_str() else {
        return false;
    };
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(cookie_name, _)| cookie_name == name)
}
