use super::endpoints::GarminEndpoints;
use super::sso::extract_response_url;
use crate::common::error::{AuthError, error_body};
use crate::common::transport::{self, has_cookie};
use crate::common::types::Credentials;
use function_timer::time;
use reqwest::Url;
use reqwest::cookie::Jar;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Cookie issued by the SSO host once the credentials are accepted.
const TICKET_GRANTING_COOKIE: &str = "CASTGC";

/// An authenticated Garmin Connect session.
///
/// The session state lives entirely in the cookie jar shared by the client;
/// catalog and export calls made through it reuse those cookies.
pub struct GarminSession {
    pub(super) client: ClientWithMiddleware,
    pub(super) endpoints: GarminEndpoints,
    cookie_jar: Arc<Jar>,
}

impl GarminSession {
    /// Runs the five-step SSO sequence. The server tracks progress through the
    /// cookies it hands out, so the steps must run in this exact order.
    #[time("garmin_login_duration")]
    pub async fn establish(
        endpoints: GarminEndpoints,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let cookie_jar = Arc::new(Jar::default());
        let client = transport::build_client("garmin", timeout, Some(cookie_jar.clone()))?;
        let session = Self {
            client,
            endpoints,
            cookie_jar,
        };

        info!("Signing in to Garmin Connect as {}", credentials.username);

        // 1. Landing page hands out the initial SSO session cookie
        session.load_page("SSO landing page", &session.endpoints.sso).await?;

        // 2-3. Credential form; a successful login embeds the ticket redirect in the page
        let response_url = session.submit_credentials(credentials).await?;

        // 4. Following the ticket URL upgrades the SSO cookie into Connect cookies
        session
            .load_page("Ticket redirect", response_url.as_str())
            .await?;

        // 5. Legacy session endpoint issues the session cookie the JSON APIs require
        session
            .load_page("Legacy session", &session.endpoints.legacy_session)
            .await?;

        if !session.has_ticket_granting_cookie() {
            warn!("No {TICKET_GRANTING_COOKIE} cookie after login, later calls may be rejected");
        }

        info!("Garmin Connect session established");
        Ok(session)
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<Url, AuthError> {
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("embed", "false"),
        ];
        let response = self
            .client
            .post(&self.endpoints.sso)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        // A missing redirect means the credentials were refused, whatever the status says
        let response_url = extract_response_url(&body)?;

        if !status.is_success() {
            return Err(AuthError::UnexpectedStatus {
                step: "Credential submission",
                code: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(response_url)
    }

    async fn load_page(&self, step: &'static str, url: &str) -> Result<(), AuthError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::UnexpectedStatus {
                step,
                code: status.as_u16(),
                body: error_body(response).await,
            });
        }

        Ok(())
    }

    /// Whether the SSO host's ticket-granting cookie made it into the jar.
    pub fn has_ticket_granting_cookie(&self) -> bool {
        Url::parse(&self.endpoints.sso)
            .map(|url| has_cookie(&self.cookie_jar, &url, TICKET_GRANTING_COOKIE))
            .unwrap_or(false)
    }
}
