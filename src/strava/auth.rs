use super::callback::CallbackListener;
use super::endpoints::StravaEndpoints;
use crate::common::error::{AuthError, error_body};
use crate::common::transport;
use crate::common::types::{AccessToken, ClientCredentials};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

// OAuth types
#[derive(Serialize)]
struct OAuthTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    grant_type: &'a str, // "authorization_code"
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

/// Bounds on the wait for the human to finish the browser step.
///
/// The default waits forever and is only cancelled through `cancel`.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeWait {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl AuthorizeWait {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Runs the authorization-code flow against Strava.
pub struct StravaAuthorizer {
    client: ClientWithMiddleware,
    endpoints: StravaEndpoints,
    callback_addr: SocketAddr,
    scope: String,
}

impl StravaAuthorizer {
    pub fn new(
        endpoints: StravaEndpoints,
        callback_addr: SocketAddr,
        scope: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client: transport::build_client("strava", timeout, None)?,
            endpoints,
            callback_addr,
            scope: scope.into(),
        })
    }

    /// URL the human opens to grant access.
    pub fn authorize_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&approval_prompt=auto&scope={}&state={}",
            self.endpoints.authorize,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scope),
            urlencoding::encode(state),
        )
    }

    /// Starts a callback listener, hands the consent URL to `show_url`, waits for
    /// the browser redirect and exchanges the code for a bearer token.
    ///
    /// The listener is torn down before the token exchange, whatever the outcome.
    pub async fn authorize(
        &self,
        credentials: &ClientCredentials,
        wait: &AuthorizeWait,
        show_url: impl FnOnce(&str),
    ) -> Result<AccessToken, AuthError> {
        let state = Uuid::new_v4().simple().to_string();
        let mut listener = CallbackListener::bind(self.callback_addr, state.clone()).await?;

        show_url(&self.authorize_url(
            &credentials.client_id,
            &listener.redirect_uri(),
            &state,
        ));

        info!("Waiting for the Strava authorization callback");
        let code = listener.wait_for_code(wait.timeout, &wait.cancel).await;
        listener.shutdown().await;

        self.exchange_code(credentials, &code?).await
    }

    /// Trades an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
    ) -> Result<AccessToken, AuthError> {
        let request = OAuthTokenRequest {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
            code,
            grant_type: "authorization_code",
        };

        let response = self
            .client
            .post(&self.endpoints.token)
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenExchangeFailed(format!(
                "unexpected status code {}: {}",
                status.as_u16(),
                error_body(response).await
            )));
        }

        let body = response.bytes().await?;
        let token_response: OAuthTokenResponse = serde_json::from_slice(&body).map_err(|e| {
            AuthError::TokenExchangeFailed(format!("failed to parse token response: {e}"))
        })?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::TokenExchangeFailed(
                "token response carried an empty access token".to_string(),
            ));
        }

        info!("Obtained Strava access token");
        Ok(AccessToken::new(token_response.access_token))
    }
}
