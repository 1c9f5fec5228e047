//! Short-lived local HTTP listener that receives the OAuth redirect.
//!
//! Each authorization attempt owns one listener. The callback handler hands
//! the first accepted code to the waiting authorizer through a oneshot
//! channel; the listener is shut down when the attempt is over.

use crate::common::error::AuthError;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const CALLBACK_PATH: &str = "/callback";

const CONFIRMATION_PAGE: &str = "<html><body><p>Strava OAuth callback code received, please follow instructions in the console!</p></body></html>";
const DENIED_PAGE: &str = "<html><body><p>Strava authorization was declined, see the console for details.</p></body></html>";

/// How long to wait for in-flight callback responses when shutting down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type CallbackResult = Result<String, String>;

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

struct Handoff {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackResult>>>,
}

impl Handoff {
    /// Delivers the outcome to the authorizer; false if one was already delivered.
    fn deliver(&self, outcome: CallbackResult) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }
}

async fn handle_callback(
    State(handoff): State<Arc<Handoff>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    if params.state.as_deref() != Some(handoff.expected_state.as_str()) {
        warn!("Rejected OAuth callback with unexpected state");
        return (StatusCode::BAD_REQUEST, Html("State mismatch"));
    }

    if let Some(reason) = params.error {
        if !handoff.deliver(Err(reason)) {
            debug!("Ignoring OAuth error callback, authorization already resolved");
        }
        return (StatusCode::OK, Html(DENIED_PAGE));
    }

    match params.code.filter(|code| !code.is_empty()) {
        Some(code) => {
            if !handoff.deliver(Ok(code)) {
                debug!("Ignoring repeated OAuth callback");
            }
            (StatusCode::OK, Html(CONFIRMATION_PAGE))
        }
        None => (StatusCode::BAD_REQUEST, Html("Missing code parameter")),
    }
}

pub struct CallbackListener {
    local_addr: SocketAddr,
    receiver: oneshot::Receiver<CallbackResult>,
    shutdown: CancellationToken,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Binds the listener and starts serving the callback path in the background.
    /// Only callbacks echoing `expected_state` are accepted.
    pub async fn bind(addr: SocketAddr, expected_state: String) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(addr).await.map_err(AuthError::Listener)?;
        let local_addr = listener.local_addr().map_err(AuthError::Listener)?;

        let (sender, receiver) = oneshot::channel();
        let handoff = Arc::new(Handoff {
            expected_state,
            sender: Mutex::new(Some(sender)),
        });
        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(handoff);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
            {
                error!("OAuth callback listener error: {e}");
            }
        });

        debug!("OAuth callback listener bound to {local_addr}");
        Ok(Self {
            local_addr,
            receiver,
            shutdown,
            server: Some(server),
        })
    }

    /// Redirect URI for this listener, naming the address it is bound to.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}{CALLBACK_PATH}", self.local_addr)
    }

    /// Blocks until the callback delivers a code, the timeout elapses or `cancel` fires.
    pub async fn wait_for_code(
        &mut self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        let received = async {
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut self.receiver).await {
                    Ok(result) => result,
                    Err(_) => return Err(AuthError::TimedOut(limit)),
                },
                None => (&mut self.receiver).await,
            };
            result.map_err(|_| {
                AuthError::Listener(std::io::Error::other(
                    "callback listener stopped before a code arrived",
                ))
            })
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(AuthError::Cancelled),
            outcome = received => outcome?,
        };

        outcome.map_err(AuthError::AccessDenied)
    }

    /// Stops accepting connections and waits briefly for the server task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(mut server) = self.server.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
                warn!("OAuth callback listener did not stop in time, aborting it");
                server.abort();
            }
        }
        debug!("OAuth callback listener on {} stopped", self.local_addr);
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
