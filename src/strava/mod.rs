//! Strava: OAuth authorization-code flow and activity uploads.

mod auth;
mod callback;
mod client;
mod endpoints;

pub use auth::{AuthorizeWait, StravaAuthorizer};
pub use callback::{CALLBACK_PATH, CallbackListener};
pub use client::StravaClient;
pub use endpoints::StravaEndpoints;
