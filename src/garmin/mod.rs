//! Garmin Connect: scraped SSO login, activity search and TCX export.

mod catalog;
mod endpoints;
mod session;
pub mod sso;

pub use catalog::ActivityCatalog;
pub use endpoints::GarminEndpoints;
pub use session::GarminSession;
