pub mod common;
pub mod config;
pub mod garmin;
pub mod strava;
pub mod sync;
