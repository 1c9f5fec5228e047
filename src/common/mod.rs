pub mod error;
pub mod metrics;
pub mod transport;
pub mod types;
