//! Driver network.
mod base;
mod config;
pub use base::CnnDriver;
pub use config::CnnDriverConfig;
