//! Juniper Junos support.

pub mod config_session;
mod operations;

pub use config_session::JunosConfig;
pub use operations::{PingOptions, TracerouteOptions};
