//! Error types for ferrisnc.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrisnc operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level errors raised while opening a session
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Remote procedure call errors
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Configuration database errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Table/view definition errors
    #[error("View error: {0}")]
    View(#[from] ViewError),
}

impl Error {
    /// Whether this fault was raised by the device through the gateway.
    ///
    /// Device faults leave an uncommitted candidate behind, so a transaction
    /// must roll back before releasing its lock. Local faults (unreadable
    /// files, builder mistakes) never touched the candidate.
    pub fn is_device_fault(&self) -> bool {
        match self {
            Error::Rpc(_) => true,
            Error::Config(err) => !matches!(
                err,
                ConfigError::Source { .. } | ConfigError::InvalidCommitConfirm { .. }
            ),
            _ => false,
        }
    }

    /// Whether this is a connection-level fault from [`Device::open`](crate::Device).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Transport layer errors (reachability, connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The connector did not produce a session in time
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// The reachability probe failed
    #[error("Probe of {host}:{port} failed within {window:?}")]
    ProbeFailed {
        host: String,
        port: u16,
        window: Duration,
    },

    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,
}

/// Errors from a single remote procedure call.
#[derive(Error, Debug)]
pub enum RpcError {
    /// No reply within the session timeout
    #[error("RPC timed out after {0:?}")]
    Timeout(Duration),

    /// The device answered with an `rpc-error`
    #[error("RPC fault: {message}")]
    Fault { message: String },

    /// The reply did not have the expected shape
    #[error("Malformed RPC reply: {message}")]
    MalformedReply { message: String },

    /// The reply could not be parsed as XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The gateway channel is gone
    #[error("RPC channel closed")]
    Closed,
}

/// Configuration database errors raised inside a transaction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration database could not be locked or opened
    #[error("Failed to lock configuration: {message}")]
    Lock { message: String },

    /// The lock could not be released
    #[error("Failed to unlock configuration: {message}")]
    Unlock { message: String },

    /// Statements were rejected while loading the candidate
    #[error("Failed to load configuration: {message}")]
    Load { message: String },

    /// The candidate could not be compared against the active configuration
    #[error("Failed to compare configuration: {message}")]
    Diff { message: String },

    /// The candidate failed device validation
    #[error("Configuration check failed: {message}")]
    Validation { message: String },

    /// The commit was rejected
    #[error("Commit failed: {message}")]
    Commit { message: String },

    /// The candidate could not be rolled back
    #[error("Rollback failed: {message}")]
    Rollback { message: String },

    /// A local configuration file could not be read
    #[error("Failed to read configuration file {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Commit-confirm window outside the device's accepted range
    #[error("Invalid commit confirm window: {message}")]
    InvalidCommitConfirm { message: String },
}

/// Driver layer errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Invalid configuration in the device builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Table/view definition errors.
#[derive(Error, Debug)]
pub enum ViewError {
    /// Definition file could not be read
    #[error("Failed to read view file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Definition document is not valid YAML
    #[error("Invalid view YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No table registered under this name
    #[error("Unknown table '{name}'")]
    UnknownTable { name: String },

    /// A table refers to something that does not exist
    #[error("Invalid definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },
}

/// Result type alias using ferrisnc's Error.
pub type Result<T> = std::result::Result<T, Error>;
