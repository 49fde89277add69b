//! Session connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Everything a [`Connector`](super::Connector) needs to open a session.
#[derive(Debug)]
pub struct ConnectionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connect timeout, also the initial per-RPC timeout.
    pub timeout: Duration,

    /// Keepalive interval for the underlying transport.
    pub keepalive: Duration,

    /// Optional OpenSSH-style client config file.
    pub ssh_config_file: Option<PathBuf>,

    /// Probe reachability for this long before connecting. `None` disables.
    pub auto_probe: Option<Duration>,

    /// Whether the connector should collect device facts on connect.
    pub gather_facts: bool,
}

impl ConnectionConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for a session.
#[derive(Debug)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}
