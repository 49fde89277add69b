//! Builder for creating device sessions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use super::device::Device;
use crate::error::{DriverError, Result};
use crate::transport::{AuthMethod, ConnectionConfig, Connector};

/// Optional session settings, typically read from a config file.
///
/// Every field is optional; unset fields leave the builder's value alone.
/// Durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceOptions {
    pub port: Option<u16>,
    pub key_file: Option<PathBuf>,
    pub keepalive: Option<u64>,
    pub ssh_config_file: Option<PathBuf>,
    pub ignore_warning: Option<bool>,
    /// Reachability probe window; `0` disables the probe.
    pub auto_probe: Option<u64>,
    /// Use a private candidate for commits instead of locking the shared one.
    pub config_private: Option<bool>,
    pub gather_facts: Option<bool>,
}

/// Builder for constructing a [`Device`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ferrisnc::driver::DeviceBuilder;
/// use ferrisnc::transport::Connector;
///
/// # fn example(connector: Arc<dyn Connector>) -> Result<(), ferrisnc::Error> {
/// let device = DeviceBuilder::new("192.0.2.1")
///     .username("admin")
///     .password("secret")
///     .config_private(true)
///     .connector(connector)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    key_file: Option<PathBuf>,
    passphrase: Option<SecretString>,
    timeout: Duration,
    keepalive: Duration,
    ssh_config_file: Option<PathBuf>,
    auto_probe: Duration,
    gather_facts: bool,
    config_private: bool,
    ignore_warning: bool,
    connector: Option<Arc<dyn Connector>>,
}

impl DeviceBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            key_file: None,
            passphrase: None,
            timeout: Duration::from_secs(60),
            keepalive: Duration::from_secs(30),
            ssh_config_file: None,
            auto_probe: Duration::ZERO,
            gather_facts: false,
            config_private: false,
            ignore_warning: false,
            connector: None,
        }
    }

    /// Set the port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    ///
    /// With a private key and no explicit passphrase, the password doubles
    /// as the key passphrase.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Authenticate with a private key.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(key_path.into());
        self
    }

    /// Passphrase for an encrypted private key.
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(SecretString::from(passphrase.into()));
        self
    }

    /// Connect timeout and initial per-RPC timeout (default: 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Transport keepalive interval (default: 30s).
    pub fn keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn ssh_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_config_file = Some(path.into());
        self
    }

    /// Probe TCP reachability for up to `window` before connecting.
    /// Zero disables the probe.
    pub fn auto_probe(mut self, window: Duration) -> Self {
        self.auto_probe = window;
        self
    }

    pub fn gather_facts(mut self, gather: bool) -> Self {
        self.gather_facts = gather;
        self
    }

    /// Commit through a private candidate by default.
    pub fn config_private(mut self, private: bool) -> Self {
        self.config_private = private;
        self
    }

    /// Do not fail loads on device warnings.
    pub fn ignore_warning(mut self, ignore: bool) -> Self {
        self.ignore_warning = ignore;
        self
    }

    /// Set the connector that opens the RPC session.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Apply every set field of `options`.
    pub fn options(mut self, options: DeviceOptions) -> Self {
        if let Some(port) = options.port {
            self.port = port;
        }
        if let Some(key_file) = options.key_file {
            self.key_file = Some(key_file);
        }
        if let Some(secs) = options.keepalive {
            self.keepalive = Duration::from_secs(secs);
        }
        if let Some(path) = options.ssh_config_file {
            self.ssh_config_file = Some(path);
        }
        if let Some(ignore) = options.ignore_warning {
            self.ignore_warning = ignore;
        }
        if let Some(secs) = options.auto_probe {
            self.auto_probe = Duration::from_secs(secs);
        }
        if let Some(private) = options.config_private {
            self.config_private = private;
        }
        if let Some(gather) = options.gather_facts {
            self.gather_facts = gather;
        }
        self
    }

    /// Build the device.
    ///
    /// This does not connect. Call `open()` on the returned device to
    /// establish the session.
    pub fn build(self) -> Result<Device> {
        let username = self
            .username
            .ok_or_else(|| DriverError::InvalidConfig {
                message: "Username is required".to_string(),
            })?;

        let connector = self.connector.ok_or_else(|| DriverError::InvalidConfig {
            message: "A connector must be specified".to_string(),
        })?;

        let auth = match (self.key_file, self.password) {
            (Some(path), password) => AuthMethod::PrivateKey {
                path,
                passphrase: self.passphrase.or(password),
            },
            (None, Some(password)) => AuthMethod::Password(password),
            (None, None) => AuthMethod::None,
        };

        let config = ConnectionConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            timeout: self.timeout,
            keepalive: self.keepalive,
            ssh_config_file: self.ssh_config_file,
            auto_probe: (!self.auto_probe.is_zero()).then_some(self.auto_probe),
            gather_facts: self.gather_facts,
        };

        Ok(Device::new(
            config,
            connector,
            self.config_private,
            self.ignore_warning,
        ))
    }
}
