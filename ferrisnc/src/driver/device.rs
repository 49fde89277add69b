//! A Junos device session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use super::Driver;
use super::config_session::{CommitOptions, ConfigFormat, ConfigSource, FileLocation, LockMode};
use super::dispatcher;
use super::response::{CommandOutcome, CommitOutcome, CompareOutcome};
use super::transaction::{self, CommitRequest, CompareRequest};
use crate::error::{DriverError, Result, RpcError, TransportError};
use crate::platform::vendors::juniper::{JunosConfig, PingOptions, TracerouteOptions};
use crate::platform::{TableRows, ViewRegistry};
use crate::rpc::{Element, RpcArg, RpcChannel, RpcGateway, RpcReply, first_fault};
use crate::transport::{self, ConnectionConfig, Connector};

/// A session to one Junos device.
///
/// Built with [`DeviceBuilder`](super::DeviceBuilder). Opening the session
/// hands the connector's gateway to an [`RpcChannel`] bounded by the
/// session timeout; every operation below goes through that channel.
pub struct Device {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    channel: Option<RpcChannel>,
    timeout: Duration,
    config_private: bool,
    ignore_warning: bool,
    views: ViewRegistry,
}

impl Device {
    pub(crate) fn new(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        config_private: bool,
        ignore_warning: bool,
    ) -> Self {
        Self {
            timeout: config.timeout,
            config,
            connector,
            channel: None,
            config_private,
            ignore_warning,
            views: ViewRegistry::new(),
        }
    }

    /// Connection parameters this device was built with.
    pub fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Per-RPC timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the per-RPC timeout, effective immediately.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        if let Some(channel) = self.channel.as_mut() {
            channel.set_timeout(timeout);
        }
    }

    /// Lock mode used by commits that do not ask for one.
    pub fn default_lock_mode(&self) -> LockMode {
        if self.config_private {
            LockMode::Private
        } else {
            LockMode::Exclusive
        }
    }

    fn channel(&mut self) -> Result<&mut RpcChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    // =========================================================================
    // Configuration transactions
    // =========================================================================

    /// Load `statements` into a private candidate and report the diff.
    ///
    /// The candidate is always rolled back. Only a closed session is an
    /// error; transaction faults are reported in the outcome.
    pub async fn compare<S: AsRef<str>>(
        &mut self,
        statements: &[S],
        check: bool,
        format: ConfigFormat,
    ) -> Result<CompareOutcome> {
        let source = ConfigSource::statements(statements.iter().map(|s| s.as_ref()));
        let request = CompareRequest::new(source).format(format).check(check);
        self.compare_request(&request).await
    }

    /// [`compare`](Self::compare) with a configuration file.
    pub async fn compare_file(
        &mut self,
        path: &str,
        location: FileLocation,
        check: bool,
    ) -> Result<CompareOutcome> {
        let request = CompareRequest::new(ConfigSource::from_location(path, location)).check(check);
        self.compare_request(&request).await
    }

    /// Run a fully specified compare transaction.
    pub async fn compare_request(&mut self, request: &CompareRequest) -> Result<CompareOutcome> {
        let ignore_warning = self.ignore_warning;
        let mut db = JunosConfig::new(self.channel()?).ignore_warning(ignore_warning);
        Ok(transaction::compare(&mut db, request).await)
    }

    /// Load, check and commit `statements` in the default lock mode.
    ///
    /// Only a closed session is an error; inspect
    /// [`CommitOutcome::committed`] for the result.
    pub async fn commit<S: AsRef<str>>(
        &mut self,
        statements: &[S],
        format: ConfigFormat,
        options: CommitOptions,
    ) -> Result<CommitOutcome> {
        let source = ConfigSource::statements(statements.iter().map(|s| s.as_ref()));
        let mut request = CommitRequest::new(source).format(format);
        request.options = options;
        self.commit_request(&request).await
    }

    /// [`commit`](Self::commit) with a configuration file.
    pub async fn commit_file(
        &mut self,
        path: &str,
        location: FileLocation,
        options: CommitOptions,
    ) -> Result<CommitOutcome> {
        let mut request = CommitRequest::new(ConfigSource::from_location(path, location));
        request.options = options;
        self.commit_request(&request).await
    }

    /// Run a fully specified commit transaction.
    pub async fn commit_request(&mut self, request: &CommitRequest) -> Result<CommitOutcome> {
        let mode = request.mode.unwrap_or_else(|| self.default_lock_mode());
        let request = CommitRequest {
            mode: Some(mode),
            ..request.clone()
        };
        let ignore_warning = self.ignore_warning;
        let mut db = JunosConfig::new(self.channel()?).ignore_warning(ignore_warning);
        Ok(transaction::commit(&mut db, &request).await)
    }

    // =========================================================================
    // Arbitrary RPCs
    // =========================================================================

    /// Execute a prepared RPC.
    pub async fn rpc_call(&mut self, rpc: &Element) -> Result<RpcReply> {
        self.channel()?.execute(rpc).await
    }

    /// Execute RPC `name` with `args` and return its reply.
    ///
    /// Embedded `rpc-error`s with error severity are faults.
    pub async fn rpc<K, A, I>(&mut self, name: &str, args: I) -> Result<Element>
    where
        K: AsRef<str>,
        A: Into<RpcArg>,
        I: IntoIterator<Item = (K, A)>,
    {
        let rpc = Element::rpc(name, args);
        self.structured(&rpc).await
    }

    /// Execute RPC `name` and render its reply as plain text.
    pub async fn rpc_text<K, A, I>(&mut self, name: &str, args: I) -> Result<String>
    where
        K: AsRef<str>,
        A: Into<RpcArg>,
        I: IntoIterator<Item = (K, A)>,
    {
        Ok(self.rpc(name, args).await?.text_content())
    }

    /// Ping `host` from the device.
    pub async fn ping(&mut self, host: &str, options: &PingOptions) -> Result<Element> {
        self.structured(&options.to_rpc(host)).await
    }

    /// Trace the route to `host` from the device.
    pub async fn traceroute(&mut self, host: &str, options: &TracerouteOptions) -> Result<Element> {
        self.structured(&options.to_rpc(host)).await
    }

    async fn structured(&mut self, rpc: &Element) -> Result<Element> {
        let reply = self.rpc_call(rpc).await?.into_element();
        if let Some(message) = first_fault(&reply, true) {
            return Err(RpcError::Fault { message }.into());
        }
        Ok(reply)
    }

    // =========================================================================
    // Tables and views
    // =========================================================================

    /// Register the table/view definitions in a YAML file.
    pub async fn load_views(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        self.views.load_file(path).await
    }

    /// Registered table/view definitions.
    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    /// Fetch table `name` and extract its rows.
    pub async fn get_table(&mut self, name: &str) -> Result<TableRows> {
        let rpc = self.views.table_rpc(name)?;
        let reply = self.structured(&rpc).await?;
        self.views.extract(name, &reply)
    }
}

impl Driver for Device {
    async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let (host, port) = (self.config.host.as_str(), self.config.port);
        if let Some(window) = self.config.auto_probe {
            transport::probe(host, port, window).await?;
        }

        debug!("connecting to {}", self.config.socket_addr());
        let gateway =
            match tokio::time::timeout(self.config.timeout, self.connector.connect(&self.config))
                .await
            {
                Ok(gateway) => gateway?,
                Err(_) => {
                    return Err(TransportError::ConnectTimeout {
                        host: host.to_string(),
                        port,
                        timeout: self.config.timeout,
                    }
                    .into());
                }
            };

        self.channel = Some(RpcChannel::new(gateway, self.timeout));
        info!("session to {} open", self.config.socket_addr());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await?;
            info!("session to {} closed", self.config.socket_addr());
        }
        Ok(())
    }

    async fn run_commands(&mut self, commands: &[&str]) -> Result<CommandOutcome> {
        Ok(dispatcher::run_commands(self.channel()?, commands).await)
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(|channel| channel.is_alive())
    }
}
