//! Remote procedure gateway.
//!
//! The gateway is the seam between this crate and whatever speaks the wire
//! protocol to the device. Implementations only have to move [`Element`]s in
//! and [`RpcReply`]s out; framing, transport and authentication are theirs.

mod element;
#[cfg(test)]
pub(crate) mod mock;
mod reply;

pub use element::{Element, RpcArg};
pub use reply::{RpcErrorEntry, RpcReply, Severity, first_fault, rpc_errors};

use std::time::Duration;

use async_trait::async_trait;
use log::trace;

use crate::error::{Result, RpcError};

/// Rendering requested from the device for a CLI command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Xml,
    Json,
}

impl OutputFormat {
    /// Attribute value used in the `<command format="...">` request.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Xml => "xml",
            OutputFormat::Json => "json",
        }
    }
}

/// Executes remote procedures against one device session.
///
/// Calls take `&mut self`: one session has one channel, and every call
/// blocks until its reply (or a fault) arrives.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Execute an RPC and wait for its reply.
    ///
    /// Device-reported `rpc-error`s with error severity should be returned
    /// as [`RpcError::Fault`]; warnings may be left embedded in the reply.
    async fn execute(&mut self, rpc: &Element) -> Result<RpcReply>;

    /// Run a CLI command and request the given rendering.
    async fn cli(&mut self, command: &str, format: OutputFormat) -> Result<RpcReply> {
        let rpc = Element::new("command")
            .with_attr("format", format.as_str())
            .with_text(command);
        self.execute(&rpc).await
    }

    /// Close the underlying session.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether the underlying session is still usable.
    fn is_alive(&self) -> bool {
        true
    }
}

/// A gateway bounded by a per-call timeout.
///
/// This is what a [`Device`](crate::Device) holds once opened.
pub struct RpcChannel {
    gateway: Box<dyn RpcGateway>,
    timeout: Duration,
}

impl RpcChannel {
    /// Wrap a gateway.
    pub fn new(gateway: Box<dyn RpcGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Set the per-call timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Get the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RpcGateway for RpcChannel {
    async fn execute(&mut self, rpc: &Element) -> Result<RpcReply> {
        trace!("rpc request: {}", rpc.to_xml());
        match tokio::time::timeout(self.timeout, self.gateway.execute(rpc)).await {
            Ok(reply) => reply,
            Err(_) => Err(RpcError::Timeout(self.timeout).into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.gateway.close().await
    }

    fn is_alive(&self) -> bool {
        self.gateway.is_alive()
    }
}
