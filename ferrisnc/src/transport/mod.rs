//! Connection parameters and the connector seam.
//!
//! The protocol transport itself lives outside this crate. A [`Connector`]
//! turns a [`ConnectionConfig`] into an [`RpcGateway`]; this module only adds
//! the reachability probe that runs before it.

pub mod config;
mod probe;

pub use config::{AuthMethod, ConnectionConfig};
pub use probe::probe;

use async_trait::async_trait;

use crate::error::Result;
use crate::rpc::RpcGateway;

/// Opens gateway sessions to devices.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a session and return its gateway.
    ///
    /// Connection and authentication failures should be reported as
    /// [`TransportError`](crate::error::TransportError)s.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn RpcGateway>>;
}
