//! TCP reachability probe.

use std::time::Duration;

use log::debug;
use tokio::net::TcpStream;

use crate::error::{Result, TransportError};

/// Check that `host:port` accepts TCP connections within `window`.
///
/// A refused connection is [`TransportError::ConnectionFailed`]; no answer
/// within the window is [`TransportError::ProbeFailed`].
pub async fn probe(host: &str, port: u16, window: Duration) -> Result<()> {
    debug!("probing {}:{} (window {:?})", host, port, window);

    match tokio::time::timeout(window, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => {
            debug!("probe of {}:{} failed: {}", host, port, e);
            Err(TransportError::ConnectionFailed {
                host: host.to_string(),
                port,
                source: e,
            }
            .into())
        }
        Err(_) => Err(TransportError::ProbeFailed {
            host: host.to_string(),
            port,
            window,
        }
        .into()),
    }
}
