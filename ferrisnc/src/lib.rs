//! # Ferrisnc
//!
//! Async Junos automation over an RPC gateway.
//!
//! Ferrisnc sits on top of whatever speaks the management protocol to the
//! device and provides the parts that protocol leaves out:
//!
//! - CLI pipe filters (`match`, `except`, `count`, `trim`, `last`, `find`)
//!   emulated locally, since the RPC interface renders only one command
//! - Operational command batches with a denylist and per-command failure
//!   isolation
//! - Configuration transactions: lock, load, check, diff, commit-confirmed,
//!   roll back and unlock, reported as a result rather than raised
//! - Typed ping/traceroute RPCs and YAML table/view extraction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ferrisnc::{CommitOptions, ConfigFormat, DeviceBuilder, Driver};
//! use ferrisnc::transport::Connector;
//!
//! # async fn example(connector: Arc<dyn Connector>) -> Result<(), ferrisnc::Error> {
//! let mut device = DeviceBuilder::new("192.0.2.1")
//!     .username("admin")
//!     .password("secret")
//!     .connector(connector)
//!     .build()?;
//!
//! device.open().await?;
//!
//! let outcome = device
//!     .run_commands(&["show interfaces terse | match ge- | except down"])
//!     .await?;
//! println!("{:?}", outcome.results());
//!
//! let commit = device
//!     .commit(&["set system host-name r1"], ConfigFormat::Set, CommitOptions::default())
//!     .await?;
//! if !commit.committed {
//!     eprintln!("commit failed: {:?}", commit.error);
//! }
//!
//! device.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod rpc;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CommandOutcome, CommitOptions, CommitOutcome, CompareOutcome, ConfigFormat, ConfigSource,
    Device, DeviceBuilder, DeviceOptions, Driver, FileLocation, LockMode,
};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use platform::ViewRegistry;
pub use rpc::{Element, RpcGateway, RpcReply};
pub use transport::{AuthMethod, ConnectionConfig, Connector};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_compose() {
        let pipeline = Pipeline::parse("show version | match junos");
        assert_eq!(pipeline.apply("Hostname: r1\nJunos: 23.4R1"), "Junos: 23.4R1");
    }

    #[test]
    fn test_transaction_outside_runtime_macro() {
        use crate::driver::transaction::{CompareRequest, compare};
        use crate::platform::vendors::juniper::JunosConfig;
        use crate::rpc::mock::ScriptedGateway;

        let _ = env_logger::builder().is_test(true).try_init();

        let mut gateway = ScriptedGateway::new();
        let outcome = tokio_test::block_on(async {
            let mut db = JunosConfig::new(&mut gateway);
            compare(
                &mut db,
                &CompareRequest::new(ConfigSource::statements(["set system host-name r1"])),
            )
            .await
        });
        assert!(outcome.is_success());
        assert_eq!(outcome.diff, "");
    }
}
