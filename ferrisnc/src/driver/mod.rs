//! High-level session API.
//!
//! The driver layer ties the pieces together: [`Device`] owns the RPC
//! channel, the [`dispatcher`] runs operational commands through the local
//! pipeline, and [`transaction`] sequences configuration changes against a
//! [`ConfigDatabase`](config_session::ConfigDatabase).

mod builder;
pub mod config_session;
mod device;
pub mod dispatcher;
mod response;
pub mod transaction;

pub use builder::{DeviceBuilder, DeviceOptions};
pub use config_session::{
    Candidate, CommitOptions, ConfigDatabase, ConfigFormat, ConfigSource, FileLocation, LockMode,
};
pub use device::Device;
pub use response::{
    CommandOutcome, CommandResult, CommitOutcome, CompareOutcome, INVALID_COMMAND, RPC_CALL_FAILED,
};
pub use transaction::{CommitRequest, CompareRequest};

use std::future::Future;

use crate::error::Result;

/// Trait for device sessions.
pub trait Driver: Send + Sync {
    /// Open the session to the device.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the session. Closing a closed session is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run operational commands, applying any pipe filters locally.
    ///
    /// Individual command failures are recorded in the outcome; only a
    /// closed session is an error.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use ferrisnc::driver::Driver;
    ///
    /// # async fn example(device: &mut impl Driver) -> Result<(), ferrisnc::Error> {
    /// let outcome = device
    ///     .run_commands(&["show interfaces terse | match ge- | count"])
    ///     .await?;
    /// println!("{:?}", outcome.results());
    /// # Ok(())
    /// # }
    /// ```
    fn run_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<CommandOutcome>> + Send;

    /// Check if the session is open.
    fn is_open(&self) -> bool;

    /// Check if the underlying session is still usable.
    ///
    /// Returns `false` if the session was never opened, or if the gateway
    /// reports its connection gone.
    ///
    /// ```rust,no_run
    /// # use ferrisnc::driver::Driver;
    /// # async fn example(device: &mut impl Driver) -> Result<(), ferrisnc::Error> {
    /// if !device.is_alive() {
    ///     device.close().await.ok();
    ///     device.open().await?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn is_alive(&self) -> bool;
}
