//! Configuration database trait and the scoped candidate guard.
//!
//! A configuration change is a **transaction** against the device's
//! candidate configuration:
//! acquire → load → validate → diff → commit or roll back → release.
//!
//! [`ConfigDatabase`] is the capability a vendor provides for those steps.
//! [`Candidate`] holds a database for the lifetime of one transaction:
//! - it is only constructed by a successful [`Candidate::acquire`]
//! - it holds `&mut D`, so no other transaction can use the database
//! - [`Candidate::release`] consumes it, so the lock is released at most once
//!
//! The transaction engine in [`transaction`](super::transaction) drives a
//! `Candidate` and guarantees `release` is reached on every path.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{ConfigError, DriverError, Error, Result};

// =============================================================================
// Transaction inputs
// =============================================================================

/// How the configuration database is locked for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Lock the shared candidate against all other sessions.
    #[default]
    Exclusive,
    /// Private copy of the candidate for this session.
    Private,
    /// Dynamic configuration database.
    Dynamic,
    /// Batch commit queue.
    Batch,
}

impl LockMode {
    /// The CLI/RPC keyword for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Exclusive => "exclusive",
            LockMode::Private => "private",
            LockMode::Dynamic => "dynamic",
            LockMode::Batch => "batch",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exclusive" => Ok(LockMode::Exclusive),
            "private" => Ok(LockMode::Private),
            "dynamic" => Ok(LockMode::Dynamic),
            "batch" => Ok(LockMode::Batch),
            other => Err(DriverError::InvalidConfig {
                message: format!("unknown lock mode '{}'", other),
            }
            .into()),
        }
    }
}

/// Syntax of the configuration being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// `set ...` statements.
    #[default]
    Set,
    /// Device-native curly-brace text.
    Text,
    /// XML `<configuration>` document.
    Xml,
}

impl ConfigFormat {
    /// Infer the format from a file name: `.set`, `.xml`, anything else is text.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("set") => ConfigFormat::Set,
            Some("xml") => ConfigFormat::Xml,
            _ => ConfigFormat::Text,
        }
    }

    /// The `format` attribute value for a load request.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Set => "set",
            ConfigFormat::Text => "text",
            ConfigFormat::Xml => "xml",
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "set" => Ok(ConfigFormat::Set),
            "text" | "conf" => Ok(ConfigFormat::Text),
            "xml" => Ok(ConfigFormat::Xml),
            other => Err(DriverError::InvalidConfig {
                message: format!("unknown configuration format '{}'", other),
            }
            .into()),
        }
    }
}

/// Where a file-sourced configuration lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLocation {
    /// On this host; read and sent inline.
    Local,
    /// A URL the device fetches itself.
    Remote,
}

impl FromStr for FileLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(FileLocation::Local),
            "remote" => Ok(FileLocation::Remote),
            other => Err(DriverError::InvalidConfig {
                message: format!("unknown file location '{}'", other),
            }
            .into()),
        }
    }
}

/// The configuration to merge into the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Statement lines, joined with newlines.
    Statements(Vec<String>),
    /// A file on this host.
    File(PathBuf),
    /// A URL fetched by the device.
    Url(String),
}

impl ConfigSource {
    /// Build a source from statement lines.
    pub fn statements<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigSource::Statements(lines.into_iter().map(Into::into).collect())
    }

    /// Build a file-backed source.
    pub fn from_location(path: impl Into<String>, location: FileLocation) -> Self {
        match location {
            FileLocation::Local => ConfigSource::File(PathBuf::from(path.into())),
            FileLocation::Remote => ConfigSource::Url(path.into()),
        }
    }

    /// Format implied by the source's file name; statements default to `set`.
    pub fn inferred_format(&self) -> ConfigFormat {
        match self {
            ConfigSource::Statements(_) => ConfigFormat::Set,
            ConfigSource::File(path) => ConfigFormat::from_path(path),
            ConfigSource::Url(url) => ConfigFormat::from_path(url),
        }
    }
}

/// Options for the commit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOptions {
    /// Confirmation window; the device reverts unless confirmed within it.
    /// `None` commits unconditionally.
    pub confirm: Option<Duration>,

    /// Free-text commit log comment.
    pub comment: Option<String>,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            confirm: Some(Duration::from_secs(60)),
            comment: None,
        }
    }
}

impl CommitOptions {
    /// Confirmation window in whole minutes, rounded up.
    ///
    /// The device accepts 1 to 65535 minutes.
    pub fn confirm_minutes(&self) -> Result<Option<u32>> {
        let Some(timeout) = self.confirm else {
            return Ok(None);
        };
        let secs = timeout.as_secs();

        if secs < 60 {
            return Err(ConfigError::InvalidCommitConfirm {
                message: format!("minimum is 1 minute, got {} seconds", secs),
            }
            .into());
        }

        let minutes = secs.div_ceil(60);
        if minutes > 65535 {
            return Err(ConfigError::InvalidCommitConfirm {
                message: format!("maximum is 65535 minutes, got {}", minutes),
            }
            .into());
        }

        Ok(Some(minutes as u32))
    }
}

// =============================================================================
// Core trait
// =============================================================================

/// A device configuration database.
///
/// Implementations map each step onto the device's own operations. Every
/// step may fail with a device fault; the transaction engine decides what
/// to do about it.
pub trait ConfigDatabase: Send {
    /// Lock or open the configuration database in `mode`.
    fn acquire(&mut self, mode: LockMode) -> impl Future<Output = Result<()>> + Send;

    /// Load `source` into the candidate. `merge == false` replaces instead.
    fn load(
        &mut self,
        source: &ConfigSource,
        format: ConfigFormat,
        merge: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Zero-context diff of the candidate against the active configuration.
    fn diff(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Validate the candidate without committing it.
    fn validate(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Commit the candidate.
    fn commit(&mut self, options: &CommitOptions) -> impl Future<Output = Result<bool>> + Send;

    /// Discard uncommitted changes.
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release whatever [`acquire`](Self::acquire) took.
    fn release(&mut self) -> impl Future<Output = Result<()>> + Send;
}

// =============================================================================
// Candidate — scoped guard over an acquired database
// =============================================================================

/// An acquired configuration database.
///
/// Dropping a `Candidate` without calling [`release`](Self::release) leaves
/// the device locked; this is logged as a warning.
pub struct Candidate<'a, D: ConfigDatabase> {
    db: &'a mut D,
    mode: LockMode,
    released: bool,
}

impl<'a, D: ConfigDatabase> Candidate<'a, D> {
    /// Acquire the database in `mode`.
    ///
    /// Failure here means nothing was locked and nothing must be released.
    pub async fn acquire(db: &'a mut D, mode: LockMode) -> Result<Self> {
        debug!("acquiring configuration database ({})", mode);
        db.acquire(mode).await?;
        Ok(Self {
            db,
            mode,
            released: false,
        })
    }

    /// The mode this candidate was acquired in.
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Merge `source` into the candidate.
    pub async fn load(&mut self, source: &ConfigSource, format: ConfigFormat) -> Result<()> {
        self.db.load(source, format, true).await
    }

    /// Diff the candidate against the active configuration.
    pub async fn diff(&mut self) -> Result<String> {
        self.db.diff().await
    }

    /// Run a device-side check of the candidate.
    pub async fn validate(&mut self) -> Result<bool> {
        self.db.validate().await
    }

    /// Commit the candidate.
    pub async fn commit(&mut self, options: &CommitOptions) -> Result<bool> {
        self.db.commit(options).await
    }

    /// Discard uncommitted changes.
    pub async fn rollback(&mut self) -> Result<()> {
        debug!("rolling back candidate configuration");
        self.db.rollback().await
    }

    /// Release the database. Consumes the guard.
    pub async fn release(mut self) -> Result<()> {
        debug!("releasing configuration database ({})", self.mode);
        self.released = true;
        self.db.release().await
    }
}

impl<D: ConfigDatabase> Drop for Candidate<'_, D> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "candidate configuration ({}) dropped without release",
                self.mode
            );
        }
    }
}
