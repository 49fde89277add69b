//! Configuration transactions.
//!
//! [`compare`] and [`commit`] drive a [`ConfigDatabase`] through one
//! lock → load → validate → diff → commit/rollback → unlock sequence.
//! Neither returns an error: faults are logged and summarised into the
//! outcome, and the database is released on every path that acquired it.

use std::time::Duration;

use log::{debug, error, info, warn};

use super::config_session::{
    Candidate, CommitOptions, ConfigDatabase, ConfigFormat, ConfigSource, LockMode,
};
use super::response::{CommitOutcome, CompareOutcome};
use crate::error::{ConfigError, Result};

/// A dry-run transaction: load, diff, optionally check, always roll back.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub source: ConfigSource,
    pub format: ConfigFormat,
    /// Run a device-side check after the diff.
    pub check: bool,
    pub mode: LockMode,
}

impl CompareRequest {
    /// Compare `source`, with its format inferred, in a private candidate.
    pub fn new(source: ConfigSource) -> Self {
        Self {
            format: source.inferred_format(),
            source,
            check: false,
            mode: LockMode::Private,
        }
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn format(mut self, format: ConfigFormat) -> Self {
        self.format = format;
        self
    }

    pub fn mode(mut self, mode: LockMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A transaction that commits `source` with confirmation.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub source: ConfigSource,
    pub format: ConfigFormat,
    /// `None` uses the device's default lock mode.
    pub mode: Option<LockMode>,
    pub options: CommitOptions,
}

impl CommitRequest {
    /// Commit `source`, with its format inferred, confirmed within one minute.
    pub fn new(source: ConfigSource) -> Self {
        Self {
            format: source.inferred_format(),
            source,
            mode: None,
            options: CommitOptions::default(),
        }
    }

    pub fn format(mut self, format: ConfigFormat) -> Self {
        self.format = format;
        self
    }

    pub fn mode(mut self, mode: LockMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Confirmation window; `None` commits unconditionally.
    pub fn confirm(mut self, window: Option<Duration>) -> Self {
        self.options.confirm = window;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.options.comment = Some(comment.into());
        self
    }
}

/// Load `request.source` into a candidate and report the difference.
///
/// The candidate is rolled back and released whatever happens; nothing is
/// ever committed.
pub async fn compare<D: ConfigDatabase>(db: &mut D, request: &CompareRequest) -> CompareOutcome {
    let mut outcome = CompareOutcome::default();

    let mut candidate = match Candidate::acquire(db, request.mode).await {
        Ok(candidate) => candidate,
        Err(e) => {
            error!("compare aborted: {}", e);
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    if let Err(e) = dry_run(&mut candidate, request, &mut outcome).await {
        error!("compare failed: {}", e);
        outcome.error = Some(e.to_string());
    }

    if let Err(e) = candidate.rollback().await {
        warn!("compare rollback failed: {}", e);
        outcome.error.get_or_insert_with(|| e.to_string());
    }
    if let Err(e) = candidate.release().await {
        warn!("compare release failed: {}", e);
        outcome.error.get_or_insert_with(|| e.to_string());
    }

    outcome
}

async fn dry_run<D: ConfigDatabase>(
    candidate: &mut Candidate<'_, D>,
    request: &CompareRequest,
    outcome: &mut CompareOutcome,
) -> Result<()> {
    candidate.load(&request.source, request.format).await?;
    outcome.diff = candidate.diff().await?;

    if request.check {
        outcome.check = candidate.validate().await?;
    }
    Ok(())
}

/// Load `request.source`, validate it, and commit it with confirmation.
///
/// A device fault after the lock was taken rolls the candidate back before
/// the lock is released. The outcome always carries the best-known diff.
pub async fn commit<D: ConfigDatabase>(db: &mut D, request: &CommitRequest) -> CommitOutcome {
    let mut outcome = CommitOutcome::default();

    if let Err(e) = request.options.confirm_minutes() {
        error!("commit aborted: {}", e);
        outcome.error = Some(e.to_string());
        return outcome;
    }

    let mode = request.mode.unwrap_or_default();
    let mut candidate = match Candidate::acquire(db, mode).await {
        Ok(candidate) => candidate,
        Err(e) => {
            error!("commit aborted: {}", e);
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    if let Err(e) = apply(&mut candidate, request, &mut outcome).await {
        error!("commit failed: {}", e);
        if e.is_device_fault() {
            if let Err(rollback) = candidate.rollback().await {
                warn!("rollback after failed commit also failed: {}", rollback);
            }
        }
        outcome.error = Some(e.to_string());
    }

    if let Err(e) = candidate.release().await {
        warn!("commit release failed: {}", e);
        outcome.error.get_or_insert_with(|| e.to_string());
    }

    if outcome.committed {
        info!("configuration committed ({})", mode);
    }
    outcome
}

async fn apply<D: ConfigDatabase>(
    candidate: &mut Candidate<'_, D>,
    request: &CommitRequest,
    outcome: &mut CommitOutcome,
) -> Result<()> {
    candidate.load(&request.source, request.format).await?;

    if !candidate.validate().await? {
        return Err(ConfigError::Validation {
            message: "candidate configuration did not pass commit check".to_string(),
        }
        .into());
    }

    outcome.diff = candidate.diff().await?;

    if !candidate.commit(&request.options).await? {
        return Err(ConfigError::Commit {
            message: "device did not acknowledge the commit".to_string(),
        }
        .into());
    }
    outcome.committed = true;

    // Post-commit drift check; only attempted.
    match candidate.validate().await {
        Ok(true) => {}
        Ok(false) => debug!("post-commit check reported problems"),
        Err(e) => debug!("post-commit check raised: {}", e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, RpcError};

    /// Records every step; fails the named step once reached.
    #[derive(Default)]
    struct RecordingDb {
        steps: Vec<&'static str>,
        fail_on: Option<&'static str>,
        reject_check: bool,
        diff: String,
    }

    impl RecordingDb {
        fn failing(step: &'static str) -> Self {
            Self {
                fail_on: Some(step),
                diff: "[edit system]\n+  host-name r1;".to_string(),
                ..Default::default()
            }
        }

        fn ok() -> Self {
            Self {
                diff: "[edit system]\n+  host-name r1;".to_string(),
                ..Default::default()
            }
        }

        fn step(&mut self, name: &'static str) -> Result<()> {
            self.steps.push(name);
            if self.fail_on == Some(name) {
                return Err(match name {
                    "acquire" => ConfigError::Lock {
                        message: "configuration database locked by user netops".to_string(),
                    }
                    .into(),
                    "load" => ConfigError::Load {
                        message: "syntax error".to_string(),
                    }
                    .into(),
                    _ => RpcError::Fault {
                        message: format!("{} rejected", name),
                    }
                    .into(),
                });
            }
            Ok(())
        }

        fn count(&self, name: &str) -> usize {
            self.steps.iter().filter(|s| **s == name).count()
        }
    }

    impl ConfigDatabase for RecordingDb {
        async fn acquire(&mut self, _mode: LockMode) -> Result<()> {
            self.step("acquire")
        }

        async fn load(
            &mut self,
            _source: &ConfigSource,
            _format: ConfigFormat,
            _merge: bool,
        ) -> Result<()> {
            self.step("load")
        }

        async fn diff(&mut self) -> Result<String> {
            self.step("diff")?;
            Ok(self.diff.clone())
        }

        async fn validate(&mut self) -> Result<bool> {
            self.step("validate")?;
            Ok(!self.reject_check)
        }

        async fn commit(&mut self, _options: &CommitOptions) -> Result<bool> {
            self.step("commit")?;
            Ok(true)
        }

        async fn rollback(&mut self) -> Result<()> {
            self.step("rollback")
        }

        async fn release(&mut self) -> Result<()> {
            self.step("release")
        }
    }

    fn statements() -> ConfigSource {
        ConfigSource::statements(["set system host-name r1"])
    }

    #[tokio::test]
    async fn test_commit_happy_path() {
        let mut db = RecordingDb::ok();
        let outcome = commit(&mut db, &CommitRequest::new(statements()).comment("ticket 42")).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.diff, "[edit system]\n+  host-name r1;");
        assert_eq!(
            db.steps,
            vec!["acquire", "load", "validate", "diff", "commit", "validate", "release"]
        );
    }

    #[tokio::test]
    async fn test_load_failure_releases_once() {
        let mut db = RecordingDb::failing("load");
        let outcome = commit(&mut db, &CommitRequest::new(statements())).await;

        assert!(!outcome.committed);
        assert!(outcome.error.as_deref().unwrap().contains("syntax error"));
        assert_eq!(db.count("release"), 1);
        assert_eq!(db.count("commit"), 0);
        assert_eq!(db.steps, vec!["acquire", "load", "rollback", "release"]);
    }

    #[tokio::test]
    async fn test_commit_fault_rolls_back_before_release() {
        let mut db = RecordingDb::failing("commit");
        let outcome = commit(&mut db, &CommitRequest::new(statements())).await;

        assert!(!outcome.committed);
        assert_eq!(outcome.diff, "[edit system]\n+  host-name r1;");
        let rollback = db.steps.iter().position(|s| *s == "rollback").unwrap();
        let release = db.steps.iter().position(|s| *s == "release").unwrap();
        assert!(rollback < release);
        assert_eq!(db.count("release"), 1);
    }

    #[tokio::test]
    async fn test_failed_check_blocks_commit() {
        let mut db = RecordingDb {
            reject_check: true,
            ..RecordingDb::ok()
        };
        let outcome = commit(&mut db, &CommitRequest::new(statements())).await;

        assert!(!outcome.committed);
        assert!(outcome.error.unwrap().contains("commit check"));
        assert_eq!(db.count("commit"), 0);
        assert_eq!(db.count("rollback"), 1);
        assert_eq!(db.count("release"), 1);
    }

    #[tokio::test]
    async fn test_lock_failure_skips_load() {
        let mut db = RecordingDb::failing("acquire");
        let outcome = commit(&mut db, &CommitRequest::new(statements())).await;

        assert!(!outcome.committed);
        assert!(outcome.error.unwrap().starts_with("Configuration error: Failed to lock"));
        assert_eq!(db.steps, vec!["acquire"]);

        let mut db = RecordingDb::failing("acquire");
        let outcome = compare(&mut db, &CompareRequest::new(statements())).await;
        assert!(outcome.error.is_some());
        assert_eq!(db.steps, vec!["acquire"]);
    }

    #[tokio::test]
    async fn test_invalid_confirm_window_never_locks() {
        let mut db = RecordingDb::ok();
        let request = CommitRequest::new(statements()).confirm(Some(Duration::from_secs(5)));
        let outcome = commit(&mut db, &request).await;

        assert!(!outcome.committed);
        assert!(outcome.error.is_some());
        assert!(db.steps.is_empty());
    }

    #[tokio::test]
    async fn test_post_commit_check_is_best_effort() {
        // Only the second validate fails.
        struct FlakyCheck(RecordingDb, usize);
        impl ConfigDatabase for FlakyCheck {
            async fn acquire(&mut self, mode: LockMode) -> Result<()> {
                self.0.acquire(mode).await
            }
            async fn load(
                &mut self,
                source: &ConfigSource,
                format: ConfigFormat,
                merge: bool,
            ) -> Result<()> {
                self.0.load(source, format, merge).await
            }
            async fn diff(&mut self) -> Result<String> {
                self.0.diff().await
            }
            async fn validate(&mut self) -> Result<bool> {
                self.1 += 1;
                if self.1 > 1 {
                    return Err(Error::Rpc(RpcError::Closed));
                }
                self.0.validate().await
            }
            async fn commit(&mut self, options: &CommitOptions) -> Result<bool> {
                self.0.commit(options).await
            }
            async fn rollback(&mut self) -> Result<()> {
                self.0.rollback().await
            }
            async fn release(&mut self) -> Result<()> {
                self.0.release().await
            }
        }

        let mut flaky = FlakyCheck(RecordingDb::ok(), 0);
        let outcome = commit(&mut flaky, &CommitRequest::new(statements())).await;
        assert!(outcome.is_success());
        assert_eq!(flaky.0.count("rollback"), 0);
        assert_eq!(flaky.0.count("release"), 1);
    }

    #[tokio::test]
    async fn test_compare_never_commits() {
        let mut db = RecordingDb::ok();
        let outcome = compare(&mut db, &CompareRequest::new(statements())).await;

        assert_eq!(outcome.diff, "[edit system]\n+  host-name r1;");
        assert!(!outcome.check);
        assert!(outcome.is_success());
        assert_eq!(db.steps, vec!["acquire", "load", "diff", "rollback", "release"]);
    }

    #[tokio::test]
    async fn test_compare_check_then_rollback() {
        for reject in [false, true] {
            let mut db = RecordingDb {
                reject_check: reject,
                ..RecordingDb::ok()
            };
            let outcome = compare(&mut db, &CompareRequest::new(statements()).check(true)).await;

            assert_eq!(outcome.check, !reject);
            assert_eq!(
                db.steps,
                vec!["acquire", "load", "diff", "validate", "rollback", "release"]
            );
        }
    }

    #[tokio::test]
    async fn test_compare_check_fault_is_reported() {
        let mut db = RecordingDb::failing("validate");
        let outcome = compare(&mut db, &CompareRequest::new(statements()).check(true)).await;

        assert!(!outcome.check);
        assert!(!outcome.is_success());
        assert!(outcome.error.as_deref().unwrap().contains("validate rejected"));
        assert_eq!(outcome.diff, "[edit system]\n+  host-name r1;");
        assert_eq!(
            db.steps,
            vec!["acquire", "load", "diff", "validate", "rollback", "release"]
        );
    }

    #[tokio::test]
    async fn test_compare_load_failure_still_releases() {
        let mut db = RecordingDb::failing("load");
        let outcome = compare(&mut db, &CompareRequest::new(statements())).await;

        assert!(outcome.diff.is_empty());
        assert!(outcome.error.is_some());
        assert_eq!(db.count("release"), 1);
        assert_eq!(db.count("commit"), 0);
    }

    #[test]
    fn test_request_builders() {
        let request = CommitRequest::new(ConfigSource::File("r1.conf".into()))
            .mode(LockMode::Exclusive)
            .confirm(Some(Duration::from_secs(300)))
            .comment("maintenance");
        assert_eq!(request.format, ConfigFormat::Text);
        assert_eq!(request.mode, Some(LockMode::Exclusive));
        assert_eq!(request.options.confirm_minutes().unwrap(), Some(5));

        let request = CompareRequest::new(statements()).format(ConfigFormat::Text);
        assert_eq!(request.mode, LockMode::Private);
        assert_eq!(request.format, ConfigFormat::Text);
        assert!(!request.check);
    }
}
