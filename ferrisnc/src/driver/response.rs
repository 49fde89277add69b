//! Result structures handed back to callers.

use indexmap::IndexMap;
use serde::Serialize;

use crate::rpc::Element;

/// Result text for a command refused by the dispatcher.
pub const INVALID_COMMAND: &str = "Invalid command";

/// Result text for a command whose RPC failed.
pub const RPC_CALL_FAILED: &str = "RPC call failed";

/// Filtered output per command, keyed by the command exactly as given.
///
/// Repeating a command in one batch yields a single entry.
pub type CommandResult = IndexMap<String, String>;

/// What a command batch produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// One text result per command.
    Results { results: CommandResult },

    /// The device answered `command` with a raw `<rpc>` document. The batch
    /// stopped there and its first child is returned as-is.
    Structured { command: String, element: Element },
}

impl CommandOutcome {
    /// Per-command results, unless the batch ended in a structured reply.
    pub fn results(&self) -> Option<&CommandResult> {
        match self {
            CommandOutcome::Results { results } => Some(results),
            CommandOutcome::Structured { .. } => None,
        }
    }

    /// Take the per-command results.
    pub fn into_results(self) -> Option<CommandResult> {
        match self {
            CommandOutcome::Results { results } => Some(results),
            CommandOutcome::Structured { .. } => None,
        }
    }

    /// Result text for a single command.
    pub fn get(&self, command: &str) -> Option<&str> {
        self.results()
            .and_then(|results| results.get(command))
            .map(String::as_str)
    }
}

/// Outcome of a compare (dry-run) transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareOutcome {
    /// Pending changes relative to the active configuration.
    pub diff: String,

    /// Result of the device-side check; `false` when not requested.
    pub check: bool,

    /// The fault that cut the transaction short, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a commit transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Changes that were (or would have been) committed.
    pub diff: String,

    /// Whether the device accepted the commit.
    pub committed: bool,

    /// The fault that cut the transaction short, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompareOutcome {
    /// Whether the transaction ran to completion.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl CommitOutcome {
    /// Whether the configuration was committed.
    pub fn is_success(&self) -> bool {
        self.committed && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_outcome_json_shape() {
        let outcome = CommitOutcome {
            diff: "[edit system]\n+  host-name r1;".to_string(),
            committed: true,
            error: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"diff": "[edit system]\n+  host-name r1;", "committed": true})
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn test_failed_outcome_carries_error() {
        let outcome = CompareOutcome {
            error: Some("Failed to lock configuration: busy".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["check"], false);
        assert_eq!(json["error"], "Failed to lock configuration: busy");
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_command_outcome_lookup() {
        let mut results = CommandResult::new();
        results.insert("show version".to_string(), "Junos: 23.4R1".to_string());
        let outcome = CommandOutcome::Results { results };
        assert_eq!(outcome.get("show version"), Some("Junos: 23.4R1"));
        assert_eq!(outcome.get("show chassis"), None);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "results");

        let structured = CommandOutcome::Structured {
            command: "show version | display xml rpc".to_string(),
            element: Element::new("get-software-information"),
        };
        assert!(structured.results().is_none());
        assert_eq!(structured.get("show version | display xml rpc"), None);
    }
}
