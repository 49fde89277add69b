//! Operational command dispatch.
//!
//! Each command is checked against a denylist, sent to the device with only
//! its base command and any `display` directive, and the text reply is run
//! through the local [`pipeline`](crate::pipeline) using the full original
//! command so every requested filter is still honoured.

use log::{debug, warn};

use super::response::{CommandOutcome, CommandResult, INVALID_COMMAND, RPC_CALL_FAILED};
use crate::error::{Result, RpcError};
use crate::pipeline::{self, split_segments};
use crate::rpc::{Element, OutputFormat, RpcGateway, RpcReply, first_fault};

/// Verbs never sent to the device. Matched as a prefix of the trimmed command.
pub const DENIED_VERBS: [&str; 4] = ["request", "clear", "start", "restart"];

/// Whether `command` starts with a denied verb.
pub fn is_denied(command: &str) -> bool {
    let command = command.trim();
    DENIED_VERBS.iter().any(|verb| command.starts_with(verb))
}

/// The command actually sent over RPC.
///
/// The device only honours `display` directives attached to the command
/// itself, so the last segment mentioning `display` is kept and every other
/// pipe segment is stripped.
pub fn rpc_command(command: &str) -> String {
    let segments = split_segments(command);
    let base = segments.first().copied().unwrap_or_default().trim();

    match segments
        .iter()
        .skip(1)
        .rev()
        .find(|segment| segment.contains("display"))
    {
        Some(display) => format!("{} | {}", base, display.trim()),
        None => base.to_string(),
    }
}

/// A classified command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Structured(Element),
}

/// Classify a reply by its tag and extract its text.
pub fn render(reply: RpcReply) -> Result<Rendered> {
    let element = match reply {
        RpcReply::Ack => return Ok(Rendered::Text(String::new())),
        RpcReply::Element(element) => element,
    };

    if let Some(message) = first_fault(&element, true) {
        return Err(RpcError::Fault { message }.into());
    }

    match element.tag.as_str() {
        "output" | "rpc-reply" => Ok(Rendered::Text(element.text_content())),
        "configuration-information" => Ok(Rendered::Text(
            element
                .find_text("configuration-output")
                .unwrap_or_default()
                .to_string(),
        )),
        "rpc" => element
            .children
            .into_iter()
            .next()
            .map(Rendered::Structured)
            .ok_or_else(|| {
                RpcError::MalformedReply {
                    message: "empty <rpc> reply".to_string(),
                }
                .into()
            }),
        other => {
            debug!("rendering unrecognised <{}> reply as text", other);
            Ok(Rendered::Text(element.text_content()))
        }
    }
}

/// Run a batch of commands, one at a time, through `gateway`.
///
/// A failing command is recorded as [`RPC_CALL_FAILED`] and the batch goes on.
/// A structured `<rpc>` reply ends the batch immediately and is returned as
/// [`CommandOutcome::Structured`].
pub async fn run_commands<G, S>(gateway: &mut G, commands: &[S]) -> CommandOutcome
where
    G: RpcGateway + ?Sized,
    S: AsRef<str>,
{
    let mut results = CommandResult::new();

    for command in commands {
        let command = command.as_ref();

        if is_denied(command) {
            warn!("refusing to run '{}'", command);
            results.insert(command.to_string(), INVALID_COMMAND.to_string());
            continue;
        }

        let rpc_command = rpc_command(command);
        debug!("dispatching '{}' as '{}'", command, rpc_command);

        let rendered = match gateway.cli(&rpc_command, OutputFormat::Text).await {
            Ok(reply) => render(reply),
            Err(e) => Err(e),
        };

        let text = match rendered {
            Ok(Rendered::Text(text)) => pipeline::process(command, &text),
            Ok(Rendered::Structured(element)) => {
                return CommandOutcome::Structured {
                    command: command.to_string(),
                    element,
                };
            }
            Err(e) => {
                warn!("command '{}' failed: {}", command, e);
                RPC_CALL_FAILED.to_string()
            }
        };
        results.insert(command.to_string(), text);
    }

    CommandOutcome::Results { results }
}
