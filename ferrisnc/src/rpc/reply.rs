//! Replies returned by the RPC gateway.

use log::warn;

use super::element::Element;

/// Reply to a single remote procedure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcReply {
    /// Bare acknowledgement (`<ok/>`) with no body.
    Ack,

    /// A structured reply body.
    Element(Element),
}

impl RpcReply {
    /// Get the reply body, if any.
    pub fn element(&self) -> Option<&Element> {
        match self {
            RpcReply::Ack => None,
            RpcReply::Element(el) => Some(el),
        }
    }

    /// Take the reply body, substituting an empty `<ok/>` for acknowledgements.
    pub fn into_element(self) -> Element {
        match self {
            RpcReply::Ack => Element::new("ok"),
            RpcReply::Element(el) => el,
        }
    }
}

impl From<Element> for RpcReply {
    fn from(el: Element) -> Self {
        if el.tag == "ok" && el.children.is_empty() {
            RpcReply::Ack
        } else {
            RpcReply::Element(el)
        }
    }
}

/// Severity of an embedded `rpc-error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// An `rpc-error` entry found inside a reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcErrorEntry {
    pub severity: Severity,
    pub message: String,
}

/// Collect every `rpc-error` embedded in a reply.
///
/// Missing `error-severity` is treated as an error.
pub fn rpc_errors(reply: &Element) -> Vec<RpcErrorEntry> {
    let mut nodes: Vec<&Element> = if reply.tag == "rpc-error" {
        vec![reply]
    } else {
        Vec::new()
    };
    nodes.extend(
        reply
            .descendants()
            .into_iter()
            .filter(|el| el.tag == "rpc-error"),
    );

    nodes
        .into_iter()
        .map(|node| {
            let severity = match node.find_text("error-severity").map(str::trim) {
                Some("warning") => Severity::Warning,
                _ => Severity::Error,
            };
            let message = node
                .find_text("error-message")
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| node.text_content().trim().to_string());
            RpcErrorEntry { severity, message }
        })
        .collect()
}

/// Check a reply for embedded errors.
///
/// Returns the message of the first blocking entry: any error, or any warning
/// when `ignore_warning` is off. Ignored warnings are logged.
pub fn first_fault(reply: &Element, ignore_warning: bool) -> Option<String> {
    for entry in rpc_errors(reply) {
        match entry.severity {
            Severity::Error => return Some(entry.message),
            Severity::Warning if !ignore_warning => return Some(entry.message),
            Severity::Warning => warn!("ignoring RPC warning: {}", entry.message),
        }
    }
    None
}
