//! Minimal XML element tree exchanged with the RPC gateway.
//!
//! RPC requests are built as [`Element`]s and replies come back as
//! [`Element`]s. The tree keeps only what RPC traffic needs: tag, ordered
//! attributes, text and children. Namespace prefixes are dropped on parse.

use std::fmt::Write as _;

use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

use crate::error::{Result, RpcError};

/// A node in an RPC request or reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Local tag name (namespace prefix stripped).
    pub tag: String,

    /// Attributes in document order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,

    /// Text directly inside this element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child elements in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

/// A single argument of an RPC parameter mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcArg {
    /// `true` renders an empty child element, `false` is omitted.
    Flag(bool),
    /// Renders a child element holding this text.
    Value(String),
}

impl From<bool> for RpcArg {
    fn from(flag: bool) -> Self {
        RpcArg::Flag(flag)
    }
}

impl From<&str> for RpcArg {
    fn from(value: &str) -> Self {
        RpcArg::Value(value.to_string())
    }
}

impl From<String> for RpcArg {
    fn from(value: String) -> Self {
        RpcArg::Value(value)
    }
}

impl From<u32> for RpcArg {
    fn from(value: u32) -> Self {
        RpcArg::Value(value.to_string())
    }
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Build an RPC body from a name and a parameter mapping.
    ///
    /// Underscores in the RPC name and parameter names become hyphens, so
    /// `get_software_information` and `get-software-information` are the same
    /// call.
    pub fn rpc<K, A>(name: &str, args: impl IntoIterator<Item = (K, A)>) -> Self
    where
        K: AsRef<str>,
        A: Into<RpcArg>,
    {
        let mut element = Element::new(name.replace('_', "-"));
        for (key, arg) in args {
            let key = key.as_ref().replace('_', "-");
            match arg.into() {
                RpcArg::Flag(true) => element.children.push(Element::new(key)),
                RpcArg::Flag(false) => {}
                RpcArg::Value(value) => element.children.push(Element::new(key).with_text(value)),
            }
        }
        element
    }

    /// Add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append an empty child element (`<name/>`).
    pub fn with_flag(self, name: impl Into<String>) -> Self {
        self.with_child(Element::new(name))
    }

    /// Append a child element holding `value` as text.
    pub fn with_param(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(Element::new(name).with_text(value))
    }

    /// Get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Text of the first direct child with the given tag.
    ///
    /// A child that exists but has no text yields `Some("")`.
    pub fn find_text(&self, tag: &str) -> Option<&str> {
        self.find(tag).map(|child| child.text.as_deref().unwrap_or(""))
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// Select elements by a slash-separated tag path.
    ///
    /// `a/b/c` walks direct children. A leading `//` matches the first step
    /// against every descendant instead.
    pub fn select(&self, path: &str) -> Vec<&Element> {
        let (mut current, rest) = if let Some(rest) = path.strip_prefix("//") {
            let mut steps = rest.splitn(2, '/');
            let first = steps.next().unwrap_or_default();
            let matched: Vec<&Element> = self
                .descendants()
                .into_iter()
                .filter(|el| el.tag == first)
                .collect();
            (matched, steps.next().unwrap_or_default())
        } else {
            (vec![self], path.trim_start_matches("./"))
        };

        for step in rest.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(move |c| c.tag == step))
                .collect();
        }
        current
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Serialize to an XML string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape(text.as_str()));
        }
        for child in &self.children {
            child.write_xml(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    /// Parse an XML document into its root element.
    ///
    /// Whitespace-only text between elements is dropped; any other text is
    /// kept verbatim.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(RpcError::from)? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| RpcError::MalformedReply {
                        message: "unbalanced closing tag".to_string(),
                    })?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(RpcError::from)?;
                    if !text.trim().is_empty() {
                        if let Some(current) = stack.last_mut() {
                            current.text.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        let data = data.into_inner();
                        current
                            .text
                            .get_or_insert_with(String::new)
                            .push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(RpcError::MalformedReply {
                message: format!("unclosed element <{}>", stack[stack.len() - 1].tag),
            }
            .into());
        }

        root.ok_or_else(|| {
            RpcError::MalformedReply {
                message: "empty document".to_string(),
            }
            .into()
        })
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element> {
        let name = start.name();
        let mut element = Element::new(String::from_utf8_lossy(name.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| RpcError::from(quick_xml::Error::from(e)))?;
            let key = attr.key.as_ref();
            if key.starts_with(b"xmlns") {
                continue;
            }
            let value = attr.unescape_value().map_err(RpcError::from)?;
            element.attributes.insert(
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value.into_owned(),
            );
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }
}
