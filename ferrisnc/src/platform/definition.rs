//! Table and view definitions loaded from YAML.
//!
//! A table names an RPC and the repeating element of its reply; a view names
//! the fields to pull out of each repetition.
//!
//! ```yaml
//! RouteTable:
//!   rpc: get-route-information
//!   args:
//!     table: inet.0
//!   item: route-table/rt
//!   key: rt-destination
//!   view: RouteView
//!
//! RouteView:
//!   fields:
//!     destination: rt-destination
//!     protocol: rt-entry/protocol-name
//!     age: { rt-entry/age: int }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rpc::{Element, RpcArg};

/// An RPC whose reply is a list of items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableDefinition {
    /// RPC name; underscores and hyphens are interchangeable.
    pub rpc: String,

    /// Default RPC arguments.
    #[serde(default)]
    pub args: IndexMap<String, ArgValue>,

    /// Path from the reply root to each item.
    pub item: String,

    /// Path, relative to an item, of the text that keys its row.
    /// Rows are keyed by position when absent.
    #[serde(default)]
    pub key: Option<String>,

    /// Name of the view applied to each item.
    pub view: String,
}

impl TableDefinition {
    /// The RPC that fetches this table.
    pub fn to_rpc(&self) -> Element {
        Element::rpc(
            &self.rpc,
            self.args
                .iter()
                .map(|(name, value)| (name.as_str(), RpcArg::from(value))),
        )
    }
}

/// A scalar RPC argument as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl From<&ArgValue> for RpcArg {
    fn from(value: &ArgValue) -> Self {
        match value {
            ArgValue::Flag(flag) => RpcArg::Flag(*flag),
            ArgValue::Number(n) => RpcArg::Value(n.to_string()),
            ArgValue::Text(text) => RpcArg::Value(text.clone()),
        }
    }
}

/// Named fields extracted from one table item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewDefinition {
    pub fields: IndexMap<String, FieldDefinition>,
}

/// Where a field's value lives and how to read it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldDefinition {
    /// `name: path`, read as text.
    Path(String),
    /// `name: { path: type }`.
    Typed(IndexMap<String, FieldType>),
}

impl FieldDefinition {
    /// The element path and conversion for this field.
    pub fn path_and_type(&self) -> Option<(&str, FieldType)> {
        match self {
            FieldDefinition::Path(path) => Some((path.as_str(), FieldType::Str)),
            FieldDefinition::Typed(map) => map.iter().next().map(|(p, t)| (p.as_str(), *t)),
        }
    }
}

/// Conversion applied to a field's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[serde(alias = "unicode")]
    Str,
    Int,
    Float,
    /// `true` if the element is present.
    Flag,
}

/// An extracted field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    /// Read `element` (if present) as `ty`. Unparseable numbers are null.
    pub fn extract(element: Option<&Element>, ty: FieldType) -> Self {
        if ty == FieldType::Flag {
            return FieldValue::Bool(element.is_some());
        }
        let Some(element) = element else {
            return FieldValue::Null;
        };
        let text = element.text_content();
        let text = text.trim();
        match ty {
            FieldType::Int => text.parse().map_or(FieldValue::Null, FieldValue::Int),
            FieldType::Float => text.parse().map_or(FieldValue::Null, FieldValue::Float),
            FieldType::Str | FieldType::Flag => FieldValue::Str(text.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A named table or view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Table(TableDefinition),
    View(ViewDefinition),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_forms() {
        let view: ViewDefinition = serde_yaml::from_str(
            "fields:\n  name: host-name\n  uptime: { up-time/seconds: int }\n  model: { product-model: unicode }\n",
        )
        .unwrap();

        assert_eq!(
            view.fields["name"].path_and_type(),
            Some(("host-name", FieldType::Str))
        );
        assert_eq!(
            view.fields["uptime"].path_and_type(),
            Some(("up-time/seconds", FieldType::Int))
        );
        assert_eq!(
            view.fields["model"].path_and_type(),
            Some(("product-model", FieldType::Str))
        );
    }

    #[test]
    fn test_table_rpc() {
        let table: TableDefinition = serde_yaml::from_str(
            "rpc: get_interface_information\nargs:\n  terse: true\n  detail: false\n  interface_name: ge-0/0/0\nitem: physical-interface\nview: IfView\n",
        )
        .unwrap();

        assert_eq!(
            table.to_rpc().to_xml(),
            "<get-interface-information><terse/>\
             <interface-name>ge-0/0/0</interface-name></get-interface-information>"
        );
        assert_eq!(table.key, None);
    }

    #[test]
    fn test_value_extraction() {
        let el = Element::new("age").with_text(" 42 ");
        assert_eq!(FieldValue::extract(Some(&el), FieldType::Int), FieldValue::Int(42));
        assert_eq!(
            FieldValue::extract(Some(&el), FieldType::Str),
            FieldValue::Str("42".to_string())
        );
        assert_eq!(FieldValue::extract(None, FieldType::Int), FieldValue::Null);
        assert_eq!(FieldValue::extract(None, FieldType::Flag), FieldValue::Bool(false));

        let bad = Element::new("age").with_text("2w1d");
        assert_eq!(FieldValue::extract(Some(&bad), FieldType::Int), FieldValue::Null);
    }
}
