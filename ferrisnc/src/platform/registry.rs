//! Session-scoped registry of table and view definitions.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};

use super::definition::{
    Definition, FieldValue, TableDefinition, ViewDefinition,
};
use crate::error::{Result, ViewError};
use crate::rpc::Element;

/// Extracted fields of one table item.
pub type TableRow = IndexMap<String, FieldValue>;

/// Table rows keyed by the table's `key` field, or by position.
pub type TableRows = IndexMap<String, TableRow>;

/// Registry of table and view definitions.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    tables: HashMap<String, TableDefinition>,
    views: HashMap<String, ViewDefinition>,
}

impl ViewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every definition in a YAML document.
    ///
    /// A name defined again replaces the earlier definition. Returns the
    /// names registered, in document order.
    pub fn load_str(&mut self, yaml: &str) -> Result<Vec<String>> {
        let document: IndexMap<String, Definition> =
            serde_yaml::from_str(yaml).map_err(ViewError::from)?;

        let mut names = Vec::with_capacity(document.len());
        for (name, definition) in document {
            match definition {
                Definition::Table(table) => {
                    if self.tables.insert(name.clone(), table).is_some() {
                        warn!("table '{}' redefined", name);
                    }
                    self.views.remove(&name);
                }
                Definition::View(view) => {
                    if self.views.insert(name.clone(), view).is_some() {
                        warn!("view '{}' redefined", name);
                    }
                    self.tables.remove(&name);
                }
            }
            names.push(name);
        }

        debug!("registered {} table/view definitions", names.len());
        Ok(names)
    }

    /// Register every definition in a YAML file.
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ViewError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.load_str(&yaml)
    }

    /// Look up a table.
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// Look up a view.
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    /// Names of all registered tables.
    pub fn tables(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }

    /// The RPC that fetches table `name`.
    pub fn table_rpc(&self, name: &str) -> Result<Element> {
        self.table(name).map(TableDefinition::to_rpc).ok_or_else(|| {
            ViewError::UnknownTable {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Apply table `name` to an RPC reply.
    pub fn extract(&self, name: &str, reply: &Element) -> Result<TableRows> {
        let table = self.table(name).ok_or_else(|| ViewError::UnknownTable {
            name: name.to_string(),
        })?;
        let view = self
            .view(&table.view)
            .ok_or_else(|| ViewError::InvalidDefinition {
                name: name.to_string(),
                message: format!("view '{}' is not defined", table.view),
            })?;

        let mut rows = TableRows::new();
        for (index, item) in reply.select(&table.item).into_iter().enumerate() {
            let key = table
                .key
                .as_deref()
                .and_then(|key| item.select(key).first().map(|el| el.text_content()))
                .map(|text| text.trim().to_string())
                .unwrap_or_else(|| index.to_string());

            let row = view
                .fields
                .iter()
                .filter_map(|(field, definition)| {
                    let (path, ty) = definition.path_and_type()?;
                    let element = item.select(path).into_iter().next();
                    Some((field.clone(), FieldValue::extract(element, ty)))
                })
                .collect();
            rows.insert(key, row);
        }
        Ok(rows)
    }
}
