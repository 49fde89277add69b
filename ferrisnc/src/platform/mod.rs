//! Vendor support and operational table definitions.
//!
//! [`vendors`] holds the per-vendor configuration databases and typed
//! operational RPCs. [`ViewRegistry`] turns list-shaped RPC replies into
//! keyed rows using YAML table/view definitions.

mod definition;
mod registry;
pub mod vendors;

pub use definition::{
    ArgValue, Definition, FieldDefinition, FieldType, FieldValue, TableDefinition, ViewDefinition,
};
pub use registry::{TableRow, TableRows, ViewRegistry};
