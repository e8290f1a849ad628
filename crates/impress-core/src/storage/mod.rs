//! # Impress Core Storage
//!
//! The local persistent record store opened once at startup.
//!
//! - [`schema`]: typed schema descriptor, validated before the engine is touched.
//! - [`store`]: [`LocalStore`], opening/creating the store and applying schema
//!   metadata (same version reuses data, higher version upgrades additively).
//! - [`table`]: per-table record operations keyed by [`RecordKey`].
//! - [`records`]: typed views of the `data` and `dpt` tables.
pub mod error;
pub mod records;
pub mod schema;
pub mod store;
pub mod table;

pub use error::StorageSystemError;
pub use records::{DataRecord, DptRecord, Record};
pub use schema::{impress_schema, FieldRole, FieldSpec, StoreSchema, TableSchema};
pub use store::LocalStore;
pub use table::{RecordKey, Table};

// Test module declaration
#[cfg(test)]
mod tests;
