use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kernel::constants;
use crate::storage::error::StorageSystemError;

/// Role of a declared field within its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// The primary key; exactly one per table, always declared first
    PrimaryKey,
    /// A secondary index usable with `where_equals`
    Indexed,
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
}

/// Declared shape of one table: primary key first, then indexed fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl TableSchema {
    /// Start a table declaration with no fields.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Declare the primary key field.
    pub fn primary_key(mut self, field: &str) -> Self {
        self.fields.push(FieldSpec {
            name: field.to_string(),
            role: FieldRole::PrimaryKey,
        });
        self
    }

    /// Declare a secondary index field.
    pub fn index(mut self, field: &str) -> Self {
        self.fields.push(FieldSpec {
            name: field.to_string(),
            role: FieldRole::Indexed,
        });
        self
    }

    /// Name of the primary key field, if one was declared first.
    pub fn primary_key_field(&self) -> Option<&str> {
        self.fields
            .first()
            .filter(|f| f.role == FieldRole::PrimaryKey)
            .map(|f| f.name.as_str())
    }

    /// Declared secondary index fields, in declaration order.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Indexed)
            .map(|f| f.name.as_str())
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed_fields().any(|f| f == field)
    }

    fn validate(&self) -> Result<(), StorageSystemError> {
        let invalid = |reason: String| StorageSystemError::InvalidSchema {
            table: Some(self.name.clone()),
            reason,
        };

        if !is_identifier(&self.name) {
            return Err(invalid(format!("'{}' is not a valid table name", self.name)));
        }
        let Some(first) = self.fields.first() else {
            return Err(invalid("at least one field must be declared".to_string()));
        };
        if first.role != FieldRole::PrimaryKey {
            return Err(invalid(format!(
                "first field '{}' must be the primary key",
                first.name
            )));
        }

        let mut seen = HashSet::new();
        for (position, field) in self.fields.iter().enumerate() {
            if !is_identifier(&field.name) {
                return Err(invalid(format!("'{}' is not a valid field name", field.name)));
            }
            if position > 0 && field.role == FieldRole::PrimaryKey {
                return Err(invalid(format!(
                    "'{}' declares a second primary key",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("field '{}' is declared twice", field.name)));
            }
        }
        Ok(())
    }
}

/// Renders the compact declaration, e.g. `url_crc,domain,source_type`.
impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|field| field.name.as_str()).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Declared shape of the whole store at one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSchema {
    pub name: String,
    pub version: u32,
    pub tables: Vec<TableSchema>,
}

impl StoreSchema {
    pub fn new(name: &str, version: u32) -> Self {
        Self {
            name: name.to_string(),
            version,
            tables: Vec::new(),
        }
    }

    /// Add a table declaration.
    pub fn table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Check the declaration before anything touches the store engine.
    pub fn validate(&self) -> Result<(), StorageSystemError> {
        let invalid = |reason: String| StorageSystemError::InvalidSchema { table: None, reason };

        if self.name.trim().is_empty() {
            return Err(invalid("store name must not be empty".to_string()));
        }
        if self.version == 0 {
            return Err(invalid("schema version must be at least 1".to_string()));
        }
        if self.tables.is_empty() {
            return Err(invalid("at least one table must be declared".to_string()));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            table.validate()?;
            if !seen.insert(table.name.as_str()) {
                return Err(invalid(format!("table '{}' is declared twice", table.name)));
            }
        }
        Ok(())
    }

    /// Whether `self` only adds to `previous`: every previous table survives with
    /// the same primary key and all of its indexes.
    pub fn is_additive_over(&self, previous: &StoreSchema) -> bool {
        previous.tables.iter().all(|old| {
            self.get_table(&old.name).is_some_and(|new| {
                new.primary_key_field() == old.primary_key_field()
                    && old.indexed_fields().all(|f| new.is_indexed(f))
            })
        })
    }
}

/// The version 1 schema of the `impress` store.
pub fn impress_schema() -> StoreSchema {
    StoreSchema::new(constants::STORE_NAME, constants::SCHEMA_VERSION)
        .table(
            TableSchema::new("data")
                .primary_key("url_crc")
                .index("domain")
                .index("source_type")
                .index("click_count")
                .index("comments_count")
                .index("impress"),
        )
        .table(TableSchema::new("dpt").primary_key("url_crc"))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impress_schema_is_valid() {
        let schema = impress_schema();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.version, 1);
        assert_eq!(schema.name, "impress");

        let data = schema.get_table("data").unwrap();
        assert_eq!(
            data.to_string(),
            "url_crc,domain,source_type,click_count,comments_count,impress"
        );
        assert_eq!(data.primary_key_field(), Some("url_crc"));

        let dpt = schema.get_table("dpt").unwrap();
        assert_eq!(dpt.to_string(), "url_crc");
        assert_eq!(dpt.indexed_fields().count(), 0);
    }

    #[test]
    fn test_table_without_fields_is_rejected() {
        let schema = StoreSchema::new("s", 1).table(TableSchema::new("empty"));
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn test_first_field_must_be_primary_key() {
        let schema = StoreSchema::new("s", 1).table(TableSchema::new("t").index("a"));
        assert!(matches!(
            schema.validate(),
            Err(StorageSystemError::InvalidSchema { table: Some(ref t), .. }) if t == "t"
        ));
    }

    #[test]
    fn test_second_primary_key_is_rejected() {
        let schema = StoreSchema::new("s", 1)
            .table(TableSchema::new("t").primary_key("a").primary_key("b"));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_bad_names_and_duplicates_are_rejected() {
        let bad_table = StoreSchema::new("s", 1).table(TableSchema::new("my table").primary_key("k"));
        assert!(bad_table.validate().is_err());

        let bad_field = StoreSchema::new("s", 1).table(TableSchema::new("t").primary_key("1k"));
        assert!(bad_field.validate().is_err());

        let dup_field = StoreSchema::new("s", 1)
            .table(TableSchema::new("t").primary_key("k").index("k"));
        assert!(dup_field.validate().is_err());

        let dup_table = StoreSchema::new("s", 1)
            .table(TableSchema::new("t").primary_key("k"))
            .table(TableSchema::new("t").primary_key("k"));
        assert!(dup_table.validate().is_err());
    }

    #[test]
    fn test_version_zero_and_empty_store_are_rejected() {
        assert!(StoreSchema::new("s", 0)
            .table(TableSchema::new("t").primary_key("k"))
            .validate()
            .is_err());
        assert!(StoreSchema::new("s", 1).validate().is_err());
    }

    #[test]
    fn test_additive_check() {
        let v1 = impress_schema();
        let v2 = StoreSchema::new("impress", 2)
            .table(v1.get_table("data").unwrap().clone())
            .table(TableSchema::new("dpt").primary_key("url_crc").index("status"))
            .table(TableSchema::new("feeds").primary_key("id"));
        assert!(v2.is_additive_over(&v1));

        let dropped = StoreSchema::new("impress", 2)
            .table(v1.get_table("data").unwrap().clone());
        assert!(!dropped.is_additive_over(&v1));

        let rekeyed = StoreSchema::new("impress", 2)
            .table(v1.get_table("data").unwrap().clone())
            .table(TableSchema::new("dpt").primary_key("id"));
        assert!(!rekeyed.is_additive_over(&v1));
    }
}
