use std::fmt;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use rusqlite::{params, ErrorCode, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::storage::error::StorageSystemError;
use crate::storage::schema::TableSchema;
use crate::storage::store::{field_expr, sql_table_name, LocalStore, Result};

/// Primary-key value of a record
///
/// Text and integer keys never collide: `"1"` and `1` are distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl RecordKey {
    /// Extract a key from a JSON value; only strings and integers qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RecordKey::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(RecordKey::Int),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RecordKey::Int(n) => Value::from(*n),
            RecordKey::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(n) => write!(f, "{n}"),
            RecordKey::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey::Text(key.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(key: String) -> Self {
        RecordKey::Text(key)
    }
}

impl From<&String> for RecordKey {
    fn from(key: &String) -> Self {
        RecordKey::Text(key.clone())
    }
}

impl From<i64> for RecordKey {
    fn from(key: i64) -> Self {
        RecordKey::Int(key)
    }
}

impl ToSql for RecordKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            RecordKey::Int(n) => n.to_sql(),
            RecordKey::Text(s) => s.to_sql(),
        }
    }
}

/// Handle to one declared table of a [`LocalStore`]
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    store: &'a LocalStore,
    schema: &'a TableSchema,
}

impl<'a> Table<'a> {
    pub(crate) fn new(store: &'a LocalStore, schema: &'a TableSchema) -> Self {
        Self { store, schema }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        self.schema
    }

    /// Look a record up by primary key.
    pub fn get(&self, key: impl Into<RecordKey>) -> Result<Option<Value>> {
        let key = key.into();
        let conn = self.store.lock("get")?;
        let body = conn
            .query_row(
                &format!("SELECT body FROM \"{}\" WHERE pk = ?1", self.sql_name()),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| StorageSystemError::engine(e, "get"))?;
        body.map(|b| self.decode(&b)).transpose()
    }

    /// Insert or overwrite a record; returns its primary key.
    pub fn put(&self, record: Value) -> Result<RecordKey> {
        let (key, body) = self.encode(&record)?;
        let conn = self.store.lock("put")?;
        conn.execute(&self.upsert_sql(), params![key, body])
            .map_err(|e| StorageSystemError::engine(e, "put"))?;
        log::trace!("put {} into '{}'", key, self.schema.name);
        Ok(key)
    }

    /// Insert a record whose key must not exist yet.
    pub fn add(&self, record: Value) -> Result<RecordKey> {
        let (key, body) = self.encode(&record)?;
        let conn = self.store.lock("add")?;
        let inserted = conn.execute(
            &format!("INSERT INTO \"{}\" (pk, body) VALUES (?1, ?2)", self.sql_name()),
            params![key, body],
        );
        match inserted {
            Ok(_) => Ok(key),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageSystemError::KeyExists {
                    table: self.schema.name.clone(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(StorageSystemError::engine(e, "add")),
        }
    }

    /// Shallow-merge `changes` into an existing record.
    ///
    /// Returns `false` when no record has that key. The primary key itself
    /// cannot be changed.
    pub fn update(&self, key: impl Into<RecordKey>, changes: Value) -> Result<bool> {
        let key = key.into();
        let Value::Object(changes) = changes else {
            return Err(StorageSystemError::InvalidRecord {
                table: self.schema.name.clone(),
            });
        };
        let pk_field = self.pk_field()?;
        if let Some(new_key) = changes.get(pk_field) {
            if RecordKey::from_json(new_key).as_ref() != Some(&key) {
                return Err(self.invalid_key(format!("'{pk_field}' cannot be changed by update")));
            }
        }

        let mut conn = self.store.lock("update")?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageSystemError::engine(e, "update"))?;
        let current = tx
            .query_row(
                &format!("SELECT body FROM \"{}\" WHERE pk = ?1", self.sql_name()),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| StorageSystemError::engine(e, "update"))?;
        let Some(current) = current else {
            return Ok(false);
        };

        let mut record = match self.decode(&current)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (field, value) in changes {
            record.insert(field, value);
        }
        let body = self.to_body(&Value::Object(record))?;
        tx.execute(
            &format!("UPDATE \"{}\" SET body = ?2 WHERE pk = ?1", self.sql_name()),
            params![key, body],
        )
        .map_err(|e| StorageSystemError::engine(e, "update"))?;
        tx.commit().map_err(|e| StorageSystemError::engine(e, "update"))?;
        Ok(true)
    }

    /// Remove a record; returns whether it existed.
    pub fn delete(&self, key: impl Into<RecordKey>) -> Result<bool> {
        let key = key.into();
        let conn = self.store.lock("delete")?;
        let removed = conn
            .execute(
                &format!("DELETE FROM \"{}\" WHERE pk = ?1", self.sql_name()),
                params![key],
            )
            .map_err(|e| StorageSystemError::engine(e, "delete"))?;
        Ok(removed > 0)
    }

    /// Upsert many records in one transaction. Nothing is written if any
    /// record is rejected.
    pub fn bulk_put(&self, records: Vec<Value>) -> Result<usize> {
        let encoded = records
            .iter()
            .map(|r| self.encode(r))
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.store.lock("bulk_put")?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageSystemError::engine(e, "bulk_put"))?;
        {
            let mut stmt = tx
                .prepare(&self.upsert_sql())
                .map_err(|e| StorageSystemError::engine(e, "bulk_put"))?;
            for (key, body) in &encoded {
                stmt.execute(params![key, body])
                    .map_err(|e| StorageSystemError::engine(e, "bulk_put"))?;
            }
        }
        tx.commit().map_err(|e| StorageSystemError::engine(e, "bulk_put"))?;
        Ok(encoded.len())
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.store.lock("count")?;
        conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.sql_name()),
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n.max(0) as u64)
        .map_err(|e| StorageSystemError::engine(e, "count"))
    }

    /// Remove every record of the table.
    pub fn clear(&self) -> Result<()> {
        let conn = self.store.lock("clear")?;
        conn.execute(&format!("DELETE FROM \"{}\"", self.sql_name()), [])
            .map_err(|e| StorageSystemError::engine(e, "clear"))?;
        Ok(())
    }

    /// Every record, ordered by primary key.
    pub fn all(&self) -> Result<Vec<Value>> {
        self.select(
            &format!("SELECT body FROM \"{}\" ORDER BY pk", self.sql_name()),
            None,
            "all",
        )
    }

    /// At most `limit` records after skipping `offset`, ordered by primary key.
    pub fn page(&self, offset: usize, limit: usize) -> Result<Vec<Value>> {
        let clamp = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        self.select(
            &format!(
                "SELECT body FROM \"{}\" ORDER BY pk LIMIT {} OFFSET {}",
                self.sql_name(),
                clamp(limit),
                clamp(offset)
            ),
            None,
            "page",
        )
    }

    /// Records whose indexed `field` equals `value`, ordered by primary key.
    ///
    /// The primary key counts as an index.
    pub fn where_equals(&self, field: &str, value: &Value) -> Result<Vec<Value>> {
        if self.schema.primary_key_field() == Some(field) {
            let Some(key) = RecordKey::from_json(value) else {
                return Ok(Vec::new());
            };
            return Ok(self.get(key)?.into_iter().collect());
        }
        if !self.schema.is_indexed(field) {
            return Err(StorageSystemError::NotIndexed {
                table: self.schema.name.clone(),
                field: field.to_string(),
            });
        }
        // `NULL = NULL` never matches, and neither does a missing field
        let Some(bound) = json_to_sql(value) else {
            return Ok(Vec::new());
        };
        self.select(
            &format!(
                "SELECT body FROM \"{}\" WHERE {} = ?1 ORDER BY pk",
                self.sql_name(),
                field_expr(field)
            ),
            Some(bound),
            "where_equals",
        )
    }

    /// Typed lookup by primary key.
    pub fn get_as<T: DeserializeOwned>(&self, key: impl Into<RecordKey>) -> Result<Option<T>> {
        self.get(key)?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| StorageSystemError::DeserializationError {
                    format: "json".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    /// Typed upsert.
    pub fn put_as<T: Serialize>(&self, record: &T) -> Result<RecordKey> {
        let value = serde_json::to_value(record).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        self.put(value)
    }

    fn select(&self, sql: &str, bound: Option<SqlValue>, operation: &str) -> Result<Vec<Value>> {
        let conn = self.store.lock(operation)?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StorageSystemError::engine(e, operation))?;
        let bodies = match bound {
            Some(v) => stmt
                .query_map(params![v], |row| row.get::<_, String>(0))
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>()),
            None => stmt
                .query_map([], |row| row.get::<_, String>(0))
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>()),
        }
        .map_err(|e| StorageSystemError::engine(e, operation))?;
        bodies.iter().map(|b| self.decode(b)).collect()
    }

    fn upsert_sql(&self) -> String {
        format!(
            "INSERT INTO \"{}\" (pk, body) VALUES (?1, ?2) \
             ON CONFLICT(pk) DO UPDATE SET body = excluded.body",
            self.sql_name()
        )
    }

    fn sql_name(&self) -> String {
        sql_table_name(&self.schema.name)
    }

    fn pk_field(&self) -> Result<&str> {
        self.schema
            .primary_key_field()
            .ok_or_else(|| self.invalid_key("table declares no primary key".to_string()))
    }

    fn encode(&self, record: &Value) -> Result<(RecordKey, String)> {
        let Value::Object(map) = record else {
            return Err(StorageSystemError::InvalidRecord {
                table: self.schema.name.clone(),
            });
        };
        let pk_field = self.pk_field()?;
        let key = match map.get(pk_field) {
            None | Some(Value::Null) => {
                return Err(self.invalid_key(format!("record has no '{pk_field}' field")));
            }
            Some(raw) => RecordKey::from_json(raw).ok_or_else(|| {
                self.invalid_key(format!("'{pk_field}' must be a string or an integer"))
            })?,
        };
        Ok((key, self.to_body(record)?))
    }

    fn to_body(&self, record: &Value) -> Result<String> {
        serde_json::to_string(record).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }

    fn decode(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| StorageSystemError::DeserializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }

    fn invalid_key(&self, reason: String) -> StorageSystemError {
        StorageSystemError::InvalidKey {
            table: self.schema.name.clone(),
            reason,
        }
    }
}

/// Map a JSON value to what `json_extract` yields for it.
fn json_to_sql(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Some(SqlValue::Text(value.to_string())),
    }
}
