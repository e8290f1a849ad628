use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::kernel::component::KernelComponent;
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result as KernelResult};
use crate::storage::error::StorageSystemError;
use crate::storage::records::Record;
use crate::storage::schema::StoreSchema;
use crate::storage::table::{RecordKey, Table};

pub type Result<T> = std::result::Result<T, StorageSystemError>;

const META_TABLE: &str = "_impress_meta";
const META_VERSION_KEY: &str = "version";
const META_SCHEMA_KEY: &str = "schema";

/// Local persistent record store opened once at startup
///
/// Each declared table is a SQLite table of JSON bodies keyed by the primary
/// key value; every declared index is an expression index over the body.
pub struct LocalStore {
    schema: StoreSchema,
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) the store named by `schema` under `dir`.
    ///
    /// The schema is validated first. Reopening an existing store reuses its
    /// records as long as the declared schema matches the stored one or is an
    /// additive upgrade to a higher version.
    pub fn open(dir: &Path, schema: StoreSchema) -> Result<Self> {
        schema.validate()?;

        fs::create_dir_all(dir)
            .map_err(|e| StorageSystemError::io(e, "create_store_dir", dir.to_path_buf()))?;
        let path = dir.join(format!("{}.{}", schema.name, constants::STORE_FILE_EXTENSION));

        log::debug!("Opening local store '{}' at {}", schema.name, path.display());
        let mut conn = Connection::open(&path).map_err(|source| StorageSystemError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| StorageSystemError::engine(e, "busy_timeout"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StorageSystemError::engine(e, "journal_mode"))?;

        apply_schema(&mut conn, &schema)?;
        log::info!(
            "Local store '{}' ready at version {} ({} tables)",
            schema.name,
            schema.version,
            schema.tables.len()
        );

        Ok(Self {
            schema,
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn version(&self) -> u32 {
        self.schema.version
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// Path of the database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether every declared table exists and the connection is usable.
    pub fn is_ready(&self) -> bool {
        let Ok(conn) = self.lock("is_ready") else {
            return false;
        };
        self.schema.tables.iter().all(|table| {
            conn.query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![sql_table_name(&table.name)],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .unwrap_or(false)
        })
    }

    /// Handle to a declared table.
    pub fn table(&self, name: &str) -> Result<Table<'_>> {
        let schema = self
            .schema
            .get_table(name)
            .ok_or_else(|| StorageSystemError::TableNotFound(name.to_string()))?;
        Ok(Table::new(self, schema))
    }

    /// Fetch a typed record from its table.
    pub fn get_record<R: Record>(&self, key: impl Into<RecordKey>) -> Result<Option<R>> {
        self.table(R::TABLE)?.get_as(key)
    }

    /// Upsert a typed record into its table.
    pub fn put_record<R: Record>(&self, record: &R) -> Result<RecordKey> {
        self.table(R::TABLE)?.put_as(record)
    }

    pub(crate) fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageSystemError::LockPoisoned(operation.to_string()))
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("name", &self.schema.name)
            .field("version", &self.schema.version)
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl KernelComponent for LocalStore {
    fn name(&self) -> &'static str {
        "LocalStore"
    }

    async fn initialize(&self) -> KernelResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::PublishSingletons,
                component_name: Some("LocalStore".to_string()),
                message: format!("store '{}' is not ready", self.schema.name),
                source: None,
            })
        }
    }
}

pub(crate) fn sql_table_name(table: &str) -> String {
    format!("t_{table}")
}

pub(crate) fn sql_index_name(table: &str, field: &str) -> String {
    // `:` never appears in an identifier, so names cannot collide across tables
    format!("idx:{table}:{field}")
}

/// Expression used both by the index definitions and by indexed lookups.
pub(crate) fn field_expr(field: &str) -> String {
    format!("json_extract(body, '$.{field}')")
}

fn apply_schema(conn: &mut Connection, schema: &StoreSchema) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|e| StorageSystemError::engine(e, "begin_schema"))?;

    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {META_TABLE} (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL);"
    ))
    .map_err(|e| StorageSystemError::engine(e, "create_meta"))?;

    if let Some((stored_version, stored_schema)) = read_meta(&tx)? {
        check_compatible(schema, stored_version, &stored_schema)?;
        if stored_version < schema.version {
            log::info!(
                "Upgrading store '{}' from version {} to {}",
                schema.name,
                stored_version,
                schema.version
            );
        }
    } else {
        log::info!("Creating store '{}' at version {}", schema.name, schema.version);
    }

    for table in &schema.tables {
        let sql_table = sql_table_name(&table.name);
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{sql_table}\" (pk PRIMARY KEY NOT NULL, body TEXT NOT NULL);"
        ))
        .map_err(|e| StorageSystemError::engine(e, "create_table"))?;

        for field in table.indexed_fields() {
            tx.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{sql_table}\" ({});",
                sql_index_name(&table.name, field),
                field_expr(field)
            ))
            .map_err(|e| StorageSystemError::engine(e, "create_index"))?;
        }
    }

    write_meta(&tx, schema)?;
    tx.commit()
        .map_err(|e| StorageSystemError::engine(e, "commit_schema"))
}

fn check_compatible(schema: &StoreSchema, stored_version: u32, stored: &StoreSchema) -> Result<()> {
    if stored_version > schema.version {
        return Err(StorageSystemError::VersionDowngrade {
            store: schema.name.clone(),
            stored: stored_version,
            declared: schema.version,
        });
    }

    let additive = schema.is_additive_over(stored);
    if stored_version == schema.version {
        // Same version must mean the same shape, in either direction
        if !(additive && stored.is_additive_over(schema)) {
            return Err(StorageSystemError::SchemaConflict {
                store: schema.name.clone(),
                version: stored_version,
                reason: "declared tables differ from the stored schema without a version bump"
                    .to_string(),
            });
        }
    } else if !additive {
        return Err(StorageSystemError::SchemaConflict {
            store: schema.name.clone(),
            version: stored_version,
            reason: format!(
                "version {} removes a table, an index, or changes a primary key",
                schema.version
            ),
        });
    }
    Ok(())
}

fn read_meta(tx: &Transaction<'_>) -> Result<Option<(u32, StoreSchema)>> {
    let lookup = |key: &str| -> Result<Option<String>> {
        tx.query_row(
            &format!("SELECT value FROM {META_TABLE} WHERE key = ?1"),
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| StorageSystemError::engine(e, "read_meta"))
    };

    let (Some(version), Some(schema)) = (lookup(META_VERSION_KEY)?, lookup(META_SCHEMA_KEY)?) else {
        return Ok(None);
    };
    let version = version
        .parse::<u32>()
        .map_err(|e| StorageSystemError::DeserializationError {
            format: "schema version".to_string(),
            source: Box::new(e),
        })?;
    let schema = serde_json::from_str::<StoreSchema>(&schema).map_err(|e| {
        StorageSystemError::DeserializationError {
            format: "json".to_string(),
            source: Box::new(e),
        }
    })?;
    Ok(Some((version, schema)))
}

fn write_meta(tx: &Transaction<'_>, schema: &StoreSchema) -> Result<()> {
    let encoded = serde_json::to_string(schema).map_err(|e| StorageSystemError::SerializationError {
        format: "json".to_string(),
        source: Box::new(e),
    })?;
    let upsert = format!(
        "INSERT INTO {META_TABLE} (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value"
    );
    tx.execute(&upsert, params![META_VERSION_KEY, schema.version.to_string()])
        .map_err(|e| StorageSystemError::engine(e, "write_meta"))?;
    tx.execute(&upsert, params![META_SCHEMA_KEY, encoded])
        .map_err(|e| StorageSystemError::engine(e, "write_meta"))?;
    Ok(())
}
