use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed record bound to one table of the store
pub trait Record: Serialize + DeserializeOwned {
    /// Name of the table the record lives in
    const TABLE: &'static str;
}

/// A tracked item of the `data` table
///
/// Fields written by collaborators beyond the declared ones are kept in
/// `extra` and round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Checksum of the canonical URL; primary key
    pub url_crc: String,
    pub domain: String,
    pub source_type: String,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    /// Impression counter
    #[serde(default)]
    pub impress: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataRecord {
    pub fn new(url_crc: &str, domain: &str, source_type: &str) -> Self {
        Self {
            url_crc: url_crc.to_string(),
            domain: domain.to_string(),
            source_type: source_type.to_string(),
            click_count: 0,
            comments_count: 0,
            impress: 0,
            extra: Map::new(),
        }
    }
}

impl Record for DataRecord {
    const TABLE: &'static str = "data";
}

/// Auxiliary per-URL record of the `dpt` table; only the key is declared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DptRecord {
    pub url_crc: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DptRecord {
    pub fn new(url_crc: &str) -> Self {
        Self {
            url_crc: url_crc.to_string(),
            extra: Map::new(),
        }
    }
}

impl Record for DptRecord {
    const TABLE: &'static str = "dpt";
}
