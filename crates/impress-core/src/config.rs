use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::constants;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Failed to serialize config to {format}: {message}")]
    Serialize { format: &'static str, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// Local store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store name; also the database file stem
    pub name: String,
    /// Directory holding the store; platform data dir when unset
    pub dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: constants::STORE_NAME.to_string(),
            dir: None,
        }
    }
}

impl StoreConfig {
    /// The directory the store opens in.
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .map(|d| d.join(constants::DATA_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(constants::FALLBACK_DATA_DIR)),
        }
    }
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base for relative request paths
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: constants::DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: format!("{}/{}", constants::APP_NAME, constants::APP_VERSION),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Notification sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Seconds before a notice closes itself; 0 keeps it open
    pub duration_secs: u64,
    /// Maximum number of notices shown at once
    pub max_count: Option<usize>,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            duration_secs: constants::DEFAULT_NOTICE_DURATION_SECS,
            max_count: None,
        }
    }
}

/// Startup configuration of the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    /// Attachment point id the root view mounts into
    pub mount_target: String,
    pub http: HttpConfig,
    pub notifications: NoticeConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            mount_target: constants::DEFAULT_MOUNT_TARGET.to_string(),
            http: HttpConfig::default(),
            notifications: NoticeConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load a config file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&data, format)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse config text in the given format; missing keys take defaults.
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                format: "JSON",
                message: e.to_string(),
            }),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize {
                format: "YAML",
                message: e.to_string(),
            }),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                format: "TOML",
                message: e.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "store.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.mount_target.trim_start_matches('#').is_empty() {
            return Err(ConfigError::Invalid {
                key: "mount_target".to_string(),
                message: "must name an attachment point".to_string(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "http.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.store.name, "impress");
        assert_eq!(config.mount_target, "app");
        assert_eq!(config.notifications.duration_secs, 3);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_parse_json_partial_uses_defaults() {
        let config = AppConfig::parse(r#"{"mount_target": "root"}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config.mount_target, "root");
        assert_eq!(config.store, StoreConfig::default());
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_parse_toml() {
        let data = r#"
            log_level = "debug"

            [store]
            name = "impress-test"
            dir = "/tmp/impress-test"

            [notifications]
            duration_secs = 0
            max_count = 2
        "#;
        let config = AppConfig::parse(data, ConfigFormat::Toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.store.name, "impress-test");
        assert_eq!(config.store.resolved_dir(), PathBuf::from("/tmp/impress-test"));
        assert_eq!(config.notifications.max_count, Some(2));
        assert_eq!(config.notifications.duration_secs, 0);
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_parse_yaml() {
        let data = "http:\n  base_url: https://api.example.com/\n  timeout_secs: 5\n";
        let config = AppConfig::parse(data, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.http.base_url.as_deref(), Some("https://api.example.com/"));
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::parse(r##"{"mount_target": "#"}"##, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "mount_target"));

        let err = AppConfig::parse(r#"{"http": {"timeout_secs": 0}}"#, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        assert!(matches!(
            AppConfig::parse("{not json", ConfigFormat::Json),
            Err(ConfigError::Parse { format: "JSON", .. })
        ));
    }

    #[test]
    fn test_serialize_round_trip_json() {
        let mut config = AppConfig::default();
        config.store.dir = Some(PathBuf::from("/var/lib/impress"));
        let text = config.serialize(ConfigFormat::Json).unwrap();
        assert_eq!(AppConfig::parse(&text, ConfigFormat::Json).unwrap(), config);
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("impress.ini");
        fs::write(&path, "x=1").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::UnsupportedFormat(_))));
    }
}
