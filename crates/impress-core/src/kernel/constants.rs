/// Application name
pub const APP_NAME: &str = "impress";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current UI plugin API version
pub const API_VERSION: &str = "0.1.0";

/// Name of the local store opened at startup
pub const STORE_NAME: &str = "impress";

/// Schema version shared by every table of the store
pub const SCHEMA_VERSION: u32 = 1;

/// File extension of the store database
pub const STORE_FILE_EXTENSION: &str = "sqlite3";

/// Data directory name under the platform data dir
pub const DATA_DIR_NAME: &str = "impress";

/// Fallback data directory when the platform has none
pub const FALLBACK_DATA_DIR: &str = ".impress";

/// Default attachment point for the root view
pub const DEFAULT_MOUNT_TARGET: &str = "app";

/// Default notice duration in seconds (0 keeps notices until closed)
pub const DEFAULT_NOTICE_DURATION_SECS: u64 = 3;

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
