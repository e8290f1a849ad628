//! # Impress Core Notification Errors
//!
//! [`NotifyError`] covers failures of the notification sink: a poisoned
//! notice list and outlets refusing a notice.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notice outlet '{outlet}' failed to deliver notice {notice_id}: {source}")]
    OutletFailed {
        outlet: String,
        notice_id: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Failed to acquire lock for notices during operation '{operation}'")]
    LockError { operation: String },

    #[error("Notice content must not be empty")]
    EmptyContent,
}
