use std::fmt::Debug;

use crate::notify::error::NotifyError;
use crate::notify::{Notice, NoticeKind};

/// Somewhere notices are shown.
///
/// Outlets are called synchronously while the notifier holds no locks.
pub trait NoticeOutlet: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Show a newly opened (or re-keyed) notice.
    fn deliver(&self, notice: &Notice) -> Result<(), NotifyError>;

    /// A notice was closed before or at its expiry.
    fn dismiss(&self, _notice: &Notice) {}
}

/// Default outlet forwarding every notice to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOutlet;

impl LogOutlet {
    fn level(kind: NoticeKind) -> log::Level {
        match kind {
            NoticeKind::Error => log::Level::Error,
            NoticeKind::Warning => log::Level::Warn,
            NoticeKind::Success | NoticeKind::Info => log::Level::Info,
            NoticeKind::Loading => log::Level::Debug,
        }
    }
}

impl NoticeOutlet for LogOutlet {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        log::log!(
            target: "impress::notice",
            Self::level(notice.kind),
            "[{}] {}",
            notice.kind,
            notice.content
        );
        Ok(())
    }
}
