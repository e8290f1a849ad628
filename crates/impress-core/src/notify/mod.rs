//! # Impress Core Notifications
//!
//! The process-wide notification sink views use to show short status
//! messages ("saved", "upload failed", ...).
//!
//! A [`Notifier`] keeps the list of currently open [`Notice`]s and fans each
//! new notice out to its [`NoticeOutlet`]s. Notices close themselves after
//! their duration (a zero duration keeps them open until closed), and the
//! oldest ones are evicted once `max_count` is exceeded. Opening a notice with
//! the key of an open one replaces it in place, which is how a `loading`
//! notice turns into a `success` one.
pub mod error;
pub mod outlet;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::config::NoticeConfig;
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result as KernelResult;

pub use error::NotifyError;
pub use outlet::{LogOutlet, NoticeOutlet};

pub type Result<T> = std::result::Result<T, NotifyError>;

/// Kind of a notice, mirroring the usual message levels of a UI kit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
    Warning,
    Loading,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
            NoticeKind::Warning => "warning",
            NoticeKind::Loading => "loading",
        };
        f.write_str(name)
    }
}

/// A single open notice
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub key: Option<String>,
    pub kind: NoticeKind,
    pub content: String,
    pub created: SystemTime,
    /// `None` keeps the notice open until it is closed explicitly
    pub duration: Option<Duration>,
}

impl Notice {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.duration {
            Some(duration) => now
                .duration_since(self.created)
                .map(|elapsed| elapsed >= duration)
                .unwrap_or(false),
            None => false,
        }
    }
}

/// Per-notice overrides
#[derive(Debug, Clone, Default)]
pub struct NoticeOptions {
    /// Replaces an open notice with the same key
    pub key: Option<String>,
    /// Overrides the configured duration; zero means sticky
    pub duration: Option<Duration>,
}

impl NoticeOptions {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Debug, Default)]
struct NoticeState {
    next_id: u64,
    open: Vec<Notice>,
}

/// Shared notification sink
#[derive(Debug)]
pub struct Notifier {
    default_duration: Option<Duration>,
    max_count: Option<usize>,
    outlets: Vec<Arc<dyn NoticeOutlet>>,
    state: Mutex<NoticeState>,
}

impl Notifier {
    /// Notifier writing to the log.
    pub fn new(config: &NoticeConfig) -> Self {
        Self::with_outlets(config, vec![Arc::new(LogOutlet)])
    }

    pub fn with_outlets(config: &NoticeConfig, outlets: Vec<Arc<dyn NoticeOutlet>>) -> Self {
        Self {
            default_duration: sticky_if_zero(Duration::from_secs(config.duration_secs)),
            max_count: config.max_count.filter(|max| *max > 0),
            outlets,
            state: Mutex::new(NoticeState::default()),
        }
    }

    pub fn success(&self, content: impl Into<String>) -> Result<u64> {
        self.open(NoticeKind::Success, content, NoticeOptions::default())
    }

    pub fn error(&self, content: impl Into<String>) -> Result<u64> {
        self.open(NoticeKind::Error, content, NoticeOptions::default())
    }

    pub fn info(&self, content: impl Into<String>) -> Result<u64> {
        self.open(NoticeKind::Info, content, NoticeOptions::default())
    }

    pub fn warning(&self, content: impl Into<String>) -> Result<u64> {
        self.open(NoticeKind::Warning, content, NoticeOptions::default())
    }

    /// Alias of [`warning`](Self::warning).
    pub fn warn(&self, content: impl Into<String>) -> Result<u64> {
        self.warning(content)
    }

    pub fn loading(&self, content: impl Into<String>) -> Result<u64> {
        self.open(NoticeKind::Loading, content, NoticeOptions::default())
    }

    /// Open a notice and hand it to every outlet. Returns the notice id.
    pub fn open(&self, kind: NoticeKind, content: impl Into<String>, options: NoticeOptions) -> Result<u64> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(NotifyError::EmptyContent);
        }

        let now = SystemTime::now();
        let duration = match options.duration {
            Some(duration) => sticky_if_zero(duration),
            None => self.default_duration,
        };

        let (notice, evicted) = {
            let mut state = self.lock("open")?;
            let mut evicted = take_expired(&mut state.open, now);

            let existing = options
                .key
                .as_ref()
                .and_then(|key| state.open.iter().position(|n| n.key.as_ref() == Some(key)));
            let notice = match existing {
                Some(index) => {
                    let replaced = &mut state.open[index];
                    replaced.kind = kind;
                    replaced.content = content;
                    replaced.created = now;
                    replaced.duration = duration;
                    replaced.clone()
                }
                None => {
                    state.next_id += 1;
                    let notice = Notice {
                        id: state.next_id,
                        key: options.key,
                        kind,
                        content,
                        created: now,
                        duration,
                    };
                    state.open.push(notice.clone());
                    notice
                }
            };

            if let Some(max) = self.max_count {
                let overflow = state.open.len().saturating_sub(max);
                evicted.extend(state.open.drain(..overflow));
            }
            (notice, evicted)
        };

        for old in &evicted {
            self.dismiss(old);
        }
        for outlet in &self.outlets {
            if let Err(e) = outlet.deliver(&notice) {
                log::warn!("Notice outlet '{}' failed: {}", outlet.name(), e);
            }
        }
        Ok(notice.id)
    }

    /// Close a notice by id. Returns whether it was open.
    pub fn close(&self, id: u64) -> Result<bool> {
        self.close_where("close", |n| n.id == id)
    }

    /// Close the notice opened with `key`.
    pub fn close_key(&self, key: &str) -> Result<bool> {
        self.close_where("close_key", |n| n.key.as_deref() == Some(key))
    }

    /// Close every open notice. Returns how many were closed.
    pub fn destroy(&self) -> Result<usize> {
        let closed: Vec<Notice> = self.lock("destroy")?.open.drain(..).collect();
        for notice in &closed {
            self.dismiss(notice);
        }
        Ok(closed.len())
    }

    /// Notices still open now, oldest first.
    pub fn active(&self) -> Result<Vec<Notice>> {
        self.active_at(SystemTime::now())
    }

    /// Notices still open at `now`; expired ones are closed on the way.
    pub fn active_at(&self, now: SystemTime) -> Result<Vec<Notice>> {
        let (open, expired) = {
            let mut state = self.lock("active")?;
            let expired = take_expired(&mut state.open, now);
            (state.open.clone(), expired)
        };
        for notice in &expired {
            self.dismiss(notice);
        }
        Ok(open)
    }

    fn close_where(&self, operation: &str, matches: impl Fn(&Notice) -> bool) -> Result<bool> {
        let closed = {
            let mut state = self.lock(operation)?;
            state
                .open
                .iter()
                .position(|n| matches(n))
                .map(|index| state.open.remove(index))
        };
        match closed {
            Some(notice) => {
                self.dismiss(&notice);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn dismiss(&self, notice: &Notice) {
        for outlet in &self.outlets {
            outlet.dismiss(notice);
        }
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, NoticeState>> {
        self.state.lock().map_err(|_| NotifyError::LockError {
            operation: operation.to_string(),
        })
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(&NoticeConfig::default())
    }
}

#[async_trait]
impl KernelComponent for Notifier {
    fn name(&self) -> &'static str {
        "Notifier"
    }

    async fn initialize(&self) -> KernelResult<()> {
        log::debug!(
            "Notifier ready with {} outlet(s), default duration {:?}",
            self.outlets.len(),
            self.default_duration
        );
        Ok(())
    }
}

fn sticky_if_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

fn take_expired(open: &mut Vec<Notice>, now: SystemTime) -> Vec<Notice> {
    let (expired, kept): (Vec<Notice>, Vec<Notice>) = open.drain(..).partition(|n| n.is_expired(now));
    *open = kept;
    expired
}
