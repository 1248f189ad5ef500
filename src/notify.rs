//! Transient user-facing messages keyed by severity.
//!
//! Controllers report outcomes through the [`NotificationSink`] trait; the
//! application owns a [`NotificationCenter`], which the event loop prunes on
//! every tick and the status area renders.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✔",
            Severity::Error => "✖",
            Severity::Warning => "⚠",
            Severity::Info => "ℹ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// Per-severity default from [`NotificationDurations`].
    Default,
    For(Duration),
    /// Stays until removed.
    Persistent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationDurations {
    pub success: Duration,
    pub error: Duration,
    pub warning: Duration,
    pub info: Duration,
}

impl NotificationDurations {
    pub fn for_severity(&self, severity: Severity) -> Duration {
        match severity {
            Severity::Success => self.success,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

impl Default for NotificationDurations {
    fn default() -> Self {
        Self {
            success: Duration::from_secs(5),
            error: Duration::from_secs(7),
            warning: Duration::from_secs(6),
            info: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub expires_at: Option<Instant>,
}

/// Where controllers send feedback. Returns the id of the new message.
pub trait NotificationSink {
    fn notify(&mut self, message: String, severity: Severity, lifetime: Lifetime) -> u64;

    fn success(&mut self, message: &str) -> u64 {
        self.notify(message.to_string(), Severity::Success, Lifetime::Default)
    }

    fn error(&mut self, message: &str) -> u64 {
        self.notify(message.to_string(), Severity::Error, Lifetime::Default)
    }

    fn warning(&mut self, message: &str) -> u64 {
        self.notify(message.to_string(), Severity::Warning, Lifetime::Default)
    }

    fn info(&mut self, message: &str) -> u64 {
        self.notify(message.to_string(), Severity::Info, Lifetime::Default)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
    durations: NotificationDurations,
}

impl NotificationCenter {
    pub fn new(durations: NotificationDurations) -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            durations,
        }
    }

    /// Enqueue a message created at `now`.
    pub fn show_at(
        &mut self,
        now: Instant,
        message: impl Into<String>,
        severity: Severity,
        lifetime: Lifetime,
    ) -> u64 {
        self.next_id += 1;
        let expires_at = match lifetime {
            Lifetime::Default => Some(now + self.durations.for_severity(severity)),
            Lifetime::For(d) => Some(now + d),
            Lifetime::Persistent => None,
        };
        self.items.push(Notification {
            id: self.next_id,
            message: message.into(),
            severity,
            expires_at,
        });
        self.next_id
    }

    /// Idempotent: removing an unknown or already removed id is a no-op.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop every message whose timer ran out; returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items
            .retain(|n| n.expires_at.is_none_or(|deadline| now < deadline));
        before - self.items.len()
    }

    /// All live messages, oldest first.
    pub fn visible(&self) -> &[Notification] {
        &self.items
    }

    /// The newest `max` messages, oldest of them first. Older ones stay queued.
    pub fn latest(&self, max: usize) -> &[Notification] {
        let start = self.items.len().saturating_sub(max);
        &self.items[start..]
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&mut self, message: String, severity: Severity, lifetime: Lifetime) -> u64 {
        self.show_at(Instant::now(), message, severity, lifetime)
    }
}
