// src/state/notification.rs
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub created: Instant,
}

/// Transient toasts; each one expires on its own.
#[derive(Debug)]
pub struct Notifications {
    items: Vec<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl Notifications {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { items: Vec::new(), ttl }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.items.push(Notification {
            level,
            message: message.into(),
            created: Instant::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Drops everything older than the time-to-live as of `now`.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items.retain(|n| now.saturating_duration_since(n.created) < ttl);
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.items.last()
    }
}
