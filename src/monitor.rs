//! Error Monitoring Module
//!
//! Bounded, append-only log of client-side errors. Injected into the fetch
//! layer through [`ErrorSink`] rather than held as global state.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Default number of events kept.
pub const DEFAULT_ERROR_CAPACITY: usize = 100;

// == Error Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Api,
    Ui,
    Auth,
    Performance,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Api => "api",
            ErrorKind::Ui => "ui",
            ErrorKind::Auth => "auth",
            ErrorKind::Performance => "performance",
        };
        f.write_str(name)
    }
}

// == Error Event ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub id: String,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-kind counts and recency of the logged events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorStats {
    pub total: usize,
    pub last_24h: usize,
    pub last_hour: usize,
    pub by_kind: HashMap<ErrorKind, usize>,
    pub most_recent: Option<DateTime<Utc>>,
}

// == Error Sink ==
/// Destination for errors observed by the data layer.
pub trait ErrorSink: Send + Sync {
    /// Records an error and returns its id.
    fn record(&self, kind: ErrorKind, message: &str) -> String;
}

// == Error Log ==
/// In-memory error log holding at most `capacity` events, newest first.
#[derive(Debug)]
pub struct ErrorLog {
    events: Mutex<VecDeque<ErrorEvent>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
        }
    }

    /// Events of `kind`, or all events, newest first.
    pub fn errors(&self, kind: Option<ErrorKind>) -> Vec<ErrorEvent> {
        self.lock()
            .iter()
            .filter(|event| kind.map_or(true, |k| event.kind == k))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> ErrorStats {
        let now = Utc::now();
        let events = self.lock();

        let within = |window: Duration| {
            events
                .iter()
                .filter(|event| now - event.timestamp < window)
                .count()
        };

        let mut by_kind = HashMap::new();
        for event in events.iter() {
            *by_kind.entry(event.kind).or_insert(0) += 1;
        }

        ErrorStats {
            total: events.len(),
            last_24h: within(Duration::hours(24)),
            last_hour: within(Duration::hours(1)),
            by_kind,
            most_recent: events.front().map(|event| event.timestamp),
        }
    }

    /// Drops events older than `max_age`. Returns the count removed.
    pub fn prune_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut events = self.lock();
        let before = events.len();
        events.retain(|event| event.timestamp > cutoff);
        before - events.len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CAPACITY)
    }
}

impl ErrorSink for ErrorLog {
    fn record(&self, kind: ErrorKind, message: &str) -> String {
        let timestamp = Utc::now();
        let id = format!(
            "err_{}_{}",
            timestamp.timestamp_millis(),
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );

        match kind {
            ErrorKind::Performance => warn!("{} warning: {}", kind, message),
            _ => error!("{} error: {}", kind, message),
        }

        let mut events = self.lock();
        events.push_front(ErrorEvent {
            id: id.clone(),
            kind,
            message: message.to_string(),
            timestamp,
        });
        events.truncate(self.capacity);
        id
    }
}
