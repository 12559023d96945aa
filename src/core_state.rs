//! Application state shared by every HTTP handler.
//!
//! Holds the runtime configuration and the in-memory access log. Database
//! connections are opened per request: SQLite in WAL mode handles the
//! concurrent readers, and writes are single statements.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::config::AppConfig;
use crate::db;

/// Entries kept in the access log before the oldest are dropped.
const ACCESS_LOG_CAPACITY: usize = 200;

pub struct CoreState {
    pub config: AppConfig,
    started_at: Instant,
    access: AccessLog,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            started_at: Instant::now(),
            access: AccessLog::new(ACCESS_LOG_CAPACITY),
        }
    }

    /// Open a connection to the configured database (migrations included).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.database_path).map_err(CoreError::Database)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Record one served request.
    pub fn log_access(&self, entry: AccessEntry) {
        self.access.record(entry);
    }

    pub fn recent_access(&self, limit: usize) -> Vec<AccessEntry> {
        self.access.recent(limit)
    }

    pub fn requests_served(&self) -> u64 {
        self.access.total()
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Access log
// ═══════════════════════════════════════════════════════════

/// A single served request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccessEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub elapsed_ms: u64,
}

/// Bounded in-memory ring of recent requests plus a running total.
pub struct AccessLog {
    buffer: Mutex<VecDeque<AccessEntry>>,
    capacity: usize,
    total: AtomicU64,
}

impl AccessLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            total: AtomicU64::new(0),
        }
    }

    pub fn record(&self, entry: AccessEntry) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<AccessEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, status: u16) -> AccessEntry {
        AccessEntry {
            timestamp: chrono::Utc::now(),
            method: "GET".into(),
            path: path.into(),
            status,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn access_log_keeps_newest_within_capacity() {
        let log = AccessLog::new(2);
        log.record(entry("/a", 200));
        log.record(entry("/b", 404));
        log.record(entry("/c", 200));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].path, "/c");
        assert_eq!(recent[1].path, "/b");
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn recent_respects_limit() {
        let log = AccessLog::new(10);
        for i in 0..5 {
            log.record(entry(&format!("/{i}"), 200));
        }
        assert_eq!(log.recent(3).len(), 3);
    }

    #[test]
    fn open_db_creates_database_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("db").join("ortoplan.db");
        let state = CoreState::new(AppConfig::for_database(path.clone()));
        let conn = state.open_db().unwrap();
        drop(conn);
        assert!(path.exists());
        assert_eq!(state.requests_served(), 0);
    }
}
