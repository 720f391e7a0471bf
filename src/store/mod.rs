//! Store facade: lifecycle, connection ownership and the public operation surface.
//!
//! A [`Store`] owns one writer connection and a small pool of read-only
//! connections to the same WAL-mode file. Each public method is its own unit of
//! work; the per-kind modules ([`entries`], [`findings`], [`summaries`],
//! [`metrics`], [`vector`]) hold the SQL and are usable directly on a
//! [`rusqlite::Connection`].

pub mod entries;
pub mod findings;
pub mod metrics;
pub mod summaries;
pub mod types;
pub mod vector;

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::cancel::{CancelToken, Interruptible};
use crate::config::StorageConfig;
use crate::db::{self, HealthReport};
use crate::error::{Result, StoreError};
use types::{
    Entry, Finding, Metric, NewEntry, NewFinding, NewMetric, NewSummary, SimilarResult, Summary,
};

/// Lifecycle state of a [`Store`]. Only `Open` accepts operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unopened,
    Open,
    Closed,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum State {
    Unopened,
    Open(Connections),
    Closed,
}

impl State {
    fn kind(&self) -> StoreState {
        match self {
            Self::Unopened => StoreState::Unopened,
            Self::Open(_) => StoreState::Open,
            Self::Closed => StoreState::Closed,
        }
    }
}

#[derive(Clone, Copy)]
enum Access {
    Read,
    Write,
}

/// Writer plus read-only pool. `:memory:` databases have no readers.
struct Connections {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl Connections {
    fn open(config: &StorageConfig) -> Result<Self> {
        let path = config.resolved_db_path();
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let display = path.display().to_string();

        let writer = db::open_writer(&path, busy_timeout)
            .map_err(|e| StoreError::connection(&display, e))?;

        let readers = if db::is_memory_path(&path) {
            Vec::new()
        } else {
            (0..config.read_connections)
                .map(|_| db::open_reader(&path, busy_timeout).map(Mutex::new))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::connection(&display, e))?
        };

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    fn writer(&self) -> MutexGuard<'_, Connection> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// First idle reader starting from a rotating offset, else wait on that offset.
    fn reader(&self) -> MutexGuard<'_, Connection> {
        if self.readers.is_empty() {
            return self.writer();
        }

        let n = self.readers.len();
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % n;
        for i in 0..n {
            match self.readers[(start + i) % n].try_lock() {
                Ok(conn) => return conn,
                Err(TryLockError::Poisoned(p)) => return p.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            }
        }
        self.readers[start]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn close(self) -> Result<()> {
        let mut first_err = None;
        let all = self
            .readers
            .into_iter()
            .chain(std::iter::once(self.writer));
        for conn in all {
            let conn = conn.into_inner().unwrap_or_else(PoisonError::into_inner);
            if let Err((_, e)) = conn.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(StoreError::Storage(e)),
            None => Ok(()),
        }
    }
}

/// Unified persistence boundary for entries, findings, summaries, metrics and
/// embeddings.
pub struct Store {
    config: StorageConfig,
    state: RwLock<State>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("db_path", &self.config.db_path)
            .field("state", &self.state())
            .finish()
    }
}

impl Store {
    /// Create an unopened store. Call [`Store::connect`] before use.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::Unopened),
        }
    }

    /// Open (or create) the database at `path` with default storage settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(StorageConfig {
            db_path: path.as_ref().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        })
    }

    /// Open (or create) the database described by `config`.
    pub fn open_with_config(config: StorageConfig) -> Result<Self> {
        let store = Self::new(config);
        store.connect()?;
        Ok(store)
    }

    /// Acquire connections and apply the schema. Unopened → Open.
    ///
    /// On failure every partially opened connection is released and the store
    /// stays unopened.
    pub fn connect(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, State::Unopened) {
            return Err(StoreError::Usage {
                action: "open store",
                state: state.kind(),
            });
        }

        let conns = Connections::open(&self.config)?;
        tracing::info!(
            path = %self.config.db_path,
            readers = conns.readers.len(),
            "store opened"
        );
        *state = State::Open(conns);
        Ok(())
    }

    /// Release all connections. Safe to call in any state; Closed is terminal.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, State::Closed) {
            State::Open(conns) => {
                tracing::info!(path = %self.config.db_path, "store closed");
                conns.close()
            }
            State::Unopened | State::Closed => Ok(()),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .kind()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Run `op` on a connection while holding the state read lock, with the
    /// cancellation token wired into SQLite's progress handler.
    fn run<T>(
        &self,
        action: &'static str,
        access: Access,
        cancel: &CancelToken,
        op: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let conns = match &*state {
            State::Open(conns) => conns,
            other => {
                return Err(StoreError::Usage {
                    action,
                    state: other.kind(),
                })
            }
        };
        cancel.check()?;

        let conn = match access {
            Access::Read => conns.reader(),
            Access::Write => conns.writer(),
        };
        let _interrupt = Interruptible::install(&conn, cancel)?;
        op(&conn)
    }

    // --- Entries ---

    pub fn save_entry(&self, cancel: &CancelToken, entry: &NewEntry) -> Result<Entry> {
        self.run("save entry", Access::Write, cancel, |conn| {
            entries::save_entry(conn, cancel, entry)
        })
    }

    pub fn get_entries_by_date_range(
        &self,
        cancel: &CancelToken,
        category: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Entry>> {
        self.run("get entries", Access::Read, cancel, |conn| {
            entries::get_entries_by_date_range(conn, cancel, category, from, to)
        })
    }

    pub fn get_entry_by_id(&self, cancel: &CancelToken, id: &str) -> Result<Entry> {
        self.run("get entry", Access::Read, cancel, |conn| {
            entries::get_entry_by_id(conn, cancel, id)
        })
    }

    // --- Findings ---

    pub fn save_finding(&self, cancel: &CancelToken, finding: &NewFinding) -> Result<Finding> {
        self.run("save finding", Access::Write, cancel, |conn| {
            findings::save_finding(conn, cancel, finding)
        })
    }

    pub fn get_recent_findings(&self, cancel: &CancelToken, limit: usize) -> Result<Vec<Finding>> {
        self.run("get findings", Access::Read, cancel, |conn| {
            findings::get_recent_findings(conn, cancel, limit)
        })
    }

    // --- Summaries ---

    pub fn save_summary(&self, cancel: &CancelToken, summary: &NewSummary) -> Result<Summary> {
        self.run("save summary", Access::Write, cancel, |conn| {
            summaries::save_summary(conn, cancel, summary)
        })
    }

    pub fn get_summaries(
        &self,
        cancel: &CancelToken,
        category: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Summary>> {
        self.run("get summaries", Access::Read, cancel, |conn| {
            summaries::get_summaries(conn, cancel, category, from, to)
        })
    }

    // --- Metrics ---

    pub fn save_metrics(
        &self,
        cancel: &CancelToken,
        entry_id: &str,
        metrics: &[NewMetric],
    ) -> Result<Vec<Metric>> {
        self.run("save metrics", Access::Write, cancel, |conn| {
            metrics::save_metrics(conn, cancel, entry_id, metrics)
        })
    }

    pub fn get_metrics(
        &self,
        cancel: &CancelToken,
        category: &str,
        key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Metric>> {
        self.run("get metrics", Access::Read, cancel, |conn| {
            metrics::get_metrics(conn, cancel, category, key, from, to)
        })
    }

    // --- Embeddings ---

    pub fn save_embedding(
        &self,
        cancel: &CancelToken,
        source_id: &str,
        source_type: &str,
        embedding: &[f32],
    ) -> Result<()> {
        self.run("save embedding", Access::Write, cancel, |conn| {
            vector::save_embedding(conn, cancel, source_id, source_type, embedding)
        })
    }

    /// Up to `k` entries nearest to `query` within `source_type`, closest first.
    ///
    /// `k` is capped at [`vector::MAX_KNN_K`]; larger requests return at most
    /// that many results.
    pub fn search_similar(
        &self,
        cancel: &CancelToken,
        query: &[f32],
        source_type: &str,
        k: usize,
    ) -> Result<Vec<SimilarResult>> {
        self.run("search similar", Access::Read, cancel, |conn| {
            vector::search_similar(conn, cancel, query, source_type, k)
        })
    }

    // --- Diagnostics ---

    pub fn health(&self, cancel: &CancelToken) -> Result<HealthReport> {
        self.run("check health", Access::Read, cancel, |conn| {
            Ok(db::check_database_health(conn)?)
        })
    }
}

/// Caller-supplied id, or a fresh UUID v7 when absent or empty.
pub(crate) fn assign_id(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::now_v7().to_string(),
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 with explicit offset, full sub-second precision.
pub(crate) fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn timestamp_from_sql(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
