//! Caller-supplied cancellation for store operations.
//!
//! A [`CancelToken`] combines a shared flag with an optional deadline. Store
//! operations check it before starting, between result rows and between batch
//! inserts. While a single statement runs, [`Interruptible`] installs a SQLite
//! progress handler that polls the token and aborts the statement.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Number of SQLite virtual machine instructions between progress-handler polls.
const PROGRESS_POLL_OPS: i32 = 1000;

/// Cloneable cancellation signal. The default token never fires.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Token that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Fire the token. All clones observe the cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return [`StoreError::Cancelled`] if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Progress handler bound to a connection for the lifetime of the guard.
pub(crate) struct Interruptible<'c> {
    conn: &'c Connection,
}

impl<'c> Interruptible<'c> {
    /// Fails if SQLite refuses the handler, so a statement is never run
    /// without a way to interrupt it.
    pub(crate) fn install(conn: &'c Connection, cancel: &CancelToken) -> Result<Self> {
        let token = cancel.clone();
        conn.progress_handler(PROGRESS_POLL_OPS, Some(move || token.is_cancelled()))?;
        Ok(Self { conn })
    }
}

impl Drop for Interruptible<'_> {
    fn drop(&mut self) {
        // Drop cannot propagate the error
        if let Err(e) = self.conn.progress_handler(0, None::<fn() -> bool>) {
            tracing::warn!(error = %e, "failed to remove progress handler");
        }
    }
}

/// Drain a row iterator, checking the token before each row.
pub(crate) fn collect_rows<T, I>(rows: I, cancel: &CancelToken) -> Result<Vec<T>>
where
    I: IntoIterator<Item = rusqlite::Result<T>>,
{
    let mut out = Vec::new();
    for row in rows {
        cancel.check()?;
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_QUERY: &str = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000) \
                              SELECT count(*) FROM c";

    #[test]
    fn default_token_never_fires() {
        let token = CancelToken::default();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.check(), Err(StoreError::Cancelled)));
    }

    #[test]
    fn expired_deadline_fires() {
        let token = CancelToken::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(token.is_cancelled());

        let later = CancelToken::with_timeout(Duration::from_secs(3600));
        assert!(!later.is_cancelled());
    }

    #[test]
    fn progress_handler_interrupts_running_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let token = CancelToken::new();
        let _guard = Interruptible::install(&conn, &token).unwrap();
        token.cancel();

        let err = conn
            .query_row(LONG_QUERY, [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Cancelled));
    }

    #[test]
    fn handler_is_removed_when_guard_drops() {
        let conn = Connection::open_in_memory().unwrap();
        let token = CancelToken::new();
        token.cancel();
        drop(Interruptible::install(&conn, &token).unwrap());

        let count: i64 = conn
            .query_row(LONG_QUERY, [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1_000_000);
    }

    #[test]
    fn collect_rows_stops_on_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let rows = vec![Ok(1), Ok(2)];
        assert!(matches!(
            collect_rows(rows, &token),
            Err(StoreError::Cancelled)
        ));
    }
}
