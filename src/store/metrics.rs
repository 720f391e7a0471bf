//! Metric persistence. A batch is written in one transaction: all rows or none.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

use crate::cancel::{collect_rows, CancelToken};
use crate::error::Result;
use crate::store::types::{Metric, NewMetric};
use crate::store::{assign_id, now, timestamp_from_sql, timestamp_to_sql};

/// Insert every metric in `metrics` against `entry_id` atomically.
///
/// Any failed insert (a missing entry, a duplicate id) or a cancellation between
/// inserts rolls back the whole batch before the error is returned.
pub fn save_metrics(
    conn: &Connection,
    cancel: &CancelToken,
    entry_id: &str,
    metrics: &[NewMetric],
) -> Result<Vec<Metric>> {
    cancel.check()?;
    if metrics.is_empty() {
        return Ok(Vec::new());
    }

    // Dropping an uncommitted transaction rolls it back
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let batch_time = now();
    let mut stored = Vec::with_capacity(metrics.len());
    {
        let mut stmt = tx.prepare(
            "INSERT INTO metrics (id, entry_id, key, value, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for metric in metrics {
            cancel.check()?;
            let row = Metric {
                id: assign_id(metric.id.as_deref()),
                entry_id: entry_id.to_string(),
                key: metric.key.clone(),
                value: metric.value,
                created_at: metric.created_at.unwrap_or(batch_time),
            };
            stmt.execute(params![
                row.id,
                row.entry_id,
                row.key,
                row.value,
                timestamp_to_sql(&row.created_at),
            ])?;
            stored.push(row);
        }
    }
    tx.commit()?;

    tracing::trace!(entry_id, count = stored.len(), "metrics saved");
    Ok(stored)
}

/// Metrics named `key` whose owning entry is in `category` and dated within
/// `[from, to]`, newest entry date first.
pub fn get_metrics(
    conn: &Connection,
    cancel: &CancelToken,
    category: &str,
    key: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Metric>> {
    cancel.check()?;

    let mut stmt = conn.prepare(
        "SELECT m.id, m.entry_id, m.key, m.value, m.created_at \
         FROM metrics m \
         JOIN entries e ON e.id = m.entry_id \
         WHERE e.category = ?1 AND m.key = ?2 AND e.date >= ?3 AND e.date <= ?4 \
         ORDER BY e.date DESC, e.rowid DESC, m.rowid ASC",
    )?;
    let rows = stmt.query_map(params![category, key, from, to], metric_from_row)?;
    collect_rows(rows, cancel)
}

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<Metric> {
    Ok(Metric {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
        created_at: timestamp_from_sql(row, 4)?,
    })
}
