//! Summary persistence: one rollup per (category, period).

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::cancel::{collect_rows, CancelToken};
use crate::error::Result;
use crate::store::types::{NewSummary, Summary};
use crate::store::{assign_id, now, timestamp_from_sql, timestamp_to_sql};

/// Insert a new summary. An inverted period fails the table's CHECK constraint.
pub fn save_summary(
    conn: &Connection,
    cancel: &CancelToken,
    summary: &NewSummary,
) -> Result<Summary> {
    cancel.check()?;

    let stored = Summary {
        id: assign_id(summary.id.as_deref()),
        period_start: summary.period_start,
        period_end: summary.period_end,
        category: summary.category.clone(),
        summary_text: summary.summary_text.clone(),
        created_at: summary.created_at.unwrap_or_else(now),
    };

    conn.execute(
        "INSERT INTO summaries (id, period_start, period_end, category, summary_text, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stored.id,
            stored.period_start,
            stored.period_end,
            stored.category,
            stored.summary_text,
            timestamp_to_sql(&stored.created_at),
        ],
    )?;

    tracing::trace!(id = %stored.id, category = %stored.category, "summary saved");
    Ok(stored)
}

/// Summaries for `category` whose whole period lies within `[from, to]`,
/// latest period start first.
pub fn get_summaries(
    conn: &Connection,
    cancel: &CancelToken,
    category: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Summary>> {
    cancel.check()?;

    let mut stmt = conn.prepare(
        "SELECT id, period_start, period_end, category, summary_text, created_at \
         FROM summaries \
         WHERE category = ?1 AND period_start >= ?2 AND period_end <= ?3 \
         ORDER BY period_start DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![category, from, to], summary_from_row)?;
    collect_rows(rows, cancel)
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<Summary> {
    Ok(Summary {
        id: row.get(0)?,
        period_start: row.get(1)?,
        period_end: row.get(2)?,
        category: row.get(3)?,
        summary_text: row.get(4)?,
        created_at: timestamp_from_sql(row, 5)?,
    })
}
