//! Entry persistence: insert-only writes, date-range scans and id lookup.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::cancel::{collect_rows, CancelToken};
use crate::error::{Result, StoreError};
use crate::store::types::{Entry, NewEntry};
use crate::store::{assign_id, now, timestamp_from_sql, timestamp_to_sql};

const ENTRY_COLUMNS: &str =
    "id, date, category, input_text, analysis_text, created_at";

/// Insert a new entry. Fails with [`StoreError::Constraint`] if the id exists.
pub fn save_entry(conn: &Connection, cancel: &CancelToken, entry: &NewEntry) -> Result<Entry> {
    cancel.check()?;

    let stored = Entry {
        id: assign_id(entry.id.as_deref()),
        date: entry.date,
        category: entry.category.clone(),
        input_text: entry.input_text.clone(),
        analysis_text: entry.analysis_text.clone(),
        created_at: entry.created_at.unwrap_or_else(now),
    };

    conn.execute(
        "INSERT INTO entries (id, date, category, input_text, analysis_text, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stored.id,
            stored.date,
            stored.category,
            stored.input_text,
            stored.analysis_text,
            timestamp_to_sql(&stored.created_at),
        ],
    )?;

    tracing::trace!(id = %stored.id, category = %stored.category, "entry saved");
    Ok(stored)
}

/// Entries in `category` dated within `[from, to]`, newest date first.
///
/// Entries sharing a date are ordered by insertion, most recent first.
pub fn get_entries_by_date_range(
    conn: &Connection,
    cancel: &CancelToken,
    category: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Entry>> {
    cancel.check()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries \
         WHERE category = ?1 AND date >= ?2 AND date <= ?3 \
         ORDER BY date DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![category, from, to], |row| entry_from_row(row, 0))?;
    collect_rows(rows, cancel)
}

/// Exact-match lookup. Fails with [`StoreError::NotFound`] when no row matches.
pub fn get_entry_by_id(conn: &Connection, cancel: &CancelToken, id: &str) -> Result<Entry> {
    cancel.check()?;

    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
        params![id],
        |row| entry_from_row(row, 0),
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("entry", id))
}

/// Map [`ENTRY_COLUMNS`] starting at column `offset`.
pub(crate) fn entry_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(offset)?,
        date: row.get(offset + 1)?,
        category: row.get(offset + 2)?,
        input_text: row.get(offset + 3)?,
        analysis_text: row.get(offset + 4)?,
        created_at: timestamp_from_sql(row, offset + 5)?,
    })
}
