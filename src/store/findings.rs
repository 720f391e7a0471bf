//! Finding persistence. Categories are stored as a JSON array of strings.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::cancel::{collect_rows, CancelToken};
use crate::error::Result;
use crate::store::types::{Finding, NewFinding};
use crate::store::{assign_id, now, timestamp_from_sql, timestamp_to_sql};

/// Insert a new finding.
pub fn save_finding(
    conn: &Connection,
    cancel: &CancelToken,
    finding: &NewFinding,
) -> Result<Finding> {
    cancel.check()?;

    let stored = Finding {
        id: assign_id(finding.id.as_deref()),
        date: finding.date,
        finding_text: finding.finding_text.clone(),
        categories: finding.categories.clone(),
        created_at: finding.created_at.unwrap_or_else(now),
    };
    let categories_json = serde_json::to_string(&stored.categories)?;

    conn.execute(
        "INSERT INTO findings (id, date, finding_text, categories, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            stored.id,
            stored.date,
            stored.finding_text,
            categories_json,
            timestamp_to_sql(&stored.created_at),
        ],
    )?;

    tracing::trace!(id = %stored.id, "finding saved");
    Ok(stored)
}

/// Up to `limit` findings, newest date first. A zero limit returns nothing.
pub fn get_recent_findings(
    conn: &Connection,
    cancel: &CancelToken,
    limit: usize,
) -> Result<Vec<Finding>> {
    cancel.check()?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        "SELECT id, date, finding_text, categories, created_at FROM findings \
         ORDER BY date DESC, rowid DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], finding_from_row)?;
    collect_rows(rows, cancel)
}

fn finding_from_row(row: &Row<'_>) -> rusqlite::Result<Finding> {
    let categories_json: String = row.get(3)?;
    let categories = serde_json::from_str(&categories_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Finding {
        id: row.get(0)?,
        date: row.get(1)?,
        finding_text: row.get(2)?,
        categories,
        created_at: timestamp_from_sql(row, 4)?,
    })
}
