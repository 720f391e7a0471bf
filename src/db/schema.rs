//! SQL DDL for all store tables.
//!
//! Defines `entries`, `findings`, `summaries`, `metrics` and the `vec_embeddings`
//! (vec0) virtual table. All DDL uses `IF NOT EXISTS` so [`apply_schema`] is safe
//! to run on every open. There is no version table and no migration path.

use rusqlite::Connection;

/// Number of `f32` components in every stored embedding.
pub const EMBEDDING_DIM: usize = 1536;

/// Relational tables and their indexes.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    category TEXT NOT NULL,
    input_text TEXT NOT NULL,
    analysis_text TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_date_category ON entries(date, category);
CREATE INDEX IF NOT EXISTS idx_entries_category ON entries(category);

CREATE TABLE IF NOT EXISTS findings (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    finding_text TEXT NOT NULL,
    categories TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_findings_date ON findings(date);

CREATE TABLE IF NOT EXISTS summaries (
    id TEXT PRIMARY KEY,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    category TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    CHECK(period_start <= period_end)
);

CREATE INDEX IF NOT EXISTS idx_summaries_category_period ON summaries(category, period_start, period_end);

CREATE TABLE IF NOT EXISTS metrics (
    id TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES entries(id),
    key TEXT NOT NULL,
    value REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metrics_entry_id ON metrics(entry_id);
CREATE INDEX IF NOT EXISTS idx_metrics_key ON metrics(key);
"#;

/// vec0 table must be created separately (sqlite-vec syntax). `source_type` is a
/// partition key so KNN queries scoped to one type only scan that partition.
fn vec_table_sql() -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vec_embeddings USING vec0(
    source_type text partition key,
    embedding float[{EMBEDDING_DIM}],
    +source_id text
);"
    )
}

/// Create every table, index and the vector index. Idempotent.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&vec_table_sql())?;
    Ok(())
}
