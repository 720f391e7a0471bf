//! Vector index over `vec_embeddings`.
//!
//! Embeddings are encoded as exactly [`EMBEDDING_DIM`] little-endian `f32` values.
//! Search is a sqlite-vec KNN query using L2 distance, scoped to one source type
//! and joined back to the owning entry.

use rusqlite::{params, Connection};

use crate::cancel::{collect_rows, CancelToken};
use crate::db::schema::EMBEDDING_DIM;
use crate::error::{Result, StoreError};
use crate::store::entries::entry_from_row;
use crate::store::types::SimilarResult;

/// Largest `k` sqlite-vec accepts in a KNN query.
pub const MAX_KNN_K: usize = 4096;

/// Encode a vector as the fixed-length little-endian blob sqlite-vec expects.
///
/// Rejects vectors of the wrong length or with non-finite components.
pub fn embedding_to_bytes(embedding: &[f32]) -> Result<Vec<u8>> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(StoreError::Serialization(format!(
            "embedding has {} dimensions, expected {EMBEDDING_DIM}",
            embedding.len()
        )));
    }
    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(StoreError::Serialization(format!(
            "embedding component {pos} is not finite"
        )));
    }

    Ok(embedding.iter().flat_map(|v| v.to_le_bytes()).collect())
}

/// Decode a blob produced by [`embedding_to_bytes`].
pub fn embedding_from_bytes(bytes: &[u8]) -> Result<Vec<f32>> {
    let expected = EMBEDDING_DIM * std::mem::size_of::<f32>();
    if bytes.len() != expected {
        return Err(StoreError::Serialization(format!(
            "embedding blob is {} bytes, expected {expected}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Persist `embedding` tagged with its owning record and source type.
pub fn save_embedding(
    conn: &Connection,
    cancel: &CancelToken,
    source_id: &str,
    source_type: &str,
    embedding: &[f32],
) -> Result<()> {
    cancel.check()?;
    let blob = embedding_to_bytes(embedding)?;

    conn.execute(
        "INSERT INTO vec_embeddings (source_type, embedding, source_id) VALUES (?1, ?2, ?3)",
        params![source_type, blob, source_id],
    )?;

    tracing::trace!(source_id, source_type, "embedding saved");
    Ok(())
}

/// Up to `k` entries nearest to `query` among embeddings tagged `source_type`,
/// closest first. Embeddings whose source id has no entry row are skipped and do
/// not take a result slot. `k` is capped at [`MAX_KNN_K`].
pub fn search_similar(
    conn: &Connection,
    cancel: &CancelToken,
    query: &[f32],
    source_type: &str,
    k: usize,
) -> Result<Vec<SimilarResult>> {
    cancel.check()?;
    let blob = embedding_to_bytes(query)?;
    if k == 0 {
        return Ok(Vec::new());
    }
    let k = k.min(MAX_KNN_K);

    // vec0 rejects an outer ORDER BY pushed into its scan, so the KNN runs
    // materialized and the entry join is LEFT to count orphan neighbours.
    let mut stmt = conn.prepare(
        "WITH knn AS MATERIALIZED ( \
             SELECT rowid AS vec_rowid, source_id, distance FROM vec_embeddings \
             WHERE embedding MATCH ?1 AND source_type = ?2 AND k = ?3 \
         ) \
         SELECT knn.distance, e.id, e.date, e.category, e.input_text, e.analysis_text, e.created_at \
         FROM knn \
         LEFT JOIN entries e ON e.id = knn.source_id \
         ORDER BY knn.distance ASC, knn.vec_rowid ASC",
    )?;

    let mut fetch = k;
    loop {
        let rows = stmt.query_map(params![blob, source_type, fetch as i64], |row| {
            let entry_id: Option<String> = row.get(1)?;
            if entry_id.is_none() {
                return Ok(None);
            }
            Ok(Some(SimilarResult {
                distance: row.get(0)?,
                entry: entry_from_row(row, 1)?,
            }))
        })?;
        let neighbours = collect_rows(rows, cancel)?;
        let scanned = neighbours.len();
        let mut results: Vec<SimilarResult> = neighbours.into_iter().flatten().collect();

        // Orphans used some slots; widen the scan while the index may hold more.
        if results.len() < k && scanned == fetch && fetch < MAX_KNN_K {
            fetch = fetch.saturating_mul(2).min(MAX_KNN_K);
            tracing::trace!(fetch, found = results.len(), "widening knn scan past orphans");
            continue;
        }

        results.truncate(k);
        return Ok(results);
    }
}
