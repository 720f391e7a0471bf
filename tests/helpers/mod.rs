#![allow(dead_code)]

use chrono::NaiveDate;
use healthanalyzer::config::StorageConfig;
use healthanalyzer::db::schema::EMBEDDING_DIM;
use healthanalyzer::{CancelToken, NewEntry, Store};
use tempfile::TempDir;

/// Open a file-backed store in a fresh temp directory. Keep the `TempDir` alive
/// for the lifetime of the store.
pub fn test_store() -> (TempDir, Store) {
    let tmp = TempDir::new().unwrap();
    let store = Store::open_with_config(StorageConfig {
        db_path: tmp.path().join("health.db").to_string_lossy().into_owned(),
        busy_timeout_ms: 5000,
        read_connections: 2,
    })
    .unwrap();
    (tmp, store)
}

/// Open a private in-memory store.
pub fn memory_store() -> Store {
    Store::open(":memory:").unwrap()
}

pub fn ctx() -> CancelToken {
    CancelToken::default()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Save an entry with a fixed id and return nothing; panics on failure.
pub fn seed_entry(store: &Store, id: &str, day: NaiveDate, category: &str, input: &str) {
    store
        .save_entry(&ctx(), &NewEntry::new(day, category, input).with_id(id))
        .unwrap();
}

/// Embedding with every component near `val`, plus a small position-dependent
/// wobble so vectors are not constant across dimensions.
pub fn make_vec(val: f32) -> Vec<f32> {
    (0..EMBEDDING_DIM)
        .map(|i| val + ((i as f64) * 0.01).sin() as f32 * 0.001)
        .collect()
}
