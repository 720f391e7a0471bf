//! Persistent store for a health analysis pipeline.
//!
//! Four record kinds share one SQLite database with a
//! [sqlite-vec](https://github.com/asg017/sqlite-vec) vector index, so callers
//! can combine date-scoped lookups with semantic similarity search:
//!
//! | Kind | Keyed by | Read path |
//! |------|----------|-----------|
//! | **Entry** | date + category | date range, id lookup, vector search |
//! | **Finding** | date | most recent N |
//! | **Summary** | category + period | periods inside a date window |
//! | **Metric** | owning entry + key | key within a category and date window |
//!
//! Embeddings are fixed at [`db::schema::EMBEDDING_DIM`] dimensions, tagged with
//! a source id and a source type, and searched by L2 distance within one source
//! type.
//!
//! # Modules
//!
//! - [`store`]: the [`Store`](store::Store) facade plus per-kind SQL
//! - [`db`]: connection setup, schema DDL and health checks
//! - [`cancel`]: caller-supplied cancellation honored by every operation
//! - [`category`]: explicit category handler registry
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`error`]: the [`StoreError`](error::StoreError) taxonomy

pub mod cancel;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod store;

pub use cancel::CancelToken;
pub use error::{Result, StoreError};
pub use store::types::{
    Entry, Finding, Metric, NewEntry, NewFinding, NewMetric, NewSummary, SimilarResult, Summary,
};
pub use store::{Store, StoreState};
