//! Record types for the four entity kinds and vector search results.
//!
//! Each kind has a `New*` input type, where `id` and `created_at` are optional
//! and filled in by the store, and a stored type with every field populated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One dated, categorized submission and its analysis, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewEntry {
    pub id: Option<String>,
    pub date: NaiveDate,
    /// Free-form life-area label, e.g. `"sleep"` or `"food"`.
    pub category: String,
    pub input_text: String,
    pub analysis_text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn new(date: NaiveDate, category: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            date,
            category: category.into(),
            input_text: input_text.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_analysis(mut self, analysis_text: impl Into<String>) -> Self {
        self.analysis_text = analysis_text.into();
        self
    }
}

/// A stored entry, matching the `entries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub date: NaiveDate,
    pub category: String,
    pub input_text: String,
    pub analysis_text: String,
    pub created_at: DateTime<Utc>,
}

/// A cross-category insight, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewFinding {
    pub id: Option<String>,
    pub date: NaiveDate,
    pub finding_text: String,
    /// Categories the insight spans, in caller order. May be empty.
    pub categories: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewFinding {
    pub fn new(date: NaiveDate, finding_text: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            date,
            finding_text: finding_text.into(),
            categories,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A stored finding, matching the `findings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub date: NaiveDate,
    pub finding_text: String,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A periodic rollup for one category, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewSummary {
    pub id: Option<String>,
    pub period_start: NaiveDate,
    /// Inclusive; must not precede `period_start`.
    pub period_end: NaiveDate,
    pub category: String,
    pub summary_text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewSummary {
    pub fn new(
        period_start: NaiveDate,
        period_end: NaiveDate,
        category: impl Into<String>,
        summary_text: impl Into<String>,
    ) -> Self {
        Self {
            period_start,
            period_end,
            category: category.into(),
            summary_text: summary_text.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A stored summary, matching the `summaries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub category: String,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}

/// One named measurement in a metric batch. The owning entry is given per batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewMetric {
    pub id: Option<String>,
    pub key: String,
    pub value: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMetric {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A stored metric, matching the `metrics` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub entry_id: String,
    pub key: String,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// An entry returned by vector search with its L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarResult {
    pub entry: Entry,
    /// Non-negative; smaller means more similar.
    pub distance: f32,
}
