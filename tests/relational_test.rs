mod helpers;

use std::time::Duration;

use chrono::{DateTime, Utc};
use healthanalyzer::{CancelToken, NewEntry, NewFinding, NewMetric, NewSummary, StoreError};
use helpers::{ctx, date, seed_entry, test_store};

#[test]
fn entry_round_trip_preserves_supplied_fields() {
    let (_tmp, store) = test_store();
    let created_at: DateTime<Utc> = "2026-02-28T06:45:00Z".parse().unwrap();
    let entry = NewEntry {
        id: Some("entry-1".into()),
        date: date(2026, 2, 28),
        category: "sleep".into(),
        input_text: "Slept 7 hours, woke up once".into(),
        analysis_text: "Adequate sleep duration with one interruption.".into(),
        created_at: Some(created_at),
    };

    let saved = store.save_entry(&ctx(), &entry).unwrap();
    let got = store.get_entry_by_id(&ctx(), "entry-1").unwrap();

    assert_eq!(got, saved);
    assert_eq!(got.id, "entry-1");
    assert_eq!(got.date, entry.date);
    assert_eq!(got.category, entry.category);
    assert_eq!(got.input_text, entry.input_text);
    assert_eq!(got.analysis_text, entry.analysis_text);
    assert_eq!(got.created_at, created_at);
}

#[test]
fn save_entry_generates_id() {
    let (_tmp, store) = test_store();
    store
        .save_entry(&ctx(), &NewEntry::new(date(2026, 2, 28), "sleep", "Slept well"))
        .unwrap();

    let entries = store
        .get_entries_by_date_range(&ctx(), "sleep", date(2026, 2, 28), date(2026, 2, 28))
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].id.is_empty());
}

#[test]
fn date_range_filters_category_and_window() {
    let (_tmp, store) = test_store();
    seed_entry(&store, "e1", date(2026, 2, 25), "sleep", "day 1");
    seed_entry(&store, "e2", date(2026, 2, 26), "sleep", "day 2");
    seed_entry(&store, "e3", date(2026, 2, 27), "sleep", "day 3");
    seed_entry(&store, "e4", date(2026, 2, 27), "food", "food day 3");
    seed_entry(&store, "e5", date(2026, 2, 28), "sleep", "day 4");

    let got = store
        .get_entries_by_date_range(&ctx(), "sleep", date(2026, 2, 26), date(2026, 2, 27))
        .unwrap();
    let ids: Vec<&str> = got.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e3", "e2"]);

    let food = store
        .get_entries_by_date_range(&ctx(), "food", date(2026, 2, 27), date(2026, 2, 27))
        .unwrap();
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].id, "e4");

    let none = store
        .get_entries_by_date_range(&ctx(), "exercise", date(2026, 2, 1), date(2026, 2, 28))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn unknown_entry_id_is_not_found() {
    let (_tmp, store) = test_store();
    let err = store.get_entry_by_id(&ctx(), "nonexistent").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "entry", .. }));
}

#[test]
fn resaving_an_entry_id_is_rejected() {
    let (_tmp, store) = test_store();
    seed_entry(&store, "e1", date(2026, 2, 28), "sleep", "original");

    let err = store
        .save_entry(
            &ctx(),
            &NewEntry::new(date(2026, 2, 28), "sleep", "overwrite").with_id("e1"),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
    assert_eq!(store.get_entry_by_id(&ctx(), "e1").unwrap().input_text, "original");
}

#[test]
fn findings_round_trip_and_limit() {
    let (_tmp, store) = test_store();
    for i in 0..5u32 {
        store
            .save_finding(
                &ctx(),
                &NewFinding::new(date(2026, 2, 24 + i), "finding", vec!["sleep".into()])
                    .with_id(format!("f{i}")),
            )
            .unwrap();
    }

    let got = store.get_recent_findings(&ctx(), 3).unwrap();
    let ids: Vec<&str> = got.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["f4", "f3", "f2"]);
    assert_eq!(got[0].date, date(2026, 2, 28));
    assert_eq!(got[0].categories, vec!["sleep".to_string()]);

    assert_eq!(store.get_recent_findings(&ctx(), 100).unwrap().len(), 5);
    assert!(store.get_recent_findings(&ctx(), 0).unwrap().is_empty());
}

#[test]
fn finding_categories_keep_order() {
    let (_tmp, store) = test_store();
    let finding = NewFinding::new(
        date(2026, 2, 28),
        "Sleep quality correlates with caffeine intake.",
        vec!["sleep".into(), "food".into()],
    )
    .with_id("f1");
    store.save_finding(&ctx(), &finding).unwrap();

    let got = store.get_recent_findings(&ctx(), 10).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].finding_text, finding.finding_text);
    assert_eq!(got[0].categories, finding.categories);
}

#[test]
fn summaries_filter_by_category_and_window() {
    let (_tmp, store) = test_store();
    store
        .save_summary(
            &ctx(),
            &NewSummary::new(date(2026, 2, 21), date(2026, 2, 27), "sleep", "Average 7.2 hours, REM improving."),
        )
        .unwrap();
    store
        .save_summary(
            &ctx(),
            &NewSummary::new(date(2026, 2, 21), date(2026, 2, 27), "food", "food summary"),
        )
        .unwrap();

    let got = store
        .get_summaries(&ctx(), "sleep", date(2026, 2, 1), date(2026, 2, 28))
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].summary_text, "Average 7.2 hours, REM improving.");
    assert_eq!(got[0].period_start, date(2026, 2, 21));
    assert_eq!(got[0].period_end, date(2026, 2, 27));
    assert_eq!(got[0].category, "sleep");
}

#[test]
fn metrics_round_trip_by_key() {
    let (_tmp, store) = test_store();
    seed_entry(&store, "e1", date(2026, 2, 28), "sleep", "slept");

    store
        .save_metrics(
            &ctx(),
            "e1",
            &[NewMetric::new("total_hours", 7.5), NewMetric::new("rem_minutes", 95.0)],
        )
        .unwrap();

    let got = store
        .get_metrics(&ctx(), "sleep", "total_hours", date(2026, 2, 1), date(2026, 2, 28))
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].key, "total_hours");
    assert_eq!(got[0].value, 7.5);
    assert_eq!(got[0].entry_id, "e1");

    let rem = store
        .get_metrics(&ctx(), "sleep", "rem_minutes", date(2026, 2, 1), date(2026, 2, 28))
        .unwrap();
    assert_eq!(rem.len(), 1);
    assert_eq!(rem[0].value, 95.0);
}

#[test]
fn metrics_across_date_range_newest_first() {
    let (_tmp, store) = test_store();
    for i in 0..3u32 {
        let id = format!("e{i}");
        seed_entry(&store, &id, date(2026, 2, 26 + i), "sleep", "slept");
        store
            .save_metrics(&ctx(), &id, &[NewMetric::new("total_hours", 6.5 + f64::from(i))])
            .unwrap();
    }

    let got = store
        .get_metrics(&ctx(), "sleep", "total_hours", date(2026, 2, 26), date(2026, 2, 28))
        .unwrap();
    let values: Vec<f64> = got.iter().map(|m| m.value).collect();
    assert_eq!(values, [8.5, 7.5, 6.5]);

    let narrowed = store
        .get_metrics(&ctx(), "sleep", "total_hours", date(2026, 2, 27), date(2026, 2, 27))
        .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].entry_id, "e1");
}

#[test]
fn metric_batch_is_atomic() {
    let (_tmp, store) = test_store();
    seed_entry(&store, "e1", date(2026, 2, 28), "sleep", "slept");

    let err = store
        .save_metrics(
            &ctx(),
            "e1",
            &[
                NewMetric::new("total_hours", 7.0).with_id("dup"),
                NewMetric::new("rem_minutes", 90.0),
                NewMetric::new("deep_minutes", 55.0).with_id("dup"),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));

    for key in ["total_hours", "rem_minutes", "deep_minutes"] {
        let got = store
            .get_metrics(&ctx(), "sleep", key, date(2026, 2, 1), date(2026, 2, 28))
            .unwrap();
        assert!(got.is_empty(), "{key} should have been rolled back");
    }
}

#[test]
fn metrics_for_missing_entry_are_rejected() {
    let (_tmp, store) = test_store();
    let err = store
        .save_metrics(&ctx(), "ghost", &[NewMetric::new("total_hours", 7.0)])
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[test]
fn deadline_during_metric_batch_rolls_back() {
    let (_tmp, store) = test_store();
    seed_entry(&store, "e1", date(2026, 2, 28), "sleep", "slept");

    let batch: Vec<NewMetric> = (0..200_000)
        .map(|i| NewMetric::new(format!("reading_{i}"), f64::from(i)))
        .collect();
    let err = store
        .save_metrics(&CancelToken::with_timeout(Duration::from_millis(20)), "e1", &batch)
        .unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
    assert_eq!(store.health(&ctx()).unwrap().metric_count, 0);

    // writer is usable again after the rollback
    store
        .save_metrics(&ctx(), "e1", &[NewMetric::new("total_hours", 7.0)])
        .unwrap();
    assert_eq!(store.health(&ctx()).unwrap().metric_count, 1);
}
