//! Tests for the stats store

use super::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn stat(year: i32, key: i64, status: &str) -> EmailStat {
    EmailStat {
        year,
        supporter_key: Some(key),
        status: status.to_string(),
    }
}

#[test]
fn test_empty_store() {
    let store = StatsStore::open_in_memory().unwrap();
    assert_eq!(store.location(), ":memory:");
    assert_eq!(store.email_stat_count().unwrap(), 0);
    assert!(store.year_summary().unwrap().is_empty());
    assert_eq!(store.insert_email_stats(&[]).unwrap(), 0);
}

#[test]
fn test_year_summary() {
    let store = StatsStore::open_in_memory().unwrap();
    let rows = vec![
        stat(2018, 1, "Sent"),
        stat(2018, 1, "Sent"),
        stat(2018, 2, "Sent"),
        stat(2018, 3, "Bounced"),
        stat(2017, 1, "Sent"),
        EmailStat {
            year: 2017,
            supporter_key: None,
            status: "Sent".to_string(),
        },
    ];
    assert_eq!(store.insert_email_stats(&rows).unwrap(), 6);
    assert_eq!(store.email_stat_count().unwrap(), 6);

    let summary = store.year_summary().unwrap();
    assert_eq!(
        summary,
        vec![
            YearStatus {
                year: 2017,
                status: "Sent".into(),
                emails: 2,
                supporters: 1,
            },
            YearStatus {
                year: 2018,
                status: "Bounced".into(),
                emails: 1,
                supporters: 1,
            },
            YearStatus {
                year: 2018,
                status: "Sent".into(),
                emails: 3,
                supporters: 2,
            },
        ]
    );
}

#[test]
fn test_file_store_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.duckdb");
    {
        let store = StatsStore::open(&path).unwrap();
        store.insert_email_stats(&[stat(2020, 9, "Sent")]).unwrap();
    }
    let store = StatsStore::open(&path).unwrap();
    assert_eq!(store.email_stat_count().unwrap(), 1);
    assert!(format!("{store:?}").contains("stats.duckdb"));
}
