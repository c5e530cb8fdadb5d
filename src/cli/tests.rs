use super::runner::{export_format, fetch_options, parse_assignment};
use super::*;
use crate::config::Config;
use crate::error::Error;
use crate::output::OutputFormat as FileFormat;
use crate::test_support::{mount_count, mount_login, mount_page};
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::MockServer;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("salsadig").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_global_flags() {
    let cli = parse(&["-C", "salsa.yaml", "--format", "pretty", "-v", "describe", "supporter"]);
    assert_eq!(cli.config, Some(PathBuf::from("salsa.yaml")));
    assert_eq!(cli.format, OutputFormat::Pretty);
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Describe { ref table } if table == "supporter"));
}

#[test]
fn test_count_conditions() {
    let cli = parse(&[
        "count",
        "donation",
        "-w",
        "Last_Modified>2021-01-01",
        "--condition",
        "RESULT=0",
    ]);
    let Commands::Count { target } = cli.command else {
        panic!("expected count");
    };
    assert_eq!(target.table, "donation");
    assert_eq!(target.conditions, vec!["Last_Modified>2021-01-01", "RESULT=0"]);
    assert!(!target.join);
}

#[test]
fn test_query_key_conflicts_with_join() {
    let result = Cli::try_parse_from(["salsadig", "query", "supporter", "--key", "1", "--join"]);
    assert!(result.is_err());
}

#[test]
fn test_save_needs_a_field() {
    assert!(Cli::try_parse_from(["salsadig", "save", "supporter", "--key", "1"]).is_err());

    let cli = parse(&["save", "supporter", "--key", "1", "-s", "State=TX", "--live"]);
    let Commands::Save { fields, live, .. } = cli.command else {
        panic!("expected save");
    };
    assert_eq!(fields, vec!["State=TX"]);
    assert!(live);
}

#[test]
fn test_deletes_default_to_dry_run() {
    let cli = parse(&["delete-donations", "--start", "2021-01-01", "--end", "2021-02-01"]);
    let Commands::DeleteDonations {
        window,
        deleters,
        live,
        ..
    } = cli.command
    else {
        panic!("expected delete-donations");
    };
    assert_eq!(window.start, "2021-01-01");
    assert_eq!(deleters, 5);
    assert!(!live);
}

#[test]
fn test_group_overlap_lists() {
    let cli = parse(&[
        "group-overlap",
        "--include",
        "3,1,2",
        "--exclude",
        "9",
        "--start",
        "2021-01-01",
        "--end",
        "2021-07-01",
    ]);
    let Commands::GroupOverlap {
        include,
        exclude,
        directory,
        ..
    } = cli.command
    else {
        panic!("expected group-overlap");
    };
    assert_eq!(include, vec![3, 1, 2]);
    assert_eq!(exclude, vec![9]);
    assert_eq!(directory, PathBuf::from("./overlap_details"));
}

#[test]
fn test_export_fields() {
    let cli = parse(&[
        "export",
        "supporter",
        "--fields",
        "supporter_KEY,Email",
        "-o",
        "out.parquet",
    ]);
    let Commands::Export {
        fields,
        compression,
        ..
    } = cli.command
    else {
        panic!("expected export");
    };
    assert_eq!(fields, vec!["supporter_KEY", "Email"]);
    assert_eq!(compression, "snappy");
}

#[test]
fn test_fetch_options_overrides() {
    let config = Config::default();
    let options = fetch_options(&config, &FetchArgs::default()).unwrap();
    assert_eq!(options.page_size, config.pipeline.page_size);

    let args = FetchArgs {
        page_size: Some(100),
        fetchers: Some(2),
    };
    let options = fetch_options(&config, &args).unwrap();
    assert_eq!(options.page_size, 100);
    assert_eq!(options.fetchers, 2);

    let args = FetchArgs {
        page_size: Some(501),
        fetchers: None,
    };
    assert!(fetch_options(&config, &args).is_err());
    let args = FetchArgs {
        page_size: None,
        fetchers: Some(0),
    };
    assert!(fetch_options(&config, &args).is_err());
}

#[test]
fn test_parse_assignment() {
    assert_eq!(
        parse_assignment("State=TX").unwrap(),
        ("State".to_string(), "TX".to_string())
    );
    assert_eq!(
        parse_assignment("Notes=a=b").unwrap(),
        ("Notes".to_string(), "a=b".to_string())
    );
    assert_eq!(
        parse_assignment("Zip=").unwrap(),
        ("Zip".to_string(), String::new())
    );
    assert!(parse_assignment("State").is_err());
    assert!(parse_assignment("=TX").is_err());
}

#[test]
fn test_export_format() {
    let csv = PathBuf::from("gifts.CSV");
    assert_eq!(export_format(&csv, None).unwrap(), FileFormat::Csv);
    assert_eq!(
        export_format(&PathBuf::from("gifts.parquet"), None).unwrap(),
        FileFormat::Parquet
    );

    let txt = PathBuf::from("gifts.txt");
    let err = export_format(&txt, None).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "output"));
    assert!(export_format(&PathBuf::from("gifts"), None).is_err());

    assert_eq!(export_format(&txt, Some("parquet")).unwrap(), FileFormat::Parquet);
    assert!(export_format(&txt, Some("xlsx")).is_err());

    let cli = parse(&["export", "supporter", "-o", "gifts.txt", "--file-format", "csv"]);
    let Commands::Export { file_format, .. } = cli.command else {
        panic!("expected export");
    };
    assert_eq!(file_format.as_deref(), Some("csv"));
}

// ============================================================================
// Against a mock CRM
// ============================================================================

fn config_file(server: &MockServer) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salsa.yaml");
    std::fs::write(
        &path,
        format!(
            "host: {}\nemail: manager@example.org\npassword: pw\nhttp:\n  requests_per_second: 0\n",
            server.uri()
        ),
    )
    .unwrap();
    (dir, path)
}

fn runner(config: &std::path::Path, args: &[&str]) -> Runner {
    let config = config.to_string_lossy().to_string();
    let mut all = vec!["-C", config.as_str()];
    all.extend_from_slice(args);
    Runner::new(parse(&all))
}

#[tokio::test]
async fn test_execute_count() {
    let crm = MockServer::start().await;
    mount_login(&crm).await;
    mount_count(&crm, "supporter", 42).await;
    let (_dir, config) = config_file(&crm);

    let result = runner(&config, &["count", "supporter"]).execute().await.unwrap();
    assert_eq!(result, json!({"table": "supporter", "count": 42}));
}

#[tokio::test]
async fn test_execute_query_page() {
    let crm = MockServer::start().await;
    mount_login(&crm).await;
    mount_page(&crm, "supporter", "20,2", json!([{"supporter_KEY": "7"}])).await;
    let (_dir, config) = config_file(&crm);

    let result = runner(
        &config,
        &["query", "supporter", "--offset", "20", "--limit", "2"],
    )
    .execute()
    .await
    .unwrap();
    assert_eq!(result, json!([{"supporter_KEY": "7"}]));
}

#[tokio::test]
async fn test_execute_save_dry_run() {
    let crm = MockServer::start().await;
    mount_login(&crm).await;
    let (_dir, config) = config_file(&crm);

    let result = runner(&config, &["save", "supporter", "--key", "5", "-s", "State=TX"])
        .execute()
        .await
        .unwrap();
    assert_eq!(
        result,
        json!({"table": "supporter", "key": "5", "fields": {"State": "TX"}, "live": false})
    );
}

#[tokio::test]
async fn test_execute_missing_config_file() {
    let result = runner(std::path::Path::new("/nonexistent/salsa.yaml"), &["count", "supporter"])
        .execute()
        .await;
    assert!(matches!(result, Err(crate::Error::FileNotFound { .. })));
}
