//! Tests for the pipeline module

use super::*;
use crate::api::Criteria;
use crate::error::{Error, Result};
use crate::pagination::StopCondition;
use crate::test_support::{mock_api, mount_count, mount_page, records};
use crate::types::{Record, RecordExt};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use wiremock::MockServer;

/// In-memory table of sequential numbers
struct Numbers {
    len: u32,
    counted: bool,
    fail_at: Option<u32>,
    calls: AtomicUsize,
}

impl Numbers {
    fn new(len: u32) -> Self {
        Self {
            len,
            counted: false,
            fail_at: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageSource for Numbers {
    type Item = u32;

    async fn total(&self) -> Result<Option<u64>> {
        Ok(self.counted.then_some(u64::from(self.len)))
    }

    async fn fetch(&self, offset: u32, count: u32) -> Result<Vec<u32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(offset) {
            return Err(Error::decode(format!("bad page at {offset}")));
        }
        let end = self.len.min(offset.saturating_add(count));
        Ok((offset..end).collect())
    }
}

fn options(page_size: u32, fetchers: usize) -> FetchOptions {
    FetchOptions {
        start: 0,
        page_size,
        fetchers,
        buffer: 16,
    }
}

async fn drain(
    source: Numbers,
    options: FetchOptions,
) -> (Result<Vec<u32>>, Arc<Numbers>, StatsSnapshot) {
    let source = Arc::new(source);
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let mut rx = spawn_fetch(&mut group, Arc::clone(&source), options, Arc::clone(&stats));

    let result = group
        .drive(async move {
            let mut seen = Vec::new();
            while let Some(n) = rx.recv().await {
                seen.push(n);
            }
            seen.sort_unstable();
            Ok(seen)
        })
        .await;
    (result, source, stats.snapshot())
}

// ============================================================================
// Fetch stage
// ============================================================================

#[tokio::test]
async fn test_unknown_total_reads_until_empty_page() {
    let (result, source, stats) = drain(Numbers::new(1234), options(100, 4)).await;

    let seen = result.unwrap();
    assert_eq!(seen, (0..1234).collect::<Vec<_>>());
    assert_eq!(stats.records, 1234);
    // 13 pages with data plus at least one empty page
    assert!(source.calls.load(Ordering::SeqCst) >= 14);
}

#[tokio::test]
async fn test_counted_total_stops_producer() {
    let mut numbers = Numbers::new(1000);
    numbers.counted = true;
    let (result, source, stats) = drain(numbers, options(250, 3)).await;

    assert_eq!(result.unwrap().len(), 1000);
    assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    assert_eq!(stats.pages, 4);
    assert_eq!(stats.skipped_pages, 0);
}

#[tokio::test]
async fn test_start_offset() {
    let mut numbers = Numbers::new(700);
    numbers.counted = true;
    let (result, _, _) = drain(numbers, options(500, 2).starting_at(600)).await;
    assert_eq!(result.unwrap(), (600..700).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_empty_source() {
    let (result, _, stats) = drain(Numbers::new(0), options(500, 5)).await;
    assert!(result.unwrap().is_empty());
    assert_eq!(stats.records, 0);
}

#[tokio::test]
async fn test_fetch_error_fails_fast() {
    let mut numbers = Numbers::new(10_000);
    numbers.fail_at = Some(300);
    let (result, _, _) = drain(numbers, options(100, 2)).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Failed to decode response: bad page at 300");
}

#[tokio::test]
async fn test_read_all_sequential() {
    let source = Numbers::new(1001);
    let all = read_all(&source, 500, StopCondition::EmptyPage).await.unwrap();
    assert_eq!(all.len(), 1001);
    assert_eq!(source.calls.load(Ordering::SeqCst), 4);

    let source = Numbers::new(1001);
    let all = read_all(&source, 500, StopCondition::ShortPage).await.unwrap();
    assert_eq!(all.len(), 1001);
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Worker pools
// ============================================================================

#[tokio::test]
async fn test_workers_process_everything_and_close_downstream() {
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let (out_tx, mut out_rx) = tokio::sync::mpsc::channel(8);

    spawn_workers(&mut group, "double", 3, rx, Arc::clone(&stats), move |n: u32| {
        let out_tx = out_tx.clone();
        async move {
            out_tx
                .send(n * 2)
                .await
                .map_err(|_| Error::pipeline("double", "closed"))
        }
    });
    group.spawn("feed", async move {
        for n in 0..50u32 {
            tx.send(n).await.map_err(|_| Error::pipeline("feed", "closed"))?;
        }
        Ok(())
    });

    let doubled = group
        .drive(async move {
            let mut seen = BTreeSet::new();
            while let Some(n) = out_rx.recv().await {
                seen.insert(n);
            }
            Ok(seen)
        })
        .await
        .unwrap();

    assert_eq!(doubled.len(), 50);
    assert!(doubled.contains(&98));
    assert_eq!(stats.snapshot().processed, 50);
}

#[tokio::test]
async fn test_worker_error_aborts_group() {
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let (tx, rx) = tokio::sync::mpsc::channel(4);

    spawn_workers(&mut group, "picky", 2, rx, Arc::clone(&stats), |n: u32| async move {
        if n == 7 {
            Err(Error::api("supporter", n.to_string(), "rejected"))
        } else {
            Ok(())
        }
    });
    group.spawn("feed", async move {
        // keeps feeding forever unless aborted
        let mut n = 0u32;
        while tx.send(n).await.is_ok() {
            n += 1;
        }
        Ok(())
    });

    let err = group.join().await.unwrap_err();
    assert_eq!(err.to_string(), "supporter 7: rejected");
    assert_eq!(stats.snapshot().failed, 1);
}

#[tokio::test]
async fn test_batches() {
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let (tx, rx) = tokio::sync::mpsc::channel(4);
    let sizes = Arc::new(StdMutex::new(Vec::new()));

    let seen = Arc::clone(&sizes);
    spawn_batches(&mut group, "chunk", 4, rx, Arc::clone(&stats), move |batch: Vec<u32>| {
        let seen = Arc::clone(&seen);
        async move {
            seen.lock().unwrap().push(batch.len());
            Ok(())
        }
    });
    group.spawn("feed", async move {
        for n in 0..10u32 {
            tx.send(n).await.map_err(|_| Error::pipeline("feed", "closed"))?;
        }
        Ok(())
    });

    group.join().await.unwrap();
    assert_eq!(*sizes.lock().unwrap(), vec![4, 4, 2]);
    assert_eq!(stats.snapshot().processed, 10);
}

#[tokio::test]
async fn test_consumer_error_wins() {
    let mut group = TaskGroup::new();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<u32>(1);
    group.spawn("feed", async move {
        let mut n = 0;
        while tx.send(n).await.is_ok() {
            n += 1;
        }
        Ok(())
    });

    let result: Result<()> = group
        .drive(async move {
            let first = rx.recv().await;
            Err(Error::output(format!("disk full after {first:?}")))
        })
        .await;
    assert!(matches!(result, Err(Error::Output { .. })));
}

// ============================================================================
// TableSource against a mock CRM
// ============================================================================

#[tokio::test]
async fn test_table_source_counted_fetch() {
    let server = MockServer::start().await;
    let api = mock_api(&server).await;
    mount_count(&server, "supporter", 7).await;
    mount_page(&server, "supporter", "0,3", records("supporter", 1, 3)).await;
    mount_page(&server, "supporter", "3,3", records("supporter", 4, 3)).await;
    mount_page(&server, "supporter", "6,3", records("supporter", 7, 1)).await;

    let source =
        Arc::new(TableSource::<Record>::objects(api.supporter(), Criteria::new()).counted(true));
    assert_eq!(source.total().await.unwrap(), Some(7));

    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let mut rx = spawn_fetch(&mut group, source, options(3, 2), Arc::clone(&stats));
    let keys = group
        .drive(async move {
            let mut keys = BTreeSet::new();
            while let Some(r) = rx.recv().await {
                keys.insert(r.text("supporter_KEY").parse::<u32>().unwrap());
            }
            Ok(keys)
        })
        .await
        .unwrap();

    assert_eq!(keys, (1..=7).collect::<BTreeSet<u32>>());
    assert_eq!(stats.snapshot().pages, 3);
}

#[tokio::test]
async fn test_table_source_uncounted_skips_count() {
    let server = MockServer::start().await;
    let api = mock_api(&server).await;
    let source = TableSource::<Record>::left_join(api.supporter_donation(), Criteria::new());
    assert_eq!(source.total().await.unwrap(), None);
    assert!(format!("{source:?}").contains("LeftJoin"));
}

#[tokio::test]
async fn test_table_source_uncounted_stops_on_error_object() {
    let server = MockServer::start().await;
    let api = mock_api(&server).await;
    mount_page(&server, "supporter", "0,3", records("supporter", 1, 3)).await;
    mount_page(
        &server,
        "supporter",
        "3,3",
        serde_json::json!({"result": "error", "messages": ["Invalid query"]}),
    )
    .await;
    mount_page(&server, "supporter", "6,3", serde_json::json!([])).await;

    let source = Arc::new(TableSource::<Record>::objects(api.supporter(), Criteria::new()));
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let mut rx = spawn_fetch(&mut group, source, options(3, 1), Arc::clone(&stats));
    let run = group.drive(async move {
        let mut seen = 0usize;
        while rx.recv().await.is_some() {
            seen += 1;
        }
        Ok(seen)
    });

    let result = tokio::time::timeout(std::time::Duration::from_secs(10), run)
        .await
        .unwrap();
    assert!(matches!(result, Err(Error::Decode { .. })));
}
