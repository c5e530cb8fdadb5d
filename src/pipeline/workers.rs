//! Worker pools

use super::group::TaskGroup;
use super::stats::PipelineStats;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Start `workers` tasks that share `input` and run `handler` on each item
///
/// Workers exit when `input` closes. A handler error fails the group. Senders
/// captured by `handler` are dropped once the last worker exits, which closes
/// the next stage's channel.
pub fn spawn_workers<T, F, Fut>(
    group: &mut TaskGroup,
    stage: &str,
    workers: usize,
    input: mpsc::Receiver<T>,
    stats: Arc<PipelineStats>,
    handler: F,
) where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let input = Arc::new(Mutex::new(input));
    let handler = Arc::new(handler);

    for id in 1..=workers.max(1) {
        let input = Arc::clone(&input);
        let handler = Arc::clone(&handler);
        let stats = Arc::clone(&stats);
        let name = format!("{stage}-{id:02}");
        group.spawn(name.clone(), async move {
            let mut handled = 0u64;
            loop {
                let next = input.lock().await.recv().await;
                let Some(item) = next else { break };
                if let Err(e) = handler(item).await {
                    stats.add_failed();
                    return Err(e);
                }
                stats.add_processed();
                handled += 1;
            }
            debug!(worker = %name, handled, "Worker done");
            Ok(())
        });
    }
}

/// Start one task that groups `input` into batches of `size` for `handler`
///
/// The last batch may be short.
pub fn spawn_batches<T, F, Fut>(
    group: &mut TaskGroup,
    stage: &str,
    size: usize,
    mut input: mpsc::Receiver<T>,
    stats: Arc<PipelineStats>,
    handler: F,
) where
    T: Send + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let size = size.max(1);
    group.spawn(stage.to_string(), async move {
        let mut batch = Vec::with_capacity(size);
        while let Some(item) = input.recv().await {
            batch.push(item);
            if batch.len() == size {
                let n = batch.len();
                run_batch(&handler, std::mem::take(&mut batch), &stats, n).await?;
                batch.reserve(size);
            }
        }
        if !batch.is_empty() {
            let n = batch.len();
            run_batch(&handler, batch, &stats, n).await?;
        }
        Ok(())
    });
}

async fn run_batch<T, F, Fut>(
    handler: &F,
    batch: Vec<T>,
    stats: &PipelineStats,
    n: usize,
) -> Result<()>
where
    F: Fn(Vec<T>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match handler(batch).await {
        Ok(()) => {
            for _ in 0..n {
                stats.add_processed();
            }
            Ok(())
        }
        Err(e) => {
            stats.add_failed();
            Err(e)
        }
    }
}
