//! Fail-fast task group

use crate::error::{Error, Result};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// A set of named tasks that stands or falls together
///
/// The first task to fail aborts the rest. Dropping the group aborts
/// whatever is still running.
#[derive(Default)]
pub struct TaskGroup {
    tasks: JoinSet<(String, Result<()>)>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        self.tasks.spawn(async move {
            let result = task.await;
            (name, result)
        });
    }

    /// Number of tasks not yet joined
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task. The first error aborts the others and is returned.
    pub async fn join(&mut self) -> Result<()> {
        while let Some(joined) = self.tasks.join_next().await {
            let failure = match joined {
                Ok((name, Ok(()))) => {
                    debug!(task = %name, "Task finished");
                    None
                }
                Ok((name, Err(e))) => {
                    error!(task = %name, "Task failed: {e}");
                    Some(e)
                }
                Err(e) if e.is_cancelled() => None,
                Err(e) => Some(Error::pipeline("task", format!("panicked: {e}"))),
            };
            if let Some(e) = failure {
                self.tasks.abort_all();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run `consumer` in the calling task while the group runs
    ///
    /// Returns the consumer's value once both are done, or the first error
    /// from either side.
    pub async fn drive<T, F>(mut self, consumer: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let (_, value) = tokio::try_join!(self.join(), consumer)?;
        Ok(value)
    }
}

impl std::fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGroup")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
