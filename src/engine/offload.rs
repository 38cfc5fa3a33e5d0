//! Worker-thread offload for cascade execution.
//!
//! Runs cascade invocations on a fixed pool of OS threads, each owning a
//! current-thread runtime, so a wedged browser page cannot stall the
//! caller's event loop. Jobs are submitted over a channel; results come
//! back over a per-job response channel.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::orchestrator::{ExecMode, RetailerExecutor};
use crate::models::{RetailerOutcome, SearchQuery};

struct Job {
    key: &'static str,
    query: SearchQuery,
    mode: ExecMode,
    respond: oneshot::Sender<RetailerOutcome>,
}

/// Fixed-size pool of isolated cascade workers.
pub struct CascadeWorkerPool {
    tx: Mutex<Option<Sender<Job>>>,
    handles: Mutex<Vec<std::thread::JoinHandle<()>>>,
}

impl CascadeWorkerPool {
    /// Spawn `workers` threads running `executor` jobs. Worker count is
    /// clamped to the machine's parallelism.
    pub fn new(workers: usize, executor: RetailerExecutor) -> Result<Arc<Self>> {
        let workers = workers.clamp(1, num_cpus::get());
        let (tx, rx) = unbounded::<Job>();

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let executor = executor.clone();
            let handle = std::thread::Builder::new()
                .name(format!("cascade-worker-{index}"))
                .spawn(move || {
                    let runtime = match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime,
                        Err(e) => {
                            warn!("cascade worker {index} failed to build runtime: {e}");
                            return;
                        }
                    };

                    while let Ok(job) = rx.recv() {
                        debug!(worker = index, retailer = job.key, "worker picked up cascade");
                        let outcome = runtime.block_on(executor(job.key, job.query, job.mode));
                        // Receiver gone means the orchestrator gave up on
                        // this retailer; nothing to do.
                        let _ = job.respond.send(outcome);
                    }
                    debug!("cascade worker {index} exiting");
                })
                .context("failed to spawn cascade worker")?;
            handles.push(handle);
        }

        Ok(Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
        }))
    }

    /// Submit one cascade job and await its outcome.
    pub async fn submit(
        &self,
        key: &'static str,
        query: SearchQuery,
        mode: ExecMode,
    ) -> RetailerOutcome {
        let (respond, receive) = oneshot::channel();

        let sent = {
            let guard = self.tx.lock();
            match guard.as_ref() {
                Some(tx) => tx
                    .send(Job {
                        key,
                        query,
                        mode,
                        respond,
                    })
                    .is_ok(),
                None => false,
            }
        };

        if !sent {
            return RetailerOutcome::failure(
                key.to_string(),
                Some("cascade worker pool is shut down".to_string()),
            );
        }

        match receive.await {
            Ok(outcome) => outcome,
            Err(_) => RetailerOutcome::failure(
                key.to_string(),
                Some("cascade worker dropped the job".to_string()),
            ),
        }
    }

    /// Stop accepting jobs and join the workers.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!("cascade worker panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    fn echo_executor() -> RetailerExecutor {
        Arc::new(|key, query, _mode| -> BoxFuture<'static, RetailerOutcome> {
            Box::pin(async move {
                RetailerOutcome::failure(
                    key.to_string(),
                    Some(format!("echo:{}", query.raw())),
                )
            })
        })
    }

    #[tokio::test]
    async fn jobs_round_trip_through_workers() {
        let pool = CascadeWorkerPool::new(2, echo_executor()).expect("pool spawns");
        let outcome = pool
            .submit("flipkart", SearchQuery::new("kettle"), ExecMode::Fast)
            .await;
        assert_eq!(outcome.retailer, "flipkart");
        assert_eq!(outcome.error.as_deref(), Some("echo:kettle"));
        pool.shutdown();
    }

    #[tokio::test]
    async fn submit_after_shutdown_degrades() {
        let pool = CascadeWorkerPool::new(1, echo_executor()).expect("pool spawns");
        pool.shutdown();
        let outcome = pool
            .submit("croma", SearchQuery::new("tv"), ExecMode::Thorough)
            .await;
        assert!(!outcome.succeeded);
        assert!(outcome.error.unwrap().contains("shut down"));
    }
}
