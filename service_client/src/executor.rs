//! Worker-pool runtime construction and supervised task spawning.

use std::future::Future;

use tokio::runtime::Runtime;

/// Sizing for the worker-thread pool that drains a service's I/O reactor.
/// Each service builds its own, independently sized pool.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct WorkerPoolSettings {
    pub worker_threads: usize,
}

/// Build the fixed-size multi-threaded runtime for a service.
pub fn build_runtime(settings: &WorkerPoolSettings) -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.worker_threads)
        .thread_name("link-worker")
        .enable_all()
        .build()
}

/// Spawn a task together with a watcher that logs a panicked or cancelled
/// task instead of letting the failure disappear. Worker threads keep
/// draining regardless.
pub fn spawn_supervised<F>(name: &'static str, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(task);
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            tracing::error!("Task '{}' failed: {}", name, e);
        }
    });
}
