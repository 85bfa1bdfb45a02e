use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};

pub fn create_runtime(threads: usize) -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(threads.max(1))
        .thread_name("netcache-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}
