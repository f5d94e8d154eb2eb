use std::sync::Arc;

use crate::foundation::error::{PixelflowError, PixelflowResult};

/// Bounded worker pool shared by compile and slice tasks of every run of an engine.
///
/// Cloning shares the same threads. Construct one at the top of the process and hand it to
/// each [`Engine`](crate::calc::Engine) that should share it.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    inner: Arc<rayon::ThreadPool>,
}

impl WorkerPool {
    /// `None` sizes the pool to the available cores.
    pub fn new(threads: Option<usize>) -> PixelflowResult<Self> {
        Ok(Self {
            inner: Arc::new(build_thread_pool(threads)?),
        })
    }

    pub fn workers(&self) -> usize {
        self.inner.current_num_threads()
    }

    /// Run `op` inside the pool, so rayon scopes and parallel iterators use its threads.
    pub(crate) fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.inner.install(op)
    }
}

fn build_thread_pool(threads: Option<usize>) -> PixelflowResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PixelflowError::config("worker 'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("pixelflow-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PixelflowError::Other(anyhow::anyhow!("failed to build worker pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/calc/pool.rs"]
mod tests;
