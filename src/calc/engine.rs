use std::sync::Arc;

use crate::calc::config::EngineConfig;
use crate::calc::handle::{Calculation, RunShared};
use crate::calc::listener::{CalculationListener, Fanout, ListenerSet};
use crate::calc::pool::WorkerPool;
use crate::calc::run::{self, RunJob};
use crate::compile::compiler::{GraphCompiler, ProgramCompiler};
use crate::foundation::error::{PixelflowError, PixelflowResult};
use crate::foundation::ids::SubscriptionId;
use crate::graph::container::EffectContainer;
use crate::render::picture::Picture;

/// One picture of a calculation run.
#[derive(Debug)]
pub struct PictureRequest {
    pub container: EffectContainer,
    pub width: usize,
    pub height: usize,
    /// Render a scaled-down preview first.
    pub preview: bool,
}

impl PictureRequest {
    /// Request a picture of `container` as it is now; later edits to `container` do not
    /// affect the run.
    pub fn new(container: &EffectContainer, width: usize, height: usize) -> Self {
        Self {
            container: container.copy(),
            width,
            height,
            preview: false,
        }
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

/// Calculation engine: compiles effect graphs and renders them in parallel slices.
///
/// Runs started from one engine share its worker pool, compiler cache and listeners.
pub struct Engine {
    config: EngineConfig,
    pool: WorkerPool,
    compiler: Arc<dyn GraphCompiler>,
    listeners: Arc<ListenerSet>,
}

impl Engine {
    /// Engine with its own worker pool sized by `config.threads`.
    pub fn new(config: EngineConfig) -> PixelflowResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.threads)?;
        Self::with_pool(config, pool)
    }

    /// Engine running on an existing pool; `config.threads` is ignored.
    pub fn with_pool(config: EngineConfig, pool: WorkerPool) -> PixelflowResult<Self> {
        config.validate()?;
        let compiler = Arc::new(ProgramCompiler::with_cache_capacity(
            config.compile_cache_capacity,
        ));
        Ok(Self {
            config,
            pool,
            compiler,
            listeners: Arc::new(ListenerSet::new()),
        })
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn GraphCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Register a listener for every later event of every run of this engine.
    pub fn add_listener(&self, listener: Arc<dyn CalculationListener>) -> SubscriptionId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn start(&self, requests: Vec<PictureRequest>) -> PixelflowResult<Calculation> {
        self.start_with_buffers(requests, Vec::new(), None)
    }

    /// Start a run that also notifies `listener`, in addition to the engine's listeners.
    pub fn start_with_listener(
        &self,
        requests: Vec<PictureRequest>,
        listener: Arc<dyn CalculationListener>,
    ) -> PixelflowResult<Calculation> {
        self.start_with_buffers(requests, Vec::new(), Some(listener))
    }

    /// Start a run that reuses `buffers[i]` for picture `i` when its shape matches.
    ///
    /// `buffers` may be empty or hold one entry per request.
    #[tracing::instrument(skip_all, fields(pictures = requests.len()))]
    pub fn start_with_buffers(
        &self,
        requests: Vec<PictureRequest>,
        buffers: Vec<Option<Picture>>,
        listener: Option<Arc<dyn CalculationListener>>,
    ) -> PixelflowResult<Calculation> {
        if !buffers.is_empty() && buffers.len() != requests.len() {
            return Err(PixelflowError::validation(format!(
                "{} reusable buffers supplied for {} pictures",
                buffers.len(),
                requests.len()
            )));
        }
        for (i, r) in requests.iter().enumerate() {
            if r.container.channels().is_empty() {
                return Err(PixelflowError::validation(format!(
                    "picture {i}: container `{}` declares no channels",
                    r.container.name()
                )));
            }
        }

        let shared = Arc::new(RunShared::new());
        let job = RunJob {
            requests,
            buffers,
            config: self.config.clone(),
            pool: self.pool.clone(),
            compiler: Arc::clone(&self.compiler),
            events: Fanout::new(Arc::clone(&self.listeners), listener),
            shared: Arc::clone(&shared),
        };
        let thread = std::thread::Builder::new()
            .name("pixelflow-calc".to_owned())
            .spawn(move || run::execute(job))
            .map_err(|e| {
                PixelflowError::Other(anyhow::anyhow!("failed to spawn calculation thread: {e}"))
            })?;
        tracing::info!("calculation started");
        Ok(Calculation::new(shared, thread))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("workers", &self.pool.workers())
            .field("listeners", &self.listeners)
            .finish()
    }
}
