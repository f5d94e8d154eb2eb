use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crate::calc::progress::RunProgress;
use crate::foundation::error::{PixelflowError, PixelflowResult};
use crate::render::picture::Picture;
use crate::render::renderer::Renderer;

/// Lifecycle of one calculation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalculationState {
    Created,
    Allocating,
    Compiling,
    Rendering,
    Completed,
    Stopped,
    Failed,
}

impl CalculationState {
    const ALL: [Self; 7] = [
        Self::Created,
        Self::Allocating,
        Self::Compiling,
        Self::Rendering,
        Self::Completed,
        Self::Stopped,
        Self::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    fn from_u8(v: u8) -> Self {
        Self::ALL.get(usize::from(v)).copied().unwrap_or(Self::Failed)
    }
}

/// Result of a finished run, indexed like the requests.
///
/// A picture is `None` when it failed; a preview is `None` when it was not requested, was
/// too small, or its picture failed. Stopped runs return their truncated buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalculationOutput {
    pub pictures: Vec<Option<Picture>>,
    pub previews: Vec<Option<Picture>>,
    /// Indices of pictures that failed to compile or render.
    pub failed: Vec<usize>,
}

/// State shared between a [`Calculation`] handle and its coordinator thread.
pub(crate) struct RunShared {
    state: AtomicU8,
    status: Mutex<String>,
    stopped: AtomicBool,
    renderers: Mutex<Vec<Arc<dyn Renderer>>>,
    progress: Mutex<Option<Arc<RunProgress>>>,
}

impl RunShared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(CalculationState::Created as u8),
            status: Mutex::new("created".to_owned()),
            stopped: AtomicBool::new(false),
            renderers: Mutex::new(Vec::new()),
            progress: Mutex::new(None),
        }
    }

    pub(crate) fn enter(&self, state: CalculationState, status: impl Into<String>) {
        let status = status.into();
        tracing::debug!(?state, status = %status, "calculation state");
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn state(&self) -> CalculationState {
        CalculationState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Track `renderer` so a stop request reaches it. A renderer registered after the
    /// request is stopped immediately.
    pub(crate) fn register(&self, renderer: Arc<dyn Renderer>) {
        let mut renderers = self.renderers.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped() {
            renderer.stop();
        }
        renderers.push(renderer);
    }

    pub(crate) fn stop(&self) {
        let renderers = self.renderers.lock().unwrap_or_else(PoisonError::into_inner);
        self.stopped.store(true, Ordering::Release);
        for r in renderers.iter() {
            r.stop();
        }
    }

    pub(crate) fn set_progress(&self, progress: Arc<RunProgress>) {
        *self.progress.lock().unwrap_or_else(PoisonError::into_inner) = Some(progress);
    }

    fn progress(&self) -> f64 {
        let tracked = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match tracked {
            Some(p) => p.fraction(),
            None if self.state() == CalculationState::Completed => 1.0,
            None => 0.0,
        }
    }
}

/// Handle of a running calculation.
///
/// Dropping the handle detaches the run; it keeps going and still notifies its listeners.
pub struct Calculation {
    shared: Arc<RunShared>,
    thread: JoinHandle<PixelflowResult<CalculationOutput>>,
}

impl Calculation {
    pub(crate) fn new(
        shared: Arc<RunShared>,
        thread: JoinHandle<PixelflowResult<CalculationOutput>>,
    ) -> Self {
        Self { shared, thread }
    }

    /// Completed fraction of the run in `0..=1`.
    pub fn progress(&self) -> f64 {
        self.shared.progress()
    }

    pub fn status(&self) -> String {
        self.shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> CalculationState {
        self.shared.state()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_failed(&self) -> bool {
        self.state() == CalculationState::Failed
    }

    /// Request a cooperative stop. Running slices return at their next row or pixel check;
    /// the run then settles as [`CalculationState::Stopped`].
    pub fn stop(&self) {
        tracing::info!("calculation stop requested");
        self.shared.stop();
    }

    /// Block until the run finishes.
    ///
    /// Allocation failures are returned as errors. Compile and render failures of single
    /// pictures are listed in [`CalculationOutput::failed`].
    pub fn wait(self) -> PixelflowResult<CalculationOutput> {
        self.thread
            .join()
            .map_err(|_| PixelflowError::Other(anyhow::anyhow!("calculation thread panicked")))?
    }
}

impl std::fmt::Debug for Calculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculation")
            .field("state", &self.state())
            .field("progress", &self.progress())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calc/handle.rs"]
mod tests;
