use std::sync::{Arc, PoisonError, RwLock};

use crate::foundation::error::PixelflowError;
use crate::foundation::ids::SubscriptionId;
use crate::render::picture::Picture;

/// Observer of calculation runs.
///
/// Every method may be called from a worker thread, concurrently with other calls. All
/// methods default to no-ops.
pub trait CalculationListener: Send + Sync {
    /// Overall run progress in `0..=1`.
    fn on_progress(&self, _fraction: f64) {}

    /// A slice of `rows` rows finished rendering.
    fn on_slice_ready(&self, _picture: usize, _preview: bool, _slice: usize, _rows: usize) {}

    fn on_preview_ready(&self, _picture: usize, _preview: &Picture) {}

    fn on_picture_ready(&self, _picture: usize, _image: &Picture) {}

    /// A picture or the whole run failed. `summary` is one line; `description` carries the
    /// details, including generated source for compile failures.
    fn on_error(&self, _summary: &str, _description: &str, _cause: &PixelflowError) {}

    /// Every picture completed and the run was not stopped.
    fn on_ready(&self, _pictures: &[Option<Picture>]) {}
}

type Entry = (SubscriptionId, Arc<dyn CalculationListener>);

/// Copy-on-write listener list: delivery iterates a snapshot, so registration and removal
/// never wait for or disturb an in-flight event.
#[derive(Default)]
pub struct ListenerSet {
    entries: RwLock<Arc<Vec<Entry>>>,
    next: std::sync::atomic::AtomicU64,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn CalculationListener>) -> SubscriptionId {
        let id = SubscriptionId(
            self.next
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
                + 1,
        );
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&guard);
        next.push((id, listener));
        *guard = Arc::new(next);
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|(sid, _)| *sid == id) {
            return false;
        }
        let next: Vec<Entry> = guard.iter().filter(|(sid, _)| *sid != id).cloned().collect();
        *guard = Arc::new(next);
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Vec<Entry>> {
        Arc::clone(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Deliver to every listener registered at the time of the call.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&dyn CalculationListener)) {
        for (_, l) in self.snapshot().iter() {
            f(l.as_ref());
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("count", &self.len())
            .finish()
    }
}

/// The engine-wide listeners plus the optional listener of one run.
#[derive(Clone)]
pub(crate) struct Fanout {
    shared: Arc<ListenerSet>,
    own: Option<Arc<dyn CalculationListener>>,
}

impl Fanout {
    pub(crate) fn new(shared: Arc<ListenerSet>, own: Option<Arc<dyn CalculationListener>>) -> Self {
        Self { shared, own }
    }

    fn each(&self, mut f: impl FnMut(&dyn CalculationListener)) {
        self.shared.for_each(&mut f);
        if let Some(own) = &self.own {
            f(own.as_ref());
        }
    }

    pub(crate) fn progress(&self, fraction: f64) {
        self.each(|l| l.on_progress(fraction));
    }

    pub(crate) fn slice_ready(&self, picture: usize, preview: bool, slice: usize, rows: usize) {
        self.each(|l| l.on_slice_ready(picture, preview, slice, rows));
    }

    pub(crate) fn preview_ready(&self, picture: usize, preview: &Picture) {
        self.each(|l| l.on_preview_ready(picture, preview));
    }

    pub(crate) fn picture_ready(&self, picture: usize, image: &Picture) {
        self.each(|l| l.on_picture_ready(picture, image));
    }

    pub(crate) fn error(&self, summary: &str, description: &str, cause: &PixelflowError) {
        self.each(|l| l.on_error(summary, description, cause));
    }

    pub(crate) fn ready(&self, pictures: &[Option<Picture>]) {
        self.each(|l| l.on_ready(pictures));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calc/listener.rs"]
mod tests;
