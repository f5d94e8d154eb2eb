use std::sync::atomic::{AtomicUsize, Ordering};

/// Row counters of one picture or preview, one slot per slice.
///
/// A slice stores its own cumulative row count; totals are recomputed from every slot, so
/// reports may arrive in any order.
#[derive(Debug)]
pub(crate) struct TargetProgress {
    width: usize,
    slice_rows: Vec<usize>,
    slots: Vec<AtomicUsize>,
}

impl TargetProgress {
    pub(crate) fn new(width: usize, slice_rows: Vec<usize>) -> Self {
        let slots = slice_rows.iter().map(|_| AtomicUsize::new(0)).collect();
        Self {
            width,
            slice_rows,
            slots,
        }
    }

    pub(crate) fn slice_count(&self) -> usize {
        self.slots.len()
    }

    /// Record that `slice` has completed `rows` rows so far. Values beyond the slice's height
    /// are clamped.
    pub(crate) fn report(&self, slice: usize, rows: usize) {
        if let (Some(slot), Some(max)) = (self.slots.get(slice), self.slice_rows.get(slice)) {
            slot.fetch_max(rows.min(*max), Ordering::AcqRel);
        }
    }

    pub(crate) fn completed_rows(&self) -> usize {
        self.slots.iter().map(|s| s.load(Ordering::Acquire)).sum()
    }

    pub(crate) fn total_rows(&self) -> usize {
        self.slice_rows.iter().sum()
    }

    pub(crate) fn completed_pixels(&self) -> usize {
        self.completed_rows() * self.width
    }

    pub(crate) fn total_pixels(&self) -> usize {
        self.total_rows() * self.width
    }

    pub(crate) fn is_slice_complete(&self, slice: usize) -> bool {
        match (self.slots.get(slice), self.slice_rows.get(slice)) {
            (Some(slot), Some(max)) => slot.load(Ordering::Acquire) == *max,
            _ => false,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        (0..self.slots.len()).all(|i| self.is_slice_complete(i))
    }
}

/// Progress of a whole run: every picture, plus previews when they are tracked.
#[derive(Debug)]
pub(crate) struct RunProgress {
    pictures: Vec<Option<TargetProgress>>,
    previews: Vec<Option<TargetProgress>>,
    track_previews: bool,
}

impl RunProgress {
    pub(crate) fn new(
        pictures: Vec<Option<TargetProgress>>,
        previews: Vec<Option<TargetProgress>>,
        track_previews: bool,
    ) -> Self {
        Self {
            pictures,
            previews,
            track_previews,
        }
    }

    pub(crate) fn picture(&self, idx: usize) -> Option<&TargetProgress> {
        self.pictures.get(idx).and_then(Option::as_ref)
    }

    pub(crate) fn preview(&self, idx: usize) -> Option<&TargetProgress> {
        self.previews.get(idx).and_then(Option::as_ref)
    }

    fn tracked(&self) -> impl Iterator<Item = &TargetProgress> + '_ {
        let previews = self.previews.iter().filter(|_| self.track_previews);
        self.pictures.iter().chain(previews).flatten()
    }

    /// Completed pixels over total pixels of every tracked target; an empty run is done.
    pub(crate) fn fraction(&self) -> f64 {
        let (done, total) = self
            .tracked()
            .fold((0usize, 0usize), |(d, t), p| {
                (d + p.completed_pixels(), t + p.total_pixels())
            });
        if total == 0 {
            return 1.0;
        }
        done as f64 / total as f64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calc/progress.rs"]
mod tests;
