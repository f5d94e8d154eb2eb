use crate::render::picture::RowsMut;

/// Half-open pixel rectangle `[start_x, end_x) x [start_y, end_y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

impl PixelRegion {
    /// Full-width band of rows.
    pub fn rows(width: usize, start_y: usize, end_y: usize) -> Self {
        Self {
            start_x: 0,
            start_y,
            end_x: width,
            end_y,
        }
    }

    pub fn row_count(&self) -> usize {
        self.end_y.saturating_sub(self.start_y)
    }
}

/// Errors raised by a renderer invocation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("renderer was built for {expected} channels but {found} were supplied")]
    ChannelCount { expected: usize, found: usize },

    #[error("invalid region: {0}")]
    Region(String),

    #[error("evaluation failed in `{program}`: {message}")]
    Evaluation { program: String, message: String },

    #[error("slice task panicked: {0}")]
    Panicked(String),
}

/// Compiled per-pixel computation for one picture.
///
/// A renderer holds no per-call state besides its stop flag, so one instance is shared by
/// every slice of a picture and its preview, and `calculate_pixels` may run concurrently
/// on disjoint row ranges.
pub trait Renderer: Send + Sync {
    /// Number of interleaved channels the program writes.
    fn channel_count(&self) -> usize;

    /// Fill `region` of a `width` x `height` picture. `rows` must cover the region's rows and
    /// hold `width * channel_count` floats per row.
    ///
    /// `progress` receives the cumulative number of completed rows of this call, at a bounded
    /// cadence and always after the final row. A stop request ends the call early with `Ok`.
    #[allow(clippy::too_many_arguments)]
    fn calculate_pixels(
        &self,
        width: usize,
        height: usize,
        channel_names: &[String],
        rows: RowsMut<'_>,
        region: PixelRegion,
        progress: &mut dyn FnMut(usize),
        slice_id: usize,
    ) -> Result<(), RenderError>;

    /// Request cooperative cancellation of every running and future call.
    fn stop(&self);

    fn is_stopped(&self) -> bool;
}
