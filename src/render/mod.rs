//! Picture buffers, the renderer seam and slice heuristics.

pub mod picture;
pub mod renderer;
pub mod slices;

pub use picture::{AllocationError, Picture, RowsMut};
pub use renderer::{PixelRegion, RenderError, Renderer};
