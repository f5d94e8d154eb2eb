use crate::compile::error::CompileError;
use crate::graph::error::GraphError;
use crate::render::picture::AllocationError;
use crate::render::renderer::RenderError;
use crate::synth::error::SynthError;

/// Convenience result type used across pixelflow.
pub type PixelflowResult<T> = Result<T, PixelflowError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixelflowError {
    /// Graph construction or binding rejected at the call site.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Source synthesis could not linearize the graph.
    #[error("synthesis error: {0}")]
    Synth(#[from] SynthError),

    /// Synthesized source did not compile into a renderer.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A slice task failed while executing a renderer.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Picture or preview buffers could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Invalid user-provided request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelflowError {
    /// Build a [`PixelflowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixelflowError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short one-line label for the error family, used as listener summaries.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Graph(_) => "graph error",
            Self::Synth(_) => "source synthesis failed",
            Self::Compile(_) => "compilation failed",
            Self::Render(_) => "rendering failed",
            Self::Allocation(_) => "not enough memory",
            Self::Validation(_) => "invalid request",
            Self::Config(_) => "invalid configuration",
            Self::Other(_) => "internal error",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
