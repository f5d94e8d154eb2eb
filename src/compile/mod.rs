//! Compilation of synthesized sources into renderers.

pub mod compiler;
pub mod error;
pub(crate) mod fingerprint;

pub use compiler::{CacheStats, DEFAULT_CACHE_CAPACITY, GraphCompiler, ProgramCompiler};
pub use error::{CompileError, CompileErrorKind};
