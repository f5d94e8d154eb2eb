//! Calculation engine: allocates picture buffers, compiles one renderer per picture, and
//! renders previews and pictures as row slices on a shared worker pool.

pub mod config;
pub mod engine;
pub mod handle;
pub mod listener;
pub mod pool;
pub(crate) mod progress;
pub(crate) mod run;

pub use config::EngineConfig;
pub use engine::{Engine, PictureRequest};
pub use handle::{Calculation, CalculationOutput, CalculationState};
pub use listener::{CalculationListener, ListenerSet};
pub use pool::WorkerPool;
