#![forbid(unsafe_code)]
//! Compile declarative effect graphs into parallel per-pixel renderers.
//!
//! An [`EffectContainer`] describes a picture as an ordered graph of effects. The engine
//! synthesizes the graph into a small pixel program, compiles that once into a
//! [`Renderer`], and renders pictures and previews as row slices on a worker pool.

pub mod calc;
pub mod compile;
pub mod effects;
mod foundation;
mod graph;
mod program;
pub mod render;
mod synth;

pub use calc::{
    Calculation, CalculationListener, CalculationOutput, CalculationState, Engine, EngineConfig,
    ListenerSet, PictureRequest, WorkerPool,
};
pub use compile::{CompileError, CompileErrorKind, GraphCompiler, ProgramCompiler};
pub use foundation::core::{Color, Gradient, GradientStop, Value, ValueType};
pub use foundation::error::{PixelflowError, PixelflowResult};
pub use foundation::ids::{EffectId, GraphId, InputId, OutputId, SubscriptionId};
pub use graph::container::{Channel, EffectContainer};
pub use graph::effect::{Effect, EffectKind, ExpressionGenerator};
pub use graph::error::{GraphError, GraphResult};
pub use graph::events::GraphEvent;
pub use graph::variable::{Binding, InputVariable, OutputVariable, VariableOwner, VariableSpec};
pub use render::{Picture, PixelRegion, RenderError, Renderer};
pub use synth::builder::{Location, Stage, SynthesizedSource};
pub use synth::emit::synthesize;
pub use synth::error::SynthError;
pub use synth::names;
pub use synth::scope::EffectScope;
