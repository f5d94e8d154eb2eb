//! Built-in leaf effects.
//!
//! Single-output effects name their output `value`, except the color effects, whose color
//! output is named `color`.

pub mod color;
pub mod math;
pub mod pattern;

pub use color::{ColorCompose, ColorSplit, GradientMap};
pub use math::{Arithmetic, ArithmeticOp, Constant, EXPRESSION_INPUTS, Expression};
pub use pattern::{Checker, LinearRamp, Noise, RadialRamp};

#[cfg(test)]
#[path = "../../tests/unit/effects/effects.rs"]
mod tests;
