//! Coordinate-driven pattern generators.

use crate::foundation::core::{Value, ValueType};
use crate::graph::effect::ExpressionGenerator;
use crate::graph::variable::VariableSpec;
use crate::synth::builder::Stage;
use crate::synth::error::SynthError;
use crate::synth::names::{X, X_NORM, Y, Y_NORM};
use crate::synth::scope::EffectScope;

fn float_in(name: &str, default: f64, description: &str) -> VariableSpec {
    VariableSpec::new(name, ValueType::Float)
        .with_default(Value::Float(default))
        .describe(description)
}

fn value_out() -> Vec<VariableSpec> {
    vec![VariableSpec::new("value", ValueType::Float)]
}

/// Ramp from 0 to 1 across the picture along a direction given in degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearRamp;

impl ExpressionGenerator for LinearRamp {
    fn type_name(&self) -> &str {
        "linear ramp"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![
            float_in("angle", 0.0, "direction in degrees, 0 runs left to right"),
            float_in("scale", 1.0, "ramp repetitions across the picture"),
            float_in("offset", 0.0, "added to the ramp"),
        ]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        value_out()
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("math");
        let (angle, scale, offset) = (
            scope.input(0)?.to_owned(),
            scope.input(1)?.to_owned(),
            scope.input(2)?.to_owned(),
        );
        let at = scope.inputs_stage().location();
        let dx = scope.local("dx");
        let dy = scope.local("dy");
        scope.emit(at, format!("let {dx} = cos({angle} * 0.017453292519943295);"));
        scope.emit(at, format!("let {dy} = sin({angle} * 0.017453292519943295);"));
        let along = format!("({X_NORM} - 0.5) * {dx} + ({Y_NORM} - 0.5) * {dy}");
        scope.define(0, Stage::Pixel, format!("({along}) * {scale} + 0.5 + {offset}"))?;
        Ok(())
    }
}

/// Distance from a center point in normalized coordinates, divided by a radius and clamped
/// to `0..=1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadialRamp;

impl ExpressionGenerator for RadialRamp {
    fn type_name(&self) -> &str {
        "radial ramp"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![
            float_in("center_x", 0.5, "center column, normalized"),
            float_in("center_y", 0.5, "center row, normalized"),
            float_in("radius", 0.5, "distance mapped to 1"),
        ]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        value_out()
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("math");
        let (cx, cy, radius) = (
            scope.input(0)?.to_owned(),
            scope.input(1)?.to_owned(),
            scope.input(2)?.to_owned(),
        );
        let dx = scope.local("dx");
        let dy = scope.local("dy");
        let stage = Stage::Pixel.max(scope.inputs_stage());
        scope.emit(stage.location(), format!("let {dx} = {X_NORM} - {cx};"));
        scope.emit(stage.location(), format!("let {dy} = {Y_NORM} - {cy};"));
        scope.define(
            0,
            Stage::Pixel,
            format!("clamp(sqrt({dx} * {dx} + {dy} * {dy}) / {radius}, 0.0, 1.0)"),
        )?;
        Ok(())
    }
}

/// Alternating 0/1 squares of `size` pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct Checker;

impl ExpressionGenerator for Checker {
    fn type_name(&self) -> &str {
        "checker"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![float_in("size", 8.0, "square side in pixels")]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        value_out()
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        if let Some(Value::Float(size)) = scope.input_constant(0)
            && *size <= 0.0
        {
            return Err(scope.error(format!("checker size must be positive, got {size}")));
        }
        scope.import("math");
        let size = scope.input(0)?.to_owned();
        scope.define(
            0,
            Stage::Pixel,
            format!("(floor({X} / {size}) + floor({Y} / {size})) % 2.0"),
        )?;
        Ok(())
    }
}

/// Fractal gradient noise remapped to roughly `0..=1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Noise;

impl ExpressionGenerator for Noise {
    fn type_name(&self) -> &str {
        "noise"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![
            float_in("scale", 8.0, "features across the picture"),
            VariableSpec::new("octaves", ValueType::Int)
                .with_default(Value::Int(4))
                .describe("fbm octaves, 1 to 10"),
            float_in("seed", 0.0, "selects an independent noise field"),
        ]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        value_out()
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("noise");
        let (scale, octaves, seed) = (
            scope.input(0)?.to_owned(),
            scope.input(1)?.to_owned(),
            scope.input(2)?.to_owned(),
        );
        scope.define(
            0,
            Stage::Pixel,
            format!(
                "fbm({X_NORM} * {scale}, {Y_NORM} * {scale}, {octaves}, {seed}) * 0.5 + 0.5"
            ),
        )?;
        Ok(())
    }
}
