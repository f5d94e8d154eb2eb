use crate::foundation::core::{Color, Gradient, Value, ValueType};
use crate::graph::effect::ExpressionGenerator;
use crate::graph::variable::VariableSpec;
use crate::synth::builder::Stage;
use crate::synth::error::SynthError;
use crate::synth::scope::EffectScope;

const COMPONENTS: [&str; 4] = ["r", "g", "b", "a"];

/// Builds a color from four float components.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorCompose;

impl ExpressionGenerator for ColorCompose {
    fn type_name(&self) -> &str {
        "compose color"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        COMPONENTS
            .iter()
            .map(|c| {
                let default = if *c == "a" { 1.0 } else { 0.0 };
                VariableSpec::new(*c, ValueType::Float).with_default(Value::Float(default))
            })
            .collect()
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("color", ValueType::Color)]
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("color");
        let args = (0..4)
            .map(|i| scope.input(i))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        scope.define(0, Stage::Uniform, format!("rgba({args})"))?;
        Ok(())
    }
}

/// Splits a color into its float components.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorSplit;

impl ExpressionGenerator for ColorSplit {
    fn type_name(&self) -> &str {
        "split color"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("color", ValueType::Color).with_default(Value::Color(Color::BLACK))]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        COMPONENTS
            .iter()
            .map(|c| VariableSpec::new(*c, ValueType::Float))
            .collect()
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("color");
        let color = scope.input(0)?.to_owned();
        for (i, func) in ["red", "green", "blue", "alpha"].into_iter().enumerate() {
            scope.define(i, Stage::Uniform, format!("{func}({color})"))?;
        }
        Ok(())
    }
}

/// Samples a gradient at a float position.
#[derive(Clone, Copy, Debug, Default)]
pub struct GradientMap;

impl ExpressionGenerator for GradientMap {
    fn type_name(&self) -> &str {
        "gradient map"
    }

    fn inputs(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::new("gradient", ValueType::Gradient)
                .with_default(Value::Gradient(Gradient::linear(Color::BLACK, Color::WHITE))),
            VariableSpec::new("t", ValueType::Float)
                .with_default(Value::Float(0.0))
                .describe("position, clamped to the end stops"),
        ]
    }

    fn outputs(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::new("color", ValueType::Color)]
    }

    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError> {
        scope.import("color");
        let gradient = scope.input(0)?.to_owned();
        let t = scope.input(1)?.to_owned();
        scope.define(0, Stage::Uniform, format!("sample({gradient}, {t})"))?;
        Ok(())
    }
}
