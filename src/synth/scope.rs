use crate::foundation::core::{Value, ValueType};
use crate::synth::builder::{Location, SourceBuilder, Stage};
use crate::synth::error::SynthError;
use crate::synth::names;

/// An input as seen by a generator: the expression that reads it.
#[derive(Clone, Debug)]
pub(crate) struct ScopedInput {
    pub(crate) name: String,
    pub(crate) expr: String,
    pub(crate) stage: Stage,
    pub(crate) constant: Option<Value>,
}

#[derive(Clone, Debug)]
pub(crate) struct ScopedOutput {
    pub(crate) ident: String,
    pub(crate) value_type: ValueType,
    pub(crate) defined: Option<Stage>,
}

/// View of the [`SourceBuilder`] handed to one leaf effect while it emits code.
///
/// Inputs resolve to ready-made expressions (an upstream identifier, a literal, or a
/// parameter field); outputs are identifiers the generator must define exactly once with
/// [`EffectScope::define`].
pub struct EffectScope<'a> {
    builder: &'a mut SourceBuilder,
    effect: &'a str,
    namespace: &'a str,
    inputs: Vec<ScopedInput>,
    outputs: Vec<ScopedOutput>,
}

impl<'a> EffectScope<'a> {
    pub(crate) fn new(
        builder: &'a mut SourceBuilder,
        effect: &'a str,
        namespace: &'a str,
        inputs: Vec<ScopedInput>,
        outputs: Vec<ScopedOutput>,
    ) -> Self {
        Self {
            builder,
            effect,
            namespace,
            inputs,
            outputs,
        }
    }

    /// Unique identifier prefix of this effect.
    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn effect_name(&self) -> &str {
        self.effect
    }

    /// Expression reading input `index`.
    pub fn input(&self, index: usize) -> Result<&str, SynthError> {
        self.inputs
            .get(index)
            .map(|i| i.expr.as_str())
            .ok_or_else(|| self.index_error("input", index))
    }

    /// Constant held by input `index` when it is not bound to an output.
    pub fn input_constant(&self, index: usize) -> Option<&Value> {
        self.inputs.get(index).and_then(|i| i.constant.as_ref())
    }

    /// Innermost stage among all inputs.
    pub fn inputs_stage(&self) -> Stage {
        self.inputs
            .iter()
            .map(|i| i.stage)
            .max()
            .unwrap_or(Stage::Uniform)
    }

    /// Identifier output `index` must be defined as.
    pub fn output(&self, index: usize) -> Result<&str, SynthError> {
        self.outputs
            .get(index)
            .map(|o| o.ident.as_str())
            .ok_or_else(|| self.index_error("output", index))
    }

    /// Define output `index` as `expr`. The declaration is placed at `min_stage` or deeper
    /// if an input demands it; the chosen stage is returned.
    pub fn define(
        &mut self,
        index: usize,
        min_stage: Stage,
        expr: impl AsRef<str>,
    ) -> Result<Stage, SynthError> {
        let stage = min_stage.max(self.inputs_stage());
        let out = self
            .outputs
            .get_mut(index)
            .ok_or_else(|| SynthError::Index {
                effect: self.effect.to_owned(),
                what: "output",
                index,
            })?;
        if out.defined.is_some() {
            return Err(SynthError::generator(
                self.effect,
                format!("output `{}` defined twice", out.ident),
            ));
        }
        out.defined = Some(stage);
        let line = format!("let {} = {};", out.ident, expr.as_ref());
        self.builder.emit(stage.location(), line);
        Ok(stage)
    }

    /// Fresh scratch identifier private to this effect.
    pub fn local(&mut self, name: &str) -> String {
        self.builder
            .unique_ident(names::TEMP_PREFIX, self.namespace, name)
    }

    pub fn emit(&mut self, location: Location, line: impl Into<String>) {
        self.builder.emit(location, line);
    }

    pub fn import(&mut self, module: &str) {
        self.builder.import(module);
    }

    /// Generator-level failure attributed to this effect.
    pub fn error(&self, message: impl Into<String>) -> SynthError {
        SynthError::generator(self.effect, message)
    }

    pub(crate) fn into_outputs(self) -> Vec<ScopedOutput> {
        self.outputs
    }

    fn index_error(&self, what: &'static str, index: usize) -> SynthError {
        SynthError::Index {
            effect: self.effect.to_owned(),
            what,
            index,
        }
    }
}
