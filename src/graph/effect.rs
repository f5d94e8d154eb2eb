use std::fmt;
use std::sync::Arc;

use crate::foundation::ids::{EffectId, InputId, OutputId};
use crate::graph::container::EffectContainer;
use crate::graph::variable::VariableSpec;
use crate::synth::error::SynthError;
use crate::synth::scope::EffectScope;

/// Code emitter for a leaf effect.
///
/// Generators are immutable descriptions: the same instance may back many effects and many
/// container copies, so all per-effect state lives in the container arena.
pub trait ExpressionGenerator: Send + Sync + fmt::Debug {
    /// Display name, also used as the default effect name.
    fn type_name(&self) -> &str;

    /// Ordered input declarations.
    fn inputs(&self) -> Vec<VariableSpec>;

    /// Ordered output declarations.
    fn outputs(&self) -> Vec<VariableSpec>;

    /// Emit code computing every output identifier of `scope`.
    fn generate(&self, scope: &mut EffectScope<'_>) -> Result<(), SynthError>;
}

/// What an effect computes.
pub enum EffectKind {
    Leaf(Arc<dyn ExpressionGenerator>),
    Composite(Box<EffectContainer>),
}

impl EffectKind {
    pub fn leaf(generator: impl ExpressionGenerator + 'static) -> Self {
        Self::Leaf(Arc::new(generator))
    }

    pub fn composite(container: EffectContainer) -> Self {
        Self::Composite(Box::new(container))
    }

    /// Structural copy; composite bodies are deep-copied into fresh arenas.
    pub(crate) fn copy(&self) -> Self {
        match self {
            Self::Leaf(g) => Self::Leaf(Arc::clone(g)),
            Self::Composite(c) => Self::Composite(Box::new(c.copy())),
        }
    }

    pub(crate) fn default_name(&self) -> String {
        match self {
            Self::Leaf(g) => g.type_name().to_owned(),
            Self::Composite(c) => c.name().to_owned(),
        }
    }

    pub(crate) fn input_specs(&self) -> Vec<VariableSpec> {
        match self {
            Self::Leaf(g) => g.inputs(),
            Self::Composite(c) => c.input_surface(),
        }
    }

    pub(crate) fn output_specs(&self) -> Vec<VariableSpec> {
        match self {
            Self::Leaf(g) => g.outputs(),
            Self::Composite(c) => c.output_surface(),
        }
    }
}

impl fmt::Debug for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(g) => f.debug_tuple("Leaf").field(&g.type_name()).finish(),
            Self::Composite(c) => f.debug_tuple("Composite").field(&c.name()).finish(),
        }
    }
}

/// Graph node owned by an [`EffectContainer`].
#[derive(Debug)]
pub struct Effect {
    pub(crate) id: EffectId,
    pub(crate) name: String,
    pub(crate) kind: EffectKind,
    pub(crate) inputs: Vec<InputId>,
    pub(crate) outputs: Vec<OutputId>,
    pub(crate) revision: u64,
}

impl Effect {
    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[InputId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputId] {
        &self.outputs
    }

    /// Incremented every time one of this effect's variables changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, EffectKind::Composite(_))
    }

    pub fn nested(&self) -> Option<&EffectContainer> {
        match &self.kind {
            EffectKind::Composite(c) => Some(c),
            EffectKind::Leaf(_) => None,
        }
    }
}
