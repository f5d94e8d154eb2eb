use crate::foundation::core::ValueType;
use crate::foundation::ids::{EffectId, InputId, OutputId};

/// Convenience result type for graph construction and editing.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised synchronously by graph construction and binding calls.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("input `{input}` ({expected}) cannot bind to output `{output}` ({found})")]
    TypeMismatch {
        input: String,
        expected: ValueType,
        output: String,
        found: ValueType,
    },

    #[error("input `{input}` ({expected}) cannot hold a constant of type {found}")]
    ConstantType {
        input: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("input `{input}` cannot reference output `{output}` declared after its effect")]
    ForwardReference { input: String, output: String },

    #[error("{0} belongs to another graph")]
    ForeignVariable(String),

    #[error("unknown effect {0}")]
    UnknownEffect(EffectId),

    #[error("unknown input variable {0}")]
    UnknownInput(InputId),

    #[error("unknown output variable {0}")]
    UnknownOutput(OutputId),

    #[error("unknown channel `{0}`")]
    UnknownChannel(String),

    #[error("duplicate name `{0}`")]
    DuplicateName(String),

    #[error("position {position} is out of range for {len} effects")]
    Position { position: usize, len: usize },

    #[error("effect {0} is not a composite")]
    NotComposite(EffectId),
}
