use crate::foundation::core::ValueType;
use crate::graph::error::GraphError;

/// Failures while linearizing an effect graph into program source.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    /// An input reads an output that has not been emitted yet.
    #[error("effect `{effect}`: input `{input}` is bound to a variable that is not in scope")]
    Unresolved { effect: String, input: String },

    /// A channel is routed to a source that cannot be stored as a float.
    #[error("channel `{channel}` cannot hold a value of type {found}")]
    ChannelType { channel: String, found: ValueType },

    /// A generator asked for an input or output index it does not declare.
    #[error("effect `{effect}` has no {what} #{index}")]
    Index {
        effect: String,
        what: &'static str,
        index: usize,
    },

    /// A generator rejected its configuration.
    #[error("effect `{effect}`: {message}")]
    Generator { effect: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SynthError {
    pub fn generator(effect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generator {
            effect: effect.into(),
            message: message.into(),
        }
    }
}
