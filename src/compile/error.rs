use std::fmt;
use std::sync::Arc;

use crate::program::error::ProgramError;

/// Failure category of a compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    /// Malformed program text or a builtin called with the wrong arity.
    Syntax,
    /// Unknown variable, function or module.
    MissingType,
    /// Construction parameters do not match the program.
    Instantiation,
    /// A name used outside the sections that can see it.
    Access,
    /// Too many channels, parameters or variables.
    Resource,
    /// Field initialization failed.
    Construction,
}

impl CompileErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Syntax => "syntax error",
            Self::MissingType => "missing type",
            Self::Instantiation => "instantiation failure",
            Self::Access => "access failure",
            Self::Resource => "resource failure",
            Self::Construction => "construction failure",
        }
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A synthesized program that did not become a renderer.
///
/// Carries the full generated source so listeners can show what was compiled.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind} in `{generator}`: {message}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Display name of the container the source was generated from.
    pub generator: String,
    pub generated_source: Arc<str>,
    pub message: String,
    /// Location and context of the failure, when known.
    pub explanation: String,
}

impl CompileError {
    pub(crate) fn from_program(
        err: ProgramError,
        generator: impl Into<String>,
        source: Arc<str>,
    ) -> Self {
        let explanation = err.explain(&source);
        Self {
            kind: err.kind,
            generator: generator.into(),
            generated_source: source,
            message: err.message,
            explanation,
        }
    }
}
