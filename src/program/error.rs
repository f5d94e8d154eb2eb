use std::fmt;

use crate::compile::error::CompileErrorKind;

/// Failure while lexing, parsing, resolving or instantiating a pixel program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProgramError {
    pub(crate) kind: CompileErrorKind,
    /// Byte offset into the source, when the failure has a location.
    pub(crate) offset: Option<usize>,
    pub(crate) message: String,
}

impl ProgramError {
    pub(crate) fn new(kind: CompileErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::Syntax, offset, message)
    }

    pub(crate) fn unlocated(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset: None,
            message: message.into(),
        }
    }

    /// `line:col` header plus the offending line and a caret, for error explanations.
    pub(crate) fn explain(&self, src: &str) -> String {
        let Some(offset) = self.offset else {
            return self.message.clone();
        };
        let offset = offset.min(src.len());
        let line_start = src[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = src[offset..].find('\n').map_or(src.len(), |i| offset + i);
        let line_no = src[..offset].matches('\n').count() + 1;
        let col = src[line_start..offset].chars().count() + 1;
        let caret = " ".repeat(col - 1);
        format!(
            "{line_no}:{col}: {}\n{}\n{caret}^",
            self.message,
            &src[line_start..line_end]
        )
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at byte {}: {}", self.kind, offset, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProgramError {}

/// Failure while executing program code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VmError {
    pub(crate) message: String,
}

impl VmError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm error: {}", self.message)
    }
}

impl std::error::Error for VmError {}
