//! Compiler errors and diagnostics.
//!
//! Expression syntax problems are collected as non-fatal [`Diagnostic`]s and only abort the
//! binding they belong to. Resolution and internal errors are returned as [`CompileError`]
//! and abort the definition being compiled; the driver turns them into diagnostics and moves
//! on to the next declaration of the file.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    Syntax,
    Resolution,
    Internal,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Resolution => "resolution",
            DiagnosticKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<ParseSourceSpan>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Option<ParseSourceSpan>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}: {}", span.start, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// A bound expression could not be parsed. Only fatal in strict mode.
    #[error("{message}")]
    Syntax {
        message: String,
        span: Option<ParseSourceSpan>,
    },

    /// A directive, pipe, query target or template name could not be resolved.
    #[error("{message}")]
    Resolution {
        message: String,
        span: Option<ParseSourceSpan>,
    },

    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn resolution(message: impl Into<String>, span: Option<ParseSourceSpan>) -> Self {
        CompileError::Resolution {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Option<ParseSourceSpan>) -> Self {
        CompileError::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal(message.into())
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CompileError::Syntax { .. } => DiagnosticKind::Syntax,
            CompileError::Resolution { .. } => DiagnosticKind::Resolution,
            CompileError::Internal(_) => DiagnosticKind::Internal,
        }
    }

    pub fn span(&self) -> Option<&ParseSourceSpan> {
        match self {
            CompileError::Syntax { span, .. } | CompileError::Resolution { span, .. } => {
                span.as_ref()
            }
            CompileError::Internal(_) => None,
        }
    }
}

impl From<CompileError> for Diagnostic {
    fn from(err: CompileError) -> Self {
        let kind = err.kind();
        let span = err.span().cloned();
        Diagnostic::new(kind, err.to_string(), span)
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
