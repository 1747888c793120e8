//! Error and diagnostic types for reading report designs.
//!
//! Structural problems (malformed XML, unexpected end of input) abort the
//! parse and surface as [`ParseError`]. Semantic problems with individual
//! records are collected as [`Diagnostic`]s and the parse carries on.

use std::fmt;
use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::core::ElementId;
use crate::xml::deserialize::DeserializeError;

/// Top-level error returned by the design entry points.
#[derive(Debug, Error)]
pub enum ParseError {
    /// IO error occurred while reading the file.
    #[error("IO error reading file: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be read as a design.
    #[error("XML parsing error{context}: {source}")]
    Xml {
        source: DeserializeError,
        context: ErrorContext,
    },
}

/// A non-fatal problem found in an otherwise readable design.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// An id or base id that is not a positive base-10 integer.
    #[error("invalid element id '{value}' on {element}")]
    InvalidElementId { element: String, value: String },

    /// An id already held by a different element.
    #[error("element id {id} of {requester} is already used by {owner}")]
    DuplicateElementId {
        id: ElementId,
        owner: String,
        requester: String,
    },

    /// An overridden value whose base id matches no virtual child.
    #[error("no virtual element with base id {base_id} under {owner}")]
    VirtualParentNotFound { owner: String, base_id: String },

    /// An `extends` reference naming a template that never appears.
    #[error("{element} extends '{reference}', which is not defined in this design")]
    UnresolvedExtends { element: String, reference: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A reported semantic error or warning with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: SemanticError,
    pub context: ErrorContext,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.severity, self.context, self.error)
    }
}

/// Context information for error reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The file path where the error occurred (if available).
    pub file_path: Option<PathBuf>,
    /// Byte offset into the document (if available).
    pub position: Option<usize>,
    /// Additional context about what was being parsed.
    pub parsing: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error context with file path.
    pub fn with_file_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Create an error context with a byte position.
    pub fn with_position(position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Add parsing context information.
    pub fn with_parsing<S: Into<String>>(mut self, parsing: S) -> Self {
        self.parsing = Some(parsing.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(ref path) = self.file_path {
            parts.push(format!(" in file '{}'", path.display()));
        }

        if let Some(position) = self.position {
            parts.push(format!(" at byte {}", position));
        }

        if let Some(ref parsing) = self.parsing {
            parts.push(format!(" while parsing {}", parsing));
        }

        if parts.is_empty() {
            return Ok(());
        }

        write!(f, "{}", parts.join(","))
    }
}

/// Collects semantic diagnostics in the order they are reported.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn semantic_error(&mut self, error: SemanticError, context: ErrorContext) {
        self.push(Severity::Error, error, context);
    }

    pub fn semantic_warning(&mut self, error: SemanticError, context: ErrorContext) {
        self.push(Severity::Warning, error, context);
    }

    fn push(&mut self, severity: Severity, error: SemanticError, context: ErrorContext) {
        let diagnostic = Diagnostic {
            severity,
            error,
            context,
        };
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every diagnostic as a numbered list.
    pub fn summary(&self) -> String {
        self.diagnostics
            .iter()
            .enumerate()
            .map(|(idx, diagnostic)| format!("  {}. {}", idx + 1, diagnostic))
            .join("\n")
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
