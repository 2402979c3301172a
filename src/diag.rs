//! Diagnostics collected over a rewrite run.
//!
//! Findings carry a stable [`ErrorCode`] rather than being distinct error
//! types: callers match on codes, and the same code can surface as an error
//! or as a warning depending on where it was raised. The fatal flag halts
//! all further processing and voids the output.

use crate::path::{format_node_path, NodeKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable diagnostic codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The JSON source text could not be parsed.
    JsonParse,
    /// A key path string is malformed.
    KeyPath,
    /// An input value has no JSON representation.
    InvalidValue,
    /// A replacement value produced by a rewrite has no JSON representation.
    SetInvalidValue,
    /// A requested path does not exist in the target.
    FindPath,
    /// A sample operation was built from an unusable payload.
    ModifierInvalid,
    /// A modifier returned an unusable value or the call itself failed.
    ModifierReturn,
    /// A retention status update was rejected. Defensive; recorded as a
    /// warning and not expected to occur in correct operation.
    UpdateStatus,
    /// A rewrite changed a node's structural kind. Informational.
    UpdateType,
    /// A user modifier requested termination.
    Abort,
    /// The source file could not be read.
    ReadError,
    /// The destination file could not be written.
    WriteError,
}

impl ErrorCode {
    /// The stable string form of this code.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::JsonParse => "json_parse",
            ErrorCode::KeyPath => "key_path",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::SetInvalidValue => "set_invalid_value",
            ErrorCode::FindPath => "find_path",
            ErrorCode::ModifierInvalid => "modifier_invalid",
            ErrorCode::ModifierReturn => "modifier_return",
            ErrorCode::UpdateStatus => "update_status",
            ErrorCode::UpdateType => "update_type",
            ErrorCode::Abort => "abort",
            ErrorCode::ReadError => "read_error",
            ErrorCode::WriteError => "write_error",
        }
    }

    /// The canonical message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::JsonParse => "failed to parse JSON input",
            ErrorCode::KeyPath => "malformed key path",
            ErrorCode::InvalidValue => {
                "property values must be JSON-representable: null, boolean, number, string, list or struct"
            }
            ErrorCode::SetInvalidValue => {
                "replacement values must be JSON-representable: null, boolean, number, string, list or struct"
            }
            ErrorCode::FindPath => "the target has no property at this path",
            ErrorCode::ModifierInvalid => "invalid sample operation",
            ErrorCode::ModifierReturn => "modifier returned an unusable value or failed",
            ErrorCode::UpdateStatus => "retention status update was rejected",
            ErrorCode::UpdateType => "value changed its structural kind",
            ErrorCode::Abort => "processing aborted by a user modifier",
            ErrorCode::ReadError => "failed to read source file",
            ErrorCode::WriteError => "failed to write destination file",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded finding: code, path of the offending property, message.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{code} at {}: {message}", format_node_path(.path))]
pub struct Diagnostic {
    /// The stable code.
    pub code: ErrorCode,
    /// Path to the property that raised the finding. Empty when the finding
    /// has no location (e.g. a JSON parse failure).
    pub path: Vec<NodeKey>,
    /// The canonical message for the code.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with the canonical message for `code`.
    pub fn new(code: ErrorCode, path: Vec<NodeKey>) -> Self {
        Self {
            code,
            path,
            message: code.message().to_owned(),
        }
    }
}

/// Ordered errors and warnings of a run, plus the fatal flag.
///
/// Warnings never stop processing; whether an error also sets the fatal flag
/// depends on the configured severity mode. Callers must check
/// [`Diagnostics::is_fatal`] before trusting the rendered output.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    fatal: bool,
    error_is_fatal: bool,
}

impl Diagnostics {
    pub(crate) fn new(error_is_fatal: bool) -> Self {
        Self {
            error_is_fatal,
            ..Self::default()
        }
    }

    /// All recorded errors, in the order they were raised.
    #[inline]
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// All recorded warnings, in the order they were raised.
    #[inline]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Whether processing was halted.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Whether any error with `code` was recorded.
    pub fn has_error_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|d| d.code == code)
    }

    /// Whether any warning with `code` was recorded.
    pub fn has_warning_code(&self, code: ErrorCode) -> bool {
        self.warnings.iter().any(|d| d.code == code)
    }

    /// Whether `code` was recorded as either an error or a warning.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.has_error_code(code) || self.has_warning_code(code)
    }

    pub(crate) fn add_error(&mut self, code: ErrorCode, path: Vec<NodeKey>) {
        tracing::debug!(code = code.as_str(), path = %format_node_path(&path), "error recorded");
        self.errors.push(Diagnostic::new(code, path));
        if self.error_is_fatal {
            self.fatal = true;
        }
    }

    pub(crate) fn add_warning(&mut self, code: ErrorCode, path: Vec<NodeKey>) {
        tracing::warn!(code = code.as_str(), path = %format_node_path(&path), "warning recorded");
        self.warnings.push(Diagnostic::new(code, path));
    }

    pub(crate) fn set_fatal(&mut self) {
        self.fatal = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sets_fatal_only_in_error_mode() {
        let mut diag = Diagnostics::new(false);
        diag.add_error(ErrorCode::FindPath, vec![NodeKey::key("foo")]);
        assert!(!diag.is_fatal());
        assert_eq!(diag.errors().len(), 1);

        let mut diag = Diagnostics::new(true);
        diag.add_error(ErrorCode::FindPath, vec![NodeKey::key("foo")]);
        assert!(diag.is_fatal());
    }

    #[test]
    fn test_warnings_never_fatal() {
        let mut diag = Diagnostics::new(true);
        diag.add_warning(ErrorCode::UpdateType, vec![NodeKey::key("box")]);
        assert!(!diag.is_fatal());
        assert!(diag.has_warning_code(ErrorCode::UpdateType));
        assert!(!diag.has_error_code(ErrorCode::UpdateType));
        assert!(diag.has_code(ErrorCode::UpdateType));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(
            ErrorCode::FindPath,
            vec![NodeKey::key("foo"), NodeKey::key("bar")],
        );
        let text = d.to_string();
        assert!(text.contains("find_path"));
        assert!(text.contains("foo.bar"));
    }

    #[test]
    fn test_empty_path_displays_root() {
        let d = Diagnostic::new(ErrorCode::JsonParse, vec![]);
        assert!(d.to_string().contains("at $"));
    }
}
