//! The rewrite entry point: processing mode, rule lists, and the result
//! object.

use crate::diag::Diagnostics;
use crate::engine;
use crate::node::Tree;
use crate::path::PathSpec;
use crate::rule::SampleOp;
use crate::value::RawValue;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

/// Default indentation width for textual rendering.
pub const DEFAULT_INDENT: usize = 2;

/// Processing mode: default retention polarity plus error severity.
///
/// Parsed from a mode string by case-insensitive substring match, so all of
/// `"over_error"`, `"overError"` and `"errorover"` select the same flags.
/// Without `"over"` the mode is strict: every property starts marked for
/// removal and must be opted in through the rules. With the error flag any
/// recorded error becomes fatal at the point it is detected.
///
/// # Examples
///
/// ```
/// use json_sift::EditMode;
///
/// let mode = EditMode::parse("over_error");
/// assert!(mode.is_over());
/// assert!(mode.is_error());
/// assert!(!mode.is_strict());
///
/// assert_eq!(EditMode::default(), EditMode::strict());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMode {
    over: bool,
    error: bool,
}

impl EditMode {
    /// Strict mode: default-remove, errors collected.
    #[inline]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Over mode: default-keep, errors collected.
    #[inline]
    pub fn over() -> Self {
        Self {
            over: true,
            error: false,
        }
    }

    /// Add the error-severity flag: any error halts the run.
    #[inline]
    pub fn with_error(self) -> Self {
        Self {
            error: true,
            ..self
        }
    }

    /// Parse a mode string.
    pub fn parse(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        Self {
            over: lower.contains("over"),
            error: lower.contains("error"),
        }
    }

    /// Whether properties default to removal (no `"over"` in the mode).
    #[inline]
    pub fn is_strict(&self) -> bool {
        !self.over
    }

    /// Whether properties default to being kept.
    #[inline]
    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Whether any error is fatal.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }
}

impl From<&str> for EditMode {
    fn from(text: &str) -> Self {
        EditMode::parse(text)
    }
}

pub(crate) enum Source {
    Value(RawValue),
    Json(String),
}

/// A configured rewrite, built up and then executed with [`Rewrite::run`].
///
/// Include rules are applied first (a missing include path is an error),
/// exclude rules second (a missing exclude path is already satisfied), and
/// sample rules last with the highest priority.
///
/// # Examples
///
/// ```
/// use json_sift::{Rewrite, SampleOp};
/// use serde_json::json;
///
/// let outcome = Rewrite::from_value(json!({
///     "version": "0.1.0",
///     "scripts": {"test": "x"}
/// }))
/// .mode("over")
/// .exclude("scripts")
/// .sample("version", SampleOp::literal("0.2.0"))
/// .run();
///
/// assert!(!outcome.diagnostics().is_fatal());
/// assert_eq!(outcome.to_value(), json!({"version": "0.2.0"}));
/// ```
pub struct Rewrite {
    pub(crate) source: Source,
    pub(crate) mode: EditMode,
    pub(crate) include: Vec<PathSpec>,
    pub(crate) exclude: Vec<PathSpec>,
    pub(crate) sample: Vec<(PathSpec, SampleOp)>,
    pub(crate) indent: usize,
}

impl Rewrite {
    fn new(source: Source) -> Self {
        Self {
            source,
            mode: EditMode::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            sample: Vec::new(),
            indent: DEFAULT_INDENT,
        }
    }

    /// Rewrite an already-parsed value.
    pub fn from_value(value: impl Into<RawValue>) -> Self {
        Self::new(Source::Value(value.into()))
    }

    /// Rewrite a JSON text blob. A parse failure surfaces as a fatal
    /// [`JsonParse`] error with an empty path.
    ///
    /// [`JsonParse`]: crate::ErrorCode::JsonParse
    pub fn from_json(text: impl Into<String>) -> Self {
        Self::new(Source::Json(text.into()))
    }

    /// Set the processing mode (an [`EditMode`] or a mode string).
    pub fn mode(mut self, mode: impl Into<EditMode>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Add a path to include explicitly. Applied in insertion order.
    pub fn include(mut self, path: impl Into<PathSpec>) -> Self {
        self.include.push(path.into());
        self
    }

    /// Add a path to exclude explicitly. Applied in insertion order.
    pub fn exclude(mut self, path: impl Into<PathSpec>) -> Self {
        self.exclude.push(path.into());
        self
    }

    /// Add a sample rule. Rules are applied last, in insertion order, and
    /// carry the highest priority.
    pub fn sample(mut self, path: impl Into<PathSpec>, op: SampleOp) -> Self {
        self.sample.push((path.into(), op));
        self
    }

    /// Indentation width for [`Outcome::to_json`]; 0 renders compact.
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    /// Execute the rewrite.
    pub fn run(self) -> Outcome {
        engine::run(self)
    }

    pub(crate) fn with_json_source(mut self, text: String) -> Self {
        self.source = Source::Json(text);
        self
    }
}

/// The result of a rewrite run.
///
/// Check [`Diagnostics::is_fatal`] before trusting the rendered output: a
/// fatal run discards the tree and renders as `null` / an empty string.
pub struct Outcome {
    mode: EditMode,
    diag: Diagnostics,
    tree: Option<Tree>,
    indent: usize,
}

impl Outcome {
    pub(crate) fn failed(mode: EditMode, diag: Diagnostics, indent: usize) -> Self {
        Self {
            mode,
            diag,
            tree: None,
            indent,
        }
    }

    pub(crate) fn succeeded(mode: EditMode, diag: Diagnostics, tree: Tree, indent: usize) -> Self {
        Self {
            mode,
            diag,
            tree: Some(tree),
            indent,
        }
    }

    /// The effective mode flags of the run.
    #[inline]
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// The diagnostics collected over the run.
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diag
    }

    /// Render the result value, honoring per-node retention.
    ///
    /// Rendering is read-only: calling this twice yields identical values.
    /// Returns `Value::Null` when the run was fatal.
    pub fn to_value(&self) -> Value {
        match &self.tree {
            Some(tree) if !self.diag.is_fatal() => tree.to_value(),
            _ => Value::Null,
        }
    }

    /// Serialize the result value.
    ///
    /// Indented output (the default) ends with a trailing newline; an indent
    /// width of 0 renders compact with no trailing newline. Returns an empty
    /// string when the run was fatal.
    pub fn to_json(&self) -> String {
        if self.diag.is_fatal() || self.tree.is_none() {
            return String::new();
        }
        let value = self.to_value();
        if self.indent == 0 {
            return value.to_string();
        }
        let indent = vec![b' '; self.indent];
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        if Serialize::serialize(&value, &mut ser).is_err() {
            return String::new();
        }
        let mut text = String::from_utf8(buf).unwrap_or_default();
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_parse_variants() {
        for text in ["over", "overerror", "over_error", "overError", "errorover", "error_over"] {
            assert!(EditMode::parse(text).is_over(), "{text}");
        }
        for text in ["error", "stricterror", "strict_error", "errorstrict"] {
            let mode = EditMode::parse(text);
            assert!(mode.is_strict(), "{text}");
            assert!(mode.is_error(), "{text}");
        }
        let mode = EditMode::parse("strict");
        assert!(mode.is_strict());
        assert!(!mode.is_error());
    }

    #[test]
    fn test_mode_constructors() {
        assert_eq!(EditMode::parse("over_error"), EditMode::over().with_error());
        assert_eq!(EditMode::parse("error"), EditMode::strict().with_error());
    }

    #[test]
    fn test_to_json_indentation() {
        let outcome = Rewrite::from_value(json!({"a": 1})).mode("over").run();
        assert_eq!(outcome.to_json(), "{\n  \"a\": 1\n}\n");

        let outcome = Rewrite::from_value(json!({"a": 1}))
            .mode("over")
            .indent(0)
            .run();
        assert_eq!(outcome.to_json(), "{\"a\":1}");

        let outcome = Rewrite::from_value(json!({"a": 1}))
            .mode("over")
            .indent(4)
            .run();
        assert_eq!(outcome.to_json(), "{\n    \"a\": 1\n}\n");
    }

    #[test]
    fn test_fatal_outcome_is_empty() {
        let outcome = Rewrite::from_json("]").run();
        assert!(outcome.diagnostics().is_fatal());
        assert_eq!(outcome.to_value(), json!(null));
        assert_eq!(outcome.to_json(), "");
    }
}
