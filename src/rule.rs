//! Sample operations: the right-hand side of a `(path, operation)` rule.
//!
//! An operation is a closed variant rather than a runtime-marker check: a
//! literal replacement value, a keep/delete flag, a user modifier callback,
//! or the explicit `Invalid` state for a wrapper built from an unusable
//! payload.

use crate::path::NodeKey;
use crate::value::RawValue;
use serde_json::Value;
use std::fmt;

/// Error type a modifier callback may return.
///
/// A failing callback never unwinds through the engine; its error is
/// captured and recorded as an [`ErrorCode::ModifierReturn`] diagnostic.
///
/// [`ErrorCode::ModifierReturn`]: crate::ErrorCode::ModifierReturn
pub type ModifierError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a modifier decided for the visited property.
#[derive(Debug)]
pub enum ModifierOutcome {
    /// Leave the property as it is; current retention settings apply.
    Pass,
    /// Stop all processing with a fatal [`Abort`] error.
    ///
    /// [`Abort`]: crate::ErrorCode::Abort
    Abort,
    /// Remove the property (REMOVE at the sample layer).
    Remove,
    /// Keep the property (KEEP at the sample layer).
    Keep,
    /// Replace the property's value. The replacement is validated the same
    /// way as input, but findings are recorded as errors.
    Replace(RawValue),
}

impl ModifierOutcome {
    /// Create a replacement outcome.
    #[inline]
    pub fn replace(value: impl Into<RawValue>) -> Self {
        ModifierOutcome::Replace(value.into())
    }
}

/// A user modifier callback.
///
/// Invoked with the property's current value (rendered regardless of
/// retention status), its key ([`NodeKey::Root`] when the rule addressed the
/// root), and its full path from the root.
pub type ModifierFn =
    Box<dyn FnMut(Value, &NodeKey, &[NodeKey]) -> Result<ModifierOutcome, ModifierError>>;

/// The operation half of a sample rule.
///
/// # Examples
///
/// ```
/// use json_sift::{ModifierOutcome, SampleOp};
///
/// let _replace = SampleOp::literal("0.2.0");
/// let _keep = SampleOp::keep();
/// let _delete = SampleOp::delete();
/// let _bump = SampleOp::modifier(|value, _key, _path| {
///     let text = value.as_str().unwrap_or_default();
///     Ok(ModifierOutcome::replace(text.replace("dist/", "")))
/// });
/// ```
pub enum SampleOp {
    /// Replace the property with this value (or create it, if the path is
    /// an endpoint path and the property is missing).
    Literal(RawValue),
    /// `true` keeps the property, `false` deletes it. Deleting an absent
    /// property is not an error.
    Flag(bool),
    /// Invoke a callback with the property's current value.
    Modifier(ModifierFn),
    /// A wrapper constructed from an unusable payload. Recorded as an
    /// [`ErrorCode::ModifierInvalid`] error when the rules are prepared.
    ///
    /// [`ErrorCode::ModifierInvalid`]: crate::ErrorCode::ModifierInvalid
    Invalid,
}

impl SampleOp {
    /// A literal replacement value.
    #[inline]
    pub fn literal(value: impl Into<RawValue>) -> Self {
        SampleOp::Literal(value.into())
    }

    /// Keep the property.
    #[inline]
    pub fn keep() -> Self {
        SampleOp::Flag(true)
    }

    /// Delete the property.
    #[inline]
    pub fn delete() -> Self {
        SampleOp::Flag(false)
    }

    /// Wrap a modifier callback.
    pub fn modifier<F>(f: F) -> Self
    where
        F: FnMut(Value, &NodeKey, &[NodeKey]) -> Result<ModifierOutcome, ModifierError> + 'static,
    {
        SampleOp::Modifier(Box::new(f))
    }

    /// The explicit invalid wrapper.
    #[inline]
    pub fn invalid() -> Self {
        SampleOp::Invalid
    }

    /// The operation name, for logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            SampleOp::Literal(_) => "literal",
            SampleOp::Flag(true) => "keep",
            SampleOp::Flag(false) => "delete",
            SampleOp::Modifier(_) => "modifier",
            SampleOp::Invalid => "invalid",
        }
    }
}

impl fmt::Debug for SampleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleOp::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            SampleOp::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            SampleOp::Modifier(_) => f.write_str("Modifier(..)"),
            SampleOp::Invalid => f.write_str("Invalid"),
        }
    }
}
