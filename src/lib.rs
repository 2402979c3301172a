//! Selective JSON rewriting over a validated value tree.
//!
//! `json-sift` projects and rewrites JSON-compatible documents according to
//! declarative path-based rules: explicit inclusion/exclusion of subtrees,
//! then a final "sample" pass that can keep, delete, or replace individual
//! properties, optionally through a user callback. Its main use is producing
//! trimmed, rewritten copies of configuration-like documents such as package
//! manifests.
//!
//! # Core Concepts
//!
//! - **RawValue**: arbitrary input, validated once into a cycle-free tree
//! - **KeyPath**: dotted selector, `*` matching all children at a position
//! - **RetentionStatus**: per-node keep/remove flag with a priority layer
//!   (`default < option < sample`)
//! - **Rewrite**: the builder — source, mode, rule lists, indent
//! - **Outcome**: rendered value, serialization, mode flags, diagnostics
//!
//! Rules are applied in fixed stage order. Include rules raise matched nodes
//! to KEEP at the option layer (a missing include path is an error). Exclude
//! rules lower matched nodes to REMOVE at the option layer (a missing
//! exclude path is already satisfied). Sample rules run last at the highest
//! layer and may also replace subtrees outright. Nodes are never physically
//! removed while rules run; removal is a status flip and omission happens
//! when the result is rendered.
//!
//! # Quick Start
//!
//! ```
//! use json_sift::{Rewrite, SampleOp};
//! use serde_json::json;
//!
//! let outcome = Rewrite::from_value(json!({
//!     "version": "0.1.0",
//!     "name": "demo",
//!     "scripts": {"test": "jest"}
//! }))
//! .mode("over")
//! .exclude("scripts")
//! .sample("version", SampleOp::literal("0.2.0"))
//! .run();
//!
//! assert!(!outcome.diagnostics().is_fatal());
//! assert_eq!(outcome.to_value(), json!({"version": "0.2.0", "name": "demo"}));
//! ```
//!
//! # Modifiers
//!
//! A sample rule can carry a callback instead of a literal. The callback
//! sees the property's current value and decides what happens to it:
//!
//! ```
//! use json_sift::{ModifierOutcome, Rewrite, SampleOp};
//! use serde_json::json;
//!
//! let outcome = Rewrite::from_value(json!({"main": "./dist/index.js"}))
//!     .mode("over")
//!     .sample(
//!         "main",
//!         SampleOp::modifier(|value, _key, _path| {
//!             let text = value.as_str().unwrap_or_default();
//!             Ok(ModifierOutcome::replace(text.replace("dist/", "")))
//!         }),
//!     )
//!     .run();
//!
//! assert_eq!(outcome.to_value(), json!({"main": "./index.js"}));
//! ```
//!
//! # Error handling
//!
//! A run never panics on bad input: findings are collected as diagnostics
//! with stable [`ErrorCode`]s, split into errors and warnings. Structural
//! failures (unparseable JSON, an unusable root value) are always fatal;
//! with the `"error"` mode flag every error is. A fatal run renders as
//! `null` / an empty string, so check [`Diagnostics::is_fatal`] first.

mod diag;
mod engine;
mod file;
mod node;
mod options;
mod path;
mod rule;
mod status;
mod value;

pub use diag::{Diagnostic, Diagnostics, ErrorCode};
pub use engine::Stage;
pub use file::rewrite_file;
pub use node::{NodeId, Tree};
pub use options::{EditMode, Outcome, Rewrite, DEFAULT_INDENT};
pub use path::{EndpointPath, KeyPath, MalformedPath, NodeKey, PathSpec, Segment};
pub use rule::{ModifierError, ModifierFn, ModifierOutcome, SampleOp};
pub use status::{Layer, RetentionStatus};
pub use value::{
    prepare_value, Prepared, PreparedPayload, Primitive, RawValue, SharedList, SharedStruct,
    ValueKind,
};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
