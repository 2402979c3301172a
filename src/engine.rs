//! The staged rule engine.
//!
//! A run moves through the stages in fixed order: validate and build the
//! tree, raise the include paths, lower the exclude paths, then apply the
//! sample rules. Every rule application is followed by a fatal-flag check;
//! once fatal, the remaining rules and stages are skipped and the tree is
//! discarded.

use crate::diag::{Diagnostics, ErrorCode};
use crate::node::{NodeId, Tree};
use crate::options::{EditMode, Outcome, Rewrite, Source};
use crate::path::{EndpointPath, KeyPath, NodeKey, PathSpec, Segment};
use crate::rule::{ModifierOutcome, SampleOp};
use crate::status::RetentionStatus;
use crate::value::{prepare_value, RawValue};
use tracing::debug;

/// Processing stage of a run. Monotonic: a stage is never re-entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Validation and tree construction.
    Init,
    /// Include rules are being applied.
    Include,
    /// Exclude rules are being applied.
    Exclude,
    /// Sample rules are being applied.
    Sample,
}

impl Stage {
    /// Move forward to `next`; moving backward is a no-op.
    pub fn advance(&mut self, next: Stage) {
        if next > *self {
            *self = next;
        }
    }
}

pub(crate) fn run(rewrite: Rewrite) -> Outcome {
    let Rewrite {
        source,
        mode,
        include,
        exclude,
        sample,
        indent,
    } = rewrite;
    let mut diag = Diagnostics::new(mode.is_error());
    let mut stage = Stage::Init;

    let raw = match source {
        Source::Value(raw) => raw,
        Source::Json(text) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => RawValue::from(value),
            Err(_) => {
                diag.add_error(ErrorCode::JsonParse, Vec::new());
                diag.set_fatal();
                return Outcome::failed(mode, diag, indent);
            }
        },
    };

    debug!(?stage, strict = mode.is_strict(), "validating input");
    let (invalid_paths, prepared) = prepare_value(&raw, mode.is_error());
    for path in invalid_paths {
        diag.add_error(ErrorCode::InvalidValue, path);
    }
    let Some(prepared) = prepared else {
        diag.set_fatal();
        return Outcome::failed(mode, diag, indent);
    };
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }

    let default_status = if mode.is_strict() {
        RetentionStatus::remove_default()
    } else {
        RetentionStatus::keep_default()
    };
    let mut tree = Tree::build(prepared, default_status);

    // The original aborts list parsing at the first malformed entry in
    // strict mode; over mode parses past it. Value validation above aborts
    // on the error-severity flag instead.
    let include = parse_path_list(include, mode.is_strict(), &mut diag);
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }
    let exclude = parse_path_list(exclude, mode.is_strict(), &mut diag);
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }
    let sample = parse_sample(sample, mode.is_strict(), &mut diag);
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }

    stage.advance(Stage::Include);
    debug!(?stage, rules = include.len(), "applying include rules");
    apply_retention(
        &mut tree,
        &include,
        RetentionStatus::keep_option(),
        stage,
        &mut diag,
    );
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }

    stage.advance(Stage::Exclude);
    debug!(?stage, rules = exclude.len(), "applying exclude rules");
    apply_retention(
        &mut tree,
        &exclude,
        RetentionStatus::remove_option(),
        stage,
        &mut diag,
    );
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }

    stage.advance(Stage::Sample);
    debug!(?stage, rules = sample.len(), "applying sample rules");
    apply_sample(&mut tree, sample, mode, &mut diag);
    if diag.is_fatal() {
        return Outcome::failed(mode, diag, indent);
    }

    Outcome::succeeded(mode, diag, tree, indent)
}

fn raw_segments_to_keys(segments: &[String]) -> Vec<NodeKey> {
    segments.iter().map(NodeKey::key).collect()
}

fn path_to_keys(path: &KeyPath) -> Vec<NodeKey> {
    path.segments()
        .iter()
        .map(|seg| match seg {
            Segment::Key(k) => NodeKey::key(k.clone()),
            Segment::Wildcard => NodeKey::key("*"),
        })
        .collect()
}

fn parse_path_list(
    specs: Vec<PathSpec>,
    abort_on_malformed: bool,
    diag: &mut Diagnostics,
) -> Vec<KeyPath> {
    let mut parsed = Vec::new();
    for spec in specs {
        match spec.resolve() {
            Ok(path) => parsed.push(path),
            Err(err) => {
                diag.add_error(ErrorCode::KeyPath, raw_segments_to_keys(err.segments()));
                if abort_on_malformed {
                    break;
                }
            }
        }
    }
    parsed
}

fn parse_sample(
    entries: Vec<(PathSpec, SampleOp)>,
    abort_on_malformed: bool,
    diag: &mut Diagnostics,
) -> Vec<(KeyPath, SampleOp)> {
    let mut with_paths = Vec::new();
    let mut malformed = Vec::new();
    for (spec, op) in entries {
        match spec.resolve() {
            Ok(path) => with_paths.push((path, op)),
            Err(err) => {
                malformed.push(err);
                if abort_on_malformed {
                    break;
                }
            }
        }
    }
    let had_malformed = !malformed.is_empty();
    for err in malformed {
        diag.add_error(ErrorCode::KeyPath, raw_segments_to_keys(err.segments()));
    }
    if had_malformed && abort_on_malformed {
        return Vec::new();
    }

    let mut rules = Vec::new();
    let mut invalid = Vec::new();
    for (path, op) in with_paths {
        if matches!(op, SampleOp::Invalid) {
            invalid.push(path);
            if abort_on_malformed {
                break;
            }
        } else {
            rules.push((path, op));
        }
    }
    for path in invalid {
        diag.add_error(ErrorCode::ModifierInvalid, path_to_keys(&path));
    }
    rules
}

/// Resolve each path and update the matched nodes' status. A miss is an
/// error only in the include stage: a requested inclusion must exist, while
/// an absent exclusion is already satisfied.
fn apply_retention(
    tree: &mut Tree,
    paths: &[KeyPath],
    status: RetentionStatus,
    stage: Stage,
    diag: &mut Diagnostics,
) {
    for path in paths {
        match tree.find_properties(path) {
            Some(nodes) => {
                for id in nodes {
                    tree.try_update_status(id, status, diag);
                }
            }
            None => {
                if stage == Stage::Include {
                    diag.add_error(ErrorCode::FindPath, path_to_keys(path));
                }
            }
        }
        if diag.is_fatal() {
            return;
        }
    }
}

fn apply_sample(
    tree: &mut Tree,
    rules: Vec<(KeyPath, SampleOp)>,
    mode: EditMode,
    diag: &mut Diagnostics,
) {
    for (path, mut op) in rules {
        match tree.find_properties(&path) {
            None => {
                match &op {
                    // A literal can create the property, but only an
                    // endpoint path can name a new key.
                    SampleOp::Literal(raw) => match path.try_endpoint() {
                        Some(endpoint) => {
                            create_property(tree, tree.root(), &endpoint, raw, mode, diag);
                        }
                        None => diag.add_error(ErrorCode::FindPath, path_to_keys(&path)),
                    },
                    // Deleting an absent property is already satisfied.
                    SampleOp::Flag(false) => {}
                    // A keep or a modifier cannot act on an unknown value.
                    _ => diag.add_error(ErrorCode::FindPath, path_to_keys(&path)),
                }
                if diag.is_fatal() {
                    return;
                }
            }
            Some(nodes) => {
                for id in nodes {
                    apply_sample_to_node(tree, id, &mut op, mode, diag);
                    if diag.is_fatal() {
                        return;
                    }
                }
            }
        }
    }
}

fn apply_sample_to_node(
    tree: &mut Tree,
    id: NodeId,
    op: &mut SampleOp,
    mode: EditMode,
    diag: &mut Diagnostics,
) {
    match op {
        SampleOp::Modifier(handler) => {
            let value = tree.render_from(id, true);
            let key = tree.key(id).clone();
            let node_path = tree.node_path(id);
            match handler(value, &key, &node_path) {
                Ok(ModifierOutcome::Pass) => {}
                Ok(ModifierOutcome::Abort) => {
                    diag.add_error(ErrorCode::Abort, node_path);
                    diag.set_fatal();
                }
                Ok(ModifierOutcome::Remove) => {
                    tree.try_update_status(id, RetentionStatus::remove_sample(), diag);
                }
                Ok(ModifierOutcome::Keep) => {
                    tree.try_update_status(id, RetentionStatus::keep_sample(), diag);
                }
                Ok(ModifierOutcome::Replace(raw)) => {
                    create_property(tree, id, &EndpointPath::root(), &raw, mode, diag);
                }
                Err(err) => {
                    debug!(error = %err, "modifier failed");
                    diag.add_error(ErrorCode::ModifierReturn, node_path);
                }
            }
        }
        SampleOp::Flag(flag) => {
            let status = if *flag {
                RetentionStatus::keep_sample()
            } else {
                RetentionStatus::remove_sample()
            };
            tree.try_update_status(id, status, diag);
        }
        SampleOp::Literal(raw) => {
            let raw = raw.clone();
            create_property(tree, id, &EndpointPath::root(), &raw, mode, diag);
        }
        // Filtered out while the rules were prepared.
        SampleOp::Invalid => {}
    }
}

/// Validate a replacement value and force it onto `path` relative to `id`.
/// Findings are recorded as [`ErrorCode::SetInvalidValue`] errors at the
/// node's path joined with the path inside the replacement.
fn create_property(
    tree: &mut Tree,
    id: NodeId,
    path: &EndpointPath,
    raw: &RawValue,
    mode: EditMode,
    diag: &mut Diagnostics,
) {
    let base = tree.node_path(id);
    let (invalid_paths, prepared) = prepare_value(raw, mode.is_error());
    for relative in invalid_paths {
        let mut full = base.clone();
        full.extend(relative);
        diag.add_error(ErrorCode::SetInvalidValue, full);
    }
    if let Some(prepared) = prepared {
        tree.force_create_property(id, path, prepared, diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_is_monotonic() {
        let mut stage = Stage::Init;
        stage.advance(Stage::Exclude);
        assert_eq!(stage, Stage::Exclude);
        stage.advance(Stage::Include);
        assert_eq!(stage, Stage::Exclude);
        stage.advance(Stage::Sample);
        assert_eq!(stage, Stage::Sample);
    }
}
