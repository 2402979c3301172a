//! Path expressions for addressing properties in the value tree.
//!
//! A path is a dotted key sequence like `"foo.bar"`. A segment that is
//! exactly `*` matches all children at that position; the empty string
//! addresses the root. Paths with no wildcard anywhere are *endpoint* paths,
//! the only kind that can name a property to create.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single segment of a [`KeyPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Match the child with exactly this key.
    Key(String),
    /// Match all children at this position.
    Wildcard,
}

impl Segment {
    /// Create a literal key segment. `"*"` and `"."` are taken verbatim.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    /// Create a wildcard segment.
    #[inline]
    pub fn wildcard() -> Self {
        Segment::Wildcard
    }

    /// Returns true if this is the wildcard segment.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }

    /// Get the key if this is a literal segment.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Wildcard => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_owned())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Wildcard => write!(f, "*"),
        }
    }
}

/// A malformed path string.
///
/// Carries the raw split segments so diagnostics can report the offending
/// input as a path.
#[derive(Clone, Debug, Error)]
#[error("malformed key path: {text:?}")]
pub struct MalformedPath {
    text: String,
    segments: Vec<String>,
}

impl MalformedPath {
    /// The original path text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The raw split segments, including the empty/offending ones.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// A parsed path expression over the value tree.
///
/// # Examples
///
/// ```
/// use json_sift::KeyPath;
///
/// let path = KeyPath::parse("foo.*.bar").unwrap();
/// assert!(!path.is_endpoint());
/// assert_eq!(path.to_string(), "foo.*.bar");
///
/// // The empty string addresses the root.
/// assert!(KeyPath::parse("").unwrap().is_root());
///
/// // Consecutive separators and wildcard runs are rejected.
/// assert!(KeyPath::parse("foo..bar").is_err());
/// assert!(KeyPath::parse("foo.**.bar").is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// The empty path (the root itself).
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path string.
    ///
    /// `""` parses to the root path. Rejected as malformed: an empty
    /// intermediate segment (consecutive separators), a leading or trailing
    /// separator, and any segment containing a run of two or more `*`.
    /// Only a segment that is exactly `*` is a wildcard; `"a*b"` is a
    /// literal key.
    pub fn parse(text: &str) -> Result<Self, MalformedPath> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let raw: Vec<&str> = text.split('.').collect();
        if raw.iter().any(|s| s.is_empty() || s.contains("**")) {
            return Err(MalformedPath {
                text: text.to_owned(),
                segments: raw.into_iter().map(str::to_owned).collect(),
            });
        }
        let segments = raw
            .into_iter()
            .map(|s| {
                if s == "*" {
                    Segment::Wildcard
                } else {
                    Segment::Key(s.to_owned())
                }
            })
            .collect();
        Ok(Self { segments })
    }

    /// Build a path from pre-split segments, used verbatim.
    #[inline]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Build a path of literal keys, bypassing the string parser.
    ///
    /// Every entry is taken as a literal key, so `.` and `*` can be real
    /// property names here. Wildcards in pre-split form must be spelled
    /// explicitly with [`Segment::Wildcard`] via [`KeyPath::from_segments`].
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            segments: keys.into_iter().map(|k| Segment::Key(k.into())).collect(),
        }
    }

    /// The segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Consume the path and return its segments.
    #[inline]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Whether this is the empty (root) path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path is empty (alias of [`KeyPath::is_root`]).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the first segment is a wildcard.
    #[inline]
    pub fn is_wildcard_first(&self) -> bool {
        matches!(self.segments.first(), Some(Segment::Wildcard))
    }

    /// Whether no segment anywhere is a wildcard.
    ///
    /// Only endpoint paths can name a property to create: a wildcard cannot
    /// name a new key.
    #[inline]
    pub fn is_endpoint(&self) -> bool {
        !self.segments.iter().any(Segment::is_wildcard)
    }

    /// Split into the first segment and the remainder.
    ///
    /// Returns `None` once the path is exhausted (the path addresses "this
    /// node").
    #[inline]
    pub fn first_split(&self) -> Option<(&Segment, &[Segment])> {
        self.segments.split_first()
    }

    /// Reinterpret as an endpoint path, if no segment is a wildcard.
    pub fn try_endpoint(&self) -> Option<EndpointPath> {
        if self.is_endpoint() {
            Some(EndpointPath {
                path: self.clone(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromIterator<Segment> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

/// A [`KeyPath`] proven to contain no wildcard segment.
///
/// Produced by [`KeyPath::try_endpoint`]; the type guarantees every segment
/// names exactly one key, so the path is safe to use for property creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointPath {
    path: KeyPath,
}

impl EndpointPath {
    /// The empty endpoint path ("this node").
    #[inline]
    pub fn root() -> Self {
        Self {
            path: KeyPath::root(),
        }
    }

    /// The underlying path.
    #[inline]
    pub fn as_path(&self) -> &KeyPath {
        &self.path
    }

    /// The literal keys of this path, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        // Wildcards are excluded by construction.
        self.path.segments().iter().filter_map(Segment::as_key)
    }
}

/// An unparsed path as accepted by the rewrite options.
///
/// Text forms go through [`KeyPath::parse`] when the rewrite runs, so a
/// malformed string is reported as a diagnostic rather than a panic.
/// Pre-split forms bypass the parser entirely.
#[derive(Clone, Debug)]
pub enum PathSpec {
    /// A dotted path string, parsed at run time.
    Text(String),
    /// Pre-split segments, used verbatim.
    Segments(Vec<Segment>),
}

impl PathSpec {
    /// Resolve to a parsed [`KeyPath`].
    pub fn resolve(&self) -> Result<KeyPath, MalformedPath> {
        match self {
            PathSpec::Text(text) => KeyPath::parse(text),
            PathSpec::Segments(segments) => Ok(KeyPath::from_segments(segments.clone())),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(s: &str) -> Self {
        PathSpec::Text(s.to_owned())
    }
}

impl From<String> for PathSpec {
    fn from(s: String) -> Self {
        PathSpec::Text(s)
    }
}

impl From<KeyPath> for PathSpec {
    fn from(p: KeyPath) -> Self {
        PathSpec::Segments(p.into_segments())
    }
}

impl From<Vec<Segment>> for PathSpec {
    fn from(segments: Vec<Segment>) -> Self {
        PathSpec::Segments(segments)
    }
}

impl From<Vec<String>> for PathSpec {
    fn from(keys: Vec<String>) -> Self {
        PathSpec::Segments(keys.into_iter().map(Segment::Key).collect())
    }
}

impl From<Vec<&str>> for PathSpec {
    fn from(keys: Vec<&str>) -> Self {
        PathSpec::Segments(keys.into_iter().map(Segment::from).collect())
    }
}

/// Key of a node within the tree: the root marker, a struct key, or a list
/// index.
///
/// Indices are assigned when the tree is built and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKey {
    /// The root of the tree. Distinct from every legal key.
    Root,
    /// A struct property name.
    Key(String),
    /// A list element index.
    Index(usize),
}

impl NodeKey {
    /// Create a struct key.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        NodeKey::Key(k.into())
    }

    /// Create a list index.
    #[inline]
    pub fn index(i: usize) -> Self {
        NodeKey::Index(i)
    }

    /// Get the key if this is a struct key.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            NodeKey::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Get the index if this is a list index.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            NodeKey::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns true for the root marker.
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, NodeKey::Root)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Root => write!(f, "$"),
            NodeKey::Key(k) => write!(f, "{}", k),
            NodeKey::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey::Key(s.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey::Key(s)
    }
}

impl From<usize> for NodeKey {
    fn from(i: usize) -> Self {
        NodeKey::Index(i)
    }
}

/// Render a node path for display: `foo.bar[2].baz`, or `$` for the root.
pub(crate) fn format_node_path(path: &[NodeKey]) -> String {
    if path.is_empty() {
        return "$".to_owned();
    }
    let mut out = String::new();
    for key in path {
        match key {
            NodeKey::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            NodeKey::Index(i) => {
                out.push_str(&format!("[{}]", i));
            }
            NodeKey::Root => {}
        }
    }
    out
}

/// Construct a [`KeyPath`] of literal keys.
///
/// # Examples
///
/// ```
/// use json_sift::{keys, KeyPath};
///
/// let p = keys!["exports", "."];
/// assert_eq!(p.segments().len(), 2);
/// assert!(p.is_endpoint());
/// assert_eq!(keys![], KeyPath::root());
/// ```
#[macro_export]
macro_rules! keys {
    () => {
        $crate::KeyPath::root()
    };
    ($($k:expr),+ $(,)?) => {
        $crate::KeyPath::from_keys(vec![$($k.to_string()),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        assert_eq!(KeyPath::parse("").unwrap(), KeyPath::root());
        assert_eq!(
            KeyPath::parse("*").unwrap().segments(),
            &[Segment::Wildcard]
        );
        assert_eq!(
            KeyPath::parse("foo").unwrap().segments(),
            &[Segment::key("foo")]
        );
        assert_eq!(
            KeyPath::parse("foo.bar").unwrap().segments(),
            &[Segment::key("foo"), Segment::key("bar")]
        );
        assert_eq!(
            KeyPath::parse("foo.*.bar").unwrap().segments(),
            &[Segment::key("foo"), Segment::Wildcard, Segment::key("bar")]
        );
        assert_eq!(KeyPath::parse("foo.*.*.bar.*").unwrap().len(), 5);
        assert!(KeyPath::parse("*").unwrap().is_wildcard_first());
        assert!(!KeyPath::parse("foo.*").unwrap().is_wildcard_first());
    }

    #[test]
    fn test_parse_malformed() {
        let err = KeyPath::parse(".foo..bar").unwrap_err();
        assert_eq!(err.segments(), &["", "foo", "", "bar"]);
        assert!(KeyPath::parse("foo.bar.").is_err());
        assert!(KeyPath::parse("**").is_err());
        assert!(KeyPath::parse("foo.**.bar").is_err());
        assert!(KeyPath::parse("foo.a**b").is_err());
    }

    #[test]
    fn test_single_star_inside_name_is_literal() {
        let path = KeyPath::parse("a*b").unwrap();
        assert_eq!(path.segments(), &[Segment::key("a*b")]);
        assert!(path.is_endpoint());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["", "foo", "foo.bar", "foo.*.bar", "a*b.c", " .x"] {
            let path = KeyPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
            assert_eq!(KeyPath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_first_split() {
        let path = KeyPath::parse("foo.bar").unwrap();
        let (first, rest) = path.first_split().unwrap();
        assert_eq!(first, &Segment::key("foo"));
        assert_eq!(rest, &[Segment::key("bar")]);
        assert!(KeyPath::root().first_split().is_none());
    }

    #[test]
    fn test_endpoint() {
        assert!(KeyPath::parse("foo.bar").unwrap().try_endpoint().is_some());
        assert!(KeyPath::parse("foo.*").unwrap().try_endpoint().is_none());
        assert!(KeyPath::root().try_endpoint().is_some());
    }

    #[test]
    fn test_from_keys_is_literal() {
        let path = KeyPath::from_keys(["exports", "*", "."]);
        assert!(path.is_endpoint());
        assert_eq!(
            path.segments(),
            &[Segment::key("exports"), Segment::key("*"), Segment::key(".")]
        );
    }

    #[test]
    fn test_path_spec_resolution() {
        let spec = PathSpec::from("foo.*");
        assert!(!spec.resolve().unwrap().is_endpoint());
        let spec = PathSpec::from(vec!["foo", "*"]);
        assert!(spec.resolve().unwrap().is_endpoint());
        let spec = PathSpec::from(vec![Segment::key("foo"), Segment::Wildcard]);
        assert!(!spec.resolve().unwrap().is_endpoint());
        assert!(PathSpec::from("a..b").resolve().is_err());
    }

    #[test]
    fn test_format_node_path() {
        assert_eq!(format_node_path(&[]), "$");
        assert_eq!(
            format_node_path(&[NodeKey::key("foo"), NodeKey::index(2), NodeKey::key("bar")]),
            "foo[2].bar"
        );
    }
}
