//! Input values and the validation boundary.
//!
//! [`RawValue`] is the arbitrary input form: containers are reference-counted
//! so user code can build shared — even cyclic — graphs, and the [`Opaque`]
//! leaf stands in for values with no JSON representation. Nothing downstream
//! of [`prepare_value`] ever re-inspects raw input: validation converts it
//! into the closed [`Prepared`] form once, collecting the paths of invalid
//! leaves and circular references as it goes.
//!
//! [`Opaque`]: RawValue::Opaque

use crate::path::NodeKey;
use serde_json::{Number, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared list payload of a [`RawValue`].
pub type SharedList = Rc<RefCell<Vec<RawValue>>>;

/// Shared struct payload of a [`RawValue`]. Entry order is preserved.
pub type SharedStruct = Rc<RefCell<Vec<(String, RawValue)>>>;

/// Structural kind of a value or tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// The null literal.
    Null,
    /// A boolean.
    Bool,
    /// A finite number.
    Number,
    /// A string.
    String,
    /// An ordered sequence of children.
    List,
    /// An ordered string-keyed mapping.
    Struct,
}

impl ValueKind {
    /// Returns true for lists and structs.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, ValueKind::List | ValueKind::Struct)
    }

    /// Returns true for leaf kinds.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        !self.is_container()
    }

    /// Human-readable kind name.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Struct => "struct",
        }
    }
}

/// An arbitrary input value, prior to validation.
///
/// Cloning is shallow for containers: the clone shares the same backing
/// storage, which is what allows building shared and cyclic graphs.
///
/// # Examples
///
/// ```
/// use json_sift::RawValue;
/// use serde_json::json;
///
/// // The usual route: convert from a serde_json value.
/// let raw = RawValue::from(json!({"name": "demo", "tags": ["a", "b"]}));
/// assert!(raw.kind().unwrap().is_container());
///
/// // Non-finite floats have no JSON representation.
/// assert!(RawValue::from(f64::NAN).kind().is_none());
/// ```
#[derive(Clone, Debug)]
pub enum RawValue {
    /// The null literal.
    Null,
    /// A boolean.
    Bool(bool),
    /// A finite number.
    Number(Number),
    /// A string.
    String(String),
    /// A shared list of values.
    List(SharedList),
    /// A shared ordered mapping.
    Struct(SharedStruct),
    /// A value with no JSON representation; always rejected by validation.
    /// The payload is a short description for diagnostics.
    Opaque(&'static str),
}

impl RawValue {
    /// Create an empty shared struct.
    #[inline]
    pub fn new_struct() -> Self {
        RawValue::Struct(Rc::new(RefCell::new(Vec::new())))
    }

    /// Create an empty shared list.
    #[inline]
    pub fn new_list() -> Self {
        RawValue::List(Rc::new(RefCell::new(Vec::new())))
    }

    /// Append `value` if this is a list. Returns false otherwise.
    pub fn push(&self, value: RawValue) -> bool {
        match self {
            RawValue::List(items) => {
                items.borrow_mut().push(value);
                true
            }
            _ => false,
        }
    }

    /// Insert `(key, value)` if this is a struct. An existing entry with the
    /// same key is overwritten in place, preserving its position. Returns
    /// false if this is not a struct.
    pub fn insert(&self, key: impl Into<String>, value: RawValue) -> bool {
        match self {
            RawValue::Struct(entries) => {
                let key = key.into();
                let mut entries = entries.borrow_mut();
                if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = value;
                } else {
                    entries.push((key, value));
                }
                true
            }
            _ => false,
        }
    }

    /// Classify this value, or `None` if it has no JSON representation.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            RawValue::Null => Some(ValueKind::Null),
            RawValue::Bool(_) => Some(ValueKind::Bool),
            RawValue::Number(_) => Some(ValueKind::Number),
            RawValue::String(_) => Some(ValueKind::String),
            RawValue::List(_) => Some(ValueKind::List),
            RawValue::Struct(_) => Some(ValueKind::Struct),
            RawValue::Opaque(_) => None,
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => RawValue::Number(n),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::List(Rc::new(RefCell::new(
                items.into_iter().map(RawValue::from).collect(),
            ))),
            Value::Object(entries) => RawValue::Struct(Rc::new(RefCell::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ))),
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.into())
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n.into())
    }
}

impl From<u64> for RawValue {
    fn from(n: u64) -> Self {
        RawValue::Number(n.into())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        match Number::from_f64(n) {
            Some(n) => RawValue::Number(n),
            None => RawValue::Opaque("non-finite number"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        RawValue::List(Rc::new(RefCell::new(items)))
    }
}

/// A validated primitive payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// The null literal.
    Null,
    /// A boolean.
    Bool(bool),
    /// A finite number.
    Number(Number),
    /// A string.
    String(String),
}

impl Primitive {
    /// The kind of this primitive.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Primitive::Null => ValueKind::Null,
            Primitive::Bool(_) => ValueKind::Bool,
            Primitive::Number(_) => ValueKind::Number,
            Primitive::String(_) => ValueKind::String,
        }
    }

    /// Convert to a plain JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Primitive::Null => Value::Null,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => Value::Number(n.clone()),
            Primitive::String(s) => Value::String(s.clone()),
        }
    }
}

/// Payload of a [`Prepared`] value: a primitive leaf or ordered children.
#[derive(Clone, Debug, PartialEq)]
pub enum PreparedPayload {
    /// A leaf value.
    Primitive(Primitive),
    /// Ordered children of a container.
    Children(Vec<Prepared>),
}

/// A validated value: cycle-free, every leaf JSON-representable.
///
/// The root entry carries the sentinel key [`NodeKey::Root`]; children carry
/// their struct key or list index.
#[derive(Clone, Debug, PartialEq)]
pub struct Prepared {
    key: NodeKey,
    kind: ValueKind,
    payload: PreparedPayload,
}

impl Prepared {
    /// The key of this entry.
    #[inline]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// The kind of this entry.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The payload of this entry.
    #[inline]
    pub fn payload(&self) -> &PreparedPayload {
        &self.payload
    }

    /// Decompose into `(key, kind, payload)`.
    #[inline]
    pub fn into_parts(self) -> (NodeKey, ValueKind, PreparedPayload) {
        (self.key, self.kind, self.payload)
    }
}

/// Validate an arbitrary value into its [`Prepared`] form.
///
/// Invalid leaves are recorded as their path relative to `raw` and, unless
/// `stop_at_first_error` is set, traversal continues past them — the
/// offending child is simply omitted from its container. Circular container
/// references are detected by identity (an "in progress" stack of container
/// pointers): re-encountering a container that is still being visited records
/// the current path and the branch is not expanded further. Empty containers
/// are preserved so callers can still target them by path.
///
/// Returns the collected error paths and the prepared value. The value is
/// `None` only when the root itself is unusable (or, with
/// `stop_at_first_error`, as soon as anything is).
///
/// # Examples
///
/// ```
/// use json_sift::{prepare_value, RawValue};
/// use serde_json::json;
///
/// let raw = RawValue::from(json!({"a": [1, 2]}));
/// let (errors, prepared) = prepare_value(&raw, false);
/// assert!(errors.is_empty());
/// assert!(prepared.is_some());
/// ```
pub fn prepare_value(
    raw: &RawValue,
    stop_at_first_error: bool,
) -> (Vec<Vec<NodeKey>>, Option<Prepared>) {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    let mut in_progress = Vec::new();
    let result = prepare_recursive(
        NodeKey::Root,
        raw,
        &mut path,
        &mut in_progress,
        &mut errors,
        stop_at_first_error,
    );
    (errors, result)
}

fn container_identity(raw: &RawValue) -> Option<*const ()> {
    match raw {
        RawValue::List(items) => Some(Rc::as_ptr(items) as *const ()),
        RawValue::Struct(entries) => Some(Rc::as_ptr(entries) as *const ()),
        _ => None,
    }
}

fn prepare_recursive(
    key: NodeKey,
    raw: &RawValue,
    path: &mut Vec<NodeKey>,
    in_progress: &mut Vec<*const ()>,
    errors: &mut Vec<Vec<NodeKey>>,
    stop: bool,
) -> Option<Prepared> {
    let Some(kind) = raw.kind() else {
        errors.push(path.clone());
        return None;
    };
    if let Some(identity) = container_identity(raw) {
        if in_progress.contains(&identity) {
            errors.push(path.clone());
            return None;
        }
        in_progress.push(identity);
    }
    let payload = match raw {
        RawValue::List(items) => {
            let mut children = Vec::new();
            for (i, child) in items.borrow().iter().enumerate() {
                path.push(NodeKey::Index(i));
                let prepared =
                    prepare_recursive(NodeKey::Index(i), child, path, in_progress, errors, stop);
                path.pop();
                match prepared {
                    Some(p) => children.push(p),
                    None if stop => {
                        in_progress.pop();
                        return None;
                    }
                    None => {}
                }
            }
            in_progress.pop();
            PreparedPayload::Children(children)
        }
        RawValue::Struct(entries) => {
            let mut children = Vec::new();
            for (name, child) in entries.borrow().iter() {
                path.push(NodeKey::Key(name.clone()));
                let prepared = prepare_recursive(
                    NodeKey::Key(name.clone()),
                    child,
                    path,
                    in_progress,
                    errors,
                    stop,
                );
                path.pop();
                match prepared {
                    Some(p) => children.push(p),
                    None if stop => {
                        in_progress.pop();
                        return None;
                    }
                    None => {}
                }
            }
            in_progress.pop();
            PreparedPayload::Children(children)
        }
        RawValue::Null => PreparedPayload::Primitive(Primitive::Null),
        RawValue::Bool(b) => PreparedPayload::Primitive(Primitive::Bool(*b)),
        RawValue::Number(n) => PreparedPayload::Primitive(Primitive::Number(n.clone())),
        RawValue::String(s) => PreparedPayload::Primitive(Primitive::String(s.clone())),
        // Rejected by the kind check above.
        RawValue::Opaque(_) => unreachable!("opaque values never reach payload construction"),
    };
    Some(Prepared { key, kind, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(path: &[&str]) -> Vec<NodeKey> {
        path.iter().map(|k| NodeKey::key(*k)).collect()
    }

    #[test]
    fn test_prepare_list_of_primitives() {
        let raw = RawValue::from(json!([1, "2", false, null]));
        let (errors, prepared) = prepare_value(&raw, false);
        assert!(errors.is_empty());
        let prepared = prepared.unwrap();
        assert_eq!(prepared.key(), &NodeKey::Root);
        assert_eq!(prepared.kind(), ValueKind::List);
        let PreparedPayload::Children(children) = prepared.payload() else {
            panic!("expected children");
        };
        assert_eq!(children.len(), 4);
        assert_eq!(children[0].key(), &NodeKey::Index(0));
        assert_eq!(children[0].kind(), ValueKind::Number);
        assert_eq!(children[3].kind(), ValueKind::Null);
    }

    #[test]
    fn test_prepare_collects_invalid_leaves() {
        let raw = RawValue::from(vec![
            RawValue::from(1i64),
            RawValue::Opaque("symbol"),
            RawValue::from(false),
            RawValue::Opaque("symbol"),
        ]);
        let (errors, prepared) = prepare_value(&raw, false);
        assert_eq!(
            errors,
            vec![vec![NodeKey::Index(1)], vec![NodeKey::Index(3)]]
        );
        // Invalid children are omitted, the rest survive.
        let prepared = prepared.unwrap();
        let PreparedPayload::Children(children) = prepared.payload() else {
            panic!("expected children");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].key(), &NodeKey::Index(0));
        assert_eq!(children[1].key(), &NodeKey::Index(2));
    }

    #[test]
    fn test_prepare_stop_at_first_error() {
        let raw = RawValue::from(vec![RawValue::from(1i64), RawValue::Opaque("symbol")]);
        let (errors, prepared) = prepare_value(&raw, true);
        assert_eq!(errors, vec![vec![NodeKey::Index(1)]]);
        assert!(prepared.is_none());
    }

    #[test]
    fn test_prepare_invalid_root() {
        let (errors, prepared) = prepare_value(&RawValue::Opaque("function"), false);
        assert_eq!(errors, vec![Vec::<NodeKey>::new()]);
        assert!(prepared.is_none());
    }

    #[test]
    fn test_prepare_nested_struct() {
        let raw = RawValue::from(json!({"foo": {"bar": [null]}}));
        let (errors, prepared) = prepare_value(&raw, true);
        assert!(errors.is_empty());
        let prepared = prepared.unwrap();
        assert_eq!(prepared.kind(), ValueKind::Struct);
        let PreparedPayload::Children(children) = prepared.payload() else {
            panic!("expected children");
        };
        assert_eq!(children[0].key(), &NodeKey::key("foo"));
        let PreparedPayload::Children(grand) = children[0].payload() else {
            panic!("expected children");
        };
        assert_eq!(grand[0].key(), &NodeKey::key("bar"));
        assert_eq!(grand[0].kind(), ValueKind::List);
    }

    #[test]
    fn test_prepare_struct_cycle_reports_back_edge() {
        // A.foo.bar = B, B.box.fix = A
        let a = RawValue::new_struct();
        let b = RawValue::new_struct();
        let a_foo = RawValue::new_struct();
        let b_box = RawValue::new_struct();
        a_foo.insert("bar", b.clone());
        b_box.insert("fix", a.clone());
        a.insert("foo", a_foo);
        b.insert("box", b_box);

        let (errors, prepared) = prepare_value(&a, false);
        assert_eq!(errors, vec![keys(&["foo", "bar", "box", "fix"])]);
        assert!(prepared.is_some());

        // Stop-at-first-error reports the same back-edge.
        let (errors, _) = prepare_value(&a, true);
        assert_eq!(errors, vec![keys(&["foo", "bar", "box", "fix"])]);
    }

    #[test]
    fn test_prepare_list_cycle() {
        let c = RawValue::new_list();
        let d = RawValue::new_list();
        c.push(RawValue::from(1i64));
        c.push(d.clone());
        d.push(RawValue::from(1i64));
        d.push(RawValue::from(2i64));
        d.push(c.clone());

        let (errors, _) = prepare_value(&c, false);
        assert_eq!(errors, vec![vec![NodeKey::Index(1), NodeKey::Index(2)]]);
    }

    #[test]
    fn test_shared_but_acyclic_is_fine() {
        let shared = RawValue::from(json!({"x": 1}));
        let root = RawValue::new_struct();
        root.insert("a", shared.clone());
        root.insert("b", shared);
        let (errors, prepared) = prepare_value(&root, false);
        assert!(errors.is_empty());
        assert!(prepared.is_some());
    }

    #[test]
    fn test_empty_containers_preserved() {
        let raw = RawValue::from(json!({"empty": {}, "list": []}));
        let (errors, prepared) = prepare_value(&raw, true);
        assert!(errors.is_empty());
        let PreparedPayload::Children(children) = prepared.unwrap().into_parts().2 else {
            panic!("expected children");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_non_finite_float_is_opaque() {
        assert!(matches!(
            RawValue::from(f64::NAN),
            RawValue::Opaque("non-finite number")
        ));
        assert!(matches!(RawValue::from(1.5f64), RawValue::Number(_)));
    }
}
