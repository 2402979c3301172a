//! The mutable in-memory value tree.
//!
//! Built once from a validated value, then mutated only through status
//! updates and forced property creation. Nodes live in an arena addressed by
//! stable [`NodeId`] indices; each node stores its children's ids and its
//! parent's id, which keeps upward cascades O(depth) and downward cascades
//! O(subtree) without ownership cycles. Nodes are never physically removed:
//! deletion is a status flip, and omission happens at render time.

use crate::diag::{Diagnostics, ErrorCode};
use crate::path::{EndpointPath, KeyPath, NodeKey, Segment};
use crate::status::RetentionStatus;
use crate::value::{Prepared, PreparedPayload, Primitive, ValueKind};
use serde_json::{Map, Value};

/// Stable handle to a node in a [`Tree`].
///
/// Ids remain valid for the lifetime of the tree, across replacements: a
/// sample rule that forces a new value onto an existing path swaps the
/// node's kind/value/children but keeps its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum Payload {
    Primitive(Primitive),
    Children(Vec<NodeId>),
}

#[derive(Debug)]
struct NodeData {
    key: NodeKey,
    kind: ValueKind,
    payload: Payload,
    status: RetentionStatus,
    parent: Option<NodeId>,
}

/// The value tree with per-node retention status.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Build a tree from a validated value, stamping every node with
    /// `default_status`.
    pub fn build(prepared: Prepared, default_status: RetentionStatus) -> Self {
        let mut tree = Tree { nodes: Vec::new() };
        tree.alloc(prepared, default_status, None);
        tree
    }

    fn alloc(&mut self, prepared: Prepared, status: RetentionStatus, parent: Option<NodeId>) -> NodeId {
        let (key, kind, payload) = prepared.into_parts();
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            key,
            kind,
            payload: Payload::Children(Vec::new()),
            status,
            parent,
        });
        let payload = match payload {
            PreparedPayload::Primitive(p) => Payload::Primitive(p),
            PreparedPayload::Children(children) => Payload::Children(
                children
                    .into_iter()
                    .map(|child| self.alloc(child, status, Some(id)))
                    .collect(),
            ),
        };
        self.nodes[id.0].payload = payload;
        id
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The key of a node.
    #[inline]
    pub fn key(&self, id: NodeId) -> &NodeKey {
        &self.nodes[id.0].key
    }

    /// The structural kind of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> ValueKind {
        self.nodes[id.0].kind
    }

    /// The current retention status of a node.
    #[inline]
    pub fn status(&self, id: NodeId) -> RetentionStatus {
        self.nodes[id.0].status
    }

    /// The key sequence from the root down to a node (excluding the root
    /// marker).
    pub fn node_path(&self, id: NodeId) -> Vec<NodeKey> {
        let mut acc = Vec::new();
        let mut current = &self.nodes[id.0];
        while let Some(parent) = current.parent {
            acc.push(current.key.clone());
            current = &self.nodes[parent.0];
        }
        acc.reverse();
        acc
    }

    /// Resolve a path expression against the tree, starting at the root.
    ///
    /// A literal segment is an exact child lookup and fails closed: `None`
    /// if the key is missing or the current node is not a container. List
    /// elements carry index keys, which never compare equal to a literal
    /// string segment, so lists are reachable only through wildcards. A
    /// wildcard segment unions the resolution of the remainder over every
    /// child; if nothing accumulates the whole lookup is `None`. The empty
    /// path resolves to the root itself.
    pub fn find_properties(&self, path: &KeyPath) -> Option<Vec<NodeId>> {
        self.find_in(self.root(), path.segments())
    }

    fn find_in(&self, id: NodeId, segments: &[Segment]) -> Option<Vec<NodeId>> {
        match segments {
            [] => Some(vec![id]),
            [first, rest @ ..] => {
                let Payload::Children(children) = &self.nodes[id.0].payload else {
                    return None;
                };
                match first {
                    Segment::Key(key) => {
                        let child = children
                            .iter()
                            .copied()
                            .find(|c| self.nodes[c.0].key.as_key() == Some(key.as_str()))?;
                        self.find_in(child, rest)
                    }
                    Segment::Wildcard => {
                        let mut acc = Vec::new();
                        for &child in children {
                            if let Some(found) = self.find_in(child, rest) {
                                acc.extend(found);
                            }
                        }
                        if acc.is_empty() {
                            None
                        } else {
                            Some(acc)
                        }
                    }
                }
            }
        }
    }

    /// Apply `status` to a node with the cascade rules.
    ///
    /// The update cascades downward through the whole subtree. If it was
    /// accepted at this node and the new status is a keep status, it also
    /// cascades upward through the ancestors: a kept descendant must not
    /// disappear because its parent is marked for removal (removal never
    /// cascades upward). A rejected update is a no-op, recorded as an
    /// [`ErrorCode::UpdateStatus`] warning, and is not propagated in either
    /// direction.
    pub fn try_update_status(&mut self, id: NodeId, status: RetentionStatus, diag: &mut Diagnostics) {
        if !self.update_down(id, status, diag) {
            return;
        }
        if self.nodes[id.0].status.is_keep() {
            if let Some(parent) = self.nodes[id.0].parent {
                self.update_up(parent, status, diag);
            }
        }
    }

    fn update_down(&mut self, id: NodeId, status: RetentionStatus, diag: &mut Diagnostics) -> bool {
        if !self.nodes[id.0].status.try_update(status) {
            diag.add_warning(ErrorCode::UpdateStatus, self.node_path(id));
            return false;
        }
        if let Payload::Children(children) = &self.nodes[id.0].payload {
            for child in children.clone() {
                self.update_down(child, status, diag);
            }
        }
        true
    }

    fn update_up(&mut self, id: NodeId, status: RetentionStatus, diag: &mut Diagnostics) {
        if !self.nodes[id.0].status.try_update(status) {
            diag.add_warning(ErrorCode::UpdateStatus, self.node_path(id));
            return;
        }
        if let Some(parent) = self.nodes[id.0].parent {
            self.update_up(parent, status, diag);
        }
    }

    /// Force `value` onto the property named by an endpoint path, relative
    /// to `id`.
    ///
    /// Walks the path creating missing intermediate struct nodes with a
    /// fresh KEEP(sample) status; an existing non-struct intermediate is
    /// coerced to an empty struct, recording an [`ErrorCode::UpdateType`]
    /// warning at its path. The terminal node is raised to KEEP(sample)
    /// (with the usual cascades) and then its kind/value/children are
    /// overwritten in place from `value`; replacement children are built
    /// directly with KEEP(sample).
    pub fn force_create_property(
        &mut self,
        id: NodeId,
        path: &EndpointPath,
        value: Prepared,
        diag: &mut Diagnostics,
    ) {
        let keys: Vec<String> = path.keys().map(str::to_owned).collect();
        self.force_create(id, &keys, value, diag);
    }

    fn force_create(&mut self, id: NodeId, keys: &[String], value: Prepared, diag: &mut Diagnostics) {
        match keys {
            [] => {
                let keep = RetentionStatus::keep_sample();
                self.try_update_status(id, keep, diag);
                let (_, kind, payload) = value.into_parts();
                let payload = match payload {
                    PreparedPayload::Primitive(p) => Payload::Primitive(p),
                    PreparedPayload::Children(children) => Payload::Children(
                        children
                            .into_iter()
                            .map(|child| self.alloc(child, keep, Some(id)))
                            .collect(),
                    ),
                };
                self.nodes[id.0].kind = kind;
                self.nodes[id.0].payload = payload;
            }
            [first, rest @ ..] => {
                if self.nodes[id.0].kind != ValueKind::Struct {
                    diag.add_warning(ErrorCode::UpdateType, self.node_path(id));
                    self.nodes[id.0].kind = ValueKind::Struct;
                    self.nodes[id.0].payload = Payload::Children(Vec::new());
                }
                let child = self.child_by_key(id, first).unwrap_or_else(|| {
                    let created = NodeId(self.nodes.len());
                    self.nodes.push(NodeData {
                        key: NodeKey::Key(first.clone()),
                        kind: ValueKind::Struct,
                        payload: Payload::Children(Vec::new()),
                        status: RetentionStatus::keep_sample(),
                        parent: Some(id),
                    });
                    if let Payload::Children(children) = &mut self.nodes[id.0].payload {
                        children.push(created);
                    }
                    created
                });
                self.force_create(child, rest, value, diag);
            }
        }
    }

    fn child_by_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match &self.nodes[id.0].payload {
            Payload::Children(children) => children
                .iter()
                .copied()
                .find(|c| self.nodes[c.0].key.as_key() == Some(key)),
            Payload::Primitive(_) => None,
        }
    }

    /// Render the subtree at `id` to a plain value, ignoring retention when
    /// `include_removed` is set.
    pub fn render_from(&self, id: NodeId, include_removed: bool) -> Value {
        self.render_node(id, include_removed).1
    }

    /// Render the whole tree, honoring retention status.
    ///
    /// If filtering removed everything the result falls back to an empty
    /// value of the root's own kind: `{}` for a struct root, `[]` for a
    /// list root, `null` for a primitive root.
    pub fn to_value(&self) -> Value {
        let (kept, value) = self.render_node(self.root(), false);
        if kept {
            value
        } else {
            match self.nodes[0].kind {
                ValueKind::Struct => Value::Object(Map::new()),
                ValueKind::List => Value::Array(Vec::new()),
                _ => Value::Null,
            }
        }
    }

    /// Returns the keep outcome for this node and its rendered value.
    ///
    /// A container reached with its own status set to remove reports
    /// not-kept immediately; otherwise it is kept iff at least one child
    /// was, which is what makes entirely-empty containers collapse away from
    /// their parents.
    fn render_node(&self, id: NodeId, all: bool) -> (bool, Value) {
        let node = &self.nodes[id.0];
        let keep = node.status.is_keep();
        if !all && !keep {
            return (false, Value::Null);
        }
        match &node.payload {
            Payload::Children(children) => {
                if node.kind == ValueKind::Struct {
                    let mut map = Map::new();
                    for &child in children {
                        let (kept, value) = self.render_node(child, all);
                        if kept {
                            if let Some(name) = self.nodes[child.0].key.as_key() {
                                map.insert(name.to_owned(), value);
                            }
                        }
                    }
                    (all || (!map.is_empty() && keep), Value::Object(map))
                } else {
                    let mut items = Vec::new();
                    for &child in children {
                        let (kept, value) = self.render_node(child, all);
                        if kept {
                            items.push(value);
                        }
                    }
                    (all || (!items.is_empty() && keep), Value::Array(items))
                }
            }
            Payload::Primitive(p) => (all || keep, p.to_value()),
        }
    }
}
