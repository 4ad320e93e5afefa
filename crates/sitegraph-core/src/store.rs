//! Storage abstraction for node lookup.
//!
//! The schema engine never touches disk or network itself; it queries nodes
//! through [`NodeStore`], which backends implement. Lookups may be backed by
//! anything asynchronous; the engine simply awaits them.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::node::{Node, NodeId};

/// Query-position context threaded through id-based lookups.
///
/// The engine treats the path as opaque; backends may use it to key caches
/// or track which query positions depend on which nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPath {
    segments: Vec<String>,
}

impl QueryPath {
    /// The root path (no query position).
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from pre-built segments.
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Returns a child path extended with one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// The node lookup contract all storage backends implement.
///
/// Implementations must be thread-safe (`Send + Sync`). Per-type sequences
/// are ordered: `get_nodes_by_type` returns nodes in a stable order so that
/// repeated schema builds over unchanged data produce identical results.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Returns a node by id, or `None` if it does not exist.
    async fn get_node(&self, id: &NodeId) -> Option<Node>;

    /// Returns all nodes with the given internal type tag, in stable order.
    async fn get_nodes_by_type(&self, type_name: &str) -> Vec<Node>;

    /// Returns the nodes matching the given ids, preserving id order and
    /// skipping unknown ids. When `type_name` is given, nodes with a
    /// different internal type tag are filtered out. `path` carries the
    /// query position of the caller for downstream caching.
    async fn get_nodes_by_ids(
        &self,
        ids: &[NodeId],
        type_name: Option<&str>,
        path: &QueryPath,
    ) -> Vec<Node>;

    /// Returns the distinct internal type tags present in the store, in
    /// first-seen order.
    async fn node_type_names(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
struct StoreInner {
    nodes: HashMap<NodeId, Node>,
    by_type: IndexMap<String, Vec<NodeId>>,
}

/// In-memory node store.
///
/// Holds all nodes in memory with a per-type index in insertion order.
/// Suitable for tests and for builds over data sets that fit in memory.
#[derive(Debug, Default)]
pub struct InMemoryNodeStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryNodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given nodes.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let store = Self::new();
        store.extend(nodes);
        store
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert(&self, node: Node) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = inner.nodes.insert(node.id.clone(), node.clone())
            && let Some(ids) = inner.by_type.get_mut(previous.type_name())
        {
            ids.retain(|id| id != &node.id);
        }
        inner
            .by_type
            .entry(node.internal.type_name.clone())
            .or_default()
            .push(node.id);
    }

    /// Inserts all given nodes.
    pub fn extend(&self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.insert(node);
        }
    }

    /// Returns the total number of nodes.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .nodes
            .len()
    }

    /// Returns `true` if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .nodes
            .get(id)
            .cloned()
    }

    async fn get_nodes_by_type(&self, type_name: &str) -> Vec<Node> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner
            .by_type
            .get(type_name)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.nodes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn get_nodes_by_ids(
        &self,
        ids: &[NodeId],
        type_name: Option<&str>,
        _path: &QueryPath,
    ) -> Vec<Node> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.iter()
            .filter_map(|id| inner.nodes.get(id))
            .filter(|node| type_name.is_none_or(|t| node.type_name() == t))
            .cloned()
            .collect()
    }

    async fn node_type_names(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .by_type
            .keys()
            .cloned()
            .collect()
    }
}
