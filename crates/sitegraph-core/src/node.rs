//! The node data model.
//!
//! A node is a storable, identifiable record with parent/child links and
//! internal lifecycle metadata. Nodes carry their user-visible data in a
//! free-form JSON field map; the schema engine derives typed GraphQL fields
//! from that data, it never interprets it here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unique identifier of a node.
///
/// Ids are caller-supplied opaque strings. They are the only way nodes
/// reference each other; child links are stored as ids, not as object
/// references, so graphs with cycles stay representable and children can be
/// resolved lazily against a [`crate::NodeStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Internal lifecycle metadata attached to every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInternal {
    /// The node's internal type tag. This is the name of the GraphQL type
    /// the node materializes as, and the key used for grouping and lookup.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Digest of the node content, used for change detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,

    /// Name of the source that created the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl NodeInternal {
    /// Creates internal metadata with just a type tag.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            content_digest: None,
            owner: None,
        }
    }
}

/// A storable record in the data graph.
///
/// # Example
///
/// ```
/// use sitegraph_core::Node;
/// use serde_json::json;
///
/// let node = Node::new("person-1", "Person")
///     .with_field("name", json!("Ada"))
///     .with_children(["pet-1", "pet-2"]);
///
/// assert_eq!(node.type_name(), "Person");
/// assert_eq!(node.children.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id of the node.
    pub id: NodeId,

    /// Id of the parent node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,

    /// Ordered ids of the node's children.
    #[serde(default)]
    pub children: Vec<NodeId>,

    /// Internal lifecycle metadata.
    pub internal: NodeInternal,

    /// User-visible node data.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Node {
    /// Creates a node with the given id and internal type tag.
    pub fn new(id: impl Into<NodeId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: Vec::new(),
            internal: NodeInternal::new(type_name),
            fields: Map::new(),
        }
    }

    /// Sets the parent id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the ordered child id list.
    #[must_use]
    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a data field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns the node's internal type tag.
    pub fn type_name(&self) -> &str {
        &self.internal.type_name
    }

    /// Returns a data field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Renders the node as a JSON object including identity and metadata,
    /// the shape resolvers hand to the GraphQL runtime.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("id".to_string(), Value::String(self.id.as_str().to_string()));
        map.insert(
            "parent".to_string(),
            match &self.parent {
                Some(parent) => Value::String(parent.as_str().to_string()),
                None => Value::Null,
            },
        );
        map.insert(
            "children".to_string(),
            Value::Array(
                self.children
                    .iter()
                    .map(|id| Value::String(id.as_str().to_string()))
                    .collect(),
            ),
        );
        let mut internal = Map::new();
        internal.insert(
            "type".to_string(),
            Value::String(self.internal.type_name.clone()),
        );
        if let Some(digest) = &self.internal.content_digest {
            internal.insert("contentDigest".to_string(), Value::String(digest.clone()));
        }
        if let Some(owner) = &self.internal.owner {
            internal.insert("owner".to_string(), Value::String(owner.clone()));
        }
        map.insert("internal".to_string(), Value::Object(internal));
        Value::Object(map)
    }
}
