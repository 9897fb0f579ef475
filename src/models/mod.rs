use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub(crate) type NodeId = String;

/// Open, string-keyed attribute payload. Its shape is decided by the node kind
/// (see `crate::schema`).
pub(crate) type Attributes = serde_json::Map<String, serde_json::Value>;

/// Node type tag.
///
/// Unknown tags are kept verbatim so a document written by a newer editor
/// still loads; the render dispatcher turns them into placeholders.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NodeKind {
    Container,
    Text,
    Heading,
    Button,
    Table,
    Form,
    TextInput,
    Outlet,
    Unknown(String),
}

impl NodeKind {
    /// Every kind the editor can create, in the order the create dialog lists them.
    pub const CREATABLE: [NodeKind; 8] = [
        NodeKind::Container,
        NodeKind::Text,
        NodeKind::Heading,
        NodeKind::Button,
        NodeKind::Table,
        NodeKind::Outlet,
        NodeKind::Form,
        NodeKind::TextInput,
    ];

    pub fn parse(tag: &str) -> Self {
        match tag {
            "container" => NodeKind::Container,
            // Documents saved before the rename still say `flex`.
            "flex" => NodeKind::Container,
            "text" => NodeKind::Text,
            "heading" => NodeKind::Heading,
            "button" => NodeKind::Button,
            "table" => NodeKind::Table,
            "form" => NodeKind::Form,
            "text-input" => NodeKind::TextInput,
            "outlet" => NodeKind::Outlet,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Text => "text",
            NodeKind::Heading => "heading",
            NodeKind::Button => "button",
            NodeKind::Table => "table",
            NodeKind::Form => "form",
            NodeKind::TextInput => "text-input",
            NodeKind::Outlet => "outlet",
            NodeKind::Unknown(tag) => tag,
        }
    }

    /// Whether nodes of this kind own an ordered `children` list.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Container | NodeKind::Form)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(NodeKind::parse(&tag))
    }
}

pub(crate) fn is_container_type(kind: &NodeKind) -> bool {
    kind.is_container()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub attributes: Attributes,

    /// Child ids in render order. Only container-capable kinds carry this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,

    /// Owning container. Absent only on the root.
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
}

impl Node {
    /// A detached node with a fresh UUID. Container kinds start with an empty
    /// child list; `tree::insert` fills in the parent.
    pub fn new(kind: NodeKind, attributes: Attributes) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), kind, attributes)
    }

    pub fn with_id(id: impl Into<NodeId>, kind: NodeKind, attributes: Attributes) -> Self {
        let children = kind.is_container().then(Vec::new);
        Self {
            id: id.into(),
            kind,
            attributes,
            children,
            parent_id: None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }
}

/// The node map. Values are reference counted so that producing an edited
/// tree only clones the nodes that actually changed.
pub(crate) type NodeMap = BTreeMap<NodeId, Arc<Node>>;

/// A persisted document (the backend calls it a renderer).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Tree {
    pub id: String,

    #[serde(rename = "rootId", alias = "default")]
    pub root_id: NodeId,

    #[serde(alias = "items", default)]
    pub nodes: NodeMap,
}

impl Tree {
    /// A document holding only a root container.
    #[cfg(test)]
    pub fn with_root(id: impl Into<String>, root: Node) -> Self {
        let root_id = root.id.clone();
        let mut nodes = NodeMap::new();
        nodes.insert(root_id.clone(), Arc::new(root));
        Self {
            id: id.into(),
            root_id,
            nodes,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.get(&self.root_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// A layout owns one renderer; routes render inside a layout's outlet.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Layout {
    pub id: String,
    pub label: String,
    pub renderer: Tree,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct RouteRecord {
    pub id: String,
    pub label: String,
    pub route: String,

    #[serde(rename = "loadDataRoute", default)]
    pub load_data_route: Option<String>,

    #[serde(rename = "layoutId", default)]
    pub layout_id: Option<String>,

    pub renderer: Tree,
}
