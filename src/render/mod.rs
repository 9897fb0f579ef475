//! Render dispatcher: projects a tree into a view model the canvas draws.

use crate::models::{Attributes, Node, NodeId, NodeKind, Tree};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RenderNode {
    pub id: NodeId,
    /// Whether the canvas should offer a delete control.
    pub deletable: bool,
    pub kind: RenderKind,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RenderKind {
    Container {
        style: ContainerStyle,
        children: Vec<RenderNode>,
    },
    Form {
        reference_id: String,
        flex: bool,
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
    Heading {
        text: String,
    },
    Button {
        label: String,
        alternative_label: Option<String>,
        submit: bool,
        route: Option<String>,
        external: bool,
    },
    Table {
        route: String,
        search: bool,
        headers: Vec<String>,
        buttons: Vec<String>,
        actions: Vec<String>,
    },
    TextInput {
        name: String,
        label: String,
        placeholder: String,
    },
    Outlet,
    Placeholder(Unrenderable),
}

#[cfg(test)]
impl RenderKind {
    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderKind::Container { children, .. } | RenderKind::Form { children, .. } => children,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Unrenderable {
    UnknownKind(String),
    MissingNode,
    Cycle,
}

impl Unrenderable {
    pub fn message(&self) -> String {
        match self {
            Unrenderable::UnknownKind(tag) => format!("Unsupported node type \"{tag}\""),
            Unrenderable::MissingNode => "Missing node".to_string(),
            Unrenderable::Cycle => "Node is its own ancestor".to_string(),
        }
    }
}

/// Layout attributes of a container, with empty strings for unset keys.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) struct ContainerStyle {
    pub flex: String,
    pub direction: String,
    pub padding: String,
    pub gap: String,
    pub align: String,
    pub justify: String,
    pub width: String,
    pub min_width: String,
    pub max_width: String,
    pub height: String,
    pub min_height: String,
    pub max_height: String,
}

impl ContainerStyle {
    fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            flex: attr_str(attrs, "flex"),
            direction: attr_str(attrs, "direction"),
            padding: attr_str(attrs, "padding"),
            gap: attr_str(attrs, "gap"),
            align: attr_str(attrs, "align"),
            justify: attr_str(attrs, "justify"),
            width: attr_str(attrs, "width"),
            min_width: attr_str(attrs, "minWidth"),
            max_width: attr_str(attrs, "maxWidth"),
            height: attr_str(attrs, "height"),
            min_height: attr_str(attrs, "minHeight"),
            max_height: attr_str(attrs, "maxHeight"),
        }
    }

    /// Inline CSS for the canvas. Bare numbers are read as pixels.
    pub fn to_css(&self) -> String {
        let mut css = String::from("display:flex;");
        let direction = if self.direction.is_empty() { "column" } else { &self.direction };
        css.push_str(&format!("flex-direction:{direction};"));

        let flex_keyword = |v: &str| match v {
            "start" => "flex-start".to_string(),
            "end" => "flex-end".to_string(),
            "between" => "space-between".to_string(),
            other => other.to_string(),
        };
        let pairs = [
            ("flex", self.flex.clone()),
            ("padding", px(&self.padding)),
            ("gap", px(&self.gap)),
            ("align-items", flex_keyword(&self.align)),
            ("justify-content", flex_keyword(&self.justify)),
            ("width", px(&self.width)),
            ("min-width", px(&self.min_width)),
            ("max-width", px(&self.max_width)),
            ("height", px(&self.height)),
            ("min-height", px(&self.min_height)),
            ("max-height", px(&self.max_height)),
        ];
        for (prop, value) in pairs {
            if !value.is_empty() {
                css.push_str(&format!("{prop}:{value};"));
            }
        }
        css
    }
}

fn px(value: &str) -> String {
    if !value.is_empty() && value.parse::<f64>().is_ok() {
        format!("{value}px")
    } else {
        value.to_string()
    }
}

fn attr_str(attrs: &Attributes, key: &str) -> String {
    match attrs.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn attr_bool(attrs: &Attributes, key: &str) -> bool {
    match attrs.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn row_labels(attrs: &Attributes, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .map(|row| attr_str(row, "label"))
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Render `node_id` and everything below it. Never fails: ids that are not
/// in the tree, unknown kinds and cycles come back as placeholders.
pub(crate) fn render(tree: &Tree, node_id: &str) -> RenderNode {
    let mut path = BTreeSet::new();
    render_node(tree, node_id, &mut path)
}

fn render_node<'a>(tree: &'a Tree, node_id: &'a str, path: &mut BTreeSet<&'a str>) -> RenderNode {
    let Some(node) = tree.get(node_id) else {
        return placeholder(node_id, Unrenderable::MissingNode);
    };
    if !path.insert(node_id) {
        return placeholder(node_id, Unrenderable::Cycle);
    }

    let attrs = &node.attributes;
    let kind = match &node.kind {
        NodeKind::Container => RenderKind::Container {
            style: ContainerStyle::from_attributes(attrs),
            children: render_children(tree, node, path),
        },
        NodeKind::Form => RenderKind::Form {
            reference_id: attr_str(attrs, "referenceId"),
            flex: attr_bool(attrs, "flex"),
            children: render_children(tree, node, path),
        },
        NodeKind::Text => RenderKind::Text {
            text: attr_str(attrs, "text"),
        },
        NodeKind::Heading => RenderKind::Heading {
            text: attr_str(attrs, "text"),
        },
        NodeKind::Button => {
            let to = attrs.get("to").and_then(Value::as_object);
            RenderKind::Button {
                label: attr_str(attrs, "label"),
                alternative_label: non_empty(attr_str(attrs, "alternativeLabel")),
                submit: attr_str(attrs, "buttonKind") == "submit",
                route: to.and_then(|t| non_empty(attr_str(t, "route"))),
                external: to.is_some_and(|t| attr_bool(t, "isExternal")),
            }
        }
        NodeKind::Table => RenderKind::Table {
            route: attr_str(attrs, "route"),
            search: attr_bool(attrs, "search"),
            headers: row_labels(attrs, "headers"),
            buttons: row_labels(attrs, "buttons"),
            actions: row_labels(attrs, "actions"),
        },
        NodeKind::TextInput => RenderKind::TextInput {
            name: attr_str(attrs, "name"),
            label: attr_str(attrs, "label"),
            placeholder: attr_str(attrs, "placeholder"),
        },
        NodeKind::Outlet => RenderKind::Outlet,
        NodeKind::Unknown(tag) => RenderKind::Placeholder(Unrenderable::UnknownKind(tag.clone())),
    };

    path.remove(node_id);
    RenderNode {
        id: node.id.clone(),
        deletable: is_deletable(tree, node),
        kind,
    }
}

fn render_children<'a>(
    tree: &'a Tree,
    node: &'a Node,
    path: &mut BTreeSet<&'a str>,
) -> Vec<RenderNode> {
    node.children()
        .iter()
        .map(|child| render_node(tree, child, path))
        .collect()
}

fn placeholder(id: &str, reason: Unrenderable) -> RenderNode {
    RenderNode {
        id: id.to_string(),
        deletable: false,
        kind: RenderKind::Placeholder(reason),
    }
}

/// Mirrors the preconditions of `tree::delete`.
fn is_deletable(tree: &Tree, node: &Node) -> bool {
    node.id != tree.root_id && !node.has_children()
}
