//! Tree editing engine.
//!
//! All mutators take the current tree by reference and hand back a new one.
//! Nodes live behind `Arc`, so an edit clones the node map's spine plus the
//! one or two nodes it touches; everything else is shared with the input.
//! On any failed precondition the input is left as it was and a
//! [`StructuralError`] comes back.

use crate::models::{is_container_type, Node, NodeId, Tree};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum StructuralError {
    #[error("parent node `{0}` does not exist")]
    ParentNotFound(NodeId),
    #[error("node `{0}` cannot hold children")]
    ParentNotContainer(NodeId),
    #[error("a node with id `{0}` already exists")]
    DuplicateId(NodeId),
    #[error("`{anchor}` is not a child of `{parent}`")]
    AnchorNotFound { parent: NodeId, anchor: NodeId },
    #[error("node `{0}` does not exist")]
    NodeNotFound(NodeId),
    #[error("the root node cannot be deleted")]
    CannotDeleteRoot,
    #[error("node `{0}` still has children; remove them first")]
    NodeHasChildren(NodeId),
}

/// Attach `node` under `parent_id`.
///
/// Without an anchor the node goes to the front of the parent's children.
/// With one it lands directly after the anchor, so repeated inserts after the
/// same anchor read newest-first.
pub(crate) fn insert(
    tree: &Tree,
    mut node: Node,
    parent_id: &str,
    after: Option<&str>,
) -> Result<Tree, StructuralError> {
    let parent = tree
        .get(parent_id)
        .ok_or_else(|| StructuralError::ParentNotFound(parent_id.to_string()))?;
    if !is_container_type(&parent.kind) {
        return Err(StructuralError::ParentNotContainer(parent_id.to_string()));
    }
    if tree.contains(&node.id) {
        return Err(StructuralError::DuplicateId(node.id));
    }

    let index = match after {
        Some(anchor) => {
            let pos = parent
                .children()
                .iter()
                .position(|c| c == anchor)
                .ok_or_else(|| StructuralError::AnchorNotFound {
                    parent: parent_id.to_string(),
                    anchor: anchor.to_string(),
                })?;
            pos + 1
        }
        None => 0,
    };

    // A fresh node cannot already own anything.
    if node.has_children() {
        tracing::warn!(node = %node.id, "dropping child ids supplied with a new node");
    }
    node.children = node.kind.is_container().then(Vec::new);
    node.parent_id = Some(parent_id.to_string());

    let mut next = tree.clone();
    let node_id = node.id.clone();
    if let Some(parent) = next.nodes.get_mut(parent_id) {
        Arc::make_mut(parent)
            .children
            .get_or_insert_with(Vec::new)
            .insert(index, node_id.clone());
    }
    next.nodes.insert(node_id.clone(), Arc::new(node));

    tracing::debug!(node = %node_id, parent = parent_id, index, "inserted node");
    Ok(next)
}

/// Replace a node's attributes.
///
/// Only `attributes` is taken from `node`; kind, id, parent and children are
/// carried over from the stored node.
pub(crate) fn update(tree: &Tree, node: Node) -> Result<Tree, StructuralError> {
    let existing = tree
        .get(&node.id)
        .ok_or_else(|| StructuralError::NodeNotFound(node.id.clone()))?;

    if existing.kind != node.kind
        || existing.parent_id != node.parent_id
        || existing.children != node.children
    {
        tracing::warn!(node = %node.id, "ignoring structural fields passed to update");
    }

    let mut next = tree.clone();
    if let Some(slot) = next.nodes.get_mut(&node.id) {
        Arc::make_mut(slot).attributes = node.attributes;
    }

    tracing::debug!(node = %node.id, "updated node attributes");
    Ok(next)
}

/// Remove a childless, non-root node and unlink it from its parent.
pub(crate) fn delete(tree: &Tree, node_id: &str) -> Result<Tree, StructuralError> {
    let node = tree
        .get(node_id)
        .ok_or_else(|| StructuralError::NodeNotFound(node_id.to_string()))?;
    if node_id == tree.root_id {
        return Err(StructuralError::CannotDeleteRoot);
    }
    if node.has_children() {
        return Err(StructuralError::NodeHasChildren(node_id.to_string()));
    }

    let parent_id = node.parent_id.clone();
    let mut next = tree.clone();
    next.nodes.remove(node_id);
    if let Some(parent) = parent_id.as_deref().and_then(|p| next.nodes.get_mut(p)) {
        if let Some(children) = Arc::make_mut(parent).children.as_mut() {
            children.retain(|c| c != node_id);
        }
    }

    tracing::debug!(node = node_id, parent = ?parent_id, "deleted node");
    Ok(next)
}

/// A broken structural invariant found in a loaded or edited tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum InvariantViolation {
    #[error("root node `{0}` is missing")]
    MissingRoot(NodeId),
    #[error("root node `{0}` has a parent")]
    RootHasParent(NodeId),
    #[error("node `{0}` has no parent and is not the root")]
    Detached(NodeId),
    #[error("node `{node}` points at parent `{parent}`, which does not list it exactly once")]
    NotListedByParent { node: NodeId, parent: NodeId },
    #[error("node `{parent}` lists child `{child}`, whose parent is different or missing")]
    ChildMismatch { parent: NodeId, child: NodeId },
    #[error("node `{0}` is listed as a child more than once")]
    SharedChild(NodeId),
    #[error("node `{0}` is its own ancestor")]
    Cycle(NodeId),
    #[error("node `{0}` has a children list that does not match its type")]
    ChildrenShape(NodeId),
}

impl Tree {
    /// Every violated structural invariant, in node-id order. Empty means the
    /// tree is well formed.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut out = Vec::new();

        match self.root() {
            None => out.push(InvariantViolation::MissingRoot(self.root_id.clone())),
            Some(root) if root.parent_id.is_some() => {
                out.push(InvariantViolation::RootHasParent(self.root_id.clone()))
            }
            Some(_) => {}
        }

        let mut listed: BTreeMap<&str, usize> = BTreeMap::new();
        for (id, node) in &self.nodes {
            if is_container_type(&node.kind) != node.children.is_some() {
                out.push(InvariantViolation::ChildrenShape(id.clone()));
            }

            match node.parent_id.as_deref() {
                None if *id != self.root_id => out.push(InvariantViolation::Detached(id.clone())),
                None => {}
                Some(parent) => {
                    let count = self
                        .get(parent)
                        .map(|p| p.children().iter().filter(|c| *c == id).count())
                        .unwrap_or(0);
                    if count != 1 {
                        out.push(InvariantViolation::NotListedByParent {
                            node: id.clone(),
                            parent: parent.to_string(),
                        });
                    }
                }
            }

            for child in node.children() {
                *listed.entry(child.as_str()).or_default() += 1;
                let points_back = self
                    .get(child)
                    .is_some_and(|c| c.parent_id.as_deref() == Some(id.as_str()));
                if !points_back {
                    out.push(InvariantViolation::ChildMismatch {
                        parent: id.clone(),
                        child: child.clone(),
                    });
                }
            }

            if self.is_own_ancestor(id) {
                out.push(InvariantViolation::Cycle(id.clone()));
            }
        }

        for (child, count) in listed {
            if count > 1 {
                out.push(InvariantViolation::SharedChild(child.to_string()));
            }
        }

        out
    }

    fn is_own_ancestor(&self, id: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut current = self.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !seen.insert(parent) {
                // A loop above us that does not include `id`; reported for its members.
                return false;
            }
            current = self.get(parent).and_then(|n| n.parent_id.as_deref());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, NodeKind};
    use proptest::prelude::*;
    use serde_json::json;

    fn root_tree() -> Tree {
        Tree::with_root("doc", Node::with_id("r", NodeKind::Container, Attributes::new()))
    }

    fn leaf(id: &str) -> Node {
        Node::with_id(id, NodeKind::Text, Attributes::new())
    }

    fn children_of(tree: &Tree, id: &str) -> Vec<String> {
        tree.get(id).map(|n| n.children().to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_insert_scenario_front_and_anchor() {
        let t = root_tree();
        let t1 = insert(&t, leaf("a"), "r", None).expect("insert a");
        assert_eq!(children_of(&t1, "r"), vec!["a"]);

        let t2 = insert(&t1, leaf("b"), "r", Some("a")).expect("insert b");
        assert_eq!(children_of(&t2, "r"), vec!["a", "b"]);

        let t3 = insert(&t2, leaf("c"), "r", None).expect("insert c");
        assert_eq!(children_of(&t3, "r"), vec!["c", "a", "b"]);

        assert_eq!(t3.get("c").and_then(|n| n.parent_id.as_deref()), Some("r"));
        assert!(t3.check_invariants().is_empty());
    }

    #[test]
    fn test_insert_after_same_anchor_is_newest_first() {
        let mut t = insert(&root_tree(), leaf("x"), "r", None).expect("x");
        t = insert(&t, leaf("y"), "r", None).expect("y");
        // children: [y, x]; anchor x sits at index 1
        for id in ["n1", "n2", "n3"] {
            t = insert(&t, leaf(id), "r", Some("x")).expect("anchored insert");
        }
        assert_eq!(children_of(&t, "r"), vec!["y", "x", "n3", "n2", "n1"]);
    }

    #[test]
    fn test_insert_rejections_leave_tree_untouched() {
        let t = insert(&root_tree(), leaf("a"), "r", None).expect("a");
        let before = t.clone();

        assert_eq!(
            insert(&t, leaf("b"), "missing", None),
            Err(StructuralError::ParentNotFound("missing".to_string()))
        );
        assert_eq!(
            insert(&t, leaf("b"), "a", None),
            Err(StructuralError::ParentNotContainer("a".to_string()))
        );
        assert_eq!(
            insert(&t, leaf("a"), "r", None),
            Err(StructuralError::DuplicateId("a".to_string()))
        );
        assert_eq!(
            insert(&t, leaf("b"), "r", Some("gone")),
            Err(StructuralError::AnchorNotFound {
                parent: "r".to_string(),
                anchor: "gone".to_string()
            })
        );
        assert_eq!(t, before);
    }

    #[test]
    fn test_insert_normalizes_children_of_new_node() {
        let mut smuggled = Node::with_id("f", NodeKind::Form, Attributes::new());
        smuggled.children = Some(vec!["ghost".to_string()]);
        let t = insert(&root_tree(), smuggled, "r", None).expect("form");
        assert_eq!(t.get("f").map(|n| n.children.clone()), Some(Some(vec![])));

        let mut leaf_with_children = leaf("t");
        leaf_with_children.children = Some(vec![]);
        let t = insert(&t, leaf_with_children, "f", None).expect("text in form");
        assert!(t.get("t").is_some_and(|n| n.children.is_none()));
        assert!(t.check_invariants().is_empty());
    }

    #[test]
    fn test_insert_shares_untouched_nodes() {
        let t = insert(&root_tree(), leaf("a"), "r", None).expect("a");
        let t2 = insert(&t, leaf("b"), "r", None).expect("b");
        let a1 = t.nodes.get("a").expect("a in t");
        let a2 = t2.nodes.get("a").expect("a in t2");
        assert!(Arc::ptr_eq(a1, a2));
        assert_eq!(children_of(&t, "r"), vec!["a"]);
    }

    #[test]
    fn test_update_only_changes_attributes() {
        let t = insert(&root_tree(), leaf("a"), "r", None).expect("a");

        let mut tampered = Node::with_id("a", NodeKind::Heading, Attributes::new());
        tampered.children = Some(vec!["bogus".to_string()]);
        tampered.parent_id = Some("elsewhere".to_string());
        tampered.attributes.insert("text".to_string(), json!("hello"));

        let t2 = update(&t, tampered).expect("update");
        let a = t2.get("a").expect("a");
        assert_eq!(a.kind, NodeKind::Text);
        assert_eq!(a.parent_id.as_deref(), Some("r"));
        assert!(a.children.is_none());
        assert_eq!(a.attributes.get("text"), Some(&json!("hello")));
        assert!(t2.check_invariants().is_empty());

        // The input keeps its old attributes.
        assert!(t.get("a").is_some_and(|n| n.attributes.is_empty()));
    }

    #[test]
    fn test_update_missing_node() {
        assert_eq!(
            update(&root_tree(), leaf("nope")),
            Err(StructuralError::NodeNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_delete_leaf_and_root() {
        let t = insert(&root_tree(), leaf("a"), "r", None).expect("a");
        let t2 = delete(&t, "a").expect("delete a");
        assert!(!t2.contains("a"));
        assert!(children_of(&t2, "r").is_empty());

        assert_eq!(delete(&t2, "r"), Err(StructuralError::CannotDeleteRoot));
        assert_eq!(
            delete(&t2, "a"),
            Err(StructuralError::NodeNotFound("a".to_string()))
        );
    }

    #[test]
    fn test_delete_blocked_on_children() {
        let mut t = root_tree();
        t = insert(&t, Node::with_id("box", NodeKind::Container, Attributes::new()), "r", None)
            .expect("box");
        t = insert(&t, leaf("inner"), "box", None).expect("inner");
        let before = t.clone();

        assert_eq!(
            delete(&t, "box"),
            Err(StructuralError::NodeHasChildren("box".to_string()))
        );
        assert_eq!(t, before);

        // Emptying the container first makes it deletable.
        let t = delete(&t, "inner").expect("inner");
        let t = delete(&t, "box").expect("box");
        assert_eq!(t.len(), 1);
        assert!(t.check_invariants().is_empty());
    }

    #[test]
    fn test_check_invariants_reports_corruption() {
        let json = json!({
            "id": "doc",
            "rootId": "r",
            "nodes": {
                "r": {"id": "r", "type": "container", "children": ["a", "a", "ghost"]},
                "a": {"id": "a", "type": "text", "parentId": "r", "children": []},
                "loose": {"id": "loose", "type": "text"}
            }
        });
        let tree: Tree = serde_json::from_value(json).expect("tree");
        let violations = tree.check_invariants();

        assert!(violations.contains(&InvariantViolation::ChildrenShape("a".to_string())));
        assert!(violations.contains(&InvariantViolation::NotListedByParent {
            node: "a".to_string(),
            parent: "r".to_string()
        }));
        assert!(violations.contains(&InvariantViolation::ChildMismatch {
            parent: "r".to_string(),
            child: "ghost".to_string()
        }));
        assert!(violations.contains(&InvariantViolation::SharedChild("a".to_string())));
        assert!(violations.contains(&InvariantViolation::Detached("loose".to_string())));
    }

    #[test]
    fn test_check_invariants_detects_cycle() {
        let json = json!({
            "id": "doc",
            "rootId": "r",
            "nodes": {
                "r": {"id": "r", "type": "container", "children": []},
                "a": {"id": "a", "type": "container", "parentId": "b", "children": ["b"]},
                "b": {"id": "b", "type": "container", "parentId": "a", "children": ["a"]}
            }
        });
        let tree: Tree = serde_json::from_value(json).expect("tree");
        let violations = tree.check_invariants();
        assert!(violations.contains(&InvariantViolation::Cycle("a".to_string())));
        assert!(violations.contains(&InvariantViolation::Cycle("b".to_string())));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert { parent: usize, anchor: Option<usize>, container: bool },
        Update { target: usize, text: String },
        Delete { target: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (any::<usize>(), proptest::option::of(any::<usize>()), any::<bool>())
                .prop_map(|(parent, anchor, container)| Op::Insert { parent, anchor, container }),
            1 => (any::<usize>(), "[a-z]{0,8}").prop_map(|(target, text)| Op::Update { target, text }),
            2 => any::<usize>().prop_map(|target| Op::Delete { target }),
        ]
    }

    fn pick(tree: &Tree, i: usize) -> String {
        let ids: Vec<&String> = tree.nodes.keys().collect();
        ids[i % ids.len()].clone()
    }

    proptest! {
        #[test]
        fn prop_edits_preserve_invariants(ops in proptest::collection::vec(op_strategy(), 1..60)) {
            let mut tree = root_tree();
            for (n, op) in ops.into_iter().enumerate() {
                let before = tree.clone();
                let result = match op {
                    Op::Insert { parent, anchor, container } => {
                        let parent_id = pick(&tree, parent);
                        let anchor_id = anchor.and_then(|a| {
                            let siblings = tree.get(&parent_id)?.children().to_vec();
                            (!siblings.is_empty()).then(|| siblings[a % siblings.len()].clone())
                        });
                        let kind = if container { NodeKind::Container } else { NodeKind::Text };
                        let node = Node::with_id(format!("n{n}"), kind, Attributes::new());
                        insert(&tree, node, &parent_id, anchor_id.as_deref())
                    }
                    Op::Update { target, text } => {
                        let mut node = tree.get(&pick(&tree, target)).cloned().expect("picked");
                        node.attributes.insert("text".to_string(), json!(text));
                        update(&tree, node)
                    }
                    Op::Delete { target } => delete(&tree, &pick(&tree, target)),
                };
                match result {
                    Ok(next) => tree = next,
                    Err(_) => prop_assert_eq!(&tree, &before),
                }
                let violations = tree.check_invariants();
                prop_assert!(violations.is_empty(), "violations: {:?}", violations);
            }
        }
    }
}
