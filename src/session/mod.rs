//! Editor session: the selection registers plus the save-then-commit
//! protocol around the tree editing engine.
//!
//! An edit is computed against the current tree, handed to the store, and
//! only swapped in once the store confirms. A failed save keeps the old tree
//! and leaves the originating panel open so the user can retry.

use crate::api::{ApiError, ApiResult, TreeStore};
use crate::models::{Node, NodeId, Tree};
use crate::tree::{self, StructuralError};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum SelectionError {
    #[error("a create request needs a parent id")]
    MissingParent,
}

/// A single-slot register: closed, or open with a payload.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Selection<T> {
    slot: Option<T>,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Selection<T> {
    pub fn open(&mut self, payload: T) {
        self.slot = Some(payload);
    }

    pub fn close(&mut self) {
        self.slot = None;
    }

    pub fn current(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.slot.is_some()
    }
}

/// Where a node is about to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CreateRequest {
    parent_id: NodeId,
    after: Option<NodeId>,
}

impl CreateRequest {
    pub fn new(parent_id: Option<&str>, after: Option<&str>) -> Result<Self, SelectionError> {
        match parent_id {
            Some(p) if !p.is_empty() => Ok(Self {
                parent_id: p.to_string(),
                after: after.map(str::to_string),
            }),
            _ => Err(SelectionError::MissingParent),
        }
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }
}

/// The three panels. They are independent: opening one leaves the others
/// as they are.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Registers {
    pub attributes: Selection<Node>,
    pub create: Selection<CreateRequest>,
    pub table_editor: Selection<NodeId>,
}

impl Registers {
    pub fn request_create(
        &mut self,
        parent_id: Option<&str>,
        after: Option<&str>,
    ) -> Result<(), SelectionError> {
        let request = CreateRequest::new(parent_id, after)?;
        self.create.open(request);
        Ok(())
    }

    pub fn close_all(&mut self) {
        self.attributes.close();
        self.create.close();
        self.table_editor.close();
    }

    fn close_for(&mut self, edit: &EditSummary) {
        match edit {
            EditSummary::Insert => self.create.close(),
            EditSummary::Update(id) | EditSummary::Delete(id) => {
                if self.attributes.current().is_some_and(|n| &n.id == id) {
                    self.attributes.close();
                }
                if self.table_editor.current() == Some(id) {
                    self.table_editor.close();
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Edit {
    Insert {
        node: Node,
        parent_id: NodeId,
        after: Option<NodeId>,
    },
    Update(Node),
    Delete(NodeId),
}

impl Edit {
    fn apply(&self, tree: &Tree) -> Result<Tree, StructuralError> {
        match self {
            Edit::Insert {
                node,
                parent_id,
                after,
            } => tree::insert(tree, node.clone(), parent_id, after.as_deref()),
            Edit::Update(node) => tree::update(tree, node.clone()),
            Edit::Delete(id) => tree::delete(tree, id),
        }
    }

    fn summary(&self) -> EditSummary {
        match self {
            Edit::Insert { .. } => EditSummary::Insert,
            Edit::Update(node) => EditSummary::Update(node.id.clone()),
            Edit::Delete(id) => EditSummary::Delete(id.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum EditSummary {
    Insert,
    Update(NodeId),
    Delete(NodeId),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub(crate) enum EditError {
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("save failed: {0}")]
    Persistence(#[from] ApiError),
}

/// An edit computed against the session's tree, waiting on the store.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingEdit {
    tree: Tree,
    summary: EditSummary,
}

impl PendingEdit {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Hand the edited node map to `store`. The result goes to
    /// [`EditorSession::finish`].
    pub async fn save<S: TreeStore + ?Sized>(&self, store: &S) -> ApiResult<()> {
        store.save_tree(&self.tree.id, &self.tree.nodes).await
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EditorSession {
    tree: Tree,
    pub registers: Registers,
    saving: bool,
}

impl EditorSession {
    pub fn new(tree: Tree) -> Self {
        let violations = tree.check_invariants();
        if !violations.is_empty() {
            tracing::warn!(renderer_id = %tree.id, ?violations, "loaded tree is inconsistent");
        }
        Self {
            tree,
            registers: Registers::default(),
            saving: false,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Close every panel unless a save is running. Returns whether anything
    /// was dismissed.
    pub fn dismiss_panels(&mut self) -> bool {
        if self.saving {
            return false;
        }
        self.registers.close_all();
        true
    }

    /// Compute `edit` and mark the session busy. Nothing visible changes
    /// until [`EditorSession::finish`].
    pub fn begin(&mut self, edit: Edit) -> Result<PendingEdit, EditError> {
        if self.saving {
            tracing::warn!(?edit, "edit rejected while a save is in flight");
            return Err(EditError::SaveInFlight);
        }
        let next = edit.apply(&self.tree).map_err(|e| {
            tracing::warn!(error = %e, "edit rejected");
            e
        })?;
        self.saving = true;
        Ok(PendingEdit {
            tree: next,
            summary: edit.summary(),
        })
    }

    /// Commit `pending` if the store accepted it, otherwise keep the current tree.
    pub fn finish(&mut self, pending: PendingEdit, saved: ApiResult<()>) -> Result<(), EditError> {
        self.saving = false;
        match saved {
            Ok(()) => {
                self.registers.close_for(&pending.summary);
                self.tree = pending.tree;
                tracing::info!(renderer_id = %self.tree.id, nodes = self.tree.len(), "edit committed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(renderer_id = %self.tree.id, error = %e, "save failed, keeping previous tree");
                Err(EditError::Persistence(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiErrorKind};
    use crate::models::{Attributes, NodeKind, NodeMap};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct MemoryStore {
        saves: RefCell<Vec<(String, NodeMap)>>,
        fail: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl TreeStore for MemoryStore {
        async fn load_tree(&self, _renderer_id: &str) -> ApiResult<Tree> {
            Err(ApiError::not_found("Renderer"))
        }

        async fn save_tree(&self, renderer_id: &str, nodes: &NodeMap) -> ApiResult<()> {
            if self.fail.get() {
                return Err(ApiError::http(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    "boom".to_string(),
                    "Renderer",
                ));
            }
            self.saves.borrow_mut().push((renderer_id.to_string(), nodes.clone()));
            Ok(())
        }
    }

    // Same steps the builder runs for every submitted edit.
    fn submit(session: &mut EditorSession, store: &MemoryStore, edit: Edit) -> Result<(), EditError> {
        let pending = session.begin(edit)?;
        let saved = block_on(pending.save(store));
        session.finish(pending, saved)
    }

    fn root_tree() -> Tree {
        Tree::with_root("r-1", Node::with_id("root", NodeKind::Container, Attributes::new()))
    }

    fn text(id: &str) -> Node {
        Node::with_id(id, NodeKind::Text, Attributes::new())
    }

    fn insert(id: &str) -> Edit {
        Edit::Insert {
            node: text(id),
            parent_id: "root".to_string(),
            after: None,
        }
    }

    #[test]
    fn test_create_request_requires_parent() {
        assert_eq!(CreateRequest::new(None, None), Err(SelectionError::MissingParent));
        assert_eq!(CreateRequest::new(Some(""), Some("a")), Err(SelectionError::MissingParent));

        let mut registers = Registers::default();
        assert!(registers.request_create(None, None).is_err());
        assert!(!registers.create.is_open());

        registers
            .request_create(Some("root"), Some("a"))
            .expect("valid request");
        let req = registers.create.current().expect("open");
        assert_eq!((req.parent_id(), req.after()), ("root", Some("a")));
    }

    #[test]
    fn test_registers_are_independent() {
        let mut registers = Registers::default();
        registers.attributes.open(text("a"));
        registers.table_editor.open("t".to_string());
        registers
            .request_create(Some("root"), None)
            .expect("valid request");
        assert!(registers.attributes.is_open());
        assert!(registers.table_editor.is_open());
        assert!(registers.create.is_open());

        registers.create.close();
        assert!(registers.attributes.is_open());
        registers.close_all();
        assert_eq!(registers, Registers::default());
    }

    #[test]
    fn test_successful_save_commits_and_closes_panel() {
        let store = MemoryStore::default();
        let mut session = EditorSession::new(root_tree());
        session
            .registers
            .request_create(Some("root"), None)
            .expect("valid request");

        submit(&mut session, &store, insert("a")).expect("edit should commit");

        assert_eq!(session.tree().get("root").map(|n| n.children().to_vec()), Some(vec!["a".to_string()]));
        assert!(!session.registers.create.is_open());
        assert!(!session.is_saving());

        let saves = store.saves.borrow();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "r-1");
        assert!(saves[0].1.contains_key("a"));
    }

    #[test]
    fn test_failed_save_keeps_tree_and_panel() {
        let store = MemoryStore::default();
        store.fail.set(true);
        let mut session = EditorSession::new(root_tree());
        session
            .registers
            .request_create(Some("root"), None)
            .expect("valid request");
        let before = session.tree().clone();

        let err = submit(&mut session, &store, insert("a")).expect_err("save fails");
        assert!(matches!(err, EditError::Persistence(ref e) if e.kind == ApiErrorKind::Http));
        assert_eq!(session.tree(), &before);
        assert!(session.registers.create.is_open());
        assert!(!session.is_saving());

        store.fail.set(false);
        submit(&mut session, &store, insert("a")).expect("retry commits");
        assert!(session.tree().contains("a"));
    }

    #[test]
    fn test_second_edit_rejected_while_saving() {
        let mut session = EditorSession::new(root_tree());
        let pending = session.begin(insert("a")).expect("first edit");
        assert!(session.is_saving());
        assert_eq!(session.begin(insert("b")), Err(EditError::SaveInFlight));

        session.finish(pending, Ok(())).expect("commit");
        assert!(session.begin(insert("b")).is_ok());
    }

    #[test]
    fn test_structural_error_leaves_session_idle() {
        let store = MemoryStore::default();
        let mut session = EditorSession::new(root_tree());
        let err = submit(&mut session, &store, Edit::Delete("root".to_string()))
            .expect_err("root cannot be deleted");
        assert_eq!(err, EditError::Structural(StructuralError::CannotDeleteRoot));
        assert!(!session.is_saving());
        assert!(store.saves.borrow().is_empty());
    }

    #[test]
    fn test_update_and_delete_close_panels_for_that_node() {
        let store = MemoryStore::default();
        let mut session = EditorSession::new(root_tree());
        submit(&mut session, &store, insert("a")).expect("insert");
        submit(&mut session, &store, insert("b")).expect("insert");

        let mut a = session.tree().get("a").cloned().expect("a exists");
        a.attributes.insert("text".to_string(), serde_json::json!("hello"));
        session.registers.attributes.open(a.clone());
        session.registers.table_editor.open("b".to_string());

        submit(&mut session, &store, Edit::Update(a)).expect("update");
        assert!(!session.registers.attributes.is_open());
        assert!(session.registers.table_editor.is_open());
        assert_eq!(
            session.tree().get("a").and_then(|n| n.attributes.get("text").cloned()),
            Some(serde_json::json!("hello"))
        );

        submit(&mut session, &store, Edit::Delete("b".to_string())).expect("delete");
        assert!(!session.registers.table_editor.is_open());
        assert!(!session.tree().contains("b"));
    }

    #[test]
    fn test_dismiss_panels_waits_for_save() {
        let mut session = EditorSession::new(root_tree());
        session.registers.attributes.open(text("root"));
        session.registers.table_editor.open("t".to_string());

        let pending = session.begin(insert("a")).expect("edit");
        assert!(!session.dismiss_panels());
        assert!(session.registers.attributes.is_open());

        session.finish(pending, Ok(())).expect("commit");
        assert!(session.dismiss_panels());
        assert_eq!(session.registers, Registers::default());
    }
}
