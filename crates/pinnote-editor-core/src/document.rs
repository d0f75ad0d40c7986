//! The document: a node arena plus its root, with structural queries.

use crate::markup::{self, MarkupError};
use crate::node::{NodeArena, NodeId, NodeKind};

/// An editable rich-text document.
///
/// Cloning a `Document` snapshots the whole tree; the history manager
/// relies on this for undo checkpoints.
#[derive(Debug, Clone)]
pub struct Document {
    pub arena: NodeArena,
    pub root: NodeId,
}

impl Document {
    /// An empty document: a root with one empty paragraph so the caret
    /// has somewhere to sit.
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(NodeKind::Root);
        let para = arena.alloc(NodeKind::Paragraph);
        let text = arena.text("");
        arena.append_child(root, para);
        arena.append_child(para, text);
        Self { arena, root }
    }

    /// Parse a document from its persisted markup form.
    pub fn from_markup(input: &str) -> Result<Self, MarkupError> {
        markup::parse(input)
    }

    /// Serialize to the persisted markup form.
    pub fn to_markup(&self) -> String {
        markup::serialize(self)
    }

    /// Plain text of the whole document, used for search previews.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for (i, &child) in self.arena.children(self.root).iter().enumerate() {
            let text = self.arena.subtree_text(child);
            if i > 0 && !out.ends_with('\n') && self.arena.kind(child).is_block() {
                out.push('\n');
            }
            out.push_str(&text);
        }
        out
    }

    /// Structural equality over the reachable tree. Node identity and
    /// stale arena entries are ignored; only kinds, text, and child
    /// order matter.
    pub fn same_structure(&self, other: &Document) -> bool {
        same_subtree(self, self.root, other, other.root)
    }

    /// Every text node reachable from the root, in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.arena
            .descendants(self.root)
            .into_iter()
            .filter(|&id| self.arena.kind(id).is_text())
            .collect()
    }

    /// The last text node in document order, if any.
    pub fn last_text_node(&self) -> Option<NodeId> {
        self.text_nodes().into_iter().last()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.same_structure(other)
    }
}

fn same_subtree(a: &Document, a_id: NodeId, b: &Document, b_id: NodeId) -> bool {
    if a.arena.kind(a_id) != b.arena.kind(b_id) {
        return false;
    }
    let a_children = a.arena.children(a_id);
    let b_children = b.arena.children(b_id);
    if a_children.len() != b_children.len() {
        return false;
    }
    a_children
        .iter()
        .zip(b_children.iter())
        .all(|(&ac, &bc)| same_subtree(a, ac, b, bc))
}
