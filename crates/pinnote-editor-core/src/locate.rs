//! Block locator: resolve a caret position to its enclosing structures.

use crate::document::Document;
use crate::node::{NodeId, NodeKind};

/// The nearest ancestor of `id` that is a direct child of the root.
/// Returns `id` itself if it already sits at the top level, or `None`
/// if the node is detached or is the root.
pub fn enclosing_top_block(doc: &Document, id: NodeId) -> Option<NodeId> {
    if id == doc.root {
        return None;
    }
    if doc.arena.parent(id) == Some(doc.root) {
        return Some(id);
    }
    let mut last = id;
    for ancestor in doc.arena.ancestors(id) {
        if ancestor == doc.root {
            return Some(last);
        }
        last = ancestor;
    }
    None
}

/// Nearest `ListItem` ancestor, including `id` itself.
pub fn enclosing_list_item(doc: &Document, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(doc.arena.ancestors(id))
        .find(|&n| matches!(doc.arena.kind(n), NodeKind::ListItem))
}

/// Nearest `TaskItem` ancestor, including `id` itself.
pub fn enclosing_task_item(doc: &Document, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(doc.arena.ancestors(id))
        .find(|&n| matches!(doc.arena.kind(n), NodeKind::TaskItem { .. }))
}

/// Nearest `TableCell` ancestor, including `id` itself.
pub fn enclosing_table_cell(doc: &Document, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(doc.arena.ancestors(id))
        .find(|&n| matches!(doc.arena.kind(n), NodeKind::TableCell { .. }))
}

/// Whether `id` sits anywhere inside one of the given wrapper kinds.
pub fn inside_kind(doc: &Document, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> bool {
    std::iter::once(id)
        .chain(doc.arena.ancestors(id))
        .any(|n| pred(doc.arena.kind(n)))
}

/// The title-heading guard: a level-1 heading that is the document's
/// first top-level block is protected from structural conversion while
/// the document has other content. Converting it away would destroy the
/// note's title.
pub fn is_protected_heading(doc: &Document, block: NodeId) -> bool {
    doc.arena.first_child(doc.root) == Some(block)
        && matches!(doc.arena.kind(block), NodeKind::Heading(1))
        && doc.arena.children(doc.root).len() > 1
}
