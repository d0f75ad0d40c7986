//! Caret and selection types, plus flat-offset conversion.
//!
//! A caret addresses a character position inside a text node. For undo
//! restoration the position is flattened to a character offset over the
//! concatenation of all text nodes in document order, so a snapshot
//! swap can re-resolve the same logical position in the restored tree.

use crate::document::Document;
use crate::node::{NodeId, NodeKind};

/// A position inside a text node, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

/// A selection between two carets. `anchor` is where the selection
/// started, `head` is where it currently ends; head may precede anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomSelection {
    pub anchor: Caret,
    pub head: Caret,
}

impl DomSelection {
    pub fn collapsed(caret: Caret) -> Self {
        Self {
            anchor: caret,
            head: caret,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// Flatten a caret to a character offset over all text in document order.
pub fn caret_to_offset(doc: &Document, caret: Caret) -> usize {
    let mut total = 0;
    for id in doc.text_nodes() {
        if id == caret.node {
            return total + caret.offset.min(doc.arena.text_len(id));
        }
        total += doc.arena.text_len(id);
    }
    total
}

/// Resolve a flat character offset back to a caret in `doc`.
///
/// Offsets past the end clamp to the end of the last text node. Returns
/// `None` only for a document with no text nodes at all.
pub fn offset_to_caret(doc: &Document, offset: usize) -> Option<Caret> {
    let mut remaining = offset;
    let mut last = None;
    for id in doc.text_nodes() {
        let len = doc.arena.text_len(id);
        if remaining <= len {
            return Some(Caret {
                node: id,
                offset: remaining,
            });
        }
        remaining -= len;
        last = Some(Caret { node: id, offset: len });
    }
    last
}

/// Flatten a selection to `(start, end)` character offsets, ordered.
pub fn selection_to_offsets(doc: &Document, sel: &DomSelection) -> (usize, usize) {
    let a = caret_to_offset(doc, sel.anchor);
    let b = caret_to_offset(doc, sel.head);
    if a <= b { (a, b) } else { (b, a) }
}

/// Delete the characters between two flat offsets, removing text nodes
/// that become empty and blocks emptied entirely by the deletion.
/// Returns a caret at the deletion point.
pub fn delete_offset_range(doc: &mut Document, start: usize, end: usize) -> Option<Caret> {
    if start >= end {
        return offset_to_caret(doc, start);
    }

    let mut emptied = Vec::new();
    let mut pos = 0;
    for id in doc.text_nodes() {
        let len = doc.arena.text_len(id);
        let node_start = pos;
        let node_end = pos + len;
        pos = node_end;
        if node_end <= start || node_start >= end {
            continue;
        }
        let cut_from = start.saturating_sub(node_start);
        let cut_to = (end - node_start).min(len);
        if let NodeKind::Text(content) = doc.arena.kind_mut(id) {
            let byte_from = char_to_byte(content, cut_from);
            let byte_to = char_to_byte(content, cut_to);
            content.replace_range(byte_from..byte_to, "");
            if content.is_empty() && cut_from == 0 && cut_to == len {
                emptied.push(id);
            }
        }
    }

    // Drop text nodes the range fully consumed, then any block left with
    // no children at all. The block holding the caret keeps its (possibly
    // empty) first surviving text node.
    let caret = offset_to_caret(doc, start);
    for id in emptied {
        if Some(id) == caret.map(|c| c.node) {
            continue;
        }
        let parent = doc.arena.parent(id);
        doc.arena.detach(id);
        let mut current = parent;
        while let Some(p) = current {
            if p != doc.root && doc.arena.children(p).is_empty() {
                let grand = doc.arena.parent(p);
                doc.arena.detach(p);
                current = grand;
            } else {
                break;
            }
        }
    }

    offset_to_caret(doc, start).or(caret)
}

fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}
