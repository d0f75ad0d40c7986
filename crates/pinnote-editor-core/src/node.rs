//! Document tree storage: an arena of block and inline nodes.
//!
//! Every node lives in a flat `NodeArena` and is addressed by a stable
//! `NodeId`. Parent/child links are explicit, so editing operations can
//! walk up (ancestor queries) and sideways (sibling insertion) the same
//! way a DOM-based editor would, without any ambient global state.

use smol_str::SmolStr;

/// Stable handle into a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which flavor of list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// The node variant. Blocks and inlines share one enum so the arena can
/// hold the whole tree; `is_block`/`is_inline` classify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per document, never detached.
    Root,
    Paragraph,
    /// Heading level 1-6.
    Heading(u8),
    List(ListKind),
    ListItem,
    TaskList,
    TaskItem { checked: bool },
    Blockquote,
    CodeBlock,
    Table,
    TableRow,
    TableCell { header: bool },
    HorizontalRule,
    /// A soft line break between runs of root-level text.
    LineBreak,
    /// A text run. The only node kind that carries character content.
    Text(String),
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Highlight,
    InlineCode,
    Link { href: SmolStr },
    Image { src: String },
}

impl NodeKind {
    /// Block-level nodes: the units the block locator resolves to.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading(_)
                | NodeKind::List(_)
                | NodeKind::ListItem
                | NodeKind::TaskList
                | NodeKind::TaskItem { .. }
                | NodeKind::Blockquote
                | NodeKind::CodeBlock
                | NodeKind::Table
                | NodeKind::TableRow
                | NodeKind::TableCell { .. }
                | NodeKind::HorizontalRule
        )
    }

    /// Inline wrappers that carry formatting around nested content.
    pub fn is_inline_wrapper(&self) -> bool {
        matches!(
            self,
            NodeKind::Bold
                | NodeKind::Italic
                | NodeKind::Underline
                | NodeKind::Strikethrough
                | NodeKind::Highlight
                | NodeKind::InlineCode
                | NodeKind::Link { .. }
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }
}

/// One tree node: a kind plus explicit parent/child links.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Flat storage for every node in one document.
///
/// Nodes are never reclaimed during an editing session; a detached node
/// simply has no parent and is unreachable from the root. Undo snapshots
/// clone the arena wholesale, and structural comparison walks only the
/// reachable tree, so stale entries are harmless.
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Allocate a text node.
    pub fn text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Index of `id` within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.child_index(id)?;
        if idx == 0 {
            None
        } else {
            Some(self.children(parent)[idx - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.child_index(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    // === Structural mutations ===

    /// Remove `id` from its parent's child list. No-op if already detached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            let children = &mut self.nodes[parent.index()].children;
            children.retain(|&c| c != id);
            self.nodes[id.index()].parent = None;
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Insert `new` immediately before `sibling` under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        let parent = self
            .parent(sibling)
            .expect("insert_before target must be attached");
        self.detach(new);
        let idx = self.child_index(sibling).unwrap();
        self.nodes[parent.index()].children.insert(idx, new);
        self.nodes[new.index()].parent = Some(parent);
    }

    /// Insert `new` immediately after `sibling` under the same parent.
    pub fn insert_after(&mut self, sibling: NodeId, new: NodeId) {
        let parent = self
            .parent(sibling)
            .expect("insert_after target must be attached");
        self.detach(new);
        let idx = self.child_index(sibling).unwrap();
        self.nodes[parent.index()].children.insert(idx + 1, new);
        self.nodes[new.index()].parent = Some(parent);
    }

    /// Replace `old` with `new` at the same tree position; `old` is detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Wrap `target` in `wrapper`: the wrapper takes the target's place
    /// and the target becomes the wrapper's only child.
    pub fn wrap(&mut self, target: NodeId, wrapper: NodeId) {
        self.insert_before(target, wrapper);
        self.append_child(wrapper, target);
    }

    /// Splice `wrapper`'s children up into its parent at the wrapper's
    /// position, then detach the wrapper.
    pub fn unwrap(&mut self, wrapper: NodeId) {
        let children: Vec<NodeId> = self.children(wrapper).to_vec();
        let mut anchor = wrapper;
        for child in children {
            self.insert_after(anchor, child);
            anchor = child;
        }
        self.detach(wrapper);
    }

    /// Split a text node at a character offset, keeping the head in place
    /// and returning a new text node holding the tail. The tail is NOT
    /// attached; callers place it where the edit requires.
    pub fn split_text(&mut self, id: NodeId, char_offset: usize) -> NodeId {
        let tail = match self.kind_mut(id) {
            NodeKind::Text(content) => {
                let byte = content
                    .char_indices()
                    .nth(char_offset)
                    .map(|(b, _)| b)
                    .unwrap_or(content.len());
                content.split_off(byte)
            }
            _ => panic!("split_text on non-text node"),
        };
        self.text(tail)
    }

    // === Queries ===

    /// Character length of a text node; zero for anything else.
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text(content) => content.chars().count(),
            _ => 0,
        }
    }

    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Concatenated text content of the subtree rooted at `id`,
    /// in document order.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::LineBreak => out.push('\n'),
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Preorder traversal of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Walk ancestors of `id` (excluding `id` itself), innermost first.
    pub fn ancestors(&self, id: NodeId) -> AncestorIter<'_> {
        AncestorIter {
            arena: self,
            current: self.parent(id),
        }
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AncestorIter<'a> {
    arena: &'a NodeArena,
    current: Option<NodeId>,
}

impl Iterator for AncestorIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.arena.parent(id);
        Some(id)
    }
}
