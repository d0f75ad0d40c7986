//! Central command dispatch.
//!
//! Every command follows the same shape: ensure a caret (defaulting to
//! the document end), perform the structural mutation, place the caret
//! in the result, checkpoint history, and notify the host. Missing
//! state degrades to an `Ok(false)` no-op; only the table last-row and
//! last-column deletions surface an error.

use smol_str::SmolStr;
use thiserror::Error;

use crate::caret::{self, Caret};
use crate::command::Command;
use crate::document::Document;
use crate::editor::Editor;
use crate::host::EditorHost;
use crate::locate;
use crate::node::{ListKind, NodeId, NodeKind};
use crate::table;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("a table must keep at least one row")]
    LastTableRow,
    #[error("a table must keep at least one column")]
    LastTableColumn,
}

/// Run one command. Returns `Ok(true)` when the document changed.
pub fn execute_command<H: EditorHost>(
    editor: &mut Editor,
    host: &mut H,
    command: &Command,
) -> Result<bool, CommandError> {
    tracing::debug!(?command, "execute command");
    let changed = match command {
        Command::Heading(level) => convert_heading(editor, *level),
        Command::List(kind) => convert_list(editor, *kind),
        Command::TaskList => convert_task_list(editor),
        Command::Blockquote => convert_blockquote(editor),
        Command::Link => insert_link(editor, host),
        Command::InlineCode => wrap_inline_code(editor),
        Command::CodeBlock => insert_code_block(editor),
        Command::InsertTable { rows, cols } => insert_table(editor, *rows, *cols),
        Command::InsertTableRow => table_edit(editor, table::insert_row_below)?,
        Command::InsertTableColumn => table_edit(editor, table::insert_column_right)?,
        Command::DeleteTableRow => {
            table_delete(editor, table::delete_row, CommandError::LastTableRow)?
        }
        Command::DeleteTableColumn => {
            table_delete(editor, table::delete_column, CommandError::LastTableColumn)?
        }
        Command::IndentListItem => indent_at_caret(editor),
        Command::OutdentListItem => outdent_at_caret(editor),
        Command::ToggleBold => toggle_inline(editor, &NodeKind::Bold),
        Command::ToggleItalic => toggle_inline(editor, &NodeKind::Italic),
        Command::ToggleUnderline => toggle_inline(editor, &NodeKind::Underline),
        Command::ToggleStrikethrough => toggle_inline(editor, &NodeKind::Strikethrough),
        Command::ToggleHighlight => toggle_inline(editor, &NodeKind::Highlight),
        Command::Undo => editor.undo(),
        Command::Redo => editor.redo(),
    };
    if changed {
        if !matches!(command, Command::Undo | Command::Redo) {
            editor.checkpoint();
        }
        host.content_changed();
    }
    Ok(changed)
}

// === Line extraction ===

/// Split the selected range into logical lines for multi-line list and
/// task conversion: one line per intersected block, further split on
/// internal line breaks, trimmed, empties dropped.
pub fn extract_lines(doc: &Document, start: usize, end: usize) -> Vec<SmolStr> {
    let mut lines = Vec::new();
    for block in blocks_in_range(doc, start, end) {
        let text = doc.arena.subtree_text(block);
        for line in text.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(SmolStr::new(trimmed));
            }
        }
    }
    if lines.is_empty() {
        // No block boundaries hit: fall back to the flat selected text.
        let slice = flat_text_slice(doc, start, end);
        for line in slice.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(SmolStr::new(trimmed));
            }
        }
    }
    lines
}

/// Top-level blocks whose flat text span intersects `[start, end)`.
/// Spans are measured over text nodes only, the same basis the caret
/// offsets use.
fn blocks_in_range(doc: &Document, start: usize, end: usize) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut pos = 0;
    for &block in doc.arena.children(doc.root) {
        let len: usize = doc
            .arena
            .descendants(block)
            .into_iter()
            .map(|n| doc.arena.text_len(n))
            .sum();
        let block_start = pos;
        let block_end = pos + len;
        pos = block_end;
        if !doc.arena.kind(block).is_block() {
            continue;
        }
        if block_end > start && block_start < end {
            out.push(block);
        }
    }
    out
}

/// The characters between two flat offsets, over the concatenated text
/// nodes in document order. This matches `caret::caret_to_offset`, which
/// never counts block separators.
fn flat_text_slice(doc: &Document, start: usize, end: usize) -> String {
    let mut out = String::new();
    let mut pos = 0;
    for id in doc.text_nodes() {
        let Some(content) = doc.arena.text_of(id) else {
            continue;
        };
        for c in content.chars() {
            if pos >= end {
                return out;
            }
            if pos >= start {
                out.push(c);
            }
            pos += 1;
        }
    }
    out
}

// === Block conversions ===

fn caret_block(editor: &mut Editor) -> Option<(Caret, NodeId)> {
    let caret = editor.caret_or_end()?;
    let block = locate::enclosing_top_block(&editor.doc, caret.node)?;
    Some((caret, block))
}

fn refuse_protected(editor: &Editor, block: NodeId) -> bool {
    if locate::is_protected_heading(&editor.doc, block) {
        tracing::warn!("refusing structural edit on the title heading");
        true
    } else {
        false
    }
}

fn place_caret_end_of(editor: &mut Editor, node: NodeId) {
    let last = editor
        .doc
        .arena
        .descendants(node)
        .into_iter()
        .filter(|&n| editor.doc.arena.kind(n).is_text())
        .last();
    if let Some(text) = last {
        let len = editor.doc.arena.text_len(text);
        editor.set_caret(Caret {
            node: text,
            offset: len,
        });
    }
}

fn convert_heading(editor: &mut Editor, level: u8) -> bool {
    let level = level.clamp(1, 6);
    let Some((_, block)) = caret_block(editor) else {
        return false;
    };
    if refuse_protected(editor, block) {
        return false;
    }

    let (start, end) = editor.selection_offsets();

    if start != end {
        // Only the selected text moves into the heading; whatever else
        // the block holds stays in place around it.
        let text = flat_text_slice(&editor.doc, start, end);
        let Some(at) = caret::delete_offset_range(&mut editor.doc, start, end) else {
            return false;
        };
        let arena = &mut editor.doc.arena;
        let tail = arena.split_text(at.node, at.offset);
        if arena.text_len(tail) > 0 {
            arena.insert_after(at.node, tail);
        }
        let heading = arena.alloc(NodeKind::Heading(level));
        let text_node = arena.text(text);
        arena.append_child(heading, text_node);
        arena.insert_after(at.node, heading);
        place_caret_end_of(editor, heading);
        return true;
    }

    let children: Vec<NodeId> = editor.doc.arena.children(block).to_vec();
    let arena = &mut editor.doc.arena;
    let heading = arena.alloc(NodeKind::Heading(level));
    for child in children {
        arena.append_child(heading, child);
    }
    if arena.children(heading).is_empty() {
        let text = arena.text("");
        arena.append_child(heading, text);
    }
    arena.replace(block, heading);
    place_caret_end_of(editor, heading);
    true
}

fn convert_list(editor: &mut Editor, kind: ListKind) -> bool {
    let Some((caret, block)) = caret_block(editor) else {
        return false;
    };

    // Toggle off: inside a list of the same kind, flatten it back to
    // one paragraph per item.
    if let Some(list) = std::iter::once(caret.node)
        .chain(editor.doc.arena.ancestors(caret.node))
        .find(|&n| editor.doc.arena.kind(n) == &NodeKind::List(kind))
    {
        return flatten_container_to_paragraphs(editor, list);
    }

    if refuse_protected(editor, block) {
        return false;
    }

    let (start, end) = editor.selection_offsets();
    let lines = if start != end {
        extract_lines(&editor.doc, start, end)
    } else {
        Vec::new()
    };

    let arena = &mut editor.doc.arena;
    let list = arena.alloc(NodeKind::List(kind));
    if lines.is_empty() {
        // Single-item list from the block's own text, or a placeholder.
        let text = editor.doc.arena.subtree_text(block);
        let arena = &mut editor.doc.arena;
        let item = arena.alloc(NodeKind::ListItem);
        let text_node = arena.text(text.trim());
        arena.append_child(item, text_node);
        arena.append_child(list, item);
        arena.replace(block, list);
    } else {
        for line in &lines {
            let item = arena.alloc(NodeKind::ListItem);
            let text_node = arena.text(line.as_str());
            arena.append_child(item, text_node);
            arena.append_child(list, item);
        }
        replace_range_blocks(editor, start, end, list);
    }
    place_caret_end_of(editor, list);
    true
}

fn convert_task_list(editor: &mut Editor) -> bool {
    let Some((caret, block)) = caret_block(editor) else {
        return false;
    };

    // Toggle off: inside a task item, the containing run of tasks
    // flattens back to paragraphs.
    if locate::enclosing_task_item(&editor.doc, caret.node).is_some() {
        if let Some(list) = std::iter::once(caret.node)
            .chain(editor.doc.arena.ancestors(caret.node))
            .find(|&n| matches!(editor.doc.arena.kind(n), NodeKind::TaskList))
        {
            return flatten_container_to_paragraphs(editor, list);
        }
    }

    if refuse_protected(editor, block) {
        return false;
    }

    let (start, end) = editor.selection_offsets();
    let lines = if start != end {
        extract_lines(&editor.doc, start, end)
    } else {
        Vec::new()
    };

    let arena = &mut editor.doc.arena;
    let list = arena.alloc(NodeKind::TaskList);
    if lines.is_empty() {
        let item = arena.alloc(NodeKind::TaskItem { checked: false });
        let text = arena.text("");
        arena.append_child(item, text);
        arena.append_child(list, item);
        if matches!(arena.kind(block), NodeKind::Paragraph)
            && editor.doc.arena.subtree_text(block).trim().is_empty()
        {
            editor.doc.arena.replace(block, list);
        } else {
            editor.doc.arena.insert_after(block, list);
        }
    } else {
        for line in &lines {
            let item = arena.alloc(NodeKind::TaskItem { checked: false });
            let text = arena.text(line.as_str());
            arena.append_child(item, text);
            arena.append_child(list, item);
        }
        replace_range_blocks(editor, start, end, list);
    }
    place_caret_end_of(editor, list);
    true
}

fn convert_blockquote(editor: &mut Editor) -> bool {
    let Some((_, block)) = caret_block(editor) else {
        return false;
    };
    if refuse_protected(editor, block) {
        return false;
    }
    if matches!(editor.doc.arena.kind(block), NodeKind::Blockquote) {
        return false;
    }
    let children: Vec<NodeId> = editor.doc.arena.children(block).to_vec();
    let arena = &mut editor.doc.arena;
    let quote = arena.alloc(NodeKind::Blockquote);
    for child in children {
        arena.append_child(quote, child);
    }
    if arena.children(quote).is_empty() {
        let text = arena.text("");
        arena.append_child(quote, text);
    }
    arena.replace(block, quote);
    place_caret_end_of(editor, quote);
    true
}

/// Replace the top-level blocks intersecting `[start, end)` with `new`,
/// which takes the first block's position.
fn replace_range_blocks(editor: &mut Editor, start: usize, end: usize, new: NodeId) {
    let victims = blocks_in_range(&editor.doc, start, end);
    let arena = &mut editor.doc.arena;
    match victims.first() {
        Some(&first) => {
            arena.insert_before(first, new);
            for victim in victims {
                arena.detach(victim);
            }
        }
        None => arena.append_child(editor.doc.root, new),
    }
}

/// Flatten a list or task-list container into one paragraph per item.
fn flatten_container_to_paragraphs(editor: &mut Editor, container: NodeId) -> bool {
    let items: Vec<NodeId> = editor.doc.arena.children(container).to_vec();
    let mut anchor = container;
    let mut first_para = None;
    for item in items {
        let text = editor.doc.arena.subtree_text(item);
        let arena = &mut editor.doc.arena;
        let para = arena.alloc(NodeKind::Paragraph);
        let text_node = arena.text(text.trim());
        arena.append_child(para, text_node);
        arena.insert_after(anchor, para);
        anchor = para;
        first_para.get_or_insert(para);
    }
    editor.doc.arena.detach(container);
    match first_para {
        Some(para) => place_caret_end_of(editor, para),
        None => return false,
    }
    true
}

// === Inline commands ===

/// Wrap or unwrap an inline formatting node around the selection.
/// Collapsed selections are a no-op.
fn toggle_inline(editor: &mut Editor, kind: &NodeKind) -> bool {
    let Some(sel) = editor.selection else {
        return false;
    };
    if sel.is_collapsed() {
        return false;
    }

    // Unwrap when the selection already sits inside this wrapper.
    let wrapper = std::iter::once(sel.head.node)
        .chain(editor.doc.arena.ancestors(sel.head.node))
        .find(|&n| editor.doc.arena.kind(n) == kind);
    if let Some(wrapper) = wrapper {
        let (start, end) = editor.selection_offsets();
        editor.doc.arena.unwrap(wrapper);
        restore_selection(editor, start, end);
        return true;
    }

    let (start, end) = caret::selection_to_offsets(&editor.doc, &sel);

    // Single-text-node selections keep surrounding structure; anything
    // wider is rebuilt from its plain text.
    if sel.anchor.node == sel.head.node {
        let node = sel.head.node;
        let from = sel.anchor.offset.min(sel.head.offset);
        let to = sel.anchor.offset.max(sel.head.offset);
        let arena = &mut editor.doc.arena;
        let tail = arena.split_text(node, to);
        if arena.text_len(tail) > 0 {
            arena.insert_after(node, tail);
        }
        let selected = arena.split_text(node, from);
        let wrapper_node = arena.alloc(kind.clone());
        arena.append_child(wrapper_node, selected);
        arena.insert_after(node, wrapper_node);
        if arena.text_len(node) == 0 {
            arena.detach(node);
        }
        restore_selection(editor, start, end);
        return true;
    }

    let text = flat_text_slice(&editor.doc, start, end);
    let Some(at) = caret::delete_offset_range(&mut editor.doc, start, end) else {
        return false;
    };
    let arena = &mut editor.doc.arena;
    let tail = arena.split_text(at.node, at.offset);
    if arena.text_len(tail) > 0 {
        arena.insert_after(at.node, tail);
    }
    let wrapper_node = arena.alloc(kind.clone());
    let text_node = arena.text(text);
    arena.append_child(wrapper_node, text_node);
    arena.insert_after(at.node, wrapper_node);
    restore_selection(editor, start, end);
    true
}

fn restore_selection(editor: &mut Editor, start: usize, end: usize) {
    let anchor = caret::offset_to_caret(&editor.doc, start);
    let head = caret::offset_to_caret(&editor.doc, end);
    editor.selection = match (anchor, head) {
        (Some(anchor), Some(head)) => Some(crate::caret::DomSelection { anchor, head }),
        _ => None,
    };
}

fn insert_link<H: EditorHost>(editor: &mut Editor, host: &mut H) -> bool {
    let Some(url) = host.prompt_link_url() else {
        return false;
    };
    let Some(caret) = editor.caret_or_end() else {
        return false;
    };
    let (start, end) = editor.selection_offsets();
    let label = if start != end {
        flat_text_slice(&editor.doc, start, end)
    } else {
        url.clone()
    };

    let at = if start != end {
        match caret::delete_offset_range(&mut editor.doc, start, end) {
            Some(c) => c,
            None => return false,
        }
    } else {
        caret
    };

    let arena = &mut editor.doc.arena;
    if !arena.kind(at.node).is_text() {
        return false;
    }
    let tail = arena.split_text(at.node, at.offset);
    if arena.text_len(tail) > 0 {
        arena.insert_after(at.node, tail);
    }
    let link = arena.alloc(NodeKind::Link {
        href: url.as_str().into(),
    });
    let text_node = arena.text(label);
    arena.append_child(link, text_node);
    arena.insert_after(at.node, link);
    place_caret_end_of(editor, link);
    true
}

fn wrap_inline_code(editor: &mut Editor) -> bool {
    let Some(sel) = editor.selection else {
        return insert_placeholder_inline_code(editor);
    };
    if sel.is_collapsed() {
        return insert_placeholder_inline_code(editor);
    }
    toggle_inline(editor, &NodeKind::InlineCode)
}

fn insert_placeholder_inline_code(editor: &mut Editor) -> bool {
    let Some(caret) = editor.caret_or_end() else {
        return false;
    };
    if !editor.doc.arena.kind(caret.node).is_text() {
        return false;
    }
    let arena = &mut editor.doc.arena;
    let tail = arena.split_text(caret.node, caret.offset);
    if arena.text_len(tail) > 0 {
        arena.insert_after(caret.node, tail);
    }
    let code = arena.alloc(NodeKind::InlineCode);
    let text = arena.text("code");
    arena.append_child(code, text);
    arena.insert_after(caret.node, code);
    place_caret_end_of(editor, code);
    true
}

fn insert_code_block(editor: &mut Editor) -> bool {
    let Some((_, block)) = caret_block(editor) else {
        return false;
    };
    let (start, end) = editor.selection_offsets();
    let content = if start != end {
        flat_text_slice(&editor.doc, start, end)
    } else {
        String::new()
    };

    let arena = &mut editor.doc.arena;
    let code = arena.alloc(NodeKind::CodeBlock);
    let text = arena.text(content);
    arena.append_child(code, text);
    if matches!(arena.kind(block), NodeKind::Paragraph)
        && editor.doc.arena.subtree_text(block).trim().is_empty()
    {
        editor.doc.arena.replace(block, code);
    } else {
        editor.doc.arena.insert_after(block, code);
    }
    place_caret_end_of(editor, code);
    true
}

// === Tables ===

fn insert_table(editor: &mut Editor, rows: usize, cols: usize) -> bool {
    let Some((_, block)) = caret_block(editor) else {
        return false;
    };
    let grid = table::build_table(&mut editor.doc, rows, cols);
    editor.doc.arena.insert_after(block, grid);
    // Caret in the first header cell.
    if let Some(first_text) = editor
        .doc
        .arena
        .descendants(grid)
        .into_iter()
        .find(|&n| editor.doc.arena.kind(n).is_text())
    {
        editor.set_caret(Caret {
            node: first_text,
            offset: 0,
        });
    }
    true
}

fn table_edit(
    editor: &mut Editor,
    op: fn(&mut Document, NodeId) -> bool,
) -> Result<bool, CommandError> {
    let Some(caret) = editor.caret_or_end() else {
        return Ok(false);
    };
    let Some(cell) = locate::enclosing_table_cell(&editor.doc, caret.node) else {
        return Ok(false);
    };
    Ok(op(&mut editor.doc, cell))
}

fn table_delete(
    editor: &mut Editor,
    op: fn(&mut Document, NodeId) -> bool,
    refusal: CommandError,
) -> Result<bool, CommandError> {
    let Some(caret) = editor.caret_or_end() else {
        return Ok(false);
    };
    let Some(cell) = locate::enclosing_table_cell(&editor.doc, caret.node) else {
        return Ok(false);
    };
    let (start, _) = editor.selection_offsets();
    if op(&mut editor.doc, cell) {
        editor.set_caret_at_offset(start.min(editor.doc.text_content().chars().count()));
        Ok(true)
    } else {
        tracing::warn!(error = %refusal, "table edit rejected");
        Err(refusal)
    }
}

// === List nesting ===

/// Move a list item into a nested list inside its preceding sibling.
/// No-op (false) without a preceding sibling item.
pub fn indent_list_item(doc: &mut Document, item: NodeId) -> bool {
    let Some(prev) = doc.arena.prev_sibling(item) else {
        return false;
    };
    if !matches!(doc.arena.kind(prev), NodeKind::ListItem) {
        return false;
    }
    let Some(list) = doc.arena.parent(item) else {
        return false;
    };
    let list_kind = match doc.arena.kind(list) {
        NodeKind::List(kind) => *kind,
        _ => return false,
    };

    // Reuse a trailing nested list in the previous item if present.
    let nested = doc
        .arena
        .last_child(prev)
        .filter(|&n| matches!(doc.arena.kind(n), NodeKind::List(_)));
    let target = match nested {
        Some(n) => n,
        None => {
            let arena = &mut doc.arena;
            let new_list = arena.alloc(NodeKind::List(list_kind));
            arena.append_child(prev, new_list);
            new_list
        }
    };
    doc.arena.append_child(target, item);
    true
}

/// Move a nested list item up one level, to directly follow the item
/// that owned its list. No-op (false) at the top level.
pub fn outdent_list_item(doc: &mut Document, item: NodeId) -> bool {
    let Some(list) = doc.arena.parent(item) else {
        return false;
    };
    if !matches!(doc.arena.kind(list), NodeKind::List(_)) {
        return false;
    }
    let Some(owner) = doc.arena.parent(list) else {
        return false;
    };
    if !matches!(doc.arena.kind(owner), NodeKind::ListItem) {
        return false;
    }
    doc.arena.insert_after(owner, item);
    if doc.arena.children(list).is_empty() {
        doc.arena.detach(list);
    }
    true
}

fn indent_at_caret(editor: &mut Editor) -> bool {
    let Some(caret) = editor.caret_or_end() else {
        return false;
    };
    let Some(item) = locate::enclosing_list_item(&editor.doc, caret.node) else {
        return false;
    };
    indent_list_item(&mut editor.doc, item)
}

fn outdent_at_caret(editor: &mut Editor) -> bool {
    let Some(caret) = editor.caret_or_end() else {
        return false;
    };
    let Some(item) = locate::enclosing_list_item(&editor.doc, caret.node) else {
        return false;
    };
    outdent_list_item(&mut editor.doc, item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::DomSelection;
    use crate::host::RecordingHost;
    use pretty_assertions::assert_eq;

    fn editor_with_caret(markup: &str, offset: usize) -> Editor {
        let mut editor = Editor::with_content(markup).unwrap();
        editor.set_caret_at_offset(offset);
        editor
    }

    fn select(editor: &mut Editor, start: usize, end: usize) {
        let anchor = caret::offset_to_caret(&editor.doc, start).unwrap();
        let head = caret::offset_to_caret(&editor.doc, end).unwrap();
        editor.selection = Some(DomSelection { anchor, head });
    }

    fn run(editor: &mut Editor, command: Command) -> bool {
        let mut host = RecordingHost::default();
        execute_command(editor, &mut host, &command).unwrap()
    }

    #[test]
    fn test_heading_converts_block() {
        let mut editor = editor_with_caret("<p>hello</p>", 3);
        assert!(run(&mut editor, Command::Heading(2)));
        assert_eq!(editor.content(), "<h2>hello</h2>");
    }

    #[test]
    fn test_heading_refused_on_title() {
        let mut editor = editor_with_caret("<h1>Title</h1><p>body</p>", 2);
        assert!(!run(&mut editor, Command::Heading(3)));
        assert_eq!(editor.content(), "<h1>Title</h1><p>body</p>");
    }

    #[test]
    fn test_heading_allowed_on_lone_title() {
        let mut editor = editor_with_caret("<h1>Title</h1>", 2);
        assert!(run(&mut editor, Command::Heading(3)));
        assert_eq!(editor.content(), "<h3>Title</h3>");
    }

    #[test]
    fn test_heading_wraps_selection_only() {
        let mut editor = Editor::with_content("<p>make this heading</p>").unwrap();
        select(&mut editor, 5, 9);
        assert!(run(&mut editor, Command::Heading(2)));
        // The unselected text of the block survives around the heading.
        assert_eq!(editor.content(), "<p>make <h2>this</h2> heading</p>");
    }

    #[test]
    fn test_list_from_single_block() {
        let mut editor = editor_with_caret("<p>milk</p>", 2);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<ul><li>milk</li></ul>");
    }

    #[test]
    fn test_list_from_multiline_selection() {
        let mut editor = Editor::with_content("<p>one</p><p>two</p><p>three</p>").unwrap();
        select(&mut editor, 0, 11);
        assert!(run(&mut editor, Command::List(ListKind::Ordered)));
        assert_eq!(
            editor.content(),
            "<ol><li>one</li><li>two</li><li>three</li></ol>"
        );
    }

    #[test]
    fn test_list_toggle_off_restores_paragraphs() {
        let mut editor = editor_with_caret("<ul><li>one</li><li>two</li></ul>", 1);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_list_toggle_roundtrip() {
        let mut editor = editor_with_caret("<p>item</p>", 2);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        editor.set_caret_at_offset(2);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<p>item</p>");
    }

    #[test]
    fn test_list_toggle_law_per_paragraph() {
        // Off: one paragraph per item. On again over the paragraphs:
        // one item per paragraph, same text.
        let mut editor = editor_with_caret("<ul><li>one</li><li>two</li></ul>", 1);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<p>one</p><p>two</p>");

        select(&mut editor, 0, 6);
        assert!(run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_list_refused_on_title() {
        let mut editor = editor_with_caret("<h1>Title</h1><p>x</p>", 2);
        assert!(!run(&mut editor, Command::List(ListKind::Bullet)));
        assert_eq!(editor.content(), "<h1>Title</h1><p>x</p>");
    }

    #[test]
    fn test_different_list_kind_is_not_toggle_off() {
        let mut editor = editor_with_caret("<ul><li>one</li></ul>", 1);
        // An ordered-list command inside a bullet list converts rather
        // than toggling off.
        assert!(run(&mut editor, Command::List(ListKind::Ordered)));
        assert!(editor.content().contains("<ol>"));
        assert!(!editor.content().contains("<ul>"));
    }

    #[test]
    fn test_task_list_toggle_off() {
        let src = "<div class=\"task-list\"><div class=\"task-item\" data-checked=\"true\"><span class=\"task-label\">milk</span></div><div class=\"task-item\" data-checked=\"false\"><span class=\"task-label\">eggs</span></div></div>";
        let mut editor = editor_with_caret(src, 1);
        assert!(run(&mut editor, Command::TaskList));
        assert_eq!(editor.content(), "<p>milk</p><p>eggs</p>");
    }

    #[test]
    fn test_task_list_from_selection() {
        let mut editor = Editor::with_content("<p>milk</p><p>eggs</p>").unwrap();
        select(&mut editor, 0, 8);
        assert!(run(&mut editor, Command::TaskList));
        assert_eq!(editor.content().matches("task-item").count(), 2);
        assert!(editor.content().contains("milk"));
        assert!(editor.content().contains("eggs"));
    }

    #[test]
    fn test_blockquote_converts_block() {
        let mut editor = editor_with_caret("<p>wise words</p>", 4);
        assert!(run(&mut editor, Command::Blockquote));
        assert_eq!(editor.content(), "<blockquote>wise words</blockquote>");
    }

    #[test]
    fn test_blockquote_refused_on_title() {
        let mut editor = editor_with_caret("<h1>Title</h1><p>x</p>", 2);
        assert!(!run(&mut editor, Command::Blockquote));
    }

    #[test]
    fn test_toggle_bold_wraps_selection() {
        let mut editor = Editor::with_content("<p>make this bold</p>").unwrap();
        select(&mut editor, 5, 9);
        assert!(run(&mut editor, Command::ToggleBold));
        assert_eq!(editor.content(), "<p>make <strong>this</strong> bold</p>");
    }

    #[test]
    fn test_toggle_bold_across_blocks() {
        // Offsets count text nodes only, never block separators.
        let mut editor = Editor::with_content("<p>abc</p><p>def</p>").unwrap();
        select(&mut editor, 2, 4);
        assert!(run(&mut editor, Command::ToggleBold));
        assert_eq!(editor.content(), "<p>ab<strong>cd</strong></p><p>ef</p>");
    }

    #[test]
    fn test_toggle_bold_unwraps_inside() {
        let mut editor = Editor::with_content("<p>a<strong>bc</strong>d</p>").unwrap();
        select(&mut editor, 1, 3);
        assert!(run(&mut editor, Command::ToggleBold));
        assert_eq!(editor.content(), "<p>abcd</p>");
    }

    #[test]
    fn test_toggle_wrap_unwrap_is_identity() {
        let mut editor = Editor::with_content("<p>strike me</p>").unwrap();
        select(&mut editor, 0, 6);
        assert!(run(&mut editor, Command::ToggleStrikethrough));
        assert!(editor.content().contains("<s>"));
        select(&mut editor, 0, 6);
        assert!(run(&mut editor, Command::ToggleStrikethrough));
        assert_eq!(editor.content(), "<p>strike me</p>");
    }

    #[test]
    fn test_toggle_highlight_noop_without_selection() {
        let mut editor = editor_with_caret("<p>text</p>", 2);
        assert!(!run(&mut editor, Command::ToggleHighlight));
    }

    #[test]
    fn test_link_uses_url_as_label_without_selection() {
        let mut editor = editor_with_caret("<p>see </p>", 4);
        let mut host = RecordingHost::with_link_url("https://example.com");
        assert!(execute_command(&mut editor, &mut host, &Command::Link).unwrap());
        assert_eq!(
            editor.content(),
            "<p>see <a href=\"https://example.com\">https://example.com</a></p>"
        );
        assert_eq!(host.changes, 1);
    }

    #[test]
    fn test_link_wraps_selection_as_label() {
        let mut editor = Editor::with_content("<p>the docs here</p>").unwrap();
        select(&mut editor, 4, 8);
        let mut host = RecordingHost::with_link_url("https://docs.example");
        assert!(execute_command(&mut editor, &mut host, &Command::Link).unwrap());
        assert!(
            editor
                .content()
                .contains("<a href=\"https://docs.example\">docs</a>")
        );
    }

    #[test]
    fn test_link_label_across_blocks() {
        let mut editor = Editor::with_content("<p>ab</p><p>cd</p>").unwrap();
        select(&mut editor, 1, 3);
        let mut host = RecordingHost::with_link_url("https://x.example");
        assert!(execute_command(&mut editor, &mut host, &Command::Link).unwrap());
        assert_eq!(
            editor.content(),
            "<p>a<a href=\"https://x.example\">bc</a></p><p>d</p>"
        );
    }

    #[test]
    fn test_link_cancelled_prompt_is_noop() {
        let mut editor = editor_with_caret("<p>text</p>", 2);
        let mut host = RecordingHost::default();
        assert!(!execute_command(&mut editor, &mut host, &Command::Link).unwrap());
        assert_eq!(host.changes, 0);
    }

    #[test]
    fn test_code_block_replaces_empty_paragraph() {
        let mut editor = editor_with_caret("<p></p>", 0);
        assert!(run(&mut editor, Command::CodeBlock));
        assert_eq!(editor.content(), "<pre><code></code></pre>");
    }

    #[test]
    fn test_insert_table_and_caret_in_first_cell() {
        let mut editor = editor_with_caret("<p>x</p>", 1);
        assert!(run(
            &mut editor,
            Command::InsertTable { rows: 2, cols: 2 }
        ));
        assert_eq!(editor.content().matches("<th>").count(), 2);
        assert_eq!(editor.content().matches("<td>").count(), 2);
        let caret = editor.caret().unwrap();
        assert!(locate::enclosing_table_cell(&editor.doc, caret.node).is_some());
    }

    #[test]
    fn test_delete_last_row_is_error() {
        let mut editor = editor_with_caret("<table><tr><td>only</td></tr></table>", 2);
        let mut host = RecordingHost::default();
        assert_eq!(
            execute_command(&mut editor, &mut host, &Command::DeleteTableRow),
            Err(CommandError::LastTableRow)
        );
        assert_eq!(host.changes, 0);
    }

    #[test]
    fn test_delete_last_column_is_error() {
        let mut editor = editor_with_caret(
            "<table><tr><td>a</td></tr><tr><td>b</td></tr></table>",
            0,
        );
        let mut host = RecordingHost::default();
        assert_eq!(
            execute_command(&mut editor, &mut host, &Command::DeleteTableColumn),
            Err(CommandError::LastTableColumn)
        );
    }

    #[test]
    fn test_insert_table_row_via_command() {
        let mut editor =
            editor_with_caret("<table><tr><td>a</td><td>b</td></tr></table>", 0);
        assert!(run(&mut editor, Command::InsertTableRow));
        assert_eq!(editor.content().matches("<tr>").count(), 2);
        assert_eq!(editor.content().matches("<td>").count(), 4);
    }

    #[test]
    fn test_indent_outdent_inverse() {
        let mut editor = editor_with_caret("<ul><li>one</li><li>two</li></ul>", 5);
        let before = editor.content();
        assert!(run(&mut editor, Command::IndentListItem));
        assert_eq!(
            editor.content(),
            "<ul><li>one<ul><li>two</li></ul></li></ul>"
        );
        assert!(run(&mut editor, Command::OutdentListItem));
        assert_eq!(editor.content(), before);
    }

    #[test]
    fn test_indent_first_item_is_noop() {
        let mut editor = editor_with_caret("<ul><li>one</li></ul>", 1);
        assert!(!run(&mut editor, Command::IndentListItem));
    }

    #[test]
    fn test_outdent_top_level_is_noop() {
        let mut editor = editor_with_caret("<ul><li>one</li></ul>", 1);
        assert!(!run(&mut editor, Command::OutdentListItem));
    }

    #[test]
    fn test_command_notifies_host() {
        let mut editor = editor_with_caret("<p>x</p>", 1);
        let mut host = RecordingHost::default();
        execute_command(&mut editor, &mut host, &Command::Heading(2)).unwrap();
        assert_eq!(host.changes, 1);
    }

    #[test]
    fn test_undo_redo_commands() {
        let mut editor = editor_with_caret("<p>x</p>", 1);
        editor.checkpoint();
        assert!(run(&mut editor, Command::Heading(2)));
        assert!(run(&mut editor, Command::Undo));
        assert_eq!(editor.content(), "<p>x</p>");
        assert!(run(&mut editor, Command::Redo));
        assert_eq!(editor.content(), "<h2>x</h2>");
    }

    #[test]
    fn test_extract_lines_drops_empty() {
        let doc = Document::from_markup("<p>one</p><p>  </p><p>two</p>").unwrap();
        let lines = extract_lines(&doc, 0, 10);
        assert_eq!(lines, vec![SmolStr::new("one"), SmolStr::new("two")]);
    }

    #[test]
    fn test_extract_lines_bare_text_fallback() {
        // No block intersected: the flat text-node slice is used, on the
        // same offset basis as the carets.
        let doc = Document::from_markup("hello<br>world").unwrap();
        let lines = extract_lines(&doc, 0, 5);
        assert_eq!(lines, vec![SmolStr::new("hello")]);
    }
}
