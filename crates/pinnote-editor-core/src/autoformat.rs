//! Markdown-style autoformatting on keystrokes.
//!
//! - space: trailing inline markers (`**b**`, `*i*`, `~~s~~`, `==h==`,
//!   `` `c` ``) and line-start markers (`#`, `-`, `1.`, `[ ]`, `>`, `---`)
//! - enter: horizontal rules, list-item exit/split, task-label split
//! - tab: list indent/outdent and table cell hops
//! - every input: URL auto-linking, then first-line heading promotion
//!
//! Everything here is best-effort: missing caret state means no-op.

use std::sync::LazyLock;

use regex::Regex;

use crate::caret::{self, Caret};
use crate::document::Document;
use crate::editor::Editor;
use crate::execute;
use crate::locate;
use crate::node::{ListKind, NodeId, NodeKind};
use crate::table;

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*$").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*$").unwrap());
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~]+)~~$").unwrap());
static HIGHLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"==([^=]+)==$").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`$").unwrap());
static ORDERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]$").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

const MAX_AUTO_HEADING_LEN: usize = 100;

/// What a line-start marker converts into.
enum LineStart {
    Heading(u8),
    Bullet,
    Ordered,
    Task { checked: bool },
    Blockquote,
    Rule,
}

fn parse_line_start(prefix: &str) -> Option<LineStart> {
    if (1..=6).contains(&prefix.len()) && prefix.bytes().all(|b| b == b'#') {
        return Some(LineStart::Heading(prefix.len() as u8));
    }
    match prefix {
        "-" | "*" => Some(LineStart::Bullet),
        "[ ]" => Some(LineStart::Task { checked: false }),
        "[x]" => Some(LineStart::Task { checked: true }),
        ">" => Some(LineStart::Blockquote),
        "---" => Some(LineStart::Rule),
        _ if ORDERED_RE.is_match(prefix) => Some(LineStart::Ordered),
        _ => None,
    }
}

fn in_code(doc: &Document, node: NodeId) -> bool {
    locate::inside_kind(doc, node, |k| {
        matches!(k, NodeKind::CodeBlock | NodeKind::InlineCode)
    })
}

/// Text of the caret node before the caret, as an owned prefix string.
fn caret_prefix(doc: &Document, caret: Caret) -> Option<String> {
    let content = doc.arena.text_of(caret.node)?;
    Some(content.chars().take(caret.offset).collect())
}

/// True when nothing textual precedes the caret node within its line:
/// no earlier text in the enclosing block, and no text since the last
/// line break for bare root-level runs.
fn at_line_start(doc: &Document, caret: Caret) -> bool {
    if doc.arena.parent(caret.node).is_none() {
        return false;
    }
    // The line's scope is the nearest block ancestor (a list item, not
    // its whole list), or the root for bare top-level text runs.
    let scope = doc
        .arena
        .ancestors(caret.node)
        .find(|&a| a == doc.root || doc.arena.kind(a).is_block())
        .unwrap_or(doc.root);
    let mut preceding = String::new();
    collect_before(doc, scope, caret.node, &mut preceding);
    preceding.is_empty()
}

fn collect_before(doc: &Document, scope: NodeId, stop: NodeId, out: &mut String) -> bool {
    for &child in doc.arena.children(scope) {
        if child == stop {
            return true;
        }
        match doc.arena.kind(child) {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::LineBreak => out.clear(),
            _ => {
                if collect_before(doc, child, stop, out) {
                    return true;
                }
            }
        }
    }
    false
}

// === Space handler ===

/// Handle a space keypress. Returns true if the keystroke was consumed
/// by a transformation (the caller must not insert a literal space).
pub fn on_space(editor: &mut Editor) -> bool {
    let Some(sel) = editor.selection else {
        return false;
    };
    if !sel.is_collapsed() {
        return false;
    }
    let caret = sel.head;
    if !editor.doc.arena.kind(caret.node).is_text() || in_code(&editor.doc, caret.node) {
        return false;
    }

    if try_inline_marker(editor, caret) {
        return true;
    }
    try_line_start_marker(editor, caret)
}

fn try_inline_marker(editor: &mut Editor, caret: Caret) -> bool {
    let Some(prefix) = caret_prefix(&editor.doc, caret) else {
        return false;
    };

    // Bold is tried before italic so `**x**` never half-matches as
    // italic; first hit wins and ends the handler.
    let rules: [(&Regex, fn() -> NodeKind); 5] = [
        (&BOLD_RE, || NodeKind::Bold),
        (&ITALIC_RE, || NodeKind::Italic),
        (&STRIKE_RE, || NodeKind::Strikethrough),
        (&HIGHLIGHT_RE, || NodeKind::Highlight),
        (&CODE_RE, || NodeKind::InlineCode),
    ];

    for (re, make_kind) in rules {
        let Some(cap) = re.captures(&prefix) else {
            continue;
        };
        let whole = cap.get(0).unwrap();
        let inner = cap[1].to_string();
        let start_char = prefix[..whole.start()].chars().count();
        tracing::debug!(marker = whole.as_str(), "inline autoformat");

        let arena = &mut editor.doc.arena;
        let tail = arena.split_text(caret.node, caret.offset);
        if arena.text_len(tail) > 0 {
            arena.insert_after(caret.node, tail);
        }
        // Drop the literal marker text.
        let _marker = arena.split_text(caret.node, start_char);

        let wrapper = arena.alloc(make_kind());
        let inner_text = arena.text(inner);
        arena.append_child(wrapper, inner_text);
        arena.insert_after(caret.node, wrapper);
        let space = arena.text(" ");
        arena.insert_after(wrapper, space);

        editor.set_caret(Caret {
            node: space,
            offset: 1,
        });
        editor.checkpoint();
        return true;
    }
    false
}

fn try_line_start_marker(editor: &mut Editor, caret: Caret) -> bool {
    if locate::enclosing_table_cell(&editor.doc, caret.node).is_some() {
        return false;
    }
    let Some(prefix) = caret_prefix(&editor.doc, caret) else {
        return false;
    };
    let Some(rule) = parse_line_start(&prefix) else {
        return false;
    };
    if !at_line_start(&editor.doc, caret) {
        return false;
    }
    tracing::debug!(marker = %prefix, "line-start autoformat");
    apply_line_start(editor, caret, rule);
    true
}

/// Replace the marker (and its enclosing simple block, when there is
/// one) with the structural node the marker names. The rest of the line
/// after the caret becomes the new node's content.
fn apply_line_start(editor: &mut Editor, caret: Caret, rule: LineStart) {
    let root = editor.doc.root;
    let arena = &mut editor.doc.arena;

    // Cut the marker: the caret node keeps only the text after the caret.
    let tail = arena.split_text(caret.node, caret.offset);
    let rest = arena.text_of(tail).unwrap_or("").to_string();
    *arena.kind_mut(caret.node) = NodeKind::Text(rest);

    let parent = match arena.parent(caret.node) {
        Some(p) => p,
        None => return,
    };
    let replace_parent = parent != root
        && arena.parent(parent) == Some(root)
        && matches!(arena.kind(parent), NodeKind::Paragraph | NodeKind::Heading(_));

    if let LineStart::Rule = rule {
        let hr = arena.alloc(NodeKind::HorizontalRule);
        let para = arena.alloc(NodeKind::Paragraph);
        let text = arena.text("");
        arena.append_child(para, text);
        if replace_parent {
            arena.insert_before(parent, hr);
            arena.insert_after(hr, para);
            arena.detach(parent);
        } else {
            arena.insert_before(caret.node, hr);
            arena.insert_after(hr, para);
            arena.detach(caret.node);
        }
        editor.set_caret(Caret {
            node: text,
            offset: 0,
        });
        editor.checkpoint();
        return;
    }

    // Build the new structure and find the node that holds line content.
    let (top, content) = match rule {
        LineStart::Heading(level) => {
            let h = arena.alloc(NodeKind::Heading(level));
            (h, h)
        }
        LineStart::Bullet | LineStart::Ordered => {
            let kind = if matches!(rule, LineStart::Bullet) {
                ListKind::Bullet
            } else {
                ListKind::Ordered
            };
            let list = arena.alloc(NodeKind::List(kind));
            let item = arena.alloc(NodeKind::ListItem);
            arena.append_child(list, item);
            (list, item)
        }
        LineStart::Task { checked } => {
            let list = arena.alloc(NodeKind::TaskList);
            let item = arena.alloc(NodeKind::TaskItem { checked });
            arena.append_child(list, item);
            (list, item)
        }
        LineStart::Blockquote => {
            let quote = arena.alloc(NodeKind::Blockquote);
            (quote, quote)
        }
        LineStart::Rule => unreachable!(),
    };

    if replace_parent {
        arena.insert_before(parent, top);
        let children: Vec<NodeId> = arena.children(parent).to_vec();
        for child in children {
            arena.append_child(content, child);
        }
        arena.detach(parent);
    } else {
        arena.insert_before(caret.node, top);
        arena.append_child(content, caret.node);
    }

    editor.set_caret(Caret {
        node: caret.node,
        offset: 0,
    });
    editor.checkpoint();
}

// === Enter handler ===

/// Handle an Enter keypress. Returns true if consumed.
pub fn on_enter(editor: &mut Editor) -> bool {
    let Some(sel) = editor.selection else {
        return false;
    };
    if !sel.is_collapsed() {
        return false;
    }
    let caret = sel.head;
    if !editor.doc.arena.kind(caret.node).is_text() || in_code(&editor.doc, caret.node) {
        return false;
    }

    // A bare `---` line becomes a rule on enter as well as on space.
    if let Some(prefix) = caret_prefix(&editor.doc, caret) {
        let at_eol = editor.doc.arena.text_len(caret.node) == caret.offset;
        if prefix == "---" && at_eol && at_line_start(&editor.doc, caret) {
            apply_line_start(editor, caret, LineStart::Rule);
            return true;
        }
    }

    if let Some(item) = locate::enclosing_task_item(&editor.doc, caret.node) {
        enter_in_task_item(editor, item);
        return true;
    }
    if let Some(item) = locate::enclosing_list_item(&editor.doc, caret.node) {
        return enter_in_list_item(editor, item, caret);
    }
    false
}

fn enter_in_task_item(editor: &mut Editor, item: NodeId) {
    let label = editor.doc.arena.subtree_text(item);
    let arena = &mut editor.doc.arena;

    if label.trim().is_empty() {
        // Empty label: leave the task list entirely.
        let list = arena.parent(item);
        arena.detach(item);
        let br = arena.alloc(NodeKind::LineBreak);
        let text = arena.text("");
        match list {
            Some(list) if arena.parent(list).is_some() => {
                arena.insert_after(list, br);
                if arena.children(list).is_empty() {
                    arena.detach(list);
                }
            }
            _ => arena.append_child(editor.doc.root, br),
        }
        arena.insert_after(br, text);
        editor.set_caret(Caret {
            node: text,
            offset: 0,
        });
    } else {
        // A fresh unchecked sibling takes the caret.
        let new_item = arena.alloc(NodeKind::TaskItem { checked: false });
        let text = arena.text("");
        arena.append_child(new_item, text);
        arena.insert_after(item, new_item);
        editor.set_caret(Caret {
            node: text,
            offset: 0,
        });
    }
    editor.checkpoint();
}

fn enter_in_list_item(editor: &mut Editor, item: NodeId, caret: Caret) -> bool {
    let text = editor.doc.arena.subtree_text(item);

    if text.trim().is_empty() {
        let nested = editor
            .doc
            .arena
            .ancestors(item)
            .any(|a| matches!(editor.doc.arena.kind(a), NodeKind::ListItem));
        if nested {
            execute::outdent_list_item(&mut editor.doc, item);
            if let Some(first) = editor
                .doc
                .arena
                .descendants(item)
                .into_iter()
                .find(|&n| editor.doc.arena.kind(n).is_text())
            {
                editor.set_caret(Caret {
                    node: first,
                    offset: 0,
                });
            }
        } else {
            let arena = &mut editor.doc.arena;
            let list = arena.parent(item);
            arena.detach(item);
            let br = arena.alloc(NodeKind::LineBreak);
            let text_node = arena.text("");
            match list {
                Some(list) if arena.parent(list).is_some() => {
                    arena.insert_after(list, br);
                    if arena.children(list).is_empty() {
                        arena.detach(list);
                    }
                }
                _ => arena.append_child(editor.doc.root, br),
            }
            arena.insert_after(br, text_node);
            editor.set_caret(Caret {
                node: text_node,
                offset: 0,
            });
        }
        editor.checkpoint();
        return true;
    }

    // Non-empty item: split at the caret into a new following item.
    let arena = &mut editor.doc.arena;
    let tail = arena.split_text(caret.node, caret.offset);
    let new_item = arena.alloc(NodeKind::ListItem);
    arena.append_child(new_item, tail);
    // Later siblings of the caret node within the item move along.
    while let Some(next) = arena.next_sibling(caret.node) {
        arena.append_child(new_item, next);
    }
    arena.insert_after(item, new_item);
    editor.set_caret(Caret {
        node: tail,
        offset: 0,
    });
    editor.checkpoint();
    true
}

// === Tab handler ===

/// Handle Tab / Shift+Tab. Returns true if consumed.
pub fn on_tab(editor: &mut Editor, shift: bool) -> bool {
    let Some(caret) = editor.caret() else {
        return false;
    };

    if let Some(cell) = locate::enclosing_table_cell(&editor.doc, caret.node) {
        let target = if shift {
            table::prev_cell(&editor.doc, cell)
        } else {
            table::next_cell(&editor.doc, cell)
        };
        if let Some(target) = target {
            let text = editor
                .doc
                .arena
                .descendants(target)
                .into_iter()
                .find(|&n| editor.doc.arena.kind(n).is_text());
            if let Some(text) = text {
                editor.set_caret(Caret {
                    node: text,
                    offset: 0,
                });
                return true;
            }
        }
        return false;
    }

    if let Some(item) = locate::enclosing_list_item(&editor.doc, caret.node) {
        let moved = if shift {
            execute::outdent_list_item(&mut editor.doc, item)
        } else {
            execute::indent_list_item(&mut editor.doc, item)
        };
        if moved {
            editor.checkpoint();
        }
        return true;
    }
    false
}

// === Input handlers ===

/// Run after every text input: first auto-linking, then first-line
/// heading promotion.
pub fn on_input(editor: &mut Editor) -> bool {
    let linked = autolink(editor);
    let promoted = promote_first_line(editor);
    linked || promoted
}

/// Turn the first raw URL in the caret's text node into a Link whose
/// href and label are both the literal URL text.
pub fn autolink(editor: &mut Editor) -> bool {
    let Some(caret) = editor.caret() else {
        return false;
    };
    if !editor.doc.arena.kind(caret.node).is_text() {
        return false;
    }
    if locate::inside_kind(&editor.doc, caret.node, |k| {
        matches!(
            k,
            NodeKind::Link { .. } | NodeKind::InlineCode | NodeKind::CodeBlock
        )
    }) {
        return false;
    }

    let content = editor.doc.arena.text_of(caret.node).unwrap_or("");
    let Some(m) = URL_RE.find(content) else {
        return false;
    };
    let url = m.as_str().to_string();
    let start_char = content[..m.start()].chars().count();
    let end_char = content[..m.end()].chars().count();
    tracing::debug!(url = %url, "autolink");

    let saved = caret::caret_to_offset(&editor.doc, caret);

    let arena = &mut editor.doc.arena;
    let tail = arena.split_text(caret.node, end_char);
    if arena.text_len(tail) > 0 {
        arena.insert_after(caret.node, tail);
    }
    let url_text = arena.split_text(caret.node, start_char);
    let link = arena.alloc(NodeKind::Link {
        href: url.as_str().into(),
    });
    arena.append_child(link, url_text);
    arena.insert_after(caret.node, link);
    if arena.text_len(caret.node) == 0 {
        arena.detach(caret.node);
    }

    editor.set_caret_at_offset(saved);
    true
}

/// Promote a short, lone first line to the note's title heading.
pub fn promote_first_line(editor: &mut Editor) -> bool {
    let root = editor.doc.root;
    let Some(first) = editor.doc.arena.first_child(root) else {
        return false;
    };
    if matches!(editor.doc.arena.kind(first), NodeKind::Heading(_)) {
        return false;
    }
    // Only when the first line is effectively the whole note.
    let alone = editor.doc.arena.children(root)[1..]
        .iter()
        .all(|&sib| !editor.doc.arena.kind(sib).is_block());
    if !alone {
        return false;
    }
    let text = editor.doc.arena.subtree_text(first);
    let trimmed = text.trim();
    if trimmed.is_empty() || text.chars().count() >= MAX_AUTO_HEADING_LEN {
        return false;
    }

    let saved = editor
        .caret()
        .map(|c| caret::caret_to_offset(&editor.doc, c));

    let arena = &mut editor.doc.arena;
    let heading = arena.alloc(NodeKind::Heading(1));
    let heading_text = arena.text(text.clone());
    arena.append_child(heading, heading_text);
    arena.replace(first, heading);

    if let Some(saved) = saved {
        let clamped = saved.min(text.chars().count());
        editor.set_caret_at_offset(clamped);
    }
    tracing::debug!("first line promoted to heading");
    true
}
