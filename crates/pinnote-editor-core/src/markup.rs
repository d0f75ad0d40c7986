//! The persisted markup format: an HTML-shaped serialization of the
//! document tree, plus a lenient hand-rolled parser for loading it back.
//!
//! Serialization is canonical (one fixed tag per node kind); parsing is
//! forgiving: unknown tags are transparent, unclosed tags close at end
//! of input, and stray close tags are ignored.

use thiserror::Error;

use crate::document::Document;
use crate::node::{ListKind, NodeArena, NodeId, NodeKind};

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(usize),
}

// === Serialization ===

pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for &child in doc.arena.children(doc.root) {
        serialize_node(doc, child, &mut out);
    }
    out
}

fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    let arena = &doc.arena;
    match arena.kind(id) {
        NodeKind::Root => {
            for &child in arena.children(id) {
                serialize_node(doc, child, out);
            }
        }
        NodeKind::Text(content) => {
            out.push_str(&html_escape::encode_text(content));
        }
        NodeKind::LineBreak => out.push_str("<br>"),
        NodeKind::HorizontalRule => out.push_str("<hr>"),
        NodeKind::Image { src } => {
            out.push_str("<img src=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(src.as_str()));
            out.push_str("\">");
        }
        NodeKind::Paragraph => wrap_children(doc, id, "p", out),
        NodeKind::Heading(level) => {
            let tag = heading_tag(*level);
            wrap_children(doc, id, tag, out);
        }
        NodeKind::List(ListKind::Bullet) => wrap_children(doc, id, "ul", out),
        NodeKind::List(ListKind::Ordered) => wrap_children(doc, id, "ol", out),
        NodeKind::ListItem => wrap_children(doc, id, "li", out),
        NodeKind::TaskList => {
            out.push_str("<div class=\"task-list\">");
            for &child in arena.children(id) {
                serialize_node(doc, child, out);
            }
            out.push_str("</div>");
        }
        NodeKind::TaskItem { checked } => {
            out.push_str("<div class=\"task-item\" data-checked=\"");
            out.push_str(if *checked { "true" } else { "false" });
            out.push_str("\"><span class=\"task-label\">");
            for &child in arena.children(id) {
                serialize_node(doc, child, out);
            }
            out.push_str("</span></div>");
        }
        NodeKind::Blockquote => wrap_children(doc, id, "blockquote", out),
        NodeKind::CodeBlock => {
            out.push_str("<pre><code>");
            for &child in arena.children(id) {
                serialize_node(doc, child, out);
            }
            out.push_str("</code></pre>");
        }
        NodeKind::Table => wrap_children(doc, id, "table", out),
        NodeKind::TableRow => wrap_children(doc, id, "tr", out),
        NodeKind::TableCell { header } => {
            let tag = if *header { "th" } else { "td" };
            wrap_children(doc, id, tag, out);
        }
        NodeKind::Bold => wrap_children(doc, id, "strong", out),
        NodeKind::Italic => wrap_children(doc, id, "em", out),
        NodeKind::Underline => wrap_children(doc, id, "u", out),
        NodeKind::Strikethrough => wrap_children(doc, id, "s", out),
        NodeKind::Highlight => wrap_children(doc, id, "mark", out),
        NodeKind::InlineCode => wrap_children(doc, id, "code", out),
        NodeKind::Link { href } => {
            out.push_str("<a href=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(href.as_str()));
            out.push_str("\">");
            for &child in arena.children(id) {
                serialize_node(doc, child, out);
            }
            out.push_str("</a>");
        }
    }
}

fn wrap_children(doc: &Document, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for &child in doc.arena.children(id) {
        serialize_node(doc, child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn heading_tag(level: u8) -> &'static str {
    match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    }
}

// === Parsing ===

struct RawTag<'a> {
    name: String,
    closing: bool,
    attrs: &'a str,
}

/// A stack frame during parsing. `Transparent` frames (unknown tags,
/// task-label spans, `<code>` inside `<pre>`) contribute their children
/// to the enclosing node. Frames remember the tag that opened them so
/// closes match by name.
enum Frame {
    Node { id: NodeId, tag: String },
    Transparent { tag: String },
}

impl Frame {
    fn tag(&self) -> &str {
        match self {
            Frame::Node { tag, .. } | Frame::Transparent { tag } => tag,
        }
    }
}

pub fn parse(input: &str) -> Result<Document, MarkupError> {
    let mut arena = NodeArena::new();
    let root = arena.alloc(NodeKind::Root);
    let mut stack: Vec<Frame> = Vec::new();
    let mut rest = input;
    let mut consumed = 0;

    while !rest.is_empty() {
        if let Some(lt) = rest.find('<') {
            if lt > 0 {
                push_text(&mut arena, root, &stack, &rest[..lt]);
            }
            let after_lt = &rest[lt..];
            let Some(gt) = after_lt.find('>') else {
                return Err(MarkupError::UnterminatedTag(consumed + lt));
            };
            let raw = parse_raw_tag(&after_lt[1..gt]);
            handle_tag(&mut arena, root, &mut stack, &raw);
            consumed += lt + gt + 1;
            rest = &after_lt[gt + 1..];
        } else {
            push_text(&mut arena, root, &stack, rest);
            break;
        }
    }

    normalize(&mut arena, root);
    Ok(Document { arena, root })
}

/// Give every empty inline-bearing block an empty text node so a caret
/// can always land inside it, and an empty document one empty paragraph.
fn normalize(arena: &mut NodeArena, root: NodeId) {
    if arena.children(root).is_empty() {
        let para = arena.alloc(NodeKind::Paragraph);
        arena.append_child(root, para);
    }
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let needs_text = arena.children(id).is_empty()
            && matches!(
                arena.kind(id),
                NodeKind::Paragraph
                    | NodeKind::Heading(_)
                    | NodeKind::ListItem
                    | NodeKind::TaskItem { .. }
                    | NodeKind::Blockquote
                    | NodeKind::CodeBlock
                    | NodeKind::TableCell { .. }
            );
        if needs_text {
            let text = arena.text("");
            arena.append_child(id, text);
            continue;
        }
        stack.extend(arena.children(id).iter().copied());
    }
}

fn parse_raw_tag(body: &str) -> RawTag<'_> {
    let body = body.trim().trim_end_matches('/').trim_end();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest.trim()),
        None => (false, body),
    };
    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    RawTag {
        name: body[..name_end].to_ascii_lowercase(),
        closing,
        attrs: &body[name_end..],
    }
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = attrs.find(&needle)? + needle.len();
    let rest = &attrs[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn current_parent(root: NodeId, stack: &[Frame]) -> NodeId {
    stack
        .iter()
        .rev()
        .find_map(|f| match f {
            Frame::Node { id, .. } => Some(*id),
            Frame::Transparent { .. } => None,
        })
        .unwrap_or(root)
}

fn push_text(arena: &mut NodeArena, root: NodeId, stack: &[Frame], raw: &str) {
    let decoded = html_escape::decode_html_entities(raw).into_owned();
    let parent = current_parent(root, stack);
    let text = arena.text(decoded);
    arena.append_child(parent, text);
}

fn inside_code_block(arena: &NodeArena, stack: &[Frame]) -> bool {
    stack.iter().any(|f| match f {
        Frame::Node { id, .. } => matches!(arena.kind(*id), NodeKind::CodeBlock),
        Frame::Transparent { .. } => false,
    })
}

fn handle_tag(arena: &mut NodeArena, root: NodeId, stack: &mut Vec<Frame>, raw: &RawTag) {
    if raw.closing {
        close_tag(stack, &raw.name);
        return;
    }

    let parent = current_parent(root, stack);

    // Void tags never go on the stack.
    match raw.name.as_str() {
        "br" => {
            let node = arena.alloc(NodeKind::LineBreak);
            arena.append_child(parent, node);
            return;
        }
        "hr" => {
            let node = arena.alloc(NodeKind::HorizontalRule);
            arena.append_child(parent, node);
            return;
        }
        "img" => {
            let src = attr_value(raw.attrs, "src").unwrap_or("").to_string();
            let node = arena.alloc(NodeKind::Image { src });
            arena.append_child(parent, node);
            return;
        }
        _ => {}
    }

    let kind = match raw.name.as_str() {
        "p" => Some(NodeKind::Paragraph),
        "h1" => Some(NodeKind::Heading(1)),
        "h2" => Some(NodeKind::Heading(2)),
        "h3" => Some(NodeKind::Heading(3)),
        "h4" => Some(NodeKind::Heading(4)),
        "h5" => Some(NodeKind::Heading(5)),
        "h6" => Some(NodeKind::Heading(6)),
        "ul" => Some(NodeKind::List(ListKind::Bullet)),
        "ol" => Some(NodeKind::List(ListKind::Ordered)),
        "li" => Some(NodeKind::ListItem),
        "blockquote" => Some(NodeKind::Blockquote),
        "pre" => Some(NodeKind::CodeBlock),
        "table" => Some(NodeKind::Table),
        "tr" => Some(NodeKind::TableRow),
        "th" => Some(NodeKind::TableCell { header: true }),
        "td" => Some(NodeKind::TableCell { header: false }),
        "strong" | "b" => Some(NodeKind::Bold),
        "em" | "i" => Some(NodeKind::Italic),
        "u" => Some(NodeKind::Underline),
        "s" | "del" | "strike" => Some(NodeKind::Strikethrough),
        "mark" => Some(NodeKind::Highlight),
        "code" => {
            // A code tag inside a pre is part of the code block shell.
            if inside_code_block(arena, stack) {
                None
            } else {
                Some(NodeKind::InlineCode)
            }
        }
        "a" => Some(NodeKind::Link {
            href: attr_value(raw.attrs, "href").unwrap_or("").into(),
        }),
        "div" => {
            let class = attr_value(raw.attrs, "class").unwrap_or("");
            if class.split_whitespace().any(|c| c == "task-list") {
                Some(NodeKind::TaskList)
            } else if class.split_whitespace().any(|c| c == "task-item") {
                let checked = attr_value(raw.attrs, "data-checked") == Some("true");
                Some(NodeKind::TaskItem { checked })
            } else {
                Some(NodeKind::Paragraph)
            }
        }
        // Spans (task labels included) and anything unrecognized are
        // transparent containers.
        _ => None,
    };

    match kind {
        Some(kind) => {
            let node = arena.alloc(kind);
            arena.append_child(parent, node);
            stack.push(Frame::Node {
                id: node,
                tag: raw.name.clone(),
            });
        }
        None => stack.push(Frame::Transparent {
            tag: raw.name.clone(),
        }),
    }
}

fn close_tag(stack: &mut Vec<Frame>, name: &str) {
    // Pop to the nearest frame opened by this tag; a close with no
    // matching open is ignored.
    if let Some(pos) = stack.iter().rposition(|f| f.tag() == name) {
        stack.truncate(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roundtrip_basic_blocks() {
        let src = "<h1>Title</h1><p>hello <strong>world</strong></p>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_roundtrip_lists() {
        let src = "<ul><li>one</li><li>two</li></ul><ol><li>a</li></ol>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_roundtrip_task_list() {
        let src = "<div class=\"task-list\"><div class=\"task-item\" data-checked=\"true\"><span class=\"task-label\">done</span></div></div>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_roundtrip_code_block() {
        let src = "<pre><code>let x = 1;</code></pre>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_roundtrip_table() {
        let src = "<table><tr><th>h</th></tr><tr><td>d</td></tr></table>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_roundtrip_link_and_image() {
        let src = "<p><a href=\"https://example.com\">site</a><img src=\"data:image/png;base64,AA==\"></p>";
        let doc = parse(src).unwrap();
        assert_eq!(serialize(&doc), src);
    }

    #[test]
    fn test_text_escaping() {
        let mut doc = Document::new();
        let text = doc.text_nodes()[0];
        *doc.arena.kind_mut(text) = NodeKind::Text("a < b & c".into());
        let markup = serialize(&doc);
        assert!(markup.contains("&lt;"));
        assert!(markup.contains("&amp;"));
        let back = parse(&markup).unwrap();
        assert_eq!(back.text_content(), "a < b & c");
    }

    #[test]
    fn test_unknown_tags_are_transparent() {
        let doc = parse("<p><span>hi</span></p>").unwrap();
        assert_eq!(serialize(&doc), "<p>hi</p>");
    }

    #[test]
    fn test_plain_div_parses_as_paragraph() {
        let doc = parse("<div>hi</div>").unwrap();
        assert_eq!(serialize(&doc), "<p>hi</p>");
    }

    #[test]
    fn test_b_and_i_aliases() {
        let doc = parse("<p><b>x</b><i>y</i></p>").unwrap();
        assert_eq!(serialize(&doc), "<p><strong>x</strong><em>y</em></p>");
    }

    #[test]
    fn test_unterminated_tag_errors() {
        assert!(matches!(
            parse("<p>hi<stro"),
            Err(MarkupError::UnterminatedTag(_))
        ));
    }

    #[test]
    fn test_unclosed_tag_closes_at_end() {
        let doc = parse("<p>hi").unwrap();
        assert_eq!(serialize(&doc), "<p>hi</p>");
    }

    #[test]
    fn test_serialization_idempotent() {
        let src = "<h1>Title</h1><ul><li>a<strong>b</strong></li></ul><div class=\"task-item\" data-checked=\"true\"><span class=\"task-label\">t</span></div>";
        let once = parse(src).unwrap();
        let twice = parse(&serialize(&once)).unwrap();
        assert!(once.same_structure(&twice));
        assert_eq!(serialize(&once), serialize(&twice));
    }

    #[test]
    fn test_bare_root_text() {
        let doc = parse("hello<br>world").unwrap();
        assert_eq!(doc.text_content(), "hello\nworld");
    }
}
