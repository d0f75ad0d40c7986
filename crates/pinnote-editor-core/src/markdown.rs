//! Markdown import: convert pasted `.md` text into a document tree.
//!
//! Line-oriented, covering the constructs notes actually use: headings,
//! horizontal rules, bullet/ordered lists, checkbox items, blockquotes,
//! fenced code, and the inline marks (bold, italic, strikethrough,
//! inline code, links, images). Anything else becomes a paragraph.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;
use crate::node::{ListKind, NodeArena, NodeId, NodeKind};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static ORDERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap());
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+\[( |x|X)\]\s+(.*)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+(.*)$").unwrap());

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~]+)~~").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Parse markdown text into a fresh document.
pub fn import_markdown(md: &str) -> Document {
    let mut arena = NodeArena::new();
    let root = arena.alloc(NodeKind::Root);

    let mut lines = md.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_end();

        if trimmed.trim().is_empty() {
            continue;
        }

        // Fenced code; any language hint after the fence is ignored.
        if trimmed.starts_with("```") {
            let mut body = String::new();
            for code_line in lines.by_ref() {
                if code_line.trim_end().starts_with("```") {
                    break;
                }
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(code_line);
            }
            let block = arena.alloc(NodeKind::CodeBlock);
            let text = arena.text(body);
            arena.append_child(block, text);
            arena.append_child(root, block);
            continue;
        }

        if trimmed == "---" || trimmed == "***" {
            let hr = arena.alloc(NodeKind::HorizontalRule);
            arena.append_child(root, hr);
            continue;
        }

        if let Some(cap) = HEADING_RE.captures(trimmed) {
            let level = cap[1].len() as u8;
            let heading = arena.alloc(NodeKind::Heading(level));
            parse_inline(&mut arena, heading, &cap[2]);
            arena.append_child(root, heading);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("> ") {
            let quote = arena.alloc(NodeKind::Blockquote);
            parse_inline(&mut arena, quote, rest);
            arena.append_child(root, quote);
            continue;
        }

        if TASK_RE.is_match(trimmed) {
            let list = arena.alloc(NodeKind::TaskList);
            let mut current = trimmed.to_string();
            loop {
                let cap = TASK_RE.captures(&current).unwrap();
                let checked = cap[1].eq_ignore_ascii_case("x");
                let item = arena.alloc(NodeKind::TaskItem { checked });
                parse_inline(&mut arena, item, &cap[2]);
                arena.append_child(list, item);
                match lines.peek() {
                    Some(next) if TASK_RE.is_match(next.trim_end()) => {
                        current = lines.next().unwrap().trim_end().to_string();
                    }
                    _ => break,
                }
            }
            arena.append_child(root, list);
            continue;
        }

        if BULLET_RE.is_match(trimmed) || ORDERED_RE.is_match(trimmed) {
            let kind = if BULLET_RE.is_match(trimmed) {
                ListKind::Bullet
            } else {
                ListKind::Ordered
            };
            let marker_re: &Regex = match kind {
                ListKind::Bullet => &BULLET_RE,
                ListKind::Ordered => &ORDERED_RE,
            };
            let list = arena.alloc(NodeKind::List(kind));
            let mut current = trimmed.to_string();
            loop {
                let cap = marker_re.captures(&current).unwrap();
                let item = arena.alloc(NodeKind::ListItem);
                parse_inline(&mut arena, item, &cap[1]);
                arena.append_child(list, item);
                match lines.peek() {
                    Some(next)
                        if marker_re.is_match(next.trim_end())
                            && !TASK_RE.is_match(next.trim_end()) =>
                    {
                        current = lines.next().unwrap().trim_end().to_string();
                    }
                    _ => break,
                }
            }
            arena.append_child(root, list);
            continue;
        }

        let para = arena.alloc(NodeKind::Paragraph);
        parse_inline(&mut arena, para, trimmed);
        arena.append_child(root, para);
    }

    if arena.children(root).is_empty() {
        let para = arena.alloc(NodeKind::Paragraph);
        let text = arena.text("");
        arena.append_child(para, text);
        arena.append_child(root, para);
    }

    Document { arena, root }
}

#[derive(Clone, Copy)]
enum Mark {
    Image,
    Link,
    Bold,
    Strike,
    Code,
    Italic,
}

/// Earliest-match-wins inline parsing; inner text of a mark is taken
/// literally (no nesting).
fn parse_inline(arena: &mut NodeArena, parent: NodeId, text: &str) {
    // Ordered so image beats link and bold beats italic on ties.
    let rules: [(&Regex, Mark); 6] = [
        (&IMAGE_RE, Mark::Image),
        (&LINK_RE, Mark::Link),
        (&BOLD_RE, Mark::Bold),
        (&STRIKE_RE, Mark::Strike),
        (&CODE_RE, Mark::Code),
        (&ITALIC_RE, Mark::Italic),
    ];

    let mut rest = text;
    while !rest.is_empty() {
        let mut best: Option<(usize, usize, &Regex, Mark)> = None;
        for (re, mark) in rules {
            if let Some(m) = re.find(rest) {
                if best.is_none_or(|(start, ..)| m.start() < start) {
                    best = Some((m.start(), m.end(), re, mark));
                }
            }
        }

        let Some((start, end, re, mark)) = best else {
            let node = arena.text(rest);
            arena.append_child(parent, node);
            break;
        };

        if start > 0 {
            let node = arena.text(&rest[..start]);
            arena.append_child(parent, node);
        }

        let cap = re.captures(&rest[start..end]).unwrap();
        let node = match mark {
            Mark::Image => arena.alloc(NodeKind::Image {
                src: cap[2].to_string(),
            }),
            Mark::Link => {
                let link = arena.alloc(NodeKind::Link {
                    href: cap[2].into(),
                });
                let label = arena.text(&cap[1]);
                arena.append_child(link, label);
                link
            }
            Mark::Bold | Mark::Strike | Mark::Code | Mark::Italic => {
                let kind = match mark {
                    Mark::Bold => NodeKind::Bold,
                    Mark::Strike => NodeKind::Strikethrough,
                    Mark::Code => NodeKind::InlineCode,
                    _ => NodeKind::Italic,
                };
                let wrapper = arena.alloc(kind);
                let inner = arena.text(&cap[1]);
                arena.append_child(wrapper, inner);
                wrapper
            }
        };
        arena.append_child(parent, node);
        rest = &rest[end..];
    }
}
