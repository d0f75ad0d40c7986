//! The collaborator contract between the editing core and its host.
//!
//! The host owns persistence, dialogs, and the platform; the core only
//! tells it that content changed, asks it for a link URL, and hands it
//! external links to open.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::caret::Caret;
use crate::editor::Editor;
use crate::node::NodeKind;

pub trait EditorHost {
    /// Called after every committed structural or autoformat edit.
    fn content_changed(&mut self);

    /// Ask the user for a link target. `None` means cancelled.
    fn prompt_link_url(&mut self) -> Option<String>;

    /// Open a link outside the editor.
    fn open_external(&mut self, href: &str);
}

/// A host that ignores everything. Useful for headless operations.
#[derive(Debug, Default)]
pub struct NullHost;

impl EditorHost for NullHost {
    fn content_changed(&mut self) {}
    fn prompt_link_url(&mut self) -> Option<String> {
        None
    }
    fn open_external(&mut self, _href: &str) {}
}

/// A host that records what the editor asked of it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub changes: usize,
    pub link_url: Option<String>,
    pub opened: Vec<String>,
}

impl RecordingHost {
    pub fn with_link_url(url: &str) -> Self {
        Self {
            link_url: Some(url.to_string()),
            ..Self::default()
        }
    }
}

impl EditorHost for RecordingHost {
    fn content_changed(&mut self) {
        self.changes += 1;
    }
    fn prompt_link_url(&mut self) -> Option<String> {
        self.link_url.clone()
    }
    fn open_external(&mut self, href: &str) {
        self.opened.push(href.to_string());
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image data is empty")]
    Empty,
    #[error("no caret to insert at")]
    NoCaret,
}

/// Embed image bytes as a data-URI image node at the caret.
pub fn insert_image(editor: &mut Editor, bytes: &[u8], mime: &str) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    let Some(caret) = editor.caret_or_end() else {
        return Err(ImageError::NoCaret);
    };
    if !editor.doc.arena.kind(caret.node).is_text() {
        return Err(ImageError::NoCaret);
    }

    let src = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
    let arena = &mut editor.doc.arena;
    let tail = arena.split_text(caret.node, caret.offset);
    if arena.text_len(tail) > 0 {
        arena.insert_after(caret.node, tail);
    }
    let image = arena.alloc(NodeKind::Image { src });
    arena.insert_after(caret.node, image);

    editor.set_caret(Caret {
        node: caret.node,
        offset: caret.offset,
    });
    editor.checkpoint();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_image_builds_data_uri() {
        let mut editor = Editor::with_content("<p>pic: </p>").unwrap();
        editor.set_caret_at_offset(5);
        insert_image(&mut editor, &[0x89, 0x50, 0x4e, 0x47], "image/png").unwrap();
        assert!(
            editor
                .content()
                .contains("<img src=\"data:image/png;base64,iVBORw==\">")
        );
    }

    #[test]
    fn test_insert_image_rejects_empty() {
        let mut editor = Editor::new();
        assert_eq!(
            insert_image(&mut editor, &[], "image/png"),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_recording_host_counts_changes() {
        let mut host = RecordingHost::default();
        host.content_changed();
        host.content_changed();
        host.open_external("https://example.com");
        assert_eq!(host.changes, 2);
        assert_eq!(host.opened, vec!["https://example.com".to_string()]);
    }
}
