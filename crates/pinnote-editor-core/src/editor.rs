//! Editor state: a document, the current selection, and history.

use web_time::Instant;

use crate::caret::{self, Caret, DomSelection};
use crate::document::Document;
use crate::history::{DebouncedCheckpoint, History};
use crate::markup::MarkupError;
use crate::node::NodeKind;

#[derive(Debug)]
pub struct Editor {
    pub doc: Document,
    /// Selection is `None` when the editor does not have focus.
    pub selection: Option<DomSelection>,
    pub history: History,
    debounce: DebouncedCheckpoint,
}

impl Editor {
    pub fn new() -> Self {
        let doc = Document::new();
        let history = History::new(&doc, (0, 0));
        Self {
            doc,
            selection: None,
            history,
            debounce: DebouncedCheckpoint::default(),
        }
    }

    pub fn with_content(markup: &str) -> Result<Self, MarkupError> {
        let doc = Document::from_markup(markup)?;
        let history = History::new(&doc, (0, 0));
        Ok(Self {
            doc,
            selection: None,
            history,
            debounce: DebouncedCheckpoint::default(),
        })
    }

    pub fn content(&self) -> String {
        self.doc.to_markup()
    }

    /// Replace the document wholesale, resetting history to the new
    /// baseline.
    pub fn set_content(&mut self, markup: &str) -> Result<(), MarkupError> {
        self.doc = Document::from_markup(markup)?;
        self.selection = None;
        self.history = History::new(&self.doc, (0, 0));
        self.debounce.cancel();
        Ok(())
    }

    // === Selection ===

    /// The caret (selection head), if the editor is focused.
    pub fn caret(&self) -> Option<Caret> {
        self.selection.map(|s| s.head)
    }

    pub fn set_caret(&mut self, caret: Caret) {
        self.selection = Some(DomSelection::collapsed(caret));
    }

    pub fn set_caret_at_offset(&mut self, offset: usize) {
        if let Some(caret) = caret::offset_to_caret(&self.doc, offset) {
            self.set_caret(caret);
        }
    }

    /// Flat `(start, end)` offsets of the selection; `(end, end)` of the
    /// document when there is none.
    pub fn selection_offsets(&self) -> (usize, usize) {
        match &self.selection {
            Some(sel) => caret::selection_to_offsets(&self.doc, sel),
            None => {
                let end = self.doc.text_content().chars().count();
                (end, end)
            }
        }
    }

    /// The caret, defaulting to the end of the document when the editor
    /// has no selection. Structural commands use this so toolbar clicks
    /// work on an unfocused note.
    pub fn caret_or_end(&mut self) -> Option<Caret> {
        if let Some(caret) = self.caret() {
            return Some(caret);
        }
        let last = self.doc.last_text_node()?;
        let caret = Caret {
            node: last,
            offset: self.doc.arena.text_len(last),
        };
        self.set_caret(caret);
        Some(caret)
    }

    // === Text entry ===

    /// Insert plain text at the caret. Collapsed selections only; a
    /// ranged selection is deleted first.
    pub fn insert_text(&mut self, s: &str) {
        let Some(sel) = self.selection else { return };
        let caret = if sel.is_collapsed() {
            sel.head
        } else {
            let (start, end) = caret::selection_to_offsets(&self.doc, &sel);
            match caret::delete_offset_range(&mut self.doc, start, end) {
                Some(c) => c,
                None => return,
            }
        };
        if let NodeKind::Text(content) = self.doc.arena.kind_mut(caret.node) {
            let byte = content
                .char_indices()
                .nth(caret.offset)
                .map(|(b, _)| b)
                .unwrap_or(content.len());
            content.insert_str(byte, s);
            self.set_caret(Caret {
                node: caret.node,
                offset: caret.offset + s.chars().count(),
            });
        }
    }

    // === History ===

    pub fn checkpoint(&mut self) {
        let offsets = self.selection_offsets();
        self.history.checkpoint(&self.doc, offsets);
    }

    /// Note an edit at `now`; a checkpoint fires via `tick` once the
    /// debounce window passes quietly.
    pub fn edited(&mut self, now: Instant) {
        self.debounce.schedule(now);
    }

    /// Drive the debounce clock. Returns true when a checkpoint was taken.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.debounce.poll(now) {
            self.checkpoint();
            true
        } else {
            false
        }
    }

    pub fn undo(&mut self) -> bool {
        // A pending debounced edit must be captured first or it would be
        // lost when the snapshot replaces the tree.
        self.debounce.cancel();
        self.checkpoint();
        match self.history.undo() {
            Some(entry) => {
                self.restore(entry.doc, entry.selection);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(entry) => {
                self.restore(entry.doc, entry.selection);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, doc: Document, selection: (usize, usize)) {
        self.doc = doc;
        let anchor = caret::offset_to_caret(&self.doc, selection.0);
        let head = caret::offset_to_caret(&self.doc, selection.1);
        self.selection = match (anchor, head) {
            (Some(anchor), Some(head)) => Some(DomSelection { anchor, head }),
            _ => None,
        };
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web_time::Duration;

    #[test]
    fn test_insert_text_moves_caret() {
        let mut editor = Editor::with_content("<p>helo</p>").unwrap();
        editor.set_caret_at_offset(3);
        editor.insert_text("l");
        assert_eq!(editor.doc.text_content(), "hello");
        assert_eq!(editor.selection_offsets(), (4, 4));
    }

    #[test]
    fn test_insert_text_replaces_range() {
        let mut editor = Editor::with_content("<p>hello world</p>").unwrap();
        let anchor = caret::offset_to_caret(&editor.doc, 6).unwrap();
        let head = caret::offset_to_caret(&editor.doc, 11).unwrap();
        editor.selection = Some(DomSelection { anchor, head });
        editor.insert_text("there");
        assert_eq!(editor.doc.text_content(), "hello there");
    }

    #[test]
    fn test_undo_restores_selection_offsets() {
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);
        editor.checkpoint();
        editor.insert_text("b");
        editor.checkpoint();

        assert!(editor.undo());
        assert_eq!(editor.doc.text_content(), "a");
        assert_eq!(editor.selection_offsets(), (1, 1));
    }

    #[test]
    fn test_undo_captures_pending_debounced_edit() {
        let t0 = Instant::now();
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);
        editor.insert_text("b");
        editor.edited(t0);

        // Undo before the debounce fires still reverts the typed text.
        assert!(editor.undo());
        assert_eq!(editor.doc.text_content(), "a");
    }

    #[test]
    fn test_tick_checkpoints_after_quiet_window() {
        let t0 = Instant::now();
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);
        editor.insert_text("b");
        editor.edited(t0);

        assert!(!editor.tick(t0 + Duration::from_millis(100)));
        assert!(editor.tick(t0 + Duration::from_millis(600)));
        assert!(editor.history.can_undo());
    }

    #[test]
    fn test_rapid_edits_coalesce_into_one_checkpoint() {
        let t0 = Instant::now();
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);

        // Two edits inside one quiet window: one checkpoint.
        editor.insert_text("b");
        editor.edited(t0);
        editor.insert_text("c");
        editor.edited(t0 + Duration::from_millis(100));
        editor.tick(t0 + Duration::from_millis(700));
        assert_eq!(editor.history.undo_depth(), 2);

        // A third edit in its own window: a second checkpoint.
        editor.insert_text("d");
        editor.edited(t0 + Duration::from_secs(2));
        editor.tick(t0 + Duration::from_secs(3));
        assert_eq!(editor.history.undo_depth(), 3);
    }

    #[test]
    fn test_undo_redo_inverse_over_sequence() {
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);
        for s in ["b", "c", "d"] {
            editor.insert_text(s);
            editor.checkpoint();
        }
        let final_content = editor.content();

        assert!(editor.undo());
        assert!(editor.undo());
        assert!(editor.undo());
        assert_eq!(editor.doc.text_content(), "a");
        assert!(!editor.undo());

        assert!(editor.redo());
        assert!(editor.redo());
        assert!(editor.redo());
        assert_eq!(editor.content(), final_content);
        assert!(!editor.redo());
    }

    #[test]
    fn test_set_content_resets_history() {
        let mut editor = Editor::with_content("<p>a</p>").unwrap();
        editor.set_caret_at_offset(1);
        editor.insert_text("b");
        editor.checkpoint();
        editor.set_content("<p>new</p>").unwrap();
        assert!(!editor.history.can_undo());
        assert_eq!(editor.doc.text_content(), "new");
    }

    #[test]
    fn test_caret_or_end_defaults_to_document_end() {
        let mut editor = Editor::with_content("<p>hello</p>").unwrap();
        let caret = editor.caret_or_end().unwrap();
        assert_eq!(caret::caret_to_offset(&editor.doc, caret), 5);
    }
}
