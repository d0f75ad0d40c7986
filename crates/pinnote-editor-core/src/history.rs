//! Snapshot-based undo/redo with a debounced checkpoint clock.
//!
//! Each history entry is a full document clone plus the flat selection
//! offsets at checkpoint time. The undo stack never drops below one
//! entry (the baseline state), holds at most `max_entries`, and any new
//! checkpoint invalidates the redo stack.

use web_time::{Duration, Instant};

use crate::document::Document;

pub const MAX_HISTORY_ENTRIES: usize = 100;
pub const CHECKPOINT_DEBOUNCE: Duration = Duration::from_millis(500);

/// One undo snapshot.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub doc: Document,
    /// Flat `(start, end)` character offsets of the selection.
    pub selection: (usize, usize),
}

#[derive(Debug)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_entries: usize,
}

impl History {
    /// A history seeded with the initial document state. The seed entry
    /// is the floor: it can be returned to but never evicted by undo.
    pub fn new(initial: &Document, selection: (usize, usize)) -> Self {
        Self::with_capacity(initial, selection, MAX_HISTORY_ENTRIES)
    }

    pub fn with_capacity(
        initial: &Document,
        selection: (usize, usize),
        max_entries: usize,
    ) -> Self {
        Self {
            undo: vec![HistoryEntry {
                doc: initial.clone(),
                selection,
            }],
            redo: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record the current state. A checkpoint structurally identical to
    /// the top of the stack pushes nothing, but still refreshes the top
    /// entry's selection so undo returns the caret to where it last sat
    /// in that state. Any accepted checkpoint clears the redo stack.
    pub fn checkpoint(&mut self, doc: &Document, selection: (usize, usize)) {
        if let Some(top) = self.undo.last_mut() {
            if top.doc.same_structure(doc) {
                top.selection = selection;
                return;
            }
        }
        tracing::trace!(depth = self.undo.len() + 1, "history checkpoint");
        self.undo.push(HistoryEntry {
            doc: doc.clone(),
            selection,
        });
        self.redo.clear();
        if self.undo.len() > self.max_entries {
            self.undo.remove(0);
        }
    }

    /// Step back one entry. The popped state moves to the redo stack and
    /// the new top is returned for restoration. `None` at the floor.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if self.undo.len() <= 1 {
            return None;
        }
        let popped = self.undo.pop().unwrap();
        self.redo.push(popped);
        self.undo.last().cloned()
    }

    /// Step forward one entry previously undone.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        Some(entry)
    }
}

/// A cancellable checkpoint deadline.
///
/// Every edit reschedules the deadline; the host polls with the current
/// time and takes a checkpoint when the deadline has passed without
/// another edit. Tests drive this with synthetic instants.
#[derive(Debug)]
pub struct DebouncedCheckpoint {
    deadline: Option<Instant>,
    delay: Duration,
}

impl DebouncedCheckpoint {
    pub fn new(delay: Duration) -> Self {
        Self {
            deadline: None,
            delay,
        }
    }

    /// Start or restart the debounce window at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the deadline elapses.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for DebouncedCheckpoint {
    fn default() -> Self {
        Self::new(CHECKPOINT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn doc(text: &str) -> Document {
        Document::from_markup(&format!("<p>{text}</p>")).unwrap()
    }

    fn edit(d: &mut Document, text: &str) {
        let id = d.text_nodes()[0];
        *d.arena.kind_mut(id) = NodeKind::Text(text.into());
    }

    #[test]
    fn test_undo_floor_is_one_entry() {
        let mut history = History::new(&doc("a"), (0, 0));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut d = doc("a");
        let mut history = History::new(&d, (1, 1));
        edit(&mut d, "ab");
        history.checkpoint(&d, (2, 2));

        let restored = history.undo().unwrap();
        assert_eq!(restored.doc.text_content(), "a");
        assert_eq!(restored.selection, (1, 1));
    }

    #[test]
    fn test_redo_after_undo() {
        let mut d = doc("a");
        let mut history = History::new(&d, (1, 1));
        edit(&mut d, "ab");
        history.checkpoint(&d, (2, 2));

        history.undo().unwrap();
        let redone = history.redo().unwrap();
        assert_eq!(redone.doc.text_content(), "ab");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_checkpoint_clears_redo() {
        let mut d = doc("a");
        let mut history = History::new(&d, (0, 0));
        edit(&mut d, "ab");
        history.checkpoint(&d, (0, 0));
        history.undo().unwrap();
        assert!(history.can_redo());

        edit(&mut d, "ax");
        history.checkpoint(&d, (0, 0));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_identical_checkpoint_dedups() {
        let d = doc("a");
        let mut history = History::new(&d, (0, 0));
        history.checkpoint(&d, (5, 5));
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut d = doc("0");
        let mut history = History::with_capacity(&d, (0, 0), 3);
        for i in 1..10 {
            edit(&mut d, &i.to_string());
            history.checkpoint(&d, (0, 0));
        }
        assert_eq!(history.undo_depth(), 3);
        // Walk all the way back; the oldest surviving state is "7".
        let mut last = None;
        while let Some(entry) = history.undo() {
            last = Some(entry);
        }
        assert_eq!(last.unwrap().doc.text_content(), "7");
    }

    #[test]
    fn test_undo_then_redo_is_identity() {
        let mut d = doc("a");
        let mut history = History::new(&d, (0, 0));
        edit(&mut d, "ab");
        history.checkpoint(&d, (2, 2));
        edit(&mut d, "abc");
        history.checkpoint(&d, (3, 3));

        history.undo().unwrap();
        let back = history.redo().unwrap();
        assert!(back.doc.same_structure(&d));
    }

    #[test]
    fn test_debounce_resets_on_reschedule() {
        let t0 = Instant::now();
        let mut debounce = DebouncedCheckpoint::new(Duration::from_millis(500));

        debounce.schedule(t0);
        assert!(!debounce.poll(t0 + Duration::from_millis(400)));

        // A second edit inside the window pushes the deadline out.
        debounce.schedule(t0 + Duration::from_millis(400));
        assert!(!debounce.poll(t0 + Duration::from_millis(600)));
        assert!(debounce.poll(t0 + Duration::from_millis(900)));
        // Fires once only.
        assert!(!debounce.poll(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_debounce_cancel() {
        let t0 = Instant::now();
        let mut debounce = DebouncedCheckpoint::default();
        debounce.schedule(t0);
        debounce.cancel();
        assert!(!debounce.poll(t0 + Duration::from_secs(10)));
    }
}
