//! Note persistence and scheduling around the editing core.
//!
//! - the on-disk note model and case-insensitive search
//! - a JSON-file note store
//! - reminder occurrence math and due-checking

pub mod note;
pub mod reminder;
pub mod storage;

pub use note::{Note, search};
pub use reminder::{Reminder, ReminderKind, TRIGGER_WINDOW_MINUTES, due_reminders};
pub use storage::{NoteStore, StorageError};
