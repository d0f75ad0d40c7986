//! Platform-independent rich-text editing core for sticky notes.
//!
//! The engine owns a block/inline document tree and everything that
//! edits it:
//!
//! - markdown-style autoformatting on space, enter, and tab
//! - a structural command set with toggle semantics
//! - snapshot undo/redo with debounced checkpointing
//! - table grid editing with rectangularity guarantees
//! - an HTML-shaped persistence format and a markdown importer
//!
//! The host integrates through [`host::EditorHost`] and the keymap; the
//! core never touches a window, a file, or a clock beyond the debounce
//! instants the host passes in.

pub mod autoformat;
pub mod caret;
pub mod command;
pub mod document;
pub mod editor;
pub mod execute;
pub mod history;
pub mod host;
pub mod keymap;
pub mod locate;
pub mod markdown;
pub mod markup;
pub mod node;
pub mod table;

pub use caret::{Caret, DomSelection};
pub use command::Command;
pub use document::Document;
pub use editor::Editor;
pub use execute::{CommandError, execute_command};
pub use history::{DebouncedCheckpoint, History, HistoryEntry};
pub use host::{EditorHost, ImageError, NullHost, insert_image};
pub use keymap::{Key, KeyCombo, KeydownResult, Modifiers, handle_keydown};
pub use markdown::import_markdown;
pub use markup::MarkupError;
pub use node::{ListKind, NodeArena, NodeId, NodeKind};
