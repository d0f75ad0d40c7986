//! Keyboard plumbing: key/modifier types and the shortcut table.
//!
//! The host translates its platform key events into [`KeyCombo`]s and
//! calls [`handle_keydown`]; the result tells it whether to suppress
//! the platform's default behavior.

use smol_str::SmolStr;

use crate::autoformat;
use crate::command::Command;
use crate::editor::Editor;
use crate::execute::{self, CommandError};
use crate::host::EditorHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Character(SmolStr),
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Self::NONE
    };
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Self::NONE
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };
    pub const META_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Self::NONE
    };

    /// The platform primary modifier: Cmd on macOS, Ctrl elsewhere.
    pub fn primary(self, is_mac: bool) -> bool {
        if is_mac { self.meta } else { self.ctrl }
    }

    pub fn primary_only(self, is_mac: bool) -> bool {
        self.primary(is_mac) && !self.shift && !self.alt
    }

    pub fn primary_shift(self, is_mac: bool) -> bool {
        self.primary(is_mac) && self.shift && !self.alt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// The editor consumed the keystroke; suppress platform handling.
    Handled,
    /// Not ours; let the platform do its default.
    NotHandled,
}

/// Map a shortcut combo to its command, if any.
pub fn shortcut_command(combo: &KeyCombo, is_mac: bool) -> Option<Command> {
    let mods = combo.modifiers;
    if let Key::Character(c) = &combo.key {
        let lower = c.to_ascii_lowercase();
        if mods.primary_only(is_mac) {
            return match lower.as_str() {
                "b" => Some(Command::ToggleBold),
                "i" => Some(Command::ToggleItalic),
                "u" => Some(Command::ToggleUnderline),
                "z" => Some(Command::Undo),
                "y" => Some(Command::Redo),
                _ => None,
            };
        }
        if mods.primary_shift(is_mac) {
            return match lower.as_str() {
                "x" => Some(Command::ToggleStrikethrough),
                "h" => Some(Command::ToggleHighlight),
                "z" => Some(Command::Redo),
                _ => None,
            };
        }
    }
    None
}

/// The full keydown path: shortcuts first, then the autoformat engine
/// for space, enter, and tab.
pub fn handle_keydown<H: EditorHost>(
    editor: &mut Editor,
    host: &mut H,
    combo: &KeyCombo,
    is_mac: bool,
) -> Result<KeydownResult, CommandError> {
    if let Some(command) = shortcut_command(combo, is_mac) {
        execute::execute_command(editor, host, &command)?;
        return Ok(KeydownResult::Handled);
    }

    let handled = match (&combo.key, combo.modifiers) {
        (Key::Space, Modifiers::NONE) => autoformat::on_space(editor),
        (Key::Enter, Modifiers::NONE) => autoformat::on_enter(editor),
        (Key::Tab, Modifiers::NONE) => autoformat::on_tab(editor, false),
        (Key::Tab, Modifiers::SHIFT) => autoformat::on_tab(editor, true),
        _ => false,
    };
    if handled {
        host.content_changed();
        Ok(KeydownResult::Handled)
    } else {
        Ok(KeydownResult::NotHandled)
    }
}
