//! The structural command set, dispatched by [`crate::execute`].

use crate::node::ListKind;

/// Every structural edit a toolbar button or shortcut can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Heading(u8),
    List(ListKind),
    TaskList,
    Blockquote,
    Link,
    InlineCode,
    CodeBlock,
    InsertTable { rows: usize, cols: usize },
    InsertTableRow,
    DeleteTableRow,
    InsertTableColumn,
    DeleteTableColumn,
    IndentListItem,
    OutdentListItem,
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleStrikethrough,
    ToggleHighlight,
    Undo,
    Redo,
}
