//! Table grid editing: insertion, row/column mutation, cell navigation.
//!
//! Tables stay rectangular: every row has the same number of cells, the
//! first row is the header row, and the last remaining row or column
//! can never be deleted.

use crate::document::Document;
use crate::node::{NodeId, NodeKind};

/// Build a table with one header row and `rows - 1` body rows, each cell
/// seeded with an empty text node. Returns the table node, unattached.
pub fn build_table(doc: &mut Document, rows: usize, cols: usize) -> NodeId {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let arena = &mut doc.arena;
    let table = arena.alloc(NodeKind::Table);
    for r in 0..rows {
        let row = arena.alloc(NodeKind::TableRow);
        for _ in 0..cols {
            let cell = arena.alloc(NodeKind::TableCell { header: r == 0 });
            let text = arena.text("");
            arena.append_child(cell, text);
            arena.append_child(row, cell);
        }
        arena.append_child(table, row);
    }
    table
}

fn table_of_cell(doc: &Document, cell: NodeId) -> Option<(NodeId, NodeId)> {
    let row = doc.arena.parent(cell)?;
    let table = doc.arena.parent(row)?;
    if matches!(doc.arena.kind(row), NodeKind::TableRow)
        && matches!(doc.arena.kind(table), NodeKind::Table)
    {
        Some((table, row))
    } else {
        None
    }
}

/// Insert a body row below the row containing `cell`, matching its width.
pub fn insert_row_below(doc: &mut Document, cell: NodeId) -> bool {
    let Some((_, row)) = table_of_cell(doc, cell) else {
        return false;
    };
    let width = doc.arena.children(row).len();
    let arena = &mut doc.arena;
    let new_row = arena.alloc(NodeKind::TableRow);
    for _ in 0..width {
        let new_cell = arena.alloc(NodeKind::TableCell { header: false });
        let text = arena.text("");
        arena.append_child(new_cell, text);
        arena.append_child(new_row, new_cell);
    }
    arena.insert_after(row, new_row);
    true
}

/// Delete the row containing `cell`. Refused for the table's only row.
pub fn delete_row(doc: &mut Document, cell: NodeId) -> bool {
    let Some((table, row)) = table_of_cell(doc, cell) else {
        return false;
    };
    if doc.arena.children(table).len() <= 1 {
        return false;
    }
    doc.arena.detach(row);
    true
}

/// Insert a column to the right of the column containing `cell`, in
/// every row, preserving the header flag from each row's first cell.
pub fn insert_column_right(doc: &mut Document, cell: NodeId) -> bool {
    let Some((table, _)) = table_of_cell(doc, cell) else {
        return false;
    };
    let Some(col) = doc.arena.child_index(cell) else {
        return false;
    };
    let rows: Vec<NodeId> = doc.arena.children(table).to_vec();
    for row in rows {
        let cells = doc.arena.children(row).to_vec();
        let header = cells
            .first()
            .map(|&c| matches!(doc.arena.kind(c), NodeKind::TableCell { header: true }))
            .unwrap_or(false);
        let arena = &mut doc.arena;
        let new_cell = arena.alloc(NodeKind::TableCell { header });
        let text = arena.text("");
        arena.append_child(new_cell, text);
        match cells.get(col) {
            Some(&anchor) => arena.insert_after(anchor, new_cell),
            None => arena.append_child(row, new_cell),
        }
    }
    true
}

/// Delete the column containing `cell` from every row. Refused for the
/// table's only column.
pub fn delete_column(doc: &mut Document, cell: NodeId) -> bool {
    let Some((table, row)) = table_of_cell(doc, cell) else {
        return false;
    };
    if doc.arena.children(row).len() <= 1 {
        return false;
    }
    let Some(col) = doc.arena.child_index(cell) else {
        return false;
    };
    let rows: Vec<NodeId> = doc.arena.children(table).to_vec();
    for row in rows {
        if let Some(&victim) = doc.arena.children(row).get(col) {
            doc.arena.detach(victim);
        }
    }
    true
}

/// The next cell in row-major order, wrapping to the next row. `None`
/// at the table's last cell.
pub fn next_cell(doc: &Document, cell: NodeId) -> Option<NodeId> {
    if let Some(next) = doc.arena.next_sibling(cell) {
        return Some(next);
    }
    let (_, row) = table_of_cell(doc, cell)?;
    let next_row = doc.arena.next_sibling(row)?;
    doc.arena.first_child(next_row)
}

/// The previous cell in row-major order, wrapping to the previous row's
/// last cell. `None` at the table's first cell.
pub fn prev_cell(doc: &Document, cell: NodeId) -> Option<NodeId> {
    if let Some(prev) = doc.arena.prev_sibling(cell) {
        return Some(prev);
    }
    let (_, row) = table_of_cell(doc, cell)?;
    let prev_row = doc.arena.prev_sibling(row)?;
    doc.arena.last_child(prev_row)
}

/// Row and cell counts, for invariant checks: `(rows, cells_per_row)`.
/// Returns `None` when rows disagree on width.
pub fn dimensions(doc: &Document, table: NodeId) -> Option<(usize, usize)> {
    let rows = doc.arena.children(table);
    let width = doc.arena.children(*rows.first()?).len();
    if rows.iter().any(|&r| doc.arena.children(r).len() != width) {
        return None;
    }
    Some((rows.len(), width))
}
