//! Table post-parsing: re-segment the flat children of array-like blocks
//! into a row/cell grid, splitting on `\\` and `&`, dropping rules and
//! comments, and wrapping each cell's content in its own node.

use phf::phf_set;

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind, Options};

/// Environments restructured into a grid.
pub static TABLE_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "tabular", "tabular*", "longtable", "array",
    "eqnarray", "eqnarray*", "align", "align*", "alignat", "alignat*",
    "matrix", "pmatrix", "bmatrix", "Bmatrix", "vmatrix", "Vmatrix",
    "cases",
};

/// Rule/spacing commands dropped during re-segmentation.
static DROPPED: phf::Set<&'static str> = phf_set! {
    "hline", "cline", "toprule", "midrule", "bottomrule", "centering",
};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    // children first: a tabular nested in a cell restructures before the
    // outer grid is rebuilt
    for gi in 0..arena.node(id).groups.len() {
        for ci in 0..arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][ci];
            process(arena, child)?;
        }
    }

    let node = arena.node(id);
    if node.kind != NodeKind::Block || !TABLE_ENVIRONMENTS.contains(node.name.as_str()) {
        return Ok(());
    }
    restructure(arena, id);
    Ok(())
}

fn restructure(arena: &mut ExprArena, table: NodeId) {
    let math = arena.node(table).math_mode;
    let mut children = {
        let ids = std::mem::take(&mut arena.node_mut(table).groups[0]);
        for id in &ids {
            arena.node_mut(*id).parent = None;
        }
        ids
    };

    // A leading anonymous group on tabular/array is the column spec
    if matches!(arena.node(table).name.as_str(), "tabular" | "tabular*" | "longtable" | "array")
    {
        if let Some(first) = children.first().copied() {
            if arena.node(first).is_block("{}") {
                let colspec = arena.flatten_text(first);
                children.remove(0);
                if arena.node(table).options.is_none() {
                    let mut map = indexmap::IndexMap::new();
                    map.insert("colspec".to_string(), colspec);
                    arena.node_mut(table).options = Some(Options::KeyValue(map));
                }
            }
        }
    }

    let mut rows: Vec<Vec<Vec<NodeId>>> = Vec::new();
    let mut row: Vec<Vec<NodeId>> = Vec::new();
    let mut cell: Vec<NodeId> = Vec::new();

    for child in children {
        let node = arena.node(child);
        let dropped = node.kind == NodeKind::Comment
            || (node.kind == NodeKind::Command && DROPPED.contains(node.name.as_str()));
        if dropped {
            continue;
        }
        if node.is_command("\\") {
            row.push(std::mem::take(&mut cell));
            rows.push(std::mem::take(&mut row));
            continue;
        }
        if node.is_command("&") {
            row.push(std::mem::take(&mut cell));
            continue;
        }
        cell.push(child);
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    for cells in rows {
        // a row holding nothing but whitespace came from a trailing \\
        let empty = cells.iter().all(|cell| {
            cell.iter().all(|id| {
                let node = arena.node(*id);
                node.kind == NodeKind::Text && node.name.trim().is_empty()
            })
        });
        if empty {
            continue;
        }
        let row_id = arena.alloc_with_groups(NodeKind::Block, "row", 1);
        arena.node_mut(row_id).math_mode = math;
        for content in cells {
            let cell_id = arena.alloc_with_groups(NodeKind::Block, "cell", 1);
            arena.node_mut(cell_id).math_mode = math;
            for id in content {
                arena.push_child(cell_id, 0, id);
            }
            arena.push_child(row_id, 0, cell_id);
        }
        arena.push_child(table, 0, row_id);
    }
}
