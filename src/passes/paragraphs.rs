//! Paragraph grouping: partition the flow-level children of a block into
//! paragraph containers, splitting at `\par` markers, heading commands,
//! display math, named blocks and verbatim blocks. A heading splitter
//! becomes a Block named after the heading, holding the heading node in
//! group 0 and the following run in group 1.

use phf::phf_set;

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind};

/// Heading-like commands that open their own container.
pub static HEADING_COMMANDS: phf::Set<&'static str> = phf_set! {
    "part", "chapter", "chapter*",
    "section", "section*",
    "subsection", "subsection*",
    "subsubsection", "subsubsection*",
    "paragraph", "subparagraph",
};

/// Blocks whose top-level children are prose flow.
static PARAGRAPHED_BLOCKS: phf::Set<&'static str> = phf_set! {
    "document", "abstract", "quote", "quotation",
    "center", "flushleft", "flushright",
};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn is_target(arena: &ExprArena, id: NodeId) -> bool {
    let node = arena.node(id);
    node.kind == NodeKind::Root
        || (node.kind == NodeKind::Block && PARAGRAPHED_BLOCKS.contains(node.name.as_str()))
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    if is_target(arena, id) {
        restructure(arena, id);
    }
    for gi in 0..arena.node(id).groups.len() {
        for ci in 0..arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][ci];
            process(arena, child)?;
        }
    }
    Ok(())
}

/// True when the run holds anything that would be visible in a paragraph.
fn has_substance(arena: &ExprArena, run: &[NodeId]) -> bool {
    run.iter().any(|id| {
        let node = arena.node(*id);
        match node.kind {
            NodeKind::Comment => false,
            NodeKind::Text => !node.name.trim().is_empty(),
            _ => true,
        }
    })
}

fn restructure(arena: &mut ExprArena, target: NodeId) {
    let children = {
        let ids = std::mem::take(&mut arena.node_mut(target).groups[0]);
        for id in &ids {
            arena.node_mut(*id).parent = None;
        }
        ids
    };

    let mut out: Vec<NodeId> = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    // a heading container waiting for its body run
    let mut pending: Option<NodeId> = None;

    macro_rules! flush {
        () => {{
            let run_ids = std::mem::take(&mut run);
            if let Some(heading) = pending.take() {
                for id in run_ids {
                    arena.push_child(heading, 1, id);
                }
                out.push(heading);
            } else if has_substance(arena, &run_ids) {
                let p = arena.alloc_with_groups(NodeKind::Block, "p", 1);
                for id in run_ids {
                    arena.push_child(p, 0, id);
                }
                out.push(p);
            } else {
                out.extend(run_ids);
            }
        }};
    }

    for child in children {
        let node = arena.node(child);
        let is_par = node.is_command("par");
        let is_heading =
            node.kind == NodeKind::Command && HEADING_COMMANDS.contains(node.name.as_str());
        let heading_name = if is_heading { Some(node.name.clone()) } else { None };
        let splits = match node.kind {
            NodeKind::DisplayMath | NodeKind::Verbatim => true,
            NodeKind::Block => node.name != "{}",
            _ => false,
        };
        if is_par {
            flush!();
            continue;
        }
        if is_heading {
            flush!();
            let name = heading_name.unwrap();
            let heading = arena.alloc_with_groups(NodeKind::Block, name, 2);
            arena.push_child(heading, 0, child);
            pending = Some(heading);
            continue;
        }
        if splits {
            flush!();
            out.push(child);
            continue;
        }
        run.push(child);
    }
    flush!();

    for id in out {
        arena.push_child(target, 0, id);
    }
}
