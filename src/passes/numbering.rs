//! Numbering: a depth-first walk assigns an incrementing per-block-name
//! counter value to every named block's tag. Heading blocks additionally
//! accumulate table-of-contents entries.

use phf::phf_set;

use crate::context::{ConversionContext, TocEntry};
use crate::error::ConversionResult;
use crate::passes::paragraphs::HEADING_COMMANDS;
use crate::tree::{ExprArena, NodeId, NodeKind, Tag};

/// Synthetic/anonymous block names that never get a counter.
static UNNUMBERED: phf::Set<&'static str> = phf_set! {
    "{}", "[]", "p", "row", "cell",
    "sub", "sup", "subsup", "under", "over", "underover",
    "document",
};

pub fn run(arena: &mut ExprArena, ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    visit(arena, ctx, root);
    Ok(())
}

fn visit(arena: &mut ExprArena, ctx: &mut ConversionContext, id: NodeId) {
    let node = arena.node(id);
    let numberable = node.kind == NodeKind::Block
        && !UNNUMBERED.contains(node.name.as_str())
        && !node.name.ends_with('*')
        && node.tag.is_none();
    if numberable {
        let name = arena.node(id).name.clone();
        let number = ctx.next_counter(&name);
        arena.node_mut(id).tag = Some(Tag::Number(number));

        if HEADING_COMMANDS.contains(name.as_str()) {
            // heading blocks keep the heading command in group 0; its
            // flattened text is the entry title
            let title = match arena.node(id).groups.first() {
                Some(group) => arena.flatten_nodes(group).trim().to_string(),
                None => String::new(),
            };
            ctx.toc.push(TocEntry {
                kind: name,
                number,
                title,
            });
        }
    }

    for gi in 0..arena.node(id).groups.len() {
        for ci in 0..arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][ci];
            visit(arena, ctx, child);
        }
    }
}
