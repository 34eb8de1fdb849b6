//! Baseless-script simplification: an inline-math span whose first
//! element is a bare `^`/`_` node (no preceding base) hoists it out of
//! the span into the surrounding flow; a span emptied this way is
//! removed.

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn is_bare_script(arena: &ExprArena, id: NodeId) -> bool {
    let node = arena.node(id);
    node.kind == NodeKind::Command && (node.name == "^" || node.name == "_")
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];
            if arena.node(child).kind != NodeKind::InlineMath {
                process(arena, child)?;
                i += 1;
                continue;
            }

            while !arena.node(child).groups[0].is_empty() {
                let first = arena.node(child).groups[0][0];
                if !is_bare_script(arena, first) {
                    break;
                }
                arena.remove_child(child, 0, 0);
                let at = arena.node(child).index_in_group;
                arena.insert_child(id, gi, at, first);
            }

            if arena.node(child).groups[0].is_empty() {
                // nothing left inside the span
                arena.splice(id, gi, arena.node(child).index_in_group, 1, Vec::new());
                continue;
            }

            process(arena, child)?;
            i = arena.node(child).index_in_group + 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;

    fn simplified(source: &str) -> ExprArena {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        arena
    }

    #[test]
    fn leading_script_hoists_out_of_the_span() {
        let arena = simplified("4$^{th}$ of July");
        let root = arena.root();
        let children = &arena.node(root).groups[0];
        // 4, hoisted ^th, then the trailing text (the emptied span is gone)
        assert_eq!(children.len(), 3);
        assert_eq!(arena.node(children[0]).name, "4");
        assert!(arena.node(children[1]).is_command("^"));
        assert_eq!(
            arena.flatten_nodes(&arena.node(children[1]).groups[0]),
            "th"
        );
        assert_eq!(arena.node(children[2]).kind, NodeKind::Text);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn span_with_remaining_content_survives() {
        let arena = simplified("$^2x$");
        let root = arena.root();
        let children = &arena.node(root).groups[0];
        assert_eq!(children.len(), 2);
        assert!(arena.node(children[0]).is_command("^"));
        assert_eq!(arena.node(children[1]).kind, NodeKind::InlineMath);
        assert_eq!(arena.flatten_nodes(&arena.node(children[1]).groups[0]), "x");
    }

    #[test]
    fn based_scripts_are_untouched() {
        let arena = simplified("$x^2$");
        let root = arena.root();
        assert_eq!(arena.node(root).groups[0].len(), 1);
        assert_eq!(
            arena.node(arena.node(root).groups[0][0]).kind,
            NodeKind::InlineMath
        );
    }
}
