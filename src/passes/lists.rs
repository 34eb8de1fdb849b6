//! List grouping: within itemize/enumerate/description blocks, the run of
//! content following each `\item` moves into a new children-group of that
//! `\item`. Content before the first item stays in place.

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::symbols::ListKind;
use crate::tree::{ExprArena, NodeId, NodeKind};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    let is_list = arena.node(id).kind == NodeKind::Block
        && ListKind::from_environment(&arena.node(id).name).is_some();
    if is_list {
        regroup(arena, id);
    }
    for gi in 0..arena.node(id).groups.len() {
        for ci in 0..arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][ci];
            process(arena, child)?;
        }
    }
    Ok(())
}

fn regroup(arena: &mut ExprArena, list: NodeId) {
    let children = {
        let ids = std::mem::take(&mut arena.node_mut(list).groups[0]);
        for id in &ids {
            arena.node_mut(*id).parent = None;
        }
        ids
    };

    let mut current: Option<(NodeId, usize)> = None;
    for child in children {
        if arena.node(child).is_command("item") {
            arena.push_child(list, 0, child);
            let gi = arena.add_group(child);
            current = Some((child, gi));
            continue;
        }
        match current {
            Some((item, gi)) => arena.push_child(item, gi, child),
            // leading material before the first \item
            None => arena.push_child(list, 0, child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;
    use crate::passes::environments;

    fn listed(source: &str) -> ExprArena {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        environments::run(&mut arena, &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        arena
    }

    #[test]
    fn items_own_their_content() {
        let arena = listed("\\begin{itemize}\\item A\\item B\\end{itemize}");
        let list = arena.node(arena.root()).groups[0][0];
        assert!(arena.node(list).is_block("itemize"));

        let items = &arena.node(list).groups[0];
        assert_eq!(items.len(), 2, "single children-group with two items");
        for (item, expected) in items.iter().zip(["A", "B"]) {
            let node = arena.node(*item);
            assert!(node.is_command("item"));
            assert_eq!(node.groups.len(), 1);
            assert_eq!(arena.flatten_nodes(&node.groups[0]).trim(), expected);
        }
        arena.check_consistency().unwrap();
    }

    #[test]
    fn nested_list_belongs_to_enclosing_item() {
        let arena = listed(
            "\\begin{itemize}\\item a\\begin{itemize}\\item b\\end{itemize}\\item c\\end{itemize}",
        );
        let outer = arena.node(arena.root()).groups[0][0];
        let items = &arena.node(outer).groups[0];
        assert_eq!(items.len(), 2);
        let first_content = &arena.node(items[0]).groups[0];
        // text 'a' plus the nested itemize block
        assert_eq!(first_content.len(), 2);
        assert!(arena.node(first_content[1]).is_block("itemize"));
    }

    #[test]
    fn description_items_keep_their_option() {
        let arena =
            listed("\\begin{description}\\item[term] def\\end{description}");
        let list = arena.node(arena.root()).groups[0][0];
        let item = arena.node(list).groups[0][0];
        assert!(arena.node(item).options.is_some());
        assert_eq!(
            arena.flatten_nodes(&arena.node(item).groups[0]).trim(),
            "def"
        );
    }
}
