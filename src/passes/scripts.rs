//! Script grouping: a `^`/`_` node following a base merges with it into a
//! synthetic script container; back-to-back `^`/`_` pairs merge into one
//! double-script container tagged with their source order. A preceding
//! `\limits` is absorbed, switching the container to its under/over form.
//!
//! Running the pass on an already-grouped tree is a no-op.

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind, ScriptOrder, Tag};

/// Names of the containers this pass synthesizes.
pub const SCRIPT_CONTAINERS: &[&str] = &["sub", "sup", "subsup", "under", "over", "underover"];

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn is_script_command(arena: &ExprArena, id: NodeId) -> bool {
    let node = arena.node(id);
    node.kind == NodeKind::Command && (node.name == "^" || node.name == "_") && node.math_mode
}

fn is_script_container(arena: &ExprArena, id: NodeId) -> bool {
    let node = arena.node(id);
    node.kind == NodeKind::Block && SCRIPT_CONTAINERS.contains(&node.name.as_str())
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];

            if !is_script_command(arena, child) || i == 0 {
                process(arena, child)?;
                i += 1;
                continue;
            }

            let prev = arena.node(id).groups[gi][i - 1];
            if is_script_container(arena, prev) || is_script_command(arena, prev) {
                // already grouped, or a baseless chain; leave it alone
                process(arena, child)?;
                i += 1;
                continue;
            }

            // absorb a \limits between operator and script
            let mut base_idx = i - 1;
            let mut limits = false;
            if arena.node(prev).is_command("limits") {
                if base_idx == 0 {
                    // \limits with no operator; drop it and retry
                    arena.splice(id, gi, base_idx, 1, Vec::new());
                    continue;
                }
                arena.splice(id, gi, base_idx, 1, Vec::new());
                limits = true;
                base_idx -= 1;
                // the script command shifted left by one
            }
            let script_idx = base_idx + 1;
            let script = arena.node(id).groups[gi][script_idx];
            let first_is_sup = arena.node(script).name == "^";

            // back-to-back opposite script?
            let double = arena
                .node(id)
                .groups[gi]
                .get(script_idx + 1)
                .copied()
                .filter(|next| {
                    is_script_command(arena, *next)
                        && (arena.node(*next).name == "^") != first_is_sup
                });

            let container = if let Some(second) = double {
                let name = if limits { "underover" } else { "subsup" };
                let block = arena.alloc_with_groups(NodeKind::Block, name, 3);
                let order = if first_is_sup {
                    ScriptOrder::SupFirst
                } else {
                    ScriptOrder::SubFirst
                };
                arena.node_mut(block).tag = Some(Tag::ScriptOrder(order));
                let removed = arena.splice(id, gi, base_idx, 3, vec![block]);
                let (base, first, _) = (removed[0], removed[1], removed[2]);
                arena.push_child(block, 0, base);
                // group 1 = subscript content, group 2 = superscript content
                let (sub_cmd, sup_cmd) = if first_is_sup {
                    (second, first)
                } else {
                    (first, second)
                };
                arena.move_children(sub_cmd, 0, block, 1);
                arena.move_children(sup_cmd, 0, block, 2);
                block
            } else {
                let name = match (first_is_sup, limits) {
                    (true, false) => "sup",
                    (false, false) => "sub",
                    (true, true) => "over",
                    (false, true) => "under",
                };
                let block = arena.alloc_with_groups(NodeKind::Block, name, 2);
                let removed = arena.splice(id, gi, base_idx, 2, vec![block]);
                let (base, cmd) = (removed[0], removed[1]);
                arena.push_child(block, 0, base);
                arena.move_children(cmd, 0, block, 1);
                block
            };

            arena.node_mut(container).math_mode = true;
            process(arena, container)?;
            i = arena.node(container).index_in_group + 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;

    fn grouped(source: &str) -> ExprArena {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        arena
    }

    fn math_children(arena: &ExprArena) -> Vec<NodeId> {
        let math = arena.node(arena.root()).groups[0][0];
        arena.node(math).groups[0].clone()
    }

    #[test]
    fn simple_superscript_groups() {
        let arena = grouped("$x^2+1$");
        let content = math_children(&arena);
        // sup(x,2), +, 1
        assert_eq!(content.len(), 3);
        let sup = content[0];
        assert!(arena.node(sup).is_block("sup"));
        assert_eq!(arena.flatten_nodes(&arena.node(sup).groups[0]), "x");
        assert_eq!(arena.flatten_nodes(&arena.node(sup).groups[1]), "2");
        assert_eq!(arena.node(content[1]).name, "+");
        assert_eq!(arena.node(content[2]).name, "1");
        arena.check_consistency().unwrap();
    }

    #[test]
    fn double_script_merges_with_order_tag() {
        let arena = grouped("$x_i^2$");
        let content = math_children(&arena);
        assert_eq!(content.len(), 1);
        let subsup = content[0];
        assert!(arena.node(subsup).is_block("subsup"));
        assert_eq!(
            arena.node(subsup).tag,
            Some(Tag::ScriptOrder(ScriptOrder::SubFirst))
        );
        assert_eq!(arena.flatten_nodes(&arena.node(subsup).groups[0]), "x");
        assert_eq!(arena.flatten_nodes(&arena.node(subsup).groups[1]), "i");
        assert_eq!(arena.flatten_nodes(&arena.node(subsup).groups[2]), "2");
    }

    #[test]
    fn sup_first_double_script_keeps_order_info() {
        let arena = grouped("$x^2_i$");
        let subsup = math_children(&arena)[0];
        assert_eq!(
            arena.node(subsup).tag,
            Some(Tag::ScriptOrder(ScriptOrder::SupFirst))
        );
    }

    #[test]
    fn limits_is_absorbed_into_underover() {
        let arena = grouped("$\\sum\\limits_{i=1}^n$");
        let content = math_children(&arena);
        assert_eq!(content.len(), 1);
        let block = content[0];
        assert!(arena.node(block).is_block("underover"));
        assert_eq!(arena.flatten_nodes(&arena.node(block).groups[1]), "i=1");
        assert_eq!(arena.flatten_nodes(&arena.node(block).groups[2]), "n");
    }

    #[test]
    fn grouping_is_idempotent() {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree("$a^2 b_1$", &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        let before = arena.dump(arena.root());
        run(&mut arena, &mut ctx).unwrap();
        let after = arena.dump(arena.root());
        assert_eq!(
            serde_json::to_string(&before).unwrap(),
            serde_json::to_string(&after).unwrap()
        );
    }

    #[test]
    fn baseless_leading_script_is_left_for_later() {
        let arena = grouped("$^{th}$");
        let content = math_children(&arena);
        assert_eq!(content.len(), 1);
        assert_eq!(arena.node(content[0]).name, "^");
        assert_eq!(arena.node(content[0]).kind, NodeKind::Command);
    }

    #[test]
    fn nested_scripts_inside_arguments_group_too() {
        let arena = grouped("$\\frac{a^2}{b}$");
        let math = arena.node(arena.root()).groups[0][0];
        let frac = arena.node(math).groups[0][0];
        let numerator = &arena.node(frac).groups[0];
        assert_eq!(numerator.len(), 1);
        assert!(arena.node(numerator[0]).is_block("sup"));
    }
}
