//! Environment encapsulation: each `\begin{X}...\end{X}` pair becomes a
//! single Block node named `X` whose first children-group holds
//! everything in between. Nested environments are encapsulated
//! recursively; an unmatched pair is fatal.

use crate::context::ConversionContext;
use crate::engine::commands::MATH_ENVIRONMENTS;
use crate::engine::env_name;
use crate::error::{ConversionError, ConversionResult};
use crate::tree::{ExprArena, NodeId, NodeKind};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];

            if arena.node(child).is_command("end") {
                let env = env_name(arena, child);
                return Err(ConversionError::ParseError {
                    message: format!("\\end{{{}}} without matching \\begin", env),
                    line: None,
                });
            }

            if !arena.node(child).is_command("begin") {
                process(arena, child)?;
                i += 1;
                continue;
            }

            let env = env_name(arena, child);
            let close = find_matching_end(arena, id, gi, i, &env).ok_or_else(|| {
                ConversionError::ParseError {
                    message: format!("unterminated environment '{}'", env),
                    line: None,
                }
            })?;

            let block = arena.alloc_with_groups(NodeKind::Block, env.clone(), 1);
            {
                let math =
                    arena.node(child).math_mode || MATH_ENVIRONMENTS.contains(env.as_str());
                let options = arena.node(child).options.clone();
                let ws = arena.node(child).ws_before;
                let node = arena.node_mut(block);
                node.math_mode = math;
                node.options = options;
                node.ws_before = ws;
            }

            let removed = arena.splice(id, gi, i, close - i + 1, vec![block]);
            // removed = [begin, interior..., end]
            for inner in &removed[1..removed.len() - 1] {
                arena.push_child(block, 0, *inner);
            }

            process(arena, block)?;
            i += 1;
        }
    }
    Ok(())
}

/// Index of the `\end` matching the `\begin` at `open`, skipping nested
/// same-name pairs.
fn find_matching_end(
    arena: &ExprArena,
    parent: NodeId,
    group: usize,
    open: usize,
    env: &str,
) -> Option<usize> {
    let children = &arena.node(parent).groups[group];
    let mut depth = 0usize;
    for (j, id) in children.iter().enumerate().skip(open + 1) {
        let node = arena.node(*id);
        if node.is_command("begin") && env_name(arena, *id) == env {
            depth += 1;
        } else if node.is_command("end") && env_name(arena, *id) == env {
            if depth == 0 {
                return Some(j);
            }
            depth -= 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;

    fn encapsulated(source: &str) -> ExprArena {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        arena
    }

    #[test]
    fn begin_end_pair_becomes_block() {
        let arena = encapsulated("\\begin{itemize}\\item A\\end{itemize}");
        let root = arena.root();
        assert_eq!(arena.group_len(root, 0), 1);
        let block = arena.node(root).groups[0][0];
        assert!(arena.node(block).is_block("itemize"));
        // interior: \item and the text
        assert_eq!(arena.node(block).groups[0].len(), 2);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn nested_environments_encapsulate_recursively() {
        let arena = encapsulated(
            "\\begin{figure}\\begin{center}x\\end{center}\\end{figure}",
        );
        let figure = arena.node(arena.root()).groups[0][0];
        assert!(arena.node(figure).is_block("figure"));
        let center = arena.node(figure).groups[0][0];
        assert!(arena.node(center).is_block("center"));
        assert_eq!(arena.flatten_text(center), "x");
    }

    #[test]
    fn nested_same_name_environments_match_correctly() {
        let arena = encapsulated(
            "\\begin{itemize}\\item a\\begin{itemize}\\item b\\end{itemize}\\end{itemize}",
        );
        let outer = arena.node(arena.root()).groups[0][0];
        assert!(arena.node(outer).is_block("itemize"));
        let inner = arena.node(outer).groups[0]
            .iter()
            .copied()
            .find(|id| arena.node(*id).is_block("itemize"))
            .expect("inner list");
        assert_eq!(arena.flatten_text(inner), "b");
    }

    #[test]
    fn math_environment_blocks_are_math_mode() {
        let arena = encapsulated("\\begin{equation}x\\end{equation}");
        let block = arena.node(arena.root()).groups[0][0];
        assert!(arena.node(block).is_block("equation"));
        assert!(arena.node(block).math_mode);
    }

    #[test]
    fn unterminated_environment_is_fatal() {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree("\\begin{itemize}\\item A", &mut ctx).unwrap();
        let err = run(&mut arena, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("unterminated environment"));
    }

    #[test]
    fn stray_end_is_fatal() {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree("x\\end{itemize}", &mut ctx).unwrap();
        assert!(run(&mut arena, &mut ctx).is_err());
    }
}
