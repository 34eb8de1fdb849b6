//! Command hoisting: document metadata written after `\begin{document}`
//! moves to just before it, preserving relative order, so later passes see
//! metadata resolved before document content.
//!
//! Runs on the still-flat root sequence, before environment encapsulation.

use crate::context::ConversionContext;
use crate::engine::env_name;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind};

const METADATA_COMMANDS: &[&str] = &["title", "author", "date"];

pub fn run(arena: &mut ExprArena, ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();

    let begin_doc = arena.node(root).groups[0].iter().copied().position(|id| {
        let node = arena.node(id);
        node.is_command("begin") && env_name(arena, id) == "document"
    });

    // record metadata nodes wherever they appear
    for id in arena.node(root).groups[0].clone() {
        let node = arena.node(id);
        if node.kind != NodeKind::Command {
            continue;
        }
        match node.name.as_str() {
            "title" => ctx.title = Some(id),
            "author" => ctx.author = Some(id),
            "date" => ctx.date = Some(id),
            _ => {}
        }
    }

    let Some(begin_idx) = begin_doc else {
        return Ok(());
    };

    // collect metadata commands sitting after the document start
    let late: Vec<NodeId> = arena.node(root).groups[0][begin_idx + 1..]
        .iter()
        .copied()
        .filter(|id| {
            let node = arena.node(*id);
            node.kind == NodeKind::Command && METADATA_COMMANDS.contains(&node.name.as_str())
        })
        .collect();

    for id in late {
        let from = arena.node(id).index_in_group;
        arena.remove_child(root, 0, from);
        // insert right before the (possibly shifted) document start
        let begin_node = arena.node(root).groups[0]
            .iter()
            .copied()
            .position(|c| {
                arena.node(c).is_command("begin") && env_name(arena, c) == "document"
            })
            .expect("document start still present");
        arena.insert_child(root, 0, begin_node, id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;

    #[test]
    fn late_metadata_moves_before_document_start() {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(
            "\\documentclass{article}\\begin{document}\\title{T}\\author{A}x\\end{document}",
            &mut ctx,
        )
        .unwrap();
        run(&mut arena, &mut ctx).unwrap();

        let root = arena.root();
        let names: Vec<String> = arena.node(root).groups[0]
            .iter()
            .map(|id| arena.node(*id).name.clone())
            .collect();
        let begin = names.iter().position(|n| n == "begin").unwrap();
        let title = names.iter().position(|n| n == "title").unwrap();
        let author = names.iter().position(|n| n == "author").unwrap();
        assert!(title < begin);
        assert!(author < begin);
        assert!(title < author, "relative order is preserved");
        assert!(ctx.title.is_some());
        arena.check_consistency().unwrap();
    }

    #[test]
    fn preamble_metadata_stays_put() {
        let mut ctx = ConversionContext::default();
        let mut arena =
            build_tree("\\title{T}\\begin{document}x\\end{document}", &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        let root = arena.root();
        assert_eq!(arena.node(arena.node(root).groups[0][0]).name, "title");
        assert!(ctx.title.is_some());
    }
}
