//! Label resolution: each `\label` records the numbering kind and value
//! of its nearest enclosing numbered block in the context's reference
//! table, keyed by the label's flattened text.

use crate::context::{ConversionContext, Reference};
use crate::error::{ConversionResult, ConversionWarning};
use crate::tree::{ExprArena, NodeId, NodeKind, Tag};

pub fn run(arena: &mut ExprArena, ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    visit(arena, ctx, root);
    Ok(())
}

fn visit(arena: &ExprArena, ctx: &mut ConversionContext, id: NodeId) {
    if arena.node(id).is_command("label") {
        resolve(arena, ctx, id);
    }
    for group in &arena.node(id).groups {
        for child in group {
            visit(arena, ctx, *child);
        }
    }
}

fn resolve(arena: &ExprArena, ctx: &mut ConversionContext, label: NodeId) {
    let key = match arena.node(label).groups.first() {
        Some(group) => arena.flatten_nodes(group).trim().to_string(),
        None => String::new(),
    };
    if key.is_empty() {
        ctx.warn(ConversionWarning::new("\\label with empty key"));
        return;
    }

    let target = arena.ancestors(label).find_map(|ancestor| {
        let node = arena.node(ancestor);
        if node.kind != NodeKind::Block {
            return None;
        }
        match &node.tag {
            Some(Tag::Number(n)) => Some((node.name.clone(), *n)),
            _ => None,
        }
    });

    match target {
        Some((kind, number)) => {
            if ctx.references.contains_key(&key) {
                ctx.warn(ConversionWarning::new(format!(
                    "duplicate label '{}'",
                    key
                )));
                return;
            }
            ctx.references.insert(key, Reference { kind, number });
        }
        None => {
            ctx.warn(ConversionWarning::new(format!(
                "label '{}' outside any numbered block",
                key
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;
    use crate::passes::{environments, numbering, paragraphs};

    fn resolved(source: &str) -> ConversionContext {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        environments::run(&mut arena, &mut ctx).unwrap();
        paragraphs::run(&mut arena, &mut ctx).unwrap();
        numbering::run(&mut arena, &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        ctx
    }

    #[test]
    fn label_resolves_to_enclosing_block() {
        let ctx = resolved(
            "\\begin{equation}x\\label{eq:x}\\end{equation}\
             \\begin{figure}f\\label{fig:f}\\end{figure}",
        );
        assert_eq!(
            ctx.lookup_reference("eq:x"),
            Some(&Reference {
                kind: "equation".into(),
                number: 1,
            })
        );
        assert_eq!(
            ctx.lookup_reference("fig:f"),
            Some(&Reference {
                kind: "figure".into(),
                number: 1,
            })
        );
    }

    #[test]
    fn section_labels_resolve_to_the_heading_block() {
        let ctx = resolved("\\section{One}\\label{sec:one}text");
        assert_eq!(
            ctx.lookup_reference("sec:one"),
            Some(&Reference {
                kind: "section".into(),
                number: 1,
            })
        );
    }

    #[test]
    fn undefined_lookup_fails_cleanly() {
        let ctx = resolved("\\begin{equation}x\\label{eq:x}\\end{equation}");
        assert_eq!(ctx.lookup_reference("eq:missing"), None);
    }

    #[test]
    fn orphan_label_warns() {
        let ctx = resolved("\\label{lost}");
        assert!(ctx
            .warnings
            .iter()
            .any(|w| w.message.contains("outside any numbered block")));
    }
}
