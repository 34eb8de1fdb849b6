//! Import inclusion: replace `\input`/`\include` nodes with the parsed
//! tree of the referenced file, splicing its top-level children into the
//! parent sequence at the same position.

use std::fs;
use std::path::PathBuf;

use crate::context::ConversionContext;
use crate::engine::build_fragment;
use crate::error::{ConversionError, ConversionResult, ConversionWarning};
use crate::preprocess::preformat;
use crate::tree::{ExprArena, NodeId, NodeKind};

/// Total includes processed per conversion before assuming a cycle.
const MAX_IMPORTS: usize = 64;

pub fn run(arena: &mut ExprArena, ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    let mut budget = MAX_IMPORTS;
    process(arena, ctx, root, &mut budget)
}

fn process(
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
    id: NodeId,
    budget: &mut usize,
) -> ConversionResult<()> {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];
            let node = arena.node(child);
            let is_import =
                node.kind == NodeKind::Command && (node.name == "input" || node.name == "include");
            if !is_import {
                process(arena, ctx, child, budget)?;
                i += 1;
                continue;
            }

            let target = arena
                .node(child)
                .groups
                .first()
                .map(|group| arena.flatten_nodes(group))
                .unwrap_or_default();
            let target = target.trim();
            if *budget == 0 {
                ctx.warn(ConversionWarning::new(format!(
                    "include limit reached at '{}'; possible include cycle",
                    target
                )));
                arena.splice(id, gi, i, 1, Vec::new());
                continue;
            }

            let path = resolve(ctx, target);
            match fs::read_to_string(&path) {
                Ok(text) => {
                    *budget -= 1;
                    let spliced = build_fragment(&preformat(&text), arena, ctx)?;
                    arena.splice(id, gi, i, 1, spliced);
                    // re-scan from the same index: the spliced content may
                    // itself contain imports
                    continue;
                }
                Err(err) if ctx.options.skip_missing => {
                    ctx.warn(ConversionWarning::info(format!(
                        "skipping missing import '{}': {}",
                        path.display(),
                        err
                    )));
                    arena.splice(id, gi, i, 1, Vec::new());
                    continue;
                }
                Err(err) => {
                    return Err(ConversionError::ResourceError {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Resolve an import target against the source directory, defaulting the
/// `.tex` extension.
fn resolve(ctx: &ConversionContext, target: &str) -> PathBuf {
    let mut path = ctx.source_dir.join(target);
    if path.extension().is_none() {
        path.set_extension("tex");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConvertOptions;
    use crate::engine::build_tree;
    use std::io::Write;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("laxml-{}-{}", name, std::process::id()));
        let _ = fs::create_dir_all(&dir);
        dir
    }

    #[test]
    fn import_splices_children_in_place() {
        let dir = temp_dir("import");
        let mut file = fs::File::create(dir.join("part.tex")).unwrap();
        file.write_all(b"B C").unwrap();

        let mut ctx = ConversionContext::new(dir, ConvertOptions::default());
        let mut arena = build_tree("A \\input{part} D", &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();

        let root = arena.root();
        let flat = arena.flatten_text(root);
        assert_eq!(flat, "A B C D");
        arena.check_consistency().unwrap();
    }

    #[test]
    fn missing_import_is_fatal_by_default() {
        let mut ctx = ConversionContext::new(temp_dir("missing"), ConvertOptions::default());
        let mut arena = build_tree("\\input{nowhere}", &mut ctx).unwrap();
        let err = run(&mut arena, &mut ctx).unwrap_err();
        assert!(matches!(err, ConversionError::ResourceError { .. }));
    }

    #[test]
    fn missing_import_skips_when_lenient() {
        let mut ctx = ConversionContext::new(temp_dir("lenient"), ConvertOptions::lenient());
        let mut arena = build_tree("a \\input{nowhere} b", &mut ctx).unwrap();
        run(&mut arena, &mut ctx).unwrap();
        assert_eq!(arena.flatten_text(arena.root()), "a  b");
        assert_eq!(ctx.warnings.len(), 1);
    }
}
