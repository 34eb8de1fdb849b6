//! The rewrite passes, in their fixed order.
//!
//! Each pass mutates the shared tree in place and depends on invariants
//! established by the previous ones; the order below is load-bearing.
//! Pipeline progress is reported as (step, 14): step 1 is tree building,
//! steps 2-13 the passes here, step 14 the bibliography attachment.

pub mod algorithms;
pub mod baseless;
pub mod environments;
pub mod hoist;
pub mod imports;
pub mod labels;
pub mod lists;
pub mod macros;
pub mod numbering;
pub mod paragraphs;
pub mod scripts;
pub mod tables;

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::ExprArena;

/// Total pipeline steps reported to progress observers.
pub const TOTAL_STEPS: usize = 14;

/// Progress observer: called once per pass boundary with
/// `(step, TOTAL_STEPS)`. Purely observational.
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize);

type Pass = fn(&mut ExprArena, &mut ConversionContext) -> ConversionResult<()>;

/// The twelve passes in execution order.
const PASSES: &[(&str, Pass)] = &[
    ("imports", imports::run),
    ("macros", macros::run),
    ("hoist", hoist::run),
    ("environments", environments::run),
    ("tables", tables::run),
    ("scripts", scripts::run),
    ("lists", lists::run),
    ("paragraphs", paragraphs::run),
    ("baseless", baseless::run),
    ("numbering", numbering::run),
    ("labels", labels::run),
    ("algorithms", algorithms::run),
];

/// Run all passes over the built tree, reporting steps 2..=13.
pub fn run_passes(
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
    mut progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
) -> ConversionResult<()> {
    for (index, (_, pass)) in PASSES.iter().enumerate() {
        pass(arena, ctx)?;
        if let Some(observer) = progress.as_deref_mut() {
            observer(index + 2, TOTAL_STEPS);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_tree;

    #[test]
    fn every_pass_preserves_the_sibling_index_invariant() {
        let source = "\\newcommand{\\q}[1]{(#1)}\
            \\begin{document}\
            \\section{S}\\label{s}intro \\q{z}\n\n\
            $a_i^2 + ^{x}$\n\n\
            \\begin{itemize}\\item A\\item B\\end{itemize}\
            \\begin{tabular}{ll}a&b\\\\c&d\\end{tabular}\
            \\begin{equation}E\\label{eq}\\end{equation}\
            \\end{document}";
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree(source, &mut ctx).unwrap();
        arena.check_consistency().unwrap();
        for (name, pass) in PASSES {
            pass(&mut arena, &mut ctx).unwrap();
            if let Err(err) = arena.check_consistency() {
                panic!("pass '{}' broke the index invariant: {}", name, err);
            }
        }
    }

    #[test]
    fn progress_reports_each_pass_boundary() {
        let mut ctx = ConversionContext::default();
        let mut arena = build_tree("x", &mut ctx).unwrap();
        let mut steps = Vec::new();
        let mut observer = |step: usize, total: usize| {
            assert_eq!(total, TOTAL_STEPS);
            steps.push(step);
        };
        run_passes(&mut arena, &mut ctx, Some(&mut observer)).unwrap();
        assert_eq!(steps, (2..=13).collect::<Vec<_>>());
    }
}
