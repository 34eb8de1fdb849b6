//! laxml - LaTeX to XHTML+MathML converter
//!
//! The pipeline: preformat the source, build the expression tree, run the
//! twelve rewrite passes in order, attach the bibliography, then render
//! XHTML with embedded MathML. Each conversion owns its tree and context;
//! independent documents may convert in parallel, one document never does.
//!
//! ```
//! use laxml::{convert_source, ConvertOptions};
//! use std::path::PathBuf;
//!
//! let html = convert_source("Hello $x^2$", PathBuf::from("."), ConvertOptions::default())
//!     .unwrap();
//! assert!(html.contains("<msup>"));
//! ```

pub mod bib;
pub mod context;
pub mod engine;
pub mod error;
pub mod passes;
pub mod preprocess;
pub mod render;
pub mod symbols;
pub mod tree;

use std::fs;
use std::path::{Path, PathBuf};

pub use context::{ConversionContext, ConvertOptions, Reference};
pub use error::{ConversionError, ConversionResult, ConversionWarning, DiagnosticSeverity};
pub use passes::{Progress, TOTAL_STEPS};
pub use tree::{ExprArena, NodeId, NodeKind, Tag};

/// Run the core pipeline: preformat, build, rewrite, attach bibliography.
/// Returns the finished tree and the populated context; rendering is the
/// caller's choice.
pub fn parse_document(
    source: &str,
    source_dir: PathBuf,
    options: ConvertOptions,
    mut progress: Option<Progress<'_>>,
) -> ConversionResult<(ExprArena, ConversionContext)> {
    let mut ctx = ConversionContext::new(source_dir, options);
    let preformatted = preprocess::preformat(source);
    let mut arena = engine::build_tree(&preformatted, &mut ctx)?;
    if let Some(observer) = progress.as_deref_mut() {
        observer(1, TOTAL_STEPS);
    }

    passes::run_passes(&mut arena, &mut ctx, progress.as_deref_mut())?;

    bib::attach_bibliography(&mut arena, &mut ctx)?;
    if let Some(observer) = progress.as_deref_mut() {
        observer(TOTAL_STEPS, TOTAL_STEPS);
    }

    Ok((arena, ctx))
}

/// Convert LaTeX source text to an XHTML document.
pub fn convert_source(
    source: &str,
    source_dir: PathBuf,
    options: ConvertOptions,
) -> ConversionResult<String> {
    let (arena, mut ctx) = parse_document(source, source_dir, options, None)?;
    Ok(render::render_document(&arena, &mut ctx))
}

/// Convert a LaTeX file to an XHTML document. Relative imports and
/// bibliography paths resolve against the file's directory.
pub fn convert_file(path: &Path, options: ConvertOptions) -> ConversionResult<String> {
    let source = fs::read_to_string(path)?;
    let source_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    convert_source(&source, source_dir, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_source_produces_a_document() {
        let html =
            convert_source("hello", PathBuf::from("."), ConvertOptions::default()).unwrap();
        assert!(html.starts_with("<?xml"));
        assert!(html.contains("<p>hello</p>"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn progress_covers_all_fourteen_steps() {
        let mut steps = Vec::new();
        let mut observer = |step: usize, total: usize| {
            assert_eq!(total, TOTAL_STEPS);
            steps.push(step);
        };
        parse_document(
            "x",
            PathBuf::from("."),
            ConvertOptions::default(),
            Some(&mut observer),
        )
        .unwrap();
        assert_eq!(steps, (1..=14).collect::<Vec<_>>());
    }

    #[test]
    fn lex_errors_abort_the_conversion() {
        let err = convert_source("{never closed", PathBuf::from("."), ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConversionError::LexError { .. }));
    }
}
