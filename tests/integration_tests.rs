//! Integration tests for laxml full document conversion

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use laxml::{
    convert_source, parse_document, ConversionError, ConvertOptions, NodeKind, Reference, Tag,
};

fn convert(source: &str) -> String {
    convert_source(source, PathBuf::from("."), ConvertOptions::default()).unwrap()
}

fn temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("laxml-it-{}-{}", name, std::process::id()));
    let _ = fs::create_dir_all(&dir);
    dir
}

fn write_file(dir: &PathBuf, name: &str, content: &str) {
    let mut file = fs::File::create(dir.join(name)).expect("create file");
    file.write_all(content.as_bytes()).expect("write file");
}

// ============================================================================
// Tree-shape scenarios
// ============================================================================

mod tree_shape {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_math_scenario() {
        // $x^2+1$: one inline-math node whose content, after script
        // grouping, is a single-script container followed by + and 1
        let (arena, _) = parse_document(
            "$x^2+1$",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        let root = arena.root();
        let p = arena.node(root).groups[0][0];
        let math = arena.node(p).groups[0][0];
        assert_eq!(arena.node(math).kind, NodeKind::InlineMath);

        let content = &arena.node(math).groups[0];
        assert_eq!(content.len(), 3);
        let script = content[0];
        assert!(arena.node(script).is_block("sup"));
        assert_eq!(arena.flatten_nodes(&arena.node(script).groups[0]), "x");
        assert_eq!(arena.flatten_nodes(&arena.node(script).groups[1]), "2");
        assert_eq!(arena.node(content[1]).name, "+");
        assert_eq!(arena.node(content[2]).name, "1");
    }

    #[test]
    fn itemized_list_scenario() {
        let (arena, _) = parse_document(
            "\\begin{itemize}\\item A\\item B\\end{itemize}",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        let list = arena.node(arena.root()).groups[0][0];
        assert!(arena.node(list).is_block("itemize"));
        assert_eq!(arena.node(list).groups.len(), 1);

        let items = &arena.node(list).groups[0];
        assert_eq!(items.len(), 2);
        for (item, expected) in items.iter().zip(["A", "B"]) {
            assert!(arena.node(*item).is_command("item"));
            assert_eq!(arena.node(*item).groups.len(), 1);
            assert_eq!(
                arena.flatten_nodes(&arena.node(*item).groups[0]).trim(),
                expected
            );
        }
    }

    #[test]
    fn custom_command_scenario() {
        let (arena, _) = parse_document(
            "\\newcommand{\\foo}[1]{X#1Y}\\foo{Z}",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        // the whole paragraph flattens to XZY, re-parented and re-indexed
        assert_eq!(arena.flatten_text(arena.root()), "XZY");
        arena.check_consistency().unwrap();
    }

    #[test]
    fn paragraph_break_scenario() {
        let (arena, _) = parse_document(
            "line one\n\nline two",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        let children = &arena.node(arena.root()).groups[0];
        assert_eq!(children.len(), 2);
        assert!(arena.node(children[0]).is_block("p"));
        assert!(arena.node(children[1]).is_block("p"));
        assert_eq!(arena.flatten_text(children[0]).trim(), "line one");
        assert_eq!(arena.flatten_text(children[1]).trim(), "line two");
    }

    #[test]
    fn counters_and_labels_populate_the_context() {
        let (_, ctx) = parse_document(
            "\\begin{figure}one\\label{fig:one}\\end{figure}\
             \\begin{figure}two\\label{fig:two}\\end{figure}",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(
            ctx.lookup_reference("fig:one"),
            Some(&Reference {
                kind: "figure".into(),
                number: 1,
            })
        );
        assert_eq!(
            ctx.lookup_reference("fig:two"),
            Some(&Reference {
                kind: "figure".into(),
                number: 2,
            })
        );
        assert_eq!(ctx.lookup_reference("fig:none"), None);
    }
}

// ============================================================================
// Full document conversion
// ============================================================================

mod document {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_article_converts_end_to_end() {
        let source = "\\documentclass{article}\n\
            \\title{A Tiny Article}\n\
            \\author{A. Author}\n\
            \\begin{document}\n\
            \\maketitle\n\
            \\section{Introduction}\n\
            Inline math $a_i + b^2$ and display:\n\
            $$\\frac{1}{2}$$\n\
            \n\
            \\begin{itemize}\n\
            \\item first\n\
            \\item second\n\
            \\end{itemize}\n\
            \\end{document}\n";
        let html = convert(source);
        assert!(html.contains("<title>A Tiny Article</title>"));
        assert!(html.contains("<h1 class=\"title\">A Tiny Article</h1>"));
        assert!(html.contains("<h2>1 Introduction</h2>"));
        assert!(html.contains("<msub>"));
        assert!(html.contains("<mfrac>"));
        assert!(html.contains("<li>first</li>"));
    }

    #[test]
    fn metadata_after_begin_document_still_titles() {
        let html = convert(
            "\\begin{document}\\title{Late}\\maketitle text\\end{document}",
        );
        assert!(html.contains("<h1 class=\"title\">Late</h1>"));
    }

    #[test]
    fn equation_gets_number_and_ref_resolves() {
        let html = convert(
            "\\begin{equation}E=mc^2\\label{eq:emc}\\end{equation}\
             Einstein wrote \\eqref{eq:emc}.",
        );
        assert!(html.contains("class=\"eqno\""));
        assert!(html.contains("<a href=\"#eq:emc\">(1)</a>"));
    }

    #[test]
    fn tabular_renders_as_table() {
        let html = convert(
            "\\begin{tabular}{ll} a & b \\\\ c & d \\end{tabular}",
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>a</td><td>b</td>"));
        assert!(html.contains("<td>c</td><td>d</td>"));
    }

    #[test]
    fn algorithmic_lines_are_numbered_and_indented() {
        let html = convert(
            "\\begin{algorithmic}\\STATE start\\IF{ready}\\STATE go\\ENDIF\\end{algorithmic}",
        );
        assert!(html.contains("class=\"algorithmic\""));
        assert!(html.contains("margin-left: 2em"));
        assert!(html.contains("<b>if</b>"));
    }

    #[test]
    fn baseless_script_is_hoisted_into_prose() {
        let html = convert("the 4$^{th}$ day");
        assert!(html.contains("<sup>"));
        assert!(html.contains("th"));
        // the emptied math span is gone
        assert!(!html.contains("<math"));
    }
}

// ============================================================================
// Imports and bibliography
// ============================================================================

mod resources {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn imported_file_contributes_content() {
        let dir = temp_dir("inputs");
        write_file(&dir, "chapter.tex", "imported text");
        let html = convert_source(
            "before \\input{chapter} after",
            dir,
            ConvertOptions::default(),
        )
        .unwrap();
        assert!(html.contains("imported text"));
    }

    #[test]
    fn missing_import_fails_unless_lenient() {
        let dir = temp_dir("missing-import");
        let err = convert_source("\\input{ghost}", dir.clone(), ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConversionError::ResourceError { .. }));

        let html = convert_source("ok \\input{ghost}", dir, ConvertOptions::lenient()).unwrap();
        assert!(html.contains("ok"));
    }

    #[test]
    fn verbatim_left_open_before_an_import_is_a_lex_error() {
        // a verbatim environment cannot straddle an import boundary: the
        // opening file fails to lex on its own
        let dir = temp_dir("verbatim-import");
        write_file(&dir, "tail.tex", "\\end{verbatim}");
        let err = convert_source(
            "\\begin{verbatim}raw\\input{tail}",
            dir,
            ConvertOptions::default(),
        )
        .unwrap_err();
        match err {
            ConversionError::LexError { construct, .. } => {
                assert_eq!(construct, "verbatim environment");
            }
            other => panic!("expected LexError, got {:?}", other),
        }
    }

    #[test]
    fn citations_number_in_bibliography_order() {
        let dir = temp_dir("bib");
        write_file(
            &dir,
            "refs.bib",
            "@article{knuth84, title = {Literate Programming}, year = 1984}\n\
             @book{lamport94, title = {LaTeX}, year = 1994}\n",
        );
        let html = convert_source(
            "See \\cite{lamport94} and \\cite{knuth84}.\\bibliography{refs}",
            dir,
            ConvertOptions::default(),
        )
        .unwrap();
        assert!(html.contains("<a href=\"#bib-lamport94\">2</a>"));
        assert!(html.contains("<a href=\"#bib-knuth84\">1</a>"));
        assert!(html.contains("References"));
        assert!(html.contains("Literate Programming"));
    }

    #[test]
    fn unknown_citation_is_flagged_inline() {
        let html = convert("\\cite{ghost}");
        assert!(html.contains("[?]"));
    }
}

// ============================================================================
// Error handling
// ============================================================================

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unterminated_brace_is_fatal_with_position() {
        let err = convert_source("ok {\nnever", PathBuf::from("."), ConvertOptions::default())
            .unwrap_err();
        match err {
            ConversionError::LexError {
                construct, line, ..
            } => {
                assert_eq!(construct, "brace group");
                assert_eq!(line, 1);
            }
            other => panic!("expected LexError, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_environment_is_fatal() {
        let err = convert_source(
            "\\begin{itemize}\\item a",
            PathBuf::from("."),
            ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unterminated environment"));
    }

    #[test]
    fn missing_arguments_degrade_to_warnings() {
        let (_, ctx) = parse_document(
            "$\\frac{1}$",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        assert!(ctx.warnings.iter().any(|w| w.message.contains("\\frac")));
    }

    #[test]
    fn unknown_constructs_never_halt_their_siblings() {
        let html = convert("\\mystery{a} still here \\begin{weird}inside\\end{weird} end");
        assert!(html.contains("still here"));
        assert!(html.contains("inside"));
        assert!(html.contains("end"));
        assert!(html.contains("unknown command"));
        assert!(html.contains("unknown environment"));
    }
}

// ============================================================================
// Pipeline invariants
// ============================================================================

mod invariants {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sibling_indices_hold_after_the_full_pipeline() {
        let (arena, _) = parse_document(
            "\\newcommand{\\q}[2]{#1 and #2}\
             \\begin{document}\\section{S}\\q{a}{b}\n\n\
             $x_1^2$ \\begin{itemize}\\item i\\end{itemize}\\end{document}",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        arena.check_consistency().unwrap();
    }

    #[test]
    fn numbering_is_strictly_increasing_per_kind() {
        let (arena, _) = parse_document(
            "\\begin{figure}a\\end{figure}\\begin{table}x\\end{table}\
             \\begin{figure}b\\end{figure}\\begin{figure}c\\end{figure}",
            PathBuf::from("."),
            ConvertOptions::default(),
            None,
        )
        .unwrap();
        let mut figures = Vec::new();
        let mut stack = vec![arena.root()];
        while let Some(id) = stack.pop() {
            let node = arena.node(id);
            if node.is_block("figure") {
                if let Some(Tag::Number(n)) = node.tag {
                    figures.push(n);
                }
            }
            for group in node.groups.iter().rev() {
                for child in group.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        assert_eq!(figures, vec![1, 2, 3]);
    }

    #[test]
    fn conversions_are_independent() {
        // counters and references never leak between conversions
        for _ in 0..2 {
            let (_, ctx) = parse_document(
                "\\begin{figure}f\\label{f}\\end{figure}",
                PathBuf::from("."),
                ConvertOptions::default(),
                None,
            )
            .unwrap();
            assert_eq!(
                ctx.lookup_reference("f"),
                Some(&Reference {
                    kind: "figure".into(),
                    number: 1,
                })
            );
        }
    }
}
