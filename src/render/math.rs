//! MathML rendering for math-mode subtrees.
//!
//! Token nodes classify into `mi`/`mn`/`mo`; script containers map onto
//! the `msub`/`msup`/`munder`/`mover` family; re-segmented tables become
//! `mtable` grids. Symbol commands resolve through the static entity
//! tables.

use super::{escape_text, Renderer};
use crate::passes::tables::TABLE_ENVIRONMENTS;
use crate::symbols::{
    Accent, FUNCTION_NAMES, GREEK_LETTERS, LETTER_SYMBOLS, MATH_FONTS, OPERATOR_SYMBOLS,
    TEXT_ESCAPES,
};
use crate::tree::{NodeId, NodeKind};

/// Render a math-mode node sequence into a complete `<math>` element.
pub fn render_math_nodes_to_string(
    renderer: &mut Renderer<'_>,
    ids: &[NodeId],
    display: bool,
    alt: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str("<math xmlns=\"http://www.w3.org/1998/Math/MathML\" display=\"");
    out.push_str(if display { "block" } else { "inline" });
    out.push('"');
    if let Some(alt) = alt {
        out.push_str(&format!(" alttext=\"{}\"", escape_text(alt)));
    }
    out.push('>');

    let gridded = ids
        .iter()
        .any(|id| renderer.node(*id).is_block("row"));
    if gridded {
        out.push_str("<mtable>");
        for id in ids {
            if renderer.node(*id).is_block("row") {
                render_row(renderer, *id, &mut out);
            }
        }
        out.push_str("</mtable>");
    } else {
        out.push_str("<mrow>");
        render_seq(renderer, ids, &mut out);
        out.push_str("</mrow>");
    }

    out.push_str("</math>");
    out
}

fn render_seq(renderer: &mut Renderer<'_>, ids: &[NodeId], out: &mut String) {
    for id in ids {
        render_one(renderer, *id, out);
    }
}

/// Render one children-group wrapped in `<mrow>` so script/fraction slots
/// always hold exactly one element.
fn render_group(renderer: &mut Renderer<'_>, id: NodeId, group: usize, out: &mut String) {
    out.push_str("<mrow>");
    let children = renderer
        .node(id)
        .groups
        .get(group)
        .cloned()
        .unwrap_or_default();
    render_seq(renderer, &children, out);
    out.push_str("</mrow>");
}

fn render_row(renderer: &mut Renderer<'_>, row: NodeId, out: &mut String) {
    out.push_str("<mtr>");
    for cell in renderer.node(row).groups[0].clone() {
        out.push_str("<mtd>");
        let content = renderer.node(cell).groups[0].clone();
        render_seq(renderer, &content, out);
        out.push_str("</mtd>");
    }
    out.push_str("</mtr>");
}

fn render_one(renderer: &mut Renderer<'_>, id: NodeId, out: &mut String) {
    match renderer.node(id).kind {
        NodeKind::Text => render_token(&renderer.node(id).name.clone(), out),
        NodeKind::Comment => {}
        NodeKind::Verbatim => {
            out.push_str(&format!(
                "<mtext>{}</mtext>",
                escape_text(&renderer.node(id).name)
            ));
        }
        NodeKind::InlineMath | NodeKind::DisplayMath | NodeKind::Root => {
            render_group(renderer, id, 0, out)
        }
        NodeKind::Block => render_block(renderer, id, out),
        NodeKind::Command => render_command(renderer, id, out),
    }
}

/// Classify a re-segmented math token.
fn render_token(token: &str, out: &mut String) {
    if token.trim().is_empty() {
        return;
    }
    if token == "\u{2062}" {
        out.push_str("<mo>&#x2062;</mo>");
        return;
    }
    if token.chars().all(|c| c.is_ascii_alphabetic()) {
        out.push_str(&format!("<mi>{}</mi>", escape_text(token)));
    } else if token.chars().all(|c| c.is_ascii_digit() || c == '.') {
        out.push_str(&format!("<mn>{}</mn>", escape_text(token)));
    } else {
        out.push_str(&format!("<mo>{}</mo>", escape_text(token.trim())));
    }
}

fn render_block(renderer: &mut Renderer<'_>, id: NodeId, out: &mut String) {
    let name = renderer.node(id).name.clone();
    match name.as_str() {
        "{}" | "[]" | "p" => render_group(renderer, id, 0, out),
        "sub" => {
            out.push_str("<msub>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</msub>");
        }
        "sup" => {
            out.push_str("<msup>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</msup>");
        }
        "subsup" => {
            // msubsup order is fixed (base, sub, sup); the source-order
            // tag only matters for hoisted prose scripts
            out.push_str("<msubsup>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            render_group(renderer, id, 2, out);
            out.push_str("</msubsup>");
        }
        "under" => {
            out.push_str("<munder>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</munder>");
        }
        "over" => {
            out.push_str("<mover>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</mover>");
        }
        "underover" => {
            out.push_str("<munderover>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            render_group(renderer, id, 2, out);
            out.push_str("</munderover>");
        }
        "cases" => {
            out.push_str("<mrow><mo>{</mo>");
            render_table(renderer, id, out);
            out.push_str("</mrow>");
        }
        _ if TABLE_ENVIRONMENTS.contains(name.as_str()) => {
            let fences = matrix_fences(&name);
            match fences {
                Some((open, close)) => {
                    out.push_str(&format!("<mrow><mo>{}</mo>", open));
                    render_table(renderer, id, out);
                    out.push_str(&format!("<mo>{}</mo></mrow>", close));
                }
                None => render_table(renderer, id, out),
            }
        }
        _ => render_group(renderer, id, 0, out),
    }
}

fn matrix_fences(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "pmatrix" => Some(("(", ")")),
        "bmatrix" => Some(("[", "]")),
        "Bmatrix" => Some(("{", "}")),
        "vmatrix" => Some(("|", "|")),
        "Vmatrix" => Some(("&#x2016;", "&#x2016;")),
        _ => None,
    }
}

fn render_table(renderer: &mut Renderer<'_>, id: NodeId, out: &mut String) {
    out.push_str("<mtable>");
    for row in renderer.node(id).groups[0].clone() {
        if renderer.node(row).is_block("row") {
            render_row(renderer, row, out);
        }
    }
    out.push_str("</mtable>");
}

fn render_command(renderer: &mut Renderer<'_>, id: NodeId, out: &mut String) {
    let name = renderer.node(id).name.clone();

    if let Some(entity) = GREEK_LETTERS.get(name.as_str()) {
        out.push_str(&format!("<mi>{}</mi>", entity));
        return;
    }
    if let Some(entity) = LETTER_SYMBOLS.get(name.as_str()) {
        out.push_str(&format!("<mi>{}</mi>", entity));
        return;
    }
    if let Some(entity) = OPERATOR_SYMBOLS.get(name.as_str()) {
        out.push_str(&format!("<mo>{}</mo>", entity));
        return;
    }
    if FUNCTION_NAMES.contains(name.as_str()) {
        out.push_str(&format!("<mi>{}</mi>", name));
        return;
    }
    if let Some(variant) = MATH_FONTS.get(name.as_str()) {
        out.push_str(&format!("<mstyle mathvariant=\"{}\">", variant));
        render_group(renderer, id, 0, out);
        out.push_str("</mstyle>");
        return;
    }
    if let Some(accent) = Accent::from_command(&name) {
        let spec = accent.params();
        out.push_str("<mover accent=\"true\">");
        render_group(renderer, id, 0, out);
        out.push_str(&format!(
            "<mo stretchy=\"{}\">{}</mo></mover>",
            spec.stretchy, spec.entity
        ));
        return;
    }

    match name.as_str() {
        "frac" | "dfrac" | "tfrac" => {
            out.push_str("<mfrac>");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</mfrac>");
        }
        "binom" => {
            out.push_str("<mrow><mo>(</mo><mfrac linethickness=\"0\">");
            render_group(renderer, id, 0, out);
            render_group(renderer, id, 1, out);
            out.push_str("</mfrac><mo>)</mo></mrow>");
        }
        "sqrt" => {
            let degree = match &renderer.node(id).options {
                Some(crate::tree::Options::List(ids)) if !ids.is_empty() => Some(ids.clone()),
                _ => None,
            };
            match degree {
                Some(ids) => {
                    out.push_str("<mroot>");
                    render_group(renderer, id, 0, out);
                    out.push_str("<mrow>");
                    render_seq(renderer, &ids, out);
                    out.push_str("</mrow></mroot>");
                }
                None => {
                    out.push_str("<msqrt>");
                    render_group(renderer, id, 0, out);
                    out.push_str("</msqrt>");
                }
            }
        }
        "overline" => {
            out.push_str("<mover>");
            render_group(renderer, id, 0, out);
            out.push_str("<mo stretchy=\"true\">&#xAF;</mo></mover>");
        }
        "overbrace" => {
            out.push_str("<mover>");
            render_group(renderer, id, 0, out);
            out.push_str("<mo stretchy=\"true\">&#x23DE;</mo></mover>");
        }
        "underbrace" => {
            out.push_str("<munder>");
            render_group(renderer, id, 0, out);
            out.push_str("<mo stretchy=\"true\">&#x23DF;</mo></munder>");
        }
        "stackrel" | "overset" => {
            out.push_str("<mover>");
            render_group(renderer, id, 1, out);
            render_group(renderer, id, 0, out);
            out.push_str("</mover>");
        }
        "underset" => {
            out.push_str("<munder>");
            render_group(renderer, id, 1, out);
            render_group(renderer, id, 0, out);
            out.push_str("</munder>");
        }
        "phantom" => {
            out.push_str("<mphantom>");
            render_group(renderer, id, 0, out);
            out.push_str("</mphantom>");
        }
        "operatorname" => {
            let text = renderer.arena.flatten_text(id);
            out.push_str(&format!("<mi>{}</mi>", escape_text(text.trim())));
        }
        "text" | "textnormal" | "mbox" | "hbox" | "textrm" | "textbf" | "textit" | "texttt" => {
            let text = renderer.arena.flatten_text(id);
            out.push_str(&format!("<mtext>{}</mtext>", escape_text(&text)));
        }
        "^" | "_" => {
            // a script that never found a base
            let element = if name == "^" { "msup" } else { "msub" };
            out.push_str(&format!("<{}><mrow></mrow>", element));
            render_group(renderer, id, 0, out);
            out.push_str(&format!("</{}>", element));
        }
        "quad" | "qquad" | "," | ";" | " " => out.push_str("<mtext>&#x2009;</mtext>"),
        "\\" | "&" | "left" | "right" | "big" | "Big" | "bigg" | "Bigg" | "limits"
        | "nolimits" | "displaystyle" | "textstyle" | "scriptstyle" | "par" => {}
        "label" => {
            let key = renderer.arena.flatten_text(id);
            out.push_str(&format!(
                "<mrow id=\"{}\"></mrow>",
                escape_text(key.trim())
            ));
        }
        _ => {
            if let Some(escape) = TEXT_ESCAPES.get(name.as_str()) {
                out.push_str(&format!("<mtext>{}</mtext>", escape));
                return;
            }
            out.push_str(&format!(
                "<!-- unknown command: \\{} -->",
                escape_text(&name).replace("--", "- -")
            ));
            renderer
                .ctx
                .warn(crate::error::ConversionWarning::new(format!(
                    "unknown math command '\\{}'",
                    name
                )));
            let groups = renderer.node(id).groups.len();
            for gi in 0..groups {
                render_group(renderer, id, gi, out);
            }
        }
    }
}
