//! Static command specifications used by the tree builder.
//!
//! Known commands declare how many brace groups they take and whether a
//! `[...]` option block is allowed; the builder stops scanning once the
//! declared shape is satisfied. Commands absent from every table are
//! unknown: the builder captures their immediately-trailing groups as-is
//! so the renderer can echo them back.

use phf::{phf_map, phf_set};

use crate::symbols;

/// Declared argument shape of a known command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Whether one leading/interleaved `[...]` option block is accepted
    pub options: bool,
    /// Number of `{...}` value groups
    pub groups: u8,
}

const fn args(options: bool, groups: u8) -> ArgSpec {
    ArgSpec { options, groups }
}

/// Argument shapes for commands with at least one argument.
static COMMAND_ARGS: phf::Map<&'static str, ArgSpec> = phf_map! {
    // structure
    "documentclass" => args(true, 1),
    "usepackage" => args(true, 1),
    "begin" => args(true, 1),
    "end" => args(false, 1),
    "input" => args(false, 1),
    "include" => args(false, 1),
    "title" => args(false, 1),
    "author" => args(false, 1),
    "date" => args(false, 1),
    "thanks" => args(false, 1),
    "part" => args(true, 1),
    "chapter" => args(true, 1),
    "chapter*" => args(false, 1),
    "section" => args(true, 1),
    "section*" => args(false, 1),
    "subsection" => args(true, 1),
    "subsection*" => args(false, 1),
    "subsubsection" => args(true, 1),
    "subsubsection*" => args(false, 1),
    "paragraph" => args(true, 1),
    "subparagraph" => args(true, 1),
    "item" => args(true, 0),
    "\\" => args(true, 0),
    "caption" => args(true, 1),
    "footnote" => args(false, 1),
    "label" => args(false, 1),
    "ref" => args(false, 1),
    "eqref" => args(false, 1),
    "pageref" => args(false, 1),
    "autoref" => args(false, 1),
    "cite" => args(true, 1),
    "citep" => args(true, 1),
    "citet" => args(true, 1),
    "nocite" => args(false, 1),
    "bibliography" => args(false, 1),
    "bibliographystyle" => args(false, 1),
    "includegraphics" => args(true, 1),
    "url" => args(false, 1),
    "href" => args(false, 2),
    "hyperref" => args(true, 1),
    "newcommand" => args(true, 2),
    "renewcommand" => args(true, 2),
    "providecommand" => args(true, 2),
    "newenvironment" => args(true, 3),
    "setcounter" => args(false, 2),
    "addtocounter" => args(false, 2),
    "setlength" => args(false, 2),
    "cline" => args(false, 1),
    "multicolumn" => args(false, 3),
    "parbox" => args(true, 2),
    "makebox" => args(true, 1),
    "framebox" => args(true, 1),
    "raisebox" => args(false, 2),
    "vspace" => args(false, 1),
    "vspace*" => args(false, 1),
    "hspace" => args(false, 1),
    "hspace*" => args(false, 1),
    "rule" => args(true, 2),
    "textcolor" => args(false, 2),
    "color" => args(false, 1),
    "colorbox" => args(false, 2),
    "graphicspath" => args(false, 1),
    "pagestyle" => args(false, 1),
    "thispagestyle" => args(false, 1),
    "numberwithin" => args(false, 2),
    // text styles and sizes with an argument
    "textbf" => args(false, 1),
    "textit" => args(false, 1),
    "texttt" => args(false, 1),
    "textsc" => args(false, 1),
    "textsf" => args(false, 1),
    "textrm" => args(false, 1),
    "textsl" => args(false, 1),
    "textup" => args(false, 1),
    "emph" => args(false, 1),
    "underline" => args(false, 1),
    "uline" => args(false, 1),
    "mbox" => args(false, 1),
    "hbox" => args(false, 1),
    "text" => args(false, 1),
    "textnormal" => args(false, 1),
    // math layout
    "frac" => args(false, 2),
    "dfrac" => args(false, 2),
    "tfrac" => args(false, 2),
    "binom" => args(false, 2),
    "sqrt" => args(true, 1),
    "overline" => args(false, 1),
    "overbrace" => args(false, 1),
    "underbrace" => args(false, 1),
    "stackrel" => args(false, 2),
    "overset" => args(false, 2),
    "underset" => args(false, 2),
    "phantom" => args(false, 1),
    "operatorname" => args(false, 1),
    // math fonts
    "mathbf" => args(false, 1),
    "mathit" => args(false, 1),
    "mathrm" => args(false, 1),
    "mathsf" => args(false, 1),
    "mathtt" => args(false, 1),
    "mathcal" => args(false, 1),
    "mathbb" => args(false, 1),
    "mathfrak" => args(false, 1),
    "boldsymbol" => args(false, 1),
    // accents (text and math)
    "hat" => args(false, 1),
    "check" => args(false, 1),
    "breve" => args(false, 1),
    "acute" => args(false, 1),
    "grave" => args(false, 1),
    "tilde" => args(false, 1),
    "bar" => args(false, 1),
    "vec" => args(false, 1),
    "dot" => args(false, 1),
    "ddot" => args(false, 1),
    "widehat" => args(false, 1),
    "widetilde" => args(false, 1),
    "overrightarrow" => args(false, 1),
    "'" => args(false, 1),
    "`" => args(false, 1),
    "\"" => args(false, 1),
    "^" => args(false, 1),
    "~" => args(false, 1),
    "c" => args(false, 1),
    "v" => args(false, 1),
    "u" => args(false, 1),
    "=" => args(false, 1),
    "." => args(false, 1),
};

/// Environments whose content is lexed in math mode.
pub static MATH_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "math", "displaymath",
    "equation", "equation*",
    "eqnarray", "eqnarray*",
    "align", "align*",
    "alignat", "alignat*",
    "gather", "gather*",
    "multline", "multline*",
    "array",
};

/// Commands whose argument groups are prose (or opaque keys) even inside
/// math: their contents must never be re-segmented into math tokens.
pub static TEXT_ARG_COMMANDS: phf::Set<&'static str> = phf_set! {
    "text", "textnormal", "mbox", "hbox", "textrm", "textbf", "textit",
    "texttt", "footnote", "caption",
    "begin", "end", "label", "ref", "eqref", "pageref", "autoref",
    "cite", "citep", "citet", "nocite", "bibliography", "operatorname",
};

/// The declared shape of `name`, if it is a known command.
pub fn arity(name: &str) -> Option<ArgSpec> {
    if let Some(spec) = COMMAND_ARGS.get(name) {
        return Some(*spec);
    }
    if symbols::is_symbol(name) || symbols::NO_ARG_COMMANDS.contains(name) {
        return Some(args(false, 0));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shapes() {
        assert_eq!(arity("frac"), Some(args(false, 2)));
        assert_eq!(arity("sqrt"), Some(args(true, 1)));
        assert_eq!(arity("alpha"), Some(args(false, 0)));
        assert_eq!(arity("hline"), Some(args(false, 0)));
        assert_eq!(arity("madeupcmd"), None);
    }
}
