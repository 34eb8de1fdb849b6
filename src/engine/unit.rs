//! Lexical unit definitions for the reader.
//!
//! A unit is the smallest thing the reader hands to the tree builder:
//! a command, a raw balanced span (group or math), a comment, a script
//! argument, or a plain text run. Raw spans keep their source text; the
//! builder re-lexes them recursively.

use std::fmt;

/// The argument of a `^`/`_` script as the reader saw it: a single
/// character, a single command, or a single brace group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptArg {
    Char(char),
    Command(String),
    Group(String),
}

/// One lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// A command name, without the leading backslash. Single-symbol
    /// commands like `\%` carry the symbol as their name.
    Command(String),
    /// A balanced `{...}` span, braces stripped
    Group(String),
    /// A `$...$` span, delimiters stripped
    InlineMath(String),
    /// A `$$...$$` span, delimiters stripped
    DisplayMath(String),
    /// `%` comment up to end of line
    Comment(String),
    /// `&` table-cell separator
    CellSep,
    /// `^`/`_` with its argument (math mode only)
    Script { sup: bool, arg: ScriptArg },
    /// A plain text run
    Text(String),
    /// Paragraph break synthesized from a blank line
    Par,
    /// Raw verbatim content, up to the closing `\end{verbatim}`
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub kind: UnitKind,
    /// Whether whitespace was consumed immediately before this unit
    pub ws_before: bool,
    /// 1-based source line the unit started on
    pub line: usize,
}

impl Unit {
    pub fn is_command(&self, name: &str) -> bool {
        matches!(&self.kind, UnitKind::Command(n) if n == name)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Command(name) => write!(f, "\\{}", name),
            UnitKind::Group(text) => write!(f, "{{{}}}", text),
            UnitKind::InlineMath(text) => write!(f, "${}$", text),
            UnitKind::DisplayMath(text) => write!(f, "$${}$$", text),
            UnitKind::Comment(text) => write!(f, "%{}", text),
            UnitKind::CellSep => f.write_str("&"),
            UnitKind::Script { sup, arg } => {
                f.write_str(if *sup { "^" } else { "_" })?;
                match arg {
                    ScriptArg::Char(c) => write!(f, "{}", c),
                    ScriptArg::Command(name) => write!(f, "\\{}", name),
                    ScriptArg::Group(text) => write!(f, "{{{}}}", text),
                }
            }
            UnitKind::Text(text) => f.write_str(text),
            UnitKind::Par => f.write_str("\\par"),
            UnitKind::Verbatim(text) => f.write_str(text),
        }
    }
}
