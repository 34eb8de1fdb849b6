//! Core state and structures for a single LaTeX to XHTML conversion.
//!
//! One `ConversionContext` is created per document and threaded by
//! reference through every pipeline stage; nothing is reached through
//! ambient/static state. Independent conversions never share a context.

use std::path::PathBuf;

use fxhash::FxHashMap;
use indexmap::IndexMap;

use crate::bib::Bibliography;
use crate::error::ConversionWarning;
use crate::tree::NodeId;

/// Options for LaTeX to XHTML conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Treat a missing import/bibliography file as a logged skip instead of
    /// a fatal error.
    /// Default: false
    pub skip_missing: bool,

    /// Localization code used for generated strings (figure/table captions,
    /// reference text).
    /// Default: "en"
    pub locale: String,

    /// Maximum nesting depth for custom-command expansion before the
    /// expander gives up on a node.
    /// Default: 64
    pub max_macro_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            skip_missing: false,
            locale: "en".into(),
            max_macro_depth: 64,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that skip over missing resources instead of failing
    pub fn lenient() -> Self {
        Self {
            skip_missing: true,
            ..Self::default()
        }
    }
}

/// A resolved label: the kind of block that carried it and the counter
/// value that block was assigned by the numbering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: String,
    pub number: u32,
}

/// One table-of-contents entry accumulated by the numbering pass.
#[derive(Debug, Clone)]
pub struct TocEntry {
    /// Heading kind ("section", "subsection", ...)
    pub kind: String,
    pub number: u32,
    pub title: String,
}

/// A registered `\newcommand`-style macro definition.
///
/// `body` points at the definition's body subtree, which stays alive in
/// the arena (detached) after the definition node is removed from the
/// tree; each invocation instantiates a deep copy.
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub params: u8,
    pub body: Vec<NodeId>,
}

/// Text size/style flags tracked while rendering prose.
#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub size: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

/// Mutable per-conversion state shared by the passes and the renderer.
#[derive(Debug, Default)]
pub struct ConversionContext {
    pub options: ConvertOptions,
    /// Directory of the source document; `\input` and bibliography paths
    /// resolve against it
    pub source_dir: PathBuf,
    /// Running counters, one per block name
    pub counters: FxHashMap<String, u32>,
    /// Label text -> resolved reference, in encounter order
    pub references: IndexMap<String, Reference>,
    /// Section contents accumulated for the renderer
    pub toc: Vec<TocEntry>,
    /// User-defined macros, in definition order
    pub macros: FxHashMap<String, MacroDef>,
    /// Citation table, attached after the main pipeline
    pub bibliography: Option<Bibliography>,
    /// Non-fatal issues collected along the way
    pub warnings: Vec<ConversionWarning>,
    /// Hoisted document metadata
    pub title: Option<NodeId>,
    pub author: Option<NodeId>,
    pub date: Option<NodeId>,
    pub text_state: TextState,
}

impl ConversionContext {
    pub fn new(source_dir: PathBuf, options: ConvertOptions) -> Self {
        Self {
            options,
            source_dir,
            ..Self::default()
        }
    }

    pub fn warn(&mut self, warning: ConversionWarning) {
        self.warnings.push(warning);
    }

    /// Bump and return the counter for `name`. Counters start at 1.
    pub fn next_counter(&mut self, name: &str) -> u32 {
        let value = self.counters.entry(name.to_string()).or_insert(0);
        *value += 1;
        *value
    }

    pub fn lookup_reference(&self, label: &str) -> Option<&Reference> {
        self.references.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_one_and_increase() {
        let mut ctx = ConversionContext::default();
        assert_eq!(ctx.next_counter("figure"), 1);
        assert_eq!(ctx.next_counter("figure"), 2);
        assert_eq!(ctx.next_counter("table"), 1);
    }

    #[test]
    fn references_keep_encounter_order() {
        let mut ctx = ConversionContext::default();
        ctx.references.insert(
            "eq:b".into(),
            Reference {
                kind: "equation".into(),
                number: 1,
            },
        );
        ctx.references.insert(
            "eq:a".into(),
            Reference {
                kind: "equation".into(),
                number: 2,
            },
        );
        let keys: Vec<&str> = ctx.references.keys().map(String::as_str).collect();
        assert_eq!(keys, ["eq:b", "eq:a"]);
    }
}
