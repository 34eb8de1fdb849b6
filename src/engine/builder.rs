//! The expression tree builder.
//!
//! Consumes the reader's lexical units and recursively constructs the
//! arena tree, resolving command argument shapes against the static
//! command table. Balanced spans (groups, math, options) are re-lexed
//! recursively with their own group reader.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use super::commands::{self, ArgSpec, MATH_ENVIRONMENTS, TEXT_ARG_COMMANDS};
use super::reader::{segment_math_text, Reader};
use super::unit::{ScriptArg, UnitKind};
use crate::context::ConversionContext;
use crate::error::{ConversionResult, ConversionWarning};
use crate::tree::{ExprArena, NodeId, NodeKind, Options};

lazy_static! {
    static ref KEY_VALUE_CHUNK: Regex = Regex::new(r"^\s*[^=,{}\[\]]+=").unwrap();
}

pub struct TreeBuilder<'c> {
    ctx: &'c mut ConversionContext,
}

/// Parse a complete source text into a fresh arena.
pub fn build_tree(source: &str, ctx: &mut ConversionContext) -> ConversionResult<ExprArena> {
    let mut arena = ExprArena::new();
    let root = arena.root();
    let mut reader = Reader::new(source);
    TreeBuilder { ctx }.build_sequence(&mut reader, &mut arena, root, 0, false)?;
    Ok(arena)
}

/// Parse an imported file's contents into `arena` under a detached
/// container node, returning its top-level children.
pub fn build_fragment(
    source: &str,
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
) -> ConversionResult<Vec<NodeId>> {
    let scratch = arena.alloc_with_groups(NodeKind::Block, "{}", 1);
    let mut reader = Reader::new(source);
    TreeBuilder { ctx }.build_sequence(&mut reader, arena, scratch, 0, false)?;
    Ok(detach_group(arena, scratch, 0))
}

/// Take all children out of `parent.groups[group]`, leaving them detached.
fn detach_group(arena: &mut ExprArena, parent: NodeId, group: usize) -> Vec<NodeId> {
    let ids = std::mem::take(&mut arena.node_mut(parent).groups[group]);
    for id in &ids {
        arena.node_mut(*id).parent = None;
    }
    ids
}

impl<'c> TreeBuilder<'c> {
    /// Build units into `parent.groups[group]` until the reader runs dry.
    fn build_sequence(
        &mut self,
        reader: &mut Reader,
        arena: &mut ExprArena,
        parent: NodeId,
        group: usize,
        math_base: bool,
    ) -> ConversionResult<()> {
        // Math environments switch the reader's math mode without opening
        // a `$` span; track them as a stack of names.
        let mut math_envs: Vec<String> = Vec::new();

        loop {
            let math = math_base || !math_envs.is_empty();
            let unit = match reader.next_unit(math)? {
                Some(unit) => unit,
                None => break,
            };
            let ws = unit.ws_before;

            match unit.kind {
                UnitKind::Text(text) => {
                    if math && text.chars().count() > 1 {
                        // Per-symbol spacing semantics: split the run and
                        // mark implicit multiplications.
                        let mut first = true;
                        for token in segment_math_text(&text) {
                            let id = arena.alloc(NodeKind::Text, token);
                            self.attach(arena, parent, group, id, first && ws, math);
                            first = false;
                        }
                    } else if !text.is_empty() {
                        let id = arena.alloc(NodeKind::Text, text);
                        self.attach(arena, parent, group, id, ws, math);
                    }
                }
                UnitKind::Command(name) => {
                    let id = self.build_command(reader, arena, &name, math)?;
                    self.attach(arena, parent, group, id, ws, math);
                    if name == "begin" {
                        let env = env_name(arena, id);
                        if MATH_ENVIRONMENTS.contains(env.as_str()) {
                            math_envs.push(env);
                        }
                    } else if name == "end" {
                        let env = env_name(arena, id);
                        if math_envs.last() == Some(&env) {
                            math_envs.pop();
                        }
                    }
                }
                UnitKind::Group(content) => {
                    let id = arena.alloc_with_groups(NodeKind::Block, "{}", 1);
                    self.build_sequence(&mut Reader::for_group(&content), arena, id, 0, math)?;
                    self.attach(arena, parent, group, id, ws, math);
                }
                UnitKind::InlineMath(text) => {
                    let id = self.build_math(arena, &text, false)?;
                    self.attach(arena, parent, group, id, ws, true);
                }
                UnitKind::DisplayMath(text) => {
                    let id = self.build_math(arena, &text, true)?;
                    self.attach(arena, parent, group, id, ws, true);
                }
                UnitKind::Comment(text) => {
                    let id = arena.alloc(NodeKind::Comment, text);
                    self.attach(arena, parent, group, id, ws, math);
                }
                UnitKind::CellSep => {
                    let id = arena.alloc(NodeKind::Command, "&");
                    self.attach(arena, parent, group, id, ws, math);
                }
                UnitKind::Script { sup, arg } => {
                    let id = self.build_script(arena, sup, arg)?;
                    self.attach(arena, parent, group, id, ws, math);
                }
                UnitKind::Par => {
                    let id = arena.alloc(NodeKind::Command, "par");
                    self.attach(arena, parent, group, id, ws, math);
                }
                UnitKind::Verbatim(text) => {
                    let id = arena.alloc(NodeKind::Verbatim, text);
                    self.attach(arena, parent, group, id, ws, false);
                }
            }
        }
        Ok(())
    }

    fn attach(
        &mut self,
        arena: &mut ExprArena,
        parent: NodeId,
        group: usize,
        id: NodeId,
        ws: bool,
        math: bool,
    ) {
        {
            let node = arena.node_mut(id);
            node.ws_before = ws;
            if math {
                node.math_mode = true;
            }
        }
        arena.push_child(parent, group, id);
    }

    /// Scan a command's arguments: at most one option block (first one
    /// wins) interleaved with value groups up to the declared arity;
    /// unknown commands capture greedily.
    fn build_command(
        &mut self,
        reader: &mut Reader,
        arena: &mut ExprArena,
        name: &str,
        math: bool,
    ) -> ConversionResult<NodeId> {
        let id = arena.alloc(NodeKind::Command, name);
        arena.node_mut(id).math_mode = math;
        let arg_math = if TEXT_ARG_COMMANDS.contains(name) {
            false
        } else {
            math
        };

        let spec = commands::arity(name);
        let greedy = spec.is_none();
        let spec = spec.unwrap_or(ArgSpec {
            options: true,
            groups: u8::MAX,
        });

        let mut have_option = !spec.options;
        let mut captured: u8 = 0;
        loop {
            if !have_option {
                if let Some(content) = reader.try_read_option()? {
                    let options = self.parse_options(arena, &content, arg_math)?;
                    arena.node_mut(id).options = Some(options);
                    have_option = true;
                    continue;
                }
            }
            if captured < spec.groups {
                if let Some(body) = reader.try_read_group_arg()? {
                    let gi = arena.add_group(id);
                    self.build_sequence(&mut Reader::for_group(&body), arena, id, gi, arg_math)?;
                    captured += 1;
                    continue;
                }
            }
            break;
        }

        if !greedy && captured < spec.groups {
            let (line, _) = reader.position();
            self.ctx.warn(
                ConversionWarning::new(format!(
                    "\\{} expects {} argument group(s), found {}",
                    name, spec.groups, captured
                ))
                .at_line(line),
            );
            // Missing groups become empty ones so the passes can index
            // the declared shape.
            while captured < spec.groups {
                arena.add_group(id);
                captured += 1;
            }
        }

        Ok(id)
    }

    /// A math span node: group 0 holds the lexed sub-expressions, group 1
    /// the original text as plain alt-text.
    fn build_math(
        &mut self,
        arena: &mut ExprArena,
        text: &str,
        display: bool,
    ) -> ConversionResult<NodeId> {
        let kind = if display {
            NodeKind::DisplayMath
        } else {
            NodeKind::InlineMath
        };
        let id = arena.alloc_with_groups(kind, "", 2);
        arena.node_mut(id).math_mode = true;
        self.build_sequence(&mut Reader::for_group(text), arena, id, 0, true)?;
        let alt = arena.alloc(NodeKind::Text, text.trim());
        arena.push_child(id, 1, alt);
        Ok(id)
    }

    /// A `^`/`_` node; its single children-group holds the argument.
    fn build_script(
        &mut self,
        arena: &mut ExprArena,
        sup: bool,
        arg: ScriptArg,
    ) -> ConversionResult<NodeId> {
        let id = arena.alloc_with_groups(NodeKind::Command, if sup { "^" } else { "_" }, 1);
        arena.node_mut(id).math_mode = true;
        match arg {
            ScriptArg::Char(c) => {
                let child = arena.alloc(NodeKind::Text, c.to_string());
                arena.node_mut(child).math_mode = true;
                arena.push_child(id, 0, child);
            }
            ScriptArg::Command(name) => {
                let child = arena.alloc(NodeKind::Command, name);
                arena.node_mut(child).math_mode = true;
                arena.push_child(id, 0, child);
            }
            ScriptArg::Group(content) => {
                self.build_sequence(&mut Reader::for_group(&content), arena, id, 0, true)?;
            }
        }
        Ok(id)
    }

    /// Bracket contents: `k=v(,k=v)*` becomes a key-value mapping,
    /// anything else an expression list.
    fn parse_options(
        &mut self,
        arena: &mut ExprArena,
        content: &str,
        math: bool,
    ) -> ConversionResult<Options> {
        let chunks: Vec<&str> = content.split(',').collect();
        let key_value = !content.trim().is_empty()
            && chunks
                .iter()
                .all(|chunk| chunk.trim().is_empty() || KEY_VALUE_CHUNK.is_match(chunk));
        if key_value {
            let mut map = IndexMap::new();
            for chunk in chunks {
                let chunk = chunk.trim();
                if chunk.is_empty() {
                    continue;
                }
                let (key, value) = chunk.split_once('=').expect("checked above");
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
            return Ok(Options::KeyValue(map));
        }

        let scratch = arena.alloc_with_groups(NodeKind::Block, "[]", 1);
        self.build_sequence(&mut Reader::for_group(content), arena, scratch, 0, math)?;
        Ok(Options::List(detach_group(arena, scratch, 0)))
    }
}

/// Environment name of a `\begin`/`\end` node: the flattened first group.
pub fn env_name(arena: &ExprArena, id: NodeId) -> String {
    match arena.node(id).groups.first() {
        Some(group) => arena.flatten_nodes(group).trim().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> (ExprArena, ConversionContext) {
        let mut ctx = ConversionContext::default();
        let arena = build_tree(source, &mut ctx).unwrap();
        (arena, ctx)
    }

    fn child(arena: &ExprArena, parent: NodeId, index: usize) -> NodeId {
        arena.node(parent).groups[0][index]
    }

    #[test]
    fn plain_text_single_node() {
        let (arena, _) = build("hello world");
        let root = arena.root();
        assert_eq!(arena.group_len(root, 0), 1);
        let text = child(&arena, root, 0);
        assert_eq!(arena.node(text).kind, NodeKind::Text);
        assert_eq!(arena.node(text).name, "hello world");
    }

    #[test]
    fn fraction_takes_two_groups() {
        let (arena, _) = build("\\frac{1}{x}");
        let frac = child(&arena, arena.root(), 0);
        assert_eq!(arena.node(frac).name, "frac");
        assert_eq!(arena.node(frac).groups.len(), 2);
        assert_eq!(arena.flatten_nodes(&arena.node(frac).groups[1]), "x");
    }

    #[test]
    fn missing_argument_pads_and_warns() {
        let (arena, ctx) = build("\\frac{1}");
        let frac = child(&arena, arena.root(), 0);
        assert_eq!(arena.node(frac).groups.len(), 2);
        assert!(arena.node(frac).groups[1].is_empty());
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].message.contains("\\frac"));
    }

    #[test]
    fn interleaved_option_after_first_group() {
        // \newcommand{\foo}[1]{body} puts the option between groups
        let (arena, _) = build("\\newcommand{\\foo}[1]{X}");
        let def = child(&arena, arena.root(), 0);
        assert_eq!(arena.node(def).groups.len(), 2);
        match arena.node(def).options.as_ref().unwrap() {
            Options::List(ids) => {
                assert_eq!(arena.flatten_nodes(ids), "1");
            }
            other => panic!("expected list options, got {:?}", other),
        }
    }

    #[test]
    fn key_value_options() {
        let (arena, _) = build("\\includegraphics[width=3cm, height=2cm]{img}");
        let cmd = child(&arena, arena.root(), 0);
        match arena.node(cmd).options.as_ref().unwrap() {
            Options::KeyValue(map) => {
                assert_eq!(map.get("width").map(String::as_str), Some("3cm"));
                assert_eq!(map.get("height").map(String::as_str), Some("2cm"));
            }
            other => panic!("expected key-value options, got {:?}", other),
        }
    }

    #[test]
    fn unknown_command_captures_trailing_groups() {
        let (arena, ctx) = build("\\frobnicate{a}{b} rest");
        let cmd = child(&arena, arena.root(), 0);
        assert_eq!(arena.node(cmd).groups.len(), 2);
        assert!(ctx.warnings.is_empty());
        let rest = child(&arena, arena.root(), 1);
        assert_eq!(arena.node(rest).name, "rest");
    }

    #[test]
    fn inline_math_builds_content_and_alt_text() {
        let (arena, _) = build("$x^2+1$");
        let math = child(&arena, arena.root(), 0);
        assert_eq!(arena.node(math).kind, NodeKind::InlineMath);
        assert!(arena.node(math).math_mode);
        // group 1 is the alt text
        assert_eq!(arena.flatten_nodes(&arena.node(math).groups[1]), "x^2+1");
        // group 0: x, ^(2), +, 1
        let content = &arena.node(math).groups[0];
        assert_eq!(content.len(), 4);
        let script = content[1];
        assert_eq!(arena.node(script).name, "^");
        assert_eq!(arena.flatten_nodes(&arena.node(script).groups[0]), "2");
        assert_eq!(arena.node(content[2]).name, "+");
        assert_eq!(arena.node(content[3]).name, "1");
    }

    #[test]
    fn math_mode_propagates_into_spans_only() {
        let (arena, _) = build("a $x$ b");
        let root = arena.root();
        let a = child(&arena, root, 0);
        let math = child(&arena, root, 1);
        assert!(!arena.node(a).math_mode);
        assert!(arena.node(math).math_mode);
        let x = arena.node(math).groups[0][0];
        assert!(arena.node(x).math_mode);
    }

    #[test]
    fn text_argument_commands_leave_math() {
        let (arena, _) = build("$\\text{abc}$");
        let math = child(&arena, arena.root(), 0);
        let text_cmd = arena.node(math).groups[0][0];
        assert_eq!(arena.node(text_cmd).name, "text");
        let inner = arena.node(text_cmd).groups[0][0];
        // un-segmented prose, not per-symbol math tokens
        assert_eq!(arena.node(inner).name, "abc");
        assert!(!arena.node(inner).math_mode);
    }

    #[test]
    fn math_environment_content_is_math_mode() {
        let (arena, _) = build("\\begin{equation}x^2\\end{equation}");
        let root = arena.root();
        // begin, x, ^(2), end
        assert_eq!(arena.group_len(root, 0), 4);
        let script = child(&arena, root, 2);
        assert_eq!(arena.node(script).name, "^");
        assert!(arena.node(script).math_mode);
    }

    #[test]
    fn brace_groups_become_anonymous_blocks() {
        let (arena, _) = build("{a{b}}");
        let outer = child(&arena, arena.root(), 0);
        assert!(arena.node(outer).is_block("{}"));
        let inner = arena.node(outer).groups[0][1];
        assert!(arena.node(inner).is_block("{}"));
        assert_eq!(arena.flatten_text(outer), "ab");
    }

    #[test]
    fn brace_balance_round_trip() {
        let source = "{a{b}c{d{e}}}";
        let (arena, _) = build(source);
        // exactly 4 matched pairs -> 4 anonymous blocks
        let mut count = 0;
        let mut stack = vec![arena.root()];
        while let Some(id) = stack.pop() {
            if arena.node(id).is_block("{}") {
                count += 1;
            }
            for group in &arena.node(id).groups {
                stack.extend(group.iter().copied());
            }
        }
        assert_eq!(count, 4);
        assert_eq!(arena.flatten_text(arena.root()), "abcde");
        arena.check_consistency().unwrap();
    }

    #[test]
    fn tree_is_consistent_after_build() {
        let (arena, _) = build(
            "\\section{One}\nText $a_i^2$ and\n\n\\begin{itemize}\\item A\\item B\\end{itemize}\n",
        );
        arena.check_consistency().unwrap();
    }
}
