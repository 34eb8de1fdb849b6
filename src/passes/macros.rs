//! Custom-command expansion.
//!
//! A single document-order walk registers `\newcommand`-family definitions
//! and expands later invocations in place. Each expansion is an
//! independent deep copy of the definition body with `#n` placeholders
//! substituted inside Text children; definition order matters and forward
//! references do not resolve.

use crate::context::{ConversionContext, MacroDef};
use crate::error::{ConversionResult, ConversionWarning};
use crate::tree::{ExprArena, NodeId, NodeKind, Options};

pub fn run(arena: &mut ExprArena, ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, ctx, root)
}

fn is_definition(name: &str) -> bool {
    matches!(name, "newcommand" | "renewcommand" | "providecommand")
}

fn process(arena: &mut ExprArena, ctx: &mut ConversionContext, id: NodeId) -> ConversionResult<()> {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        // consecutive re-expansions at one position, to catch recursive
        // macro bodies
        let mut rescans = 0usize;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];
            let node = arena.node(child);

            if node.kind == NodeKind::Command && is_definition(&node.name) {
                register(arena, ctx, child);
                arena.splice(id, gi, i, 1, Vec::new());
                rescans = 0;
                continue;
            }

            if node.kind == NodeKind::Command && ctx.macros.contains_key(&node.name) {
                if rescans >= ctx.options.max_macro_depth {
                    let name = node.name.clone();
                    ctx.warn(ConversionWarning::new(format!(
                        "macro loop detected while expanding '\\{}'",
                        name
                    )));
                    i += 1;
                    rescans = 0;
                    continue;
                }
                expand(arena, ctx, id, gi, i, child)?;
                rescans += 1;
                // re-examine the splice position: the expansion may start
                // with another macro invocation
                continue;
            }

            process(arena, ctx, child)?;
            i += 1;
            rescans = 0;
        }
    }
    Ok(())
}

/// Register a definition node: group 0 names the macro, the option block
/// gives the parameter count, group 1 is the body. The body subtree is
/// detached from the definition node and kept alive in the arena.
fn register(arena: &mut ExprArena, ctx: &mut ConversionContext, def: NodeId) {
    let provide = arena.node(def).name == "providecommand";

    let name = arena
        .node(def)
        .groups
        .first()
        .map(|group| arena.flatten_nodes(group))
        .unwrap_or_default();
    let name = name.trim().trim_start_matches('\\').to_string();
    let name = if name.is_empty() {
        // the name group usually holds a single Command node, which
        // flattens to nothing; read its name directly
        match arena
            .node(def)
            .groups
            .first()
            .and_then(|group| group.first())
        {
            Some(first) if arena.node(*first).kind == NodeKind::Command => {
                arena.node(*first).name.clone()
            }
            _ => {
                ctx.warn(ConversionWarning::new("definition without a macro name"));
                return;
            }
        }
    } else {
        name
    };

    let params: u8 = match &arena.node(def).options {
        Some(Options::List(ids)) => arena.flatten_nodes(ids).trim().parse().unwrap_or(0),
        Some(Options::KeyValue(_)) | None => 0,
    };

    let body = match arena.node(def).groups.len() {
        len if len >= 2 => {
            let ids = std::mem::take(&mut arena.node_mut(def).groups[1]);
            for id in &ids {
                arena.node_mut(*id).parent = None;
            }
            ids
        }
        _ => Vec::new(),
    };

    if provide && ctx.macros.contains_key(&name) {
        return;
    }
    ctx.macros.insert(
        name.clone(),
        MacroDef {
            name,
            params,
            body,
        },
    );
}

/// Replace the invocation at `(parent, group, index)` with an
/// instantiated copy of the macro body.
fn expand(
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
    parent: NodeId,
    group: usize,
    index: usize,
    invocation: NodeId,
) -> ConversionResult<()> {
    let def = ctx.macros[&arena.node(invocation).name].clone();
    let args: Vec<Vec<NodeId>> = arena.node(invocation).groups.clone();

    // instantiate under a scratch container so placeholder substitution
    // can splice at the top level of the body too; only the declared
    // parameters substitute, surplus groups go through the fallback below
    let scratch = arena.alloc_with_groups(NodeKind::Block, "{}", 1);
    for node in &def.body {
        let copy = arena.deep_copy(*node);
        arena.push_child(scratch, 0, copy);
    }
    let declared = &args[..args.len().min(def.params as usize)];
    substitute(arena, scratch, declared);

    let expanded = {
        let ids = std::mem::take(&mut arena.node_mut(scratch).groups[0]);
        for id in &ids {
            arena.node_mut(*id).parent = None;
        }
        ids
    };

    // Best-effort fallback for invocations with surplus argument groups:
    // hand them to the nearest descendant command of the expanded body.
    // An all-empty surplus is the `\foo{}` expansion-stopping idiom and
    // is dropped silently.
    let mut surplus: Vec<Vec<NodeId>> = args
        .iter()
        .skip(def.params as usize)
        .cloned()
        .collect();
    if surplus.iter().all(|group| group.is_empty()) {
        surplus.clear();
    }
    let mut trailer: Vec<NodeId> = Vec::new();
    if !surplus.is_empty() {
        match first_command(arena, &expanded) {
            Some(cmd) => {
                for extra in surplus {
                    let gi = arena.add_group(cmd);
                    for id in extra {
                        arena.node_mut(id).parent = None;
                        arena.push_child(cmd, gi, id);
                    }
                }
            }
            None => {
                ctx.warn(ConversionWarning::new(format!(
                    "macro '\\{}' invoked with surplus arguments and no command to take them",
                    def.name
                )));
                for extra in surplus {
                    for id in extra {
                        arena.node_mut(id).parent = None;
                        trailer.push(id);
                    }
                }
            }
        }
    }

    let mut replacement = expanded;
    replacement.extend(trailer);
    arena.splice(parent, group, index, 1, replacement);
    Ok(())
}

/// Pre-order search for the first Command node in a forest.
fn first_command(arena: &ExprArena, ids: &[NodeId]) -> Option<NodeId> {
    for id in ids {
        if arena.node(*id).kind == NodeKind::Command {
            return Some(*id);
        }
        for group in &arena.node(*id).groups {
            if let Some(found) = first_command(arena, group) {
                return Some(found);
            }
        }
    }
    None
}

/// Recursively substitute `#n` placeholders inside Text children of the
/// container, splicing fresh copies of the argument nodes.
fn substitute(arena: &mut ExprArena, id: NodeId, args: &[Vec<NodeId>]) {
    for gi in 0..arena.node(id).groups.len() {
        let mut i = 0;
        while i < arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][i];
            if arena.node(child).kind == NodeKind::Text && arena.node(child).name.contains('#') {
                let replacement = split_placeholder_text(arena, child, args);
                let count = replacement.len();
                arena.splice(id, gi, i, 1, replacement);
                // skip past the spliced copies; argument text is not
                // re-scanned for placeholders
                i += count;
                continue;
            }
            substitute(arena, child, args);
            i += 1;
        }
    }
}

/// Split a Text node on `#n` markers into literal Text pieces and copies
/// of the corresponding argument node lists.
fn split_placeholder_text(
    arena: &mut ExprArena,
    text_id: NodeId,
    args: &[Vec<NodeId>],
) -> Vec<NodeId> {
    let text = arena.node(text_id).name.clone();
    let math = arena.node(text_id).math_mode;
    let mut out: Vec<NodeId> = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '#' {
            literal.push(c);
            continue;
        }
        match chars.peek().and_then(|d| d.to_digit(10)) {
            Some(n) if n >= 1 => {
                chars.next();
                if !literal.is_empty() {
                    let piece = arena.alloc(NodeKind::Text, std::mem::take(&mut literal));
                    arena.node_mut(piece).math_mode = math;
                    out.push(piece);
                }
                if let Some(arg) = args.get((n - 1) as usize) {
                    for node in arg.clone() {
                        out.push(arena.deep_copy(node));
                    }
                }
                // a missing argument substitutes nothing
            }
            _ => literal.push('#'),
        }
    }
    if !literal.is_empty() {
        let piece = arena.alloc(NodeKind::Text, literal);
        arena.node_mut(piece).math_mode = math;
        out.push(piece);
    }
    out
}
