//! Algorithm preprocessing: inside algorithmic blocks, walk the top-level
//! children tracking an indentation counter over begin/end markers and
//! tag each line-opening command with its running line number and current
//! depth for the renderer.

use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::tree::{ExprArena, NodeId, NodeKind, Tag};

pub fn run(arena: &mut ExprArena, _ctx: &mut ConversionContext) -> ConversionResult<()> {
    let root = arena.root();
    process(arena, root)
}

fn process(arena: &mut ExprArena, id: NodeId) -> ConversionResult<()> {
    if arena.node(id).kind == NodeKind::Block && arena.node(id).name == "algorithmic" {
        annotate(arena, id);
    }
    for gi in 0..arena.node(id).groups.len() {
        for ci in 0..arena.group_len(id, gi) {
            let child = arena.node(id).groups[gi][ci];
            process(arena, child)?;
        }
    }
    Ok(())
}

/// Effect of one algorithmic command on the indentation counter.
enum Step {
    /// plain statement line
    Line,
    /// opens a nested body (IF/FOR/WHILE/PROCEDURE/FUNCTION/...)
    Open,
    /// closes a nested body (ENDIF/ENDFOR/.../UNTIL)
    Close,
    /// closes and reopens at the same depth (ELSE/ELSIF)
    Reopen,
    None,
}

fn classify(name: &str) -> Step {
    // both the algorithms (\STATE) and algpseudocode (\State) spellings
    match name.to_ascii_lowercase().as_str() {
        "state" | "statex" | "return" | "require" | "ensure" | "comment" => Step::Line,
        "if" | "for" | "forall" | "while" | "loop" | "repeat" | "procedure" | "function" => {
            Step::Open
        }
        "endif" | "endfor" | "endwhile" | "endloop" | "endprocedure" | "endfunction"
        | "until" => Step::Close,
        "else" | "elsif" | "elseif" => Step::Reopen,
        _ => Step::None,
    }
}

fn annotate(arena: &mut ExprArena, block: NodeId) {
    let mut line: u32 = 0;
    let mut depth: u32 = 0;
    for ci in 0..arena.group_len(block, 0) {
        let child = arena.node(block).groups[0][ci];
        if arena.node(child).kind != NodeKind::Command {
            continue;
        }
        match classify(&arena.node(child).name) {
            Step::Line => {
                line += 1;
                arena.node_mut(child).tag = Some(Tag::AlgoLine { line, depth });
            }
            Step::Open => {
                line += 1;
                arena.node_mut(child).tag = Some(Tag::AlgoLine { line, depth });
                depth += 1;
            }
            Step::Close => {
                depth = depth.saturating_sub(1);
                line += 1;
                arena.node_mut(child).tag = Some(Tag::AlgoLine { line, depth });
            }
            Step::Reopen => {
                let outer = depth.saturating_sub(1);
                line += 1;
                arena.node_mut(child).tag = Some(Tag::AlgoLine { line, depth: outer });
            }
            Step::None => {}
        }
    }
}
