//! Bibliography resolver.
//!
//! Parses a BibTeX-subset blob of `@type{key, field = value, ...}`
//! records into a citation table. Field values are themselves lexed into
//! expression-node lists so they can carry markup (`\emph{...}`, math).
//! Entries are numbered by encounter order, which is the citation order
//! used by the renderer.

use std::fs;

use indexmap::IndexMap;

use crate::context::ConversionContext;
use crate::engine::build_fragment;
use crate::error::{ConversionError, ConversionResult, ConversionWarning};
use crate::tree::{ExprArena, NodeId, NodeKind};

/// One `@type{...}` record.
#[derive(Debug, Clone)]
pub struct BibEntry {
    pub entry_type: String,
    /// 1-based ordinal in encounter order
    pub number: u32,
    /// field name -> lexed value nodes
    pub fields: IndexMap<String, Vec<NodeId>>,
}

/// Citation key -> entry, in encounter order.
pub type Bibliography = IndexMap<String, BibEntry>;

/// Parse a raw bibliography blob. Malformed records are skipped with a
/// warning rather than aborting.
pub fn parse_bibliography(
    text: &str,
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
) -> ConversionResult<Bibliography> {
    let mut bib = Bibliography::new();
    let mut number = 0u32;
    let mut pos = 0usize;

    while let Some(at) = text[pos..].find('@') {
        let start = pos + at;
        match parse_record(&text[start + 1..], arena, ctx)? {
            Some((consumed, key, entry_type, fields)) => {
                pos = start + 1 + consumed;
                if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
                    continue;
                }
                if bib.contains_key(&key) {
                    ctx.warn(ConversionWarning::new(format!(
                        "duplicate bibliography key '{}'",
                        key
                    )));
                    continue;
                }
                number += 1;
                bib.insert(
                    key,
                    BibEntry {
                        entry_type,
                        number,
                        fields,
                    },
                );
            }
            None => {
                pos = start + 1;
                ctx.warn(ConversionWarning::new("malformed bibliography record"));
            }
        }
    }
    Ok(bib)
}

type Record = (usize, String, String, IndexMap<String, Vec<NodeId>>);

/// Parse one record after the `@`. Returns the number of consumed
/// characters, the key, the entry type and the lexed fields.
fn parse_record(
    text: &str,
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
) -> ConversionResult<Option<Record>> {
    let open = match text.find('{') {
        Some(idx) => idx,
        None => return Ok(None),
    };
    let entry_type = text[..open].trim().to_lowercase();
    if entry_type.is_empty() || !entry_type.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(None);
    }

    // find the balancing close brace of the record body
    let body_start = open + 1;
    let mut depth = 1usize;
    let mut body_end = None;
    for (idx, c) in text[body_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    body_end = Some(body_start + idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let body_end = match body_end {
        Some(idx) => idx,
        None => return Ok(None),
    };
    let body = &text[body_start..body_end];

    let (key, field_text) = match body.split_once(',') {
        Some((key, rest)) => (key.trim().to_string(), rest),
        None => (body.trim().to_string(), ""),
    };
    if key.is_empty() {
        return Ok(None);
    }

    let mut fields = IndexMap::new();
    for (name, raw) in split_fields(field_text) {
        let value = build_fragment(&raw, arena, ctx)?;
        fields.insert(name.to_lowercase(), value);
    }

    Ok(Some((body_end + 1, key, entry_type, fields)))
}

/// Split `field = value, field = value` respecting braces and quotes.
fn split_fields(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        // field name
        let mut name = String::new();
        for c in chars.by_ref() {
            if c == '=' {
                break;
            }
            name.push(c);
        }
        let name = name.trim().trim_start_matches(',').trim().to_string();
        if name.is_empty() {
            break;
        }

        // field value: braced, quoted, or bare
        let mut value = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut depth = 1usize;
                for c in chars.by_ref() {
                    match c {
                        '{' => {
                            depth += 1;
                            value.push(c);
                        }
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            value.push(c);
                        }
                        _ => value.push(c),
                    }
                }
            }
            Some('"') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    value.push(c);
                }
            }
            Some(_) => {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
            None => {}
        }
        out.push((name, value.trim().to_string()));

        // skip the separating comma
        while let Some(&c) = chars.peek() {
            if c == ',' || c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
    }
    out
}

/// Find the document's `\bibliography` command, read the referenced
/// `.bib` file(s) and attach the parsed table to the context.
pub fn attach_bibliography(
    arena: &mut ExprArena,
    ctx: &mut ConversionContext,
) -> ConversionResult<()> {
    let root = arena.root();
    let Some(stems) = find_bibliography_command(arena, root) else {
        return Ok(());
    };

    let mut combined = Bibliography::new();
    for stem in stems.split(',') {
        let stem = stem.trim();
        if stem.is_empty() {
            continue;
        }
        let mut path = ctx.source_dir.join(stem);
        if path.extension().is_none() {
            path.set_extension("bib");
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if ctx.options.skip_missing => {
                ctx.warn(ConversionWarning::info(format!(
                    "skipping missing bibliography '{}': {}",
                    path.display(),
                    err
                )));
                continue;
            }
            Err(err) => {
                return Err(ConversionError::ResourceError {
                    path,
                    message: err.to_string(),
                });
            }
        };
        let parsed = parse_bibliography(&text, arena, ctx)?;
        for (key, mut entry) in parsed {
            entry.number = combined.len() as u32 + 1;
            combined.entry(key).or_insert(entry);
        }
    }

    if !combined.is_empty() {
        ctx.bibliography = Some(combined);
    }
    Ok(())
}

fn find_bibliography_command(arena: &ExprArena, id: NodeId) -> Option<String> {
    let node = arena.node(id);
    if node.kind == NodeKind::Command && node.name == "bibliography" {
        return node
            .groups
            .first()
            .map(|group| arena.flatten_nodes(group).trim().to_string());
    }
    for group in &node.groups {
        for child in group {
            if let Some(found) = find_bibliography_command(arena, *child) {
                return Some(found);
            }
        }
    }
    None
}
