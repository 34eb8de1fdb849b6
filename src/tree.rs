//! The expression tree shared by the builder, the rewrite passes and the
//! renderer.
//!
//! Nodes live in an arena and are addressed by stable `NodeId` handles;
//! parent links and the (group, index) coordinates of a node inside its
//! parent are plain indices. Every mutation goes through the arena so the
//! coordinates stay in sync with the actual child lists.

use indexmap::IndexMap;
use serde::Serialize;

/// Handle of a node inside an [`ExprArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The variant kind of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// The document root
    Root,
    /// A literal text run; the payload is in `name`
    Text,
    /// A command like `\section` or a single-symbol command like `\%`
    Command,
    /// `$...$`
    InlineMath,
    /// `$$...$$` and display-math environments after encapsulation
    DisplayMath,
    /// An encapsulated environment or a `{...}` group (name `"{}"`)
    Block,
    /// `%` comment, payload in `name`
    Comment,
    /// Raw verbatim content, payload in `name`
    Verbatim,
}

/// Ordering of a merged double script, used when rendering `msubsup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptOrder {
    SubFirst,
    SupFirst,
}

/// Auxiliary payload attached to a node by one rewrite pass for a later
/// pass or the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Tag {
    /// Per-block-name counter value assigned by the numbering pass
    Number(u32),
    /// A computed label string
    Label(String),
    /// Line number and indentation depth of an algorithm line
    AlgoLine { line: u32, depth: u32 },
    /// Which script came first in the source for a double script
    ScriptOrder(ScriptOrder),
}

/// Bracket options of a command or environment.
///
/// The two representations are mutually exclusive: `[key=value,...]`
/// contents become a key-value mapping, anything else is parsed as an
/// expression list. Callers must check which one is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum Options {
    KeyValue(IndexMap<String, String>),
    List(Vec<NodeId>),
}

/// One expression node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Command/block identifier, or the literal payload for
    /// Text/Comment/Verbatim nodes
    pub name: String,
    pub options: Option<Options>,
    /// The children-groups. A command may own several bracketed argument
    /// groups (a fraction has two), hence a list of lists.
    pub groups: Vec<Vec<NodeId>>,
    pub tag: Option<Tag>,
    /// Math context flag, inherited from the parent unless this node opens
    /// math itself
    pub math_mode: bool,
    /// Whether whitespace was consumed immediately before this node
    pub ws_before: bool,
    pub parent: Option<NodeId>,
    pub group_in_parent: usize,
    pub index_in_group: usize,
}

impl Node {
    fn new(kind: NodeKind, name: String) -> Self {
        Node {
            kind,
            name,
            options: None,
            groups: Vec::new(),
            tag: None,
            math_mode: false,
            ws_before: false,
            parent: None,
            group_in_parent: 0,
            index_in_group: 0,
        }
    }

    pub fn is_command(&self, name: &str) -> bool {
        self.kind == NodeKind::Command && self.name == name
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.kind == NodeKind::Block && self.name == name
    }
}

/// Arena owning all nodes of one conversion.
#[derive(Debug)]
pub struct ExprArena {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for ExprArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprArena {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::new(NodeKind::Root, String::new()));
        let root = NodeId(0);
        let mut arena = ExprArena { nodes, root };
        arena.node_mut(root).groups.push(Vec::new());
        arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, name.into()));
        id
    }

    /// Allocate a detached node that owns `count` empty children-groups.
    pub fn alloc_with_groups(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        count: usize,
    ) -> NodeId {
        let id = self.alloc(kind, name);
        self.node_mut(id).groups = vec![Vec::new(); count];
        id
    }

    /// Append a new empty children-group, returning its index.
    pub fn add_group(&mut self, id: NodeId) -> usize {
        let node = self.node_mut(id);
        node.groups.push(Vec::new());
        node.groups.len() - 1
    }

    pub fn group_len(&self, id: NodeId, group: usize) -> usize {
        self.node(id).groups[group].len()
    }

    /// Append `child` to `parent.groups[group]`, fixing the child's
    /// coordinates.
    pub fn push_child(&mut self, parent: NodeId, group: usize, child: NodeId) {
        let index = self.node(parent).groups[group].len();
        self.node_mut(parent).groups[group].push(child);
        let node = self.node_mut(child);
        node.parent = Some(parent);
        node.group_in_parent = group;
        node.index_in_group = index;
    }

    /// Insert `child` at `index`, renumbering trailing siblings.
    pub fn insert_child(&mut self, parent: NodeId, group: usize, index: usize, child: NodeId) {
        self.node_mut(parent).groups[group].insert(index, child);
        self.node_mut(child).parent = Some(parent);
        self.renumber(parent, group, index);
    }

    /// Remove and return the child at `index`, renumbering trailing
    /// siblings. The removed node stays in the arena, detached.
    pub fn remove_child(&mut self, parent: NodeId, group: usize, index: usize) -> NodeId {
        let child = self.node_mut(parent).groups[group].remove(index);
        self.node_mut(child).parent = None;
        self.renumber(parent, group, index);
        child
    }

    /// Replace `remove` children starting at `index` with `replacement`,
    /// renumbering everything from the mutation point. Returns the removed
    /// node ids, detached.
    pub fn splice(
        &mut self,
        parent: NodeId,
        group: usize,
        index: usize,
        remove: usize,
        replacement: Vec<NodeId>,
    ) -> Vec<NodeId> {
        let removed: Vec<NodeId> = self.nodes[parent.index()].groups[group]
            .splice(index..index + remove, replacement)
            .collect();
        for id in &removed {
            self.node_mut(*id).parent = None;
        }
        self.renumber(parent, group, index);
        removed
    }

    /// Move the whole contents of `from.groups[from_group]` onto the end of
    /// `to.groups[to_group]`.
    pub fn move_children(
        &mut self,
        from: NodeId,
        from_group: usize,
        to: NodeId,
        to_group: usize,
    ) {
        let ids = std::mem::take(&mut self.node_mut(from).groups[from_group]);
        for id in ids {
            self.push_child(to, to_group, id);
        }
    }

    fn renumber(&mut self, parent: NodeId, group: usize, from: usize) {
        let ids: Vec<NodeId> = self.nodes[parent.index()].groups[group][from..].to_vec();
        for (offset, id) in ids.into_iter().enumerate() {
            let node = self.node_mut(id);
            node.parent = Some(parent);
            node.group_in_parent = group;
            node.index_in_group = from + offset;
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let parent = node.parent?;
        self.node(parent).groups[node.group_in_parent]
            .get(node.index_in_group + 1)
            .copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let parent = node.parent?;
        if node.index_in_group == 0 {
            return None;
        }
        self.node(parent).groups[node.group_in_parent]
            .get(node.index_in_group - 1)
            .copied()
    }

    /// Walk upward from `id` (excluding `id` itself).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            current: self.node(id).parent,
        }
    }

    /// Instantiate an independent copy of the subtree at `id`. Used only
    /// for custom-command expansion; coordinates of the copy are left
    /// detached for the caller to splice in.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let template = self.node(id).clone();
        let copy = self.alloc(template.kind, template.name.clone());
        {
            let node = self.node_mut(copy);
            node.tag = template.tag.clone();
            node.math_mode = template.math_mode;
            node.ws_before = template.ws_before;
        }
        if let Some(options) = &template.options {
            let copied = match options {
                Options::KeyValue(map) => Options::KeyValue(map.clone()),
                Options::List(ids) => {
                    let ids = ids.clone();
                    let mut out = Vec::with_capacity(ids.len());
                    for child in ids {
                        out.push(self.deep_copy(child));
                    }
                    Options::List(out)
                }
            };
            self.node_mut(copy).options = Some(copied);
        }
        for (gi, group) in template.groups.iter().enumerate() {
            self.add_group(copy);
            for child in group {
                let child_copy = self.deep_copy(*child);
                self.push_child(copy, gi, child_copy);
            }
        }
        copy
    }

    /// Concatenate the payloads of all Text and Verbatim leaves below `id`,
    /// in tree order.
    pub fn flatten_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.flatten_into(id, &mut out);
        out
    }

    /// Flatten a child list (e.g. one children-group) the same way.
    pub fn flatten_nodes(&self, ids: &[NodeId]) -> String {
        let mut out = String::new();
        for id in ids {
            self.flatten_into(*id, &mut out);
        }
        out
    }

    fn flatten_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match node.kind {
            NodeKind::Text | NodeKind::Verbatim => out.push_str(&node.name),
            NodeKind::Comment => {}
            _ => {
                for group in &node.groups {
                    for child in group {
                        self.flatten_into(*child, out);
                    }
                }
            }
        }
    }

    /// Verify the position invariant for the whole tree reachable from the
    /// root: `parent.groups[g][i]` is the node and the node's coordinates
    /// say `(g, i)`. Returns the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        self.check_node(self.root)
    }

    fn check_node(&self, id: NodeId) -> Result<(), String> {
        let node = self.node(id);
        for (gi, group) in node.groups.iter().enumerate() {
            for (ci, child) in group.iter().enumerate() {
                let c = self.node(*child);
                if c.parent != Some(id) || c.group_in_parent != gi || c.index_in_group != ci {
                    return Err(format!(
                        "node {:?} '{}' thinks it is at ({:?}, {}, {}) but sits at ({:?}, {}, {})",
                        child, c.name, c.parent, c.group_in_parent, c.index_in_group, id, gi, ci
                    ));
                }
                self.check_node(*child)?;
            }
        }
        Ok(())
    }

    /// Serializable snapshot of the subtree at `id`, for `--dump-tree`.
    pub fn dump(&self, id: NodeId) -> DumpNode {
        let node = self.node(id);
        DumpNode {
            kind: node.kind,
            name: node.name.clone(),
            math_mode: node.math_mode,
            tag: node.tag.clone(),
            options: node.options.as_ref().map(|options| match options {
                Options::KeyValue(map) => DumpOptions::KeyValue(
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                ),
                Options::List(ids) => {
                    DumpOptions::List(ids.iter().map(|id| self.dump(*id)).collect())
                }
            }),
            groups: node
                .groups
                .iter()
                .map(|group| group.iter().map(|child| self.dump(*child)).collect())
                .collect(),
        }
    }
}

/// Upward iterator over a node's ancestors.
pub struct Ancestors<'a> {
    arena: &'a ExprArena,
    current: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.arena.node(id).parent;
        Some(id)
    }
}

/// JSON-friendly view of a node, produced by [`ExprArena::dump`].
#[derive(Debug, Serialize)]
pub struct DumpNode {
    pub kind: NodeKind,
    pub name: String,
    pub math_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<DumpOptions>,
    pub groups: Vec<Vec<DumpNode>>,
}

#[derive(Debug, Serialize)]
pub enum DumpOptions {
    KeyValue(Vec<(String, String)>),
    List(Vec<DumpNode>),
}
