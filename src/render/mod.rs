//! XHTML rendering.
//!
//! Walks the finished tree and emits the output document. Math subtrees
//! are handed to the MathML emitter in [`math`]. Unknown constructs
//! render as inert XML comments and never stop traversal.

pub mod math;

use crate::context::ConversionContext;
use crate::symbols::{Accent, ListKind, TextSize, TextStyle, TEXT_ESCAPES};
use crate::tree::{ExprArena, NodeId, NodeKind, Options, Tag};

/// Escape text content for XML.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside an XML comment.
fn escape_comment(text: &str) -> String {
    escape_text(text).replace("--", "- -")
}

pub struct Renderer<'a> {
    pub(crate) arena: &'a ExprArena,
    pub(crate) ctx: &'a mut ConversionContext,
}

/// Render the whole tree into a standalone XHTML 1.1 + MathML document.
pub fn render_document(arena: &ExprArena, ctx: &mut ConversionContext) -> String {
    let title = ctx
        .title
        .map(|id| arena.flatten_text(id))
        .unwrap_or_else(|| "Untitled".to_string());
    let generated = chrono::Utc::now().format("%Y-%m-%d");

    let mut body = String::new();
    let root = arena.root();
    let children = arena.node(root).groups[0].clone();
    let mut renderer = Renderer { arena, ctx };
    renderer.render_nodes(&children, &mut body);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1 plus MathML 2.0//EN\" \
         \"http://www.w3.org/Math/DTD/mathml2/xhtml-math11-f.dtd\">\n",
    );
    out.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<head>\n");
    out.push_str(&format!("<title>{}</title>\n", escape_text(title.trim())));
    out.push_str("<meta name=\"generator\" content=\"laxml\" />\n");
    out.push_str(&format!("<meta name=\"date\" content=\"{}\" />\n", generated));
    out.push_str("</head>\n<body>\n");
    out.push_str(&body);
    out.push_str("\n</body>\n</html>\n");
    out
}

impl<'a> Renderer<'a> {
    pub(crate) fn node(&self, id: NodeId) -> &crate::tree::Node {
        self.arena.node(id)
    }

    /// Render a sibling run of prose nodes.
    pub(crate) fn render_nodes(&mut self, ids: &[NodeId], out: &mut String) {
        let mut i = 0;
        while i < ids.len() {
            let id = ids[i];
            let node = self.node(id);

            // a size/style switch scopes to the rest of the run
            if node.kind == NodeKind::Command && node.groups.is_empty() {
                if let Some(size) = TextSize::from_command(&node.name) {
                    let css = size.css_size();
                    if self.ctx.text_state.size.as_deref() == Some(css) {
                        i += 1;
                        continue;
                    }
                    let saved = self.ctx.text_state.size.replace(css.to_string());
                    out.push_str(&format!("<span style=\"font-size: {}\">", css));
                    self.render_nodes(&ids[i + 1..], out);
                    out.push_str("</span>");
                    self.ctx.text_state.size = saved;
                    return;
                }
                if let Some(style) = TextStyle::from_command(&node.name) {
                    let already = match style {
                        TextStyle::Bold => self.ctx.text_state.bold,
                        TextStyle::Italic | TextStyle::Emphasis => self.ctx.text_state.italic,
                        _ => false,
                    };
                    if already {
                        i += 1;
                        continue;
                    }
                    let saved = self.ctx.text_state.clone();
                    match style {
                        TextStyle::Bold => self.ctx.text_state.bold = true,
                        TextStyle::Italic | TextStyle::Emphasis => {
                            self.ctx.text_state.italic = true
                        }
                        _ => {}
                    }
                    let spec = style.params();
                    out.push('<');
                    out.push_str(spec.element);
                    if let Some(css) = spec.style {
                        out.push_str(&format!(" style=\"{}\"", css));
                    }
                    out.push('>');
                    self.render_nodes(&ids[i + 1..], out);
                    out.push_str(&format!("</{}>", spec.element));
                    self.ctx.text_state = saved;
                    return;
                }
            }

            self.render_node(id, out);
            i += 1;
        }
    }

    fn space_before(&self, id: NodeId, out: &mut String) {
        if self.node(id).ws_before && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
    }

    pub(crate) fn render_node(&mut self, id: NodeId, out: &mut String) {
        match self.node(id).kind {
            NodeKind::Root => {
                let children = self.node(id).groups[0].clone();
                self.render_nodes(&children, out);
            }
            NodeKind::Text => {
                self.space_before(id, out);
                out.push_str(&escape_text(&self.node(id).name));
            }
            NodeKind::Comment => {}
            NodeKind::Verbatim => {
                out.push_str("<pre class=\"verbatim\">");
                out.push_str(&escape_text(self.node(id).name.trim_matches('\n')));
                out.push_str("</pre>\n");
            }
            NodeKind::InlineMath => {
                self.space_before(id, out);
                self.render_math_span(id, false, out);
            }
            NodeKind::DisplayMath => self.render_math_span(id, true, out),
            NodeKind::Block => self.render_block(id, out),
            NodeKind::Command => self.render_command(id, out),
        }
    }

    fn group(&self, id: NodeId, index: usize) -> Vec<NodeId> {
        self.node(id)
            .groups
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    fn render_group(&mut self, id: NodeId, index: usize, out: &mut String) {
        let children = self.group(id, index);
        // style switches inside a group scope to the group
        let saved = self.ctx.text_state.clone();
        self.render_nodes(&children, out);
        self.ctx.text_state = saved;
    }

    fn heading_level(name: &str) -> &'static str {
        match name.trim_end_matches('*') {
            "part" => "h1",
            "chapter" => "h1",
            "section" => "h2",
            "subsection" => "h3",
            "subsubsection" => "h4",
            "paragraph" => "h5",
            _ => "h6",
        }
    }

    fn render_block(&mut self, id: NodeId, out: &mut String) {
        let name = self.node(id).name.clone();
        match name.as_str() {
            "{}" => self.render_group(id, 0, out),
            "p" => {
                let mut inner = String::new();
                self.render_group(id, 0, &mut inner);
                if !inner.trim().is_empty() {
                    out.push_str("<p>");
                    out.push_str(inner.trim_end());
                    out.push_str("</p>\n");
                }
            }
            "document" => self.render_group(id, 0, out),
            "abstract" => {
                out.push_str("<div class=\"abstract\">\n<h3>Abstract</h3>\n");
                self.render_group(id, 0, out);
                out.push_str("</div>\n");
            }
            "quote" | "quotation" => {
                out.push_str("<blockquote>");
                self.render_group(id, 0, out);
                out.push_str("</blockquote>\n");
            }
            "center" => {
                out.push_str("<div style=\"text-align: center\">");
                self.render_group(id, 0, out);
                out.push_str("</div>\n");
            }
            "flushleft" | "flushright" => {
                let align = if name == "flushleft" { "left" } else { "right" };
                out.push_str(&format!("<div style=\"text-align: {}\">", align));
                self.render_group(id, 0, out);
                out.push_str("</div>\n");
            }
            "itemize" | "enumerate" | "description" => self.render_list(id, out),
            "figure" | "figure*" | "table" | "table*" | "algorithm" => {
                out.push_str(&format!("<div class=\"{}\">\n", name.trim_end_matches('*')));
                self.render_group(id, 0, out);
                out.push_str("</div>\n");
            }
            "titlepage" => self.render_group(id, 0, out),
            "tabular" | "tabular*" | "longtable" => self.render_table(id, out),
            "algorithmic" => self.render_algorithmic(id, out),
            "verbatim" => {
                out.push_str("<pre class=\"verbatim\">");
                let mut inner = String::new();
                self.render_group(id, 0, &mut inner);
                out.push_str(&inner);
                out.push_str("</pre>\n");
            }
            "sub" | "sup" => {
                // a script container hoisted into prose
                let element = if name == "sub" { "sub" } else { "sup" };
                self.render_group(id, 0, out);
                out.push_str(&format!("<{}>", element));
                self.render_group(id, 1, out);
                out.push_str(&format!("</{}>", element));
            }
            _ if self.node(id).math_mode => {
                // display-math environment block
                self.render_math_environment(id, out);
            }
            _ if Self::heading_block(&name) => self.render_heading(id, out),
            _ => {
                out.push_str(&format!(
                    "<!-- unknown environment: {} -->\n",
                    escape_comment(&name)
                ));
                self.ctx.warn(crate::error::ConversionWarning::new(format!(
                    "unknown environment '{}'",
                    name
                )));
                self.render_group(id, 0, out);
            }
        }
    }

    fn heading_block(name: &str) -> bool {
        crate::passes::paragraphs::HEADING_COMMANDS.contains(name)
    }

    fn render_heading(&mut self, id: NodeId, out: &mut String) {
        let name = self.node(id).name.clone();
        let element = Self::heading_level(&name);
        let number = match self.node(id).tag {
            Some(Tag::Number(n)) => Some(n),
            _ => None,
        };
        out.push_str(&format!("<{}>", element));
        if let Some(n) = number {
            out.push_str(&format!("{} ", n));
        }
        // group 0 holds the heading command; render its title group
        if let Some(cmd) = self.group(id, 0).first().copied() {
            let last = self.node(cmd).groups.len().saturating_sub(1);
            self.render_group(cmd, last, out);
        }
        out.push_str(&format!("</{}>\n", element));
        self.render_group(id, 1, out);
    }

    fn render_list(&mut self, id: NodeId, out: &mut String) {
        let kind = ListKind::from_environment(&self.node(id).name).expect("list block");
        let (list_el, item_el) = kind.elements();
        out.push_str(&format!("<{}>\n", list_el));
        for child in self.group(id, 0) {
            if !self.node(child).is_command("item") {
                // leading material before the first \item
                let mut stray = String::new();
                self.render_node(child, &mut stray);
                out.push_str(stray.trim_end());
                continue;
            }
            if kind == ListKind::Description {
                let term = match self.node(child).options.clone() {
                    Some(Options::List(ids)) => Some(ids),
                    _ => None,
                };
                if let Some(term) = term {
                    out.push_str("<dt>");
                    self.render_nodes(&term, out);
                    out.push_str("</dt>");
                }
            }
            out.push_str(&format!("<{}>", item_el));
            let mut inner = String::new();
            if !self.node(child).groups.is_empty() {
                self.render_group(child, 0, &mut inner);
            }
            out.push_str(inner.trim());
            out.push_str(&format!("</{}>\n", item_el));
        }
        out.push_str(&format!("</{}>\n", list_el));
    }

    fn render_table(&mut self, id: NodeId, out: &mut String) {
        out.push_str("<table>\n");
        for row in self.group(id, 0) {
            if !self.node(row).is_block("row") {
                continue;
            }
            out.push_str("<tr>");
            for cell in self.group(row, 0) {
                out.push_str("<td>");
                let mut inner = String::new();
                self.render_group(cell, 0, &mut inner);
                out.push_str(inner.trim());
                out.push_str("</td>");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n");
    }

    fn render_algorithmic(&mut self, id: NodeId, out: &mut String) {
        out.push_str("<div class=\"algorithmic\">\n");
        for child in self.group(id, 0) {
            let node = self.node(child);
            let Some(Tag::AlgoLine { line, depth }) = node.tag else {
                continue;
            };
            let keyword = node.name.to_ascii_lowercase();
            out.push_str(&format!(
                "<div class=\"algo-line\" style=\"margin-left: {}em\">{}. ",
                depth * 2,
                line
            ));
            if !matches!(keyword.as_str(), "state" | "statex") {
                out.push_str(&format!("<b>{}</b> ", escape_text(&keyword)));
            }
            let groups = node.groups.len();
            for gi in 0..groups {
                self.render_group(child, gi, out);
            }
            // trailing prose up to the next tagged line
            let mut sibling = self.arena.next_sibling(child);
            while let Some(next) = sibling {
                if self.node(next).tag.is_some() {
                    break;
                }
                if matches!(
                    self.node(next).kind,
                    NodeKind::Text | NodeKind::InlineMath | NodeKind::Command
                ) && self.node(next).tag.is_none()
                {
                    self.render_node(next, out);
                }
                sibling = self.arena.next_sibling(next);
            }
            out.push_str("</div>\n");
        }
        out.push_str("</div>\n");
    }

    fn render_math_environment(&mut self, id: NodeId, out: &mut String) {
        let number = match self.node(id).tag {
            Some(Tag::Number(n)) => Some(n),
            _ => None,
        };
        out.push_str("<div class=\"displaymath\">");
        let children = self.group(id, 0);
        out.push_str(&math::render_math_nodes_to_string(self, &children, true, None));
        if let Some(n) = number {
            out.push_str(&format!("<span class=\"eqno\">({})</span>", n));
        }
        out.push_str("</div>\n");
    }

    fn render_math_span(&mut self, id: NodeId, display: bool, out: &mut String) {
        let children = self.group(id, 0);
        let alt = self
            .node(id)
            .groups
            .get(1)
            .map(|group| self.arena.flatten_nodes(group));
        out.push_str(&math::render_math_nodes_to_string(
            self,
            &children,
            display,
            alt.as_deref(),
        ));
        if display {
            out.push('\n');
        }
    }

    fn render_command(&mut self, id: NodeId, out: &mut String) {
        let name = self.node(id).name.clone();

        // a script hoisted out of an emptied math span
        if (name == "^" || name == "_") && self.node(id).math_mode {
            let element = if name == "^" { "sup" } else { "sub" };
            out.push_str(&format!("<{}>", element));
            self.render_group(id, 0, out);
            out.push_str(&format!("</{}>", element));
            return;
        }

        if let Some(escape) = TEXT_ESCAPES.get(name.as_str()) {
            self.space_before(id, out);
            out.push_str(escape);
            return;
        }
        if let Some(style) = TextStyle::from_command(&name) {
            if !self.node(id).groups.is_empty() {
                self.space_before(id, out);
                let spec = style.params();
                out.push('<');
                out.push_str(spec.element);
                if let Some(css) = spec.style {
                    out.push_str(&format!(" style=\"{}\"", css));
                }
                out.push('>');
                self.render_group(id, 0, out);
                out.push_str(&format!("</{}>", spec.element));
                return;
            }
        }
        if Accent::from_command(&name).is_some() && !self.node(id).groups.is_empty() {
            self.space_before(id, out);
            self.render_group(id, 0, out);
            out.push_str(Accent::from_command(&name).expect("checked").params().entity);
            return;
        }

        match name.as_str() {
            // paragraph markers and layout switches contribute nothing
            "par" | "centering" | "raggedright" | "raggedleft" | "noindent" | "indent"
            | "hfill" | "vfill" | "protect" | "relax" | "bigskip" | "medskip" | "smallskip"
            | "newpage" | "clearpage" | "pagebreak" | "linebreak" | "limits" | "nolimits"
            | "displaystyle" | "hline" | "toprule" | "midrule" | "bottomrule" | "cline" => {}
            // pure preamble commands
            "documentclass" | "usepackage" | "pagestyle" | "thispagestyle"
            | "bibliographystyle" | "setlength" | "setcounter" | "addtocounter"
            | "numberwithin" | "graphicspath" | "vspace" | "vspace*" | "hspace" | "hspace*"
            | "title" | "author" | "date" | "thanks" => {}
            "\\" => out.push_str("<br />"),
            "quad" => out.push_str("&#x2003;"),
            "qquad" => out.push_str("&#x2003;&#x2003;"),
            "maketitle" => self.render_titling(out),
            "tableofcontents" => self.render_toc(out),
            "item" => self.render_group(id, 0, out),
            "caption" => self.render_caption(id, out),
            "label" => {
                let key = self.arena.flatten_nodes(&self.group(id, 0));
                out.push_str(&format!("<a id=\"{}\"></a>", escape_text(key.trim())));
            }
            "ref" | "autoref" | "pageref" => self.render_ref(id, false, out),
            "eqref" => self.render_ref(id, true, out),
            "cite" | "citep" | "citet" => self.render_cite(id, out),
            "nocite" => {}
            "footnote" => {
                out.push_str("<span class=\"footnote\"> (");
                self.render_group(id, 0, out);
                out.push_str(")</span>");
            }
            "url" => {
                let target = self.arena.flatten_nodes(&self.group(id, 0));
                let target = escape_text(target.trim());
                out.push_str(&format!("<a href=\"{}\">{}</a>", target, target));
            }
            "href" => {
                let target = self.arena.flatten_nodes(&self.group(id, 0));
                out.push_str(&format!("<a href=\"{}\">", escape_text(target.trim())));
                self.render_group(id, 1, out);
                out.push_str("</a>");
            }
            "hyperref" => self.render_group(id, 0, out),
            "includegraphics" => self.render_image(id, out),
            "textcolor" => {
                let color = self.arena.flatten_nodes(&self.group(id, 0));
                out.push_str(&format!(
                    "<span style=\"color: {}\">",
                    escape_text(color.trim())
                ));
                self.render_group(id, 1, out);
                out.push_str("</span>");
            }
            "mbox" | "hbox" | "text" | "textnormal" => {
                self.space_before(id, out);
                self.render_group(id, 0, out);
            }
            "bibliography" => self.render_bibliography(out),
            _ if crate::passes::paragraphs::HEADING_COMMANDS.contains(name.as_str()) => {
                // a heading that escaped paragraph grouping
                let element = Self::heading_level(&name);
                out.push_str(&format!("<{}>", element));
                let last = self.node(id).groups.len().saturating_sub(1);
                self.render_group(id, last, out);
                out.push_str(&format!("</{}>\n", element));
            }
            _ => {
                self.space_before(id, out);
                out.push_str(&format!(
                    "<!-- unknown command: \\{} -->",
                    escape_comment(&name)
                ));
                self.ctx.warn(crate::error::ConversionWarning::new(format!(
                    "unknown command '\\{}'",
                    name
                )));
                // echo captured contents so nothing is silently lost
                let groups = self.node(id).groups.len();
                for gi in 0..groups {
                    self.render_group(id, gi, out);
                }
            }
        }
    }

    fn render_titling(&mut self, out: &mut String) {
        if let Some(title) = self.ctx.title {
            out.push_str("<h1 class=\"title\">");
            self.render_group(title, 0, out);
            out.push_str("</h1>\n");
        }
        if let Some(author) = self.ctx.author {
            out.push_str("<div class=\"author\">");
            self.render_group(author, 0, out);
            out.push_str("</div>\n");
        }
        if let Some(date) = self.ctx.date {
            out.push_str("<div class=\"date\">");
            self.render_group(date, 0, out);
            out.push_str("</div>\n");
        }
    }

    fn render_toc(&mut self, out: &mut String) {
        if self.ctx.toc.is_empty() {
            return;
        }
        out.push_str("<ul class=\"toc\">\n");
        let entries = self.ctx.toc.clone();
        for entry in entries {
            out.push_str(&format!(
                "<li class=\"toc-{}\">{} {}</li>\n",
                entry.kind,
                entry.number,
                escape_text(&entry.title)
            ));
        }
        out.push_str("</ul>\n");
    }

    fn render_caption(&mut self, id: NodeId, out: &mut String) {
        // the nearest numbered ancestor supplies the caption prefix
        let context = self.arena.ancestors(id).find_map(|ancestor| {
            let node = self.node(ancestor);
            match (&node.tag, node.kind) {
                (Some(Tag::Number(n)), NodeKind::Block) => Some((node.name.clone(), *n)),
                _ => None,
            }
        });
        out.push_str("<div class=\"caption\">");
        if let Some((kind, number)) = context {
            let label = match kind.as_str() {
                "table" => "Table",
                "algorithm" => "Algorithm",
                _ => "Figure",
            };
            out.push_str(&format!("{} {}: ", label, number));
        }
        self.render_group(id, 0, out);
        out.push_str("</div>\n");
    }

    fn render_ref(&mut self, id: NodeId, parenthesized: bool, out: &mut String) {
        let key = self.arena.flatten_nodes(&self.group(id, 0));
        let key = key.trim().to_string();
        match self.ctx.lookup_reference(&key) {
            Some(reference) => {
                let text = if parenthesized {
                    format!("({})", reference.number)
                } else {
                    reference.number.to_string()
                };
                out.push_str(&format!(
                    "<a href=\"#{}\">{}</a>",
                    escape_text(&key),
                    text
                ));
            }
            None => {
                out.push_str(&format!(
                    "<!-- undefined reference: {} -->??",
                    escape_comment(&key)
                ));
                self.ctx.warn(crate::error::ConversionWarning::new(format!(
                    "undefined reference '{}'",
                    key
                )));
            }
        }
    }

    fn render_cite(&mut self, id: NodeId, out: &mut String) {
        let keys = self.arena.flatten_nodes(&self.group(id, 0));
        let mut numbers = Vec::new();
        for key in keys.split(',') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let number = self
                .ctx
                .bibliography
                .as_ref()
                .and_then(|bib| bib.get(key))
                .map(|entry| entry.number);
            match number {
                Some(n) => numbers.push(format!(
                    "<a href=\"#bib-{}\">{}</a>",
                    escape_text(key),
                    n
                )),
                None => {
                    numbers.push("?".to_string());
                    self.ctx.warn(crate::error::ConversionWarning::new(format!(
                        "undefined citation '{}'",
                        key
                    )));
                }
            }
        }
        out.push_str(&format!("[{}]", numbers.join(", ")));
    }

    fn render_image(&mut self, id: NodeId, out: &mut String) {
        let src = self.arena.flatten_nodes(&self.group(id, 0));
        let mut attrs = String::new();
        if let Some(Options::KeyValue(map)) = &self.node(id).options {
            if let Some(width) = map.get("width") {
                attrs = format!(" style=\"width: {}\"", escape_text(width));
            }
        }
        out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\"{} />",
            escape_text(src.trim()),
            escape_text(src.trim()),
            attrs
        ));
    }

    fn render_bibliography(&mut self, out: &mut String) {
        let Some(bib) = self.ctx.bibliography.take() else {
            return;
        };
        out.push_str("<div class=\"bibliography\">\n<h2>References</h2>\n<dl>\n");
        for (key, entry) in &bib {
            out.push_str(&format!(
                "<dt id=\"bib-{}\">[{}]</dt>\n<dd>",
                escape_text(key),
                entry.number
            ));
            let mut pieces = Vec::new();
            for field in ["author", "title", "journal", "booktitle", "publisher", "year"] {
                if let Some(value) = entry.fields.get(field) {
                    let mut piece = String::new();
                    self.render_nodes(value, &mut piece);
                    if !piece.trim().is_empty() {
                        pieces.push(piece.trim().to_string());
                    }
                }
            }
            out.push_str(&pieces.join(". "));
            out.push_str(".</dd>\n");
        }
        out.push_str("</dl>\n</div>\n");
        self.ctx.bibliography = Some(bib);
    }
}
