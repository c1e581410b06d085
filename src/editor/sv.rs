//! The Split-View DOM renderer: a pure source view where every token sits
//! in a typed span and line structure is carried by newline spans, so the
//! editor half of a split screen can edit Markdown while the other half
//! shows the rendered form.

use crate::editor::{caret_to_dom, EdWriter};
use crate::nodes::{
    AstNode, ListDelimType, ListType, NodeCodeBlock, NodeValue, TableAlignment,
};
use crate::parser::{Options, RefMap};
use crate::strings;

/// The span sequence standing in for `\n` in Split-View output.
pub const NEWLINE_SV: &str =
    "<span data-type=\"newline\"><br /><span style=\"display: none\">\n</span></span>";

/// Renders a document to the Split-View DOM.
pub fn render_document<'a>(root: &'a AstNode<'a>, options: &Options) -> String {
    render_document_with_refs(root, options, &RefMap::new())
}

/// Renders a document to the Split-View DOM, appending the given
/// link-reference definitions after the body the way they would appear in
/// source.
pub fn render_document_with_refs<'a>(
    root: &'a AstNode<'a>,
    options: &Options,
    refs: &RefMap,
) -> String {
    let mut r = SplitView {
        w: EdWriter::new(),
        stack: vec![],
        options,
    };
    r.render_node(root);
    r.newline();

    let mut labels: Vec<&String> = refs.map.keys().collect();
    labels.sort();
    for label in labels {
        let reference = &refs.map[label];
        r.bracket("[");
        r.w.tag(
            "span",
            &[("class", "sv__marker--link"), ("data-type", "footnotes-link")],
            false,
        );
        r.w.escaped(label);
        r.w.tag("/span", &[], false);
        r.bracket("]");
        r.w.push_str("<span>: </span>");
        r.w.escaped(&reference.url);
        r.newline();
    }

    r.w.push_str(NEWLINE_SV);
    caret_to_dom(r.w.into_inner())
}

struct SplitView<'o> {
    w: EdWriter,
    stack: Vec<EdWriter>,
    options: &'o Options,
}

impl<'o> SplitView<'o> {
    fn push_writer(&mut self) {
        self.stack.push(std::mem::replace(&mut self.w, EdWriter::new()));
    }

    fn pop_writer(&mut self) -> String {
        let inner = std::mem::replace(&mut self.w, self.stack.pop().unwrap());
        inner.into_inner()
    }

    fn newline(&mut self) {
        if !self.w.is_empty() && !self.w.ends_with(NEWLINE_SV) {
            self.w.push_str(NEWLINE_SV);
        }
    }

    fn blank(&mut self) {
        self.newline();
        self.w.push_str(NEWLINE_SV);
    }

    fn marker(&mut self, text: &str) {
        self.w.tag("span", &[("class", "sv__marker")], false);
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

    fn marker_typed(&mut self, data_type: &str, text: &str) {
        self.w.tag(
            "span",
            &[("data-type", data_type), ("class", "sv__marker")],
            false,
        );
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

    fn bracket(&mut self, text: &str) {
        self.w.tag("span", &[("class", "sv__marker--bracket")], false);
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

    fn text_span(&mut self, text: &str) {
        self.w.tag("span", &[("data-type", "text")], false);
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

    /// Renders `node`'s children into a fresh buffer and hands the result
    /// back, with the trailing newline span guaranteed.
    fn children_to_string<'a>(&mut self, node: &'a AstNode<'a>) -> String {
        self.push_writer();
        self.render_children(node);
        self.newline();
        self.pop_writer()
    }

    /// Re-emits buffered content with `first` spliced in front of the first
    /// line and `cont` in front of every later non-empty line.
    fn splice_lines(&mut self, content: &str, first: &str, cont: &str) {
        let mut segments: Vec<&str> = content.split(NEWLINE_SV).collect();
        if segments.last() == Some(&"") {
            segments.pop();
        }
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                self.w.push_str(NEWLINE_SV);
                continue;
            }
            self.w
                .push_str(if i == 0 { first } else { cont });
            self.w.push_str(segment);
            self.w.push_str(NEWLINE_SV);
        }
    }

    fn padding_span(width: usize) -> String {
        format!(
            "<span data-type=\"padding\">{}</span>",
            " ".repeat(width)
        )
    }

    fn render_children<'a>(&mut self, node: &'a AstNode<'a>) {
        for ch in node.children() {
            self.render_node(ch);
        }
    }

    fn render_node<'a>(&mut self, node: &'a AstNode<'a>) {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Document => self.render_children(node),

            NodeValue::FrontMatter(ref fm) => {
                self.marker_typed("yaml-front-matter-open-marker", "---");
                self.newline();
                self.w.tag("span", &[("data-type", "text")], false);
                let content = strings::front_matter_content(fm);
                let mut lines = content.split('\n').peekable();
                while let Some(line) = lines.next() {
                    let mut escaped = String::new();
                    let _ = crate::html::escape(&mut escaped, line);
                    self.w.push_str(&escaped);
                    if lines.peek().is_some() {
                        self.w.push_str(&Self::padding_span(0));
                        self.w.push_str(NEWLINE_SV);
                    }
                }
                self.w.tag("/span", &[], false);
                self.newline();
                self.marker_typed("yaml-front-matter-close-marker", "---");
                self.blank();
            }

            NodeValue::Paragraph => {
                self.render_children(node);
                let tight = node
                    .parent()
                    .and_then(|n| n.parent())
                    .map_or(false, |n| match n.data.borrow().value {
                        NodeValue::List(nl) => nl.tight,
                        _ => false,
                    });
                if tight {
                    self.newline();
                } else {
                    self.blank();
                }
            }

            NodeValue::BlockQuote => {
                let content = self.children_to_string(node);
                let marker = {
                    let mut w = EdWriter::new();
                    w.tag(
                        "span",
                        &[("data-type", "blockquote-marker"), ("class", "sv__marker")],
                        false,
                    );
                    w.escaped("> ");
                    w.tag("/span", &[], false);
                    w.into_inner()
                };
                self.splice_lines(&content, &marker, &marker);
                self.blank();
            }

            NodeValue::List(..) => {
                self.render_children(node);
                self.blank();
            }

            NodeValue::Item(..) | NodeValue::TaskItem(..) => {
                let list_data = match node.parent().unwrap().data.borrow().value {
                    NodeValue::List(nl) => nl,
                    _ => return,
                };

                let mut marker_text = match list_data.list_type {
                    ListType::Bullet => {
                        let bullet = if list_data.bullet_char == 0 {
                            b'-'
                        } else {
                            list_data.bullet_char
                        };
                        format!("{} ", bullet as char)
                    }
                    ListType::Ordered => {
                        let mut ix = list_data.start;
                        let mut sibling = node.previous_sibling();
                        while let Some(s) = sibling {
                            ix += 1;
                            sibling = s.previous_sibling();
                        }
                        let delim = match list_data.delimiter {
                            ListDelimType::Period => '.',
                            ListDelimType::Paren => ')',
                        };
                        format!("{}{} ", ix, delim)
                    }
                };
                if let NodeValue::TaskItem(symbol) = node.data.borrow().value {
                    marker_text.push_str(&match symbol {
                        Some(c) => format!("[{}] ", c),
                        None => "[ ] ".to_string(),
                    });
                }

                let content = self.children_to_string(node);
                let first = {
                    let mut w = EdWriter::new();
                    w.tag(
                        "span",
                        &[("data-type", "list-marker"), ("class", "sv__marker")],
                        false,
                    );
                    w.escaped(&marker_text);
                    w.tag("/span", &[], false);
                    w.into_inner()
                };
                let cont = Self::padding_span(marker_text.len());
                self.splice_lines(&content, &first, &cont);
                if !list_data.tight {
                    self.blank();
                }
            }

            NodeValue::Heading(ref nh) => {
                let marker = format!("{} ", "#".repeat(nh.level as usize));
                self.marker_typed("heading-marker", &marker);
                self.render_children(node);
                self.blank();
            }

            NodeValue::CodeBlock(ref ncb) => self.render_code_block(ncb),

            NodeValue::HtmlBlock(ref nhb) => {
                self.w.tag("span", &[("data-type", "html-block")], false);
                self.w.escaped(nhb.literal.trim_end_matches('\n'));
                self.w.tag("/span", &[], false);
                self.blank();
            }

            NodeValue::ThematicBreak => {
                self.marker("---");
                self.blank();
            }

            NodeValue::FootnoteDefinition(ref nfd) => {
                self.bracket("[");
                self.w.tag(
                    "span",
                    &[("class", "sv__marker--link"), ("data-type", "footnotes-link")],
                    false,
                );
                self.w.escaped(&format!("^{}", nfd.name));
                self.w.tag("/span", &[], false);
                self.bracket("]");
                self.w.push_str("<span>: </span>");

                let content = self.children_to_string(node);
                self.splice_lines(&content, "", &Self::padding_span(4));
                self.blank();
            }

            NodeValue::Table(ref nt) => self.render_table(node, &nt.alignments),
            NodeValue::TableRow(..) | NodeValue::TableCell => (),

            NodeValue::MathBlock(ref nmb) => {
                self.marker_typed("math-block-open-marker", "$$");
                self.newline();
                self.w.tag("span", &[("data-type", "math-block")], false);
                self.w.escaped(nmb.literal.trim_end_matches('\n'));
                self.w.tag("/span", &[], false);
                self.newline();
                self.marker_typed("math-block-close-marker", "$$");
                self.blank();
            }

            NodeValue::TableOfContents => {
                self.w.tag(
                    "span",
                    &[("class", "sv__toc"), ("data-type", "toc-block")],
                    false,
                );
                self.w.escaped("[toc]");
                self.w.tag("/span", &[], false);
                self.blank();
            }

            NodeValue::BlockAttributes(ref raw) => {
                self.marker_typed("kramdown-ial", raw);
                self.blank();
            }

            NodeValue::Text(ref literal) => self.text_span(literal),

            NodeValue::SoftBreak => self.newline(),

            NodeValue::LineBreak => {
                self.text_span("  ");
                self.w.push_str(NEWLINE_SV);
            }

            NodeValue::Code(ref nc) => {
                let ticks = "`".repeat(nc.num_backticks.max(1));
                let pad = nc.literal.starts_with('`') || nc.literal.ends_with('`');
                self.marker(&ticks);
                self.w.tag("span", &[("data-type", "code-inline")], false);
                if pad {
                    self.w.push_str(" ");
                }
                self.w.escaped(&nc.literal);
                if pad {
                    self.w.push_str(" ");
                }
                self.w.tag("/span", &[], false);
                self.marker(&ticks);
            }

            NodeValue::HtmlInline(ref literal) => {
                self.w.tag("span", &[("data-type", "html-inline")], false);
                self.w.escaped(literal);
                self.w.tag("/span", &[], false);
            }

            NodeValue::HtmlEntity(ref ne) => {
                self.w.tag(
                    "span",
                    &[("class", "sv__marker--pre"), ("data-type", "html-entity")],
                    false,
                );
                self.w.escaped(&ne.origin);
                self.w.tag("/span", &[], false);
            }

            NodeValue::Emph
            | NodeValue::Strong
            | NodeValue::Strikethrough
            | NodeValue::Highlight => self.render_children(node),

            NodeValue::Marker(ref m) => self.marker(m),

            NodeValue::Escaped => {
                self.w.tag("span", &[("data-type", "backslash")], false);
                self.marker("\\");
                if let Some(child) = node.first_child() {
                    if let NodeValue::Text(ref t) = child.data.borrow().value {
                        self.w.escaped(t);
                    }
                }
                self.w.tag("/span", &[], false);
            }

            NodeValue::Link(ref nl) => {
                self.bracket("[");
                self.w.tag("span", &[("data-type", "link-text")], false);
                self.render_children(node);
                self.w.tag("/span", &[], false);
                self.bracket("]");
                self.render_link_tail(&nl.url, &nl.title);
            }

            NodeValue::Image(ref nl) => {
                self.marker("!");
                self.bracket("[");
                self.w.tag("span", &[("data-type", "link-text")], false);
                self.render_children(node);
                self.w.tag("/span", &[], false);
                self.bracket("]");
                self.render_link_tail(&nl.url, &nl.title);
            }

            NodeValue::FootnoteReference(ref nfr) => {
                self.w.tag(
                    "span",
                    &[("class", "sup"), ("data-type", "footnotes-ref")],
                    false,
                );
                self.bracket("[");
                self.w.tag("span", &[("class", "sv__marker--link")], false);
                self.w.escaped(&format!("^{}", nfr.name));
                self.w.tag("/span", &[], false);
                self.bracket("]");
                self.w.tag("/span", &[], false);
            }

            NodeValue::Math(ref nm) => {
                let fence = if nm.display { "$$" } else { "$" };
                self.marker(fence);
                self.w.tag("span", &[("data-type", "inline-math")], false);
                self.w.escaped(&nm.literal);
                self.w.tag("/span", &[], false);
                self.marker(fence);
            }

            NodeValue::Emoji(ref ne) => {
                self.w.tag("span", &[("data-type", "emoji")], false);
                self.w.escaped(&format!(":{}:", ne.alias));
                self.w.tag("/span", &[], false);
            }
        }
    }

    fn render_link_tail(&mut self, url: &str, title: &str) {
        self.w.tag("span", &[("class", "sv__marker--paren")], false);
        self.w.escaped("(");
        self.w.tag("/span", &[], false);
        self.w.tag("span", &[("data-type", "link-dest")], false);
        self.w.escaped(url);
        self.w.tag("/span", &[], false);
        if !title.is_empty() {
            self.w.push_str("<span> </span>");
            self.marker("\"");
            self.w.tag("span", &[("data-type", "link-title")], false);
            self.w.escaped(title);
            self.w.tag("/span", &[], false);
            self.marker("\"");
        }
        self.w.tag("span", &[("class", "sv__marker--paren")], false);
        self.w.escaped(")");
        self.w.tag("/span", &[], false);
    }

    fn render_code_block(&mut self, ncb: &NodeCodeBlock) {
        let fence_char = if ncb.fence_char == b'~' { '~' } else { '`' };
        let fence = fence_char
            .to_string()
            .repeat(ncb.fence_length.max(3));

        self.marker_typed("code-block-open-marker", &fence);
        if !ncb.info.is_empty() {
            self.w.tag(
                "span",
                &[("class", "sv__marker--info"), ("data-type", "code-block-info")],
                false,
            );
            self.w.escaped(&ncb.info);
            self.w.tag("/span", &[], false);
        }
        self.newline();

        self.w.tag("span", &[("data-type", "code-block-code")], false);
        let mut lines = ncb.literal.split('\n').peekable();
        while let Some(line) = lines.next() {
            if lines.peek().is_none() && line.is_empty() {
                break;
            }
            let mut escaped = String::new();
            let _ = crate::html::escape(&mut escaped, line);
            self.w.push_str(&escaped);
            self.w.push_str(NEWLINE_SV);
        }
        self.w.tag("/span", &[], false);

        self.marker_typed("code-block-close-marker", &fence);
        self.blank();
    }

    fn render_table<'a>(&mut self, node: &'a AstNode<'a>, alignments: &[TableAlignment]) {
        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            self.marker("|");
            for cell in row.children() {
                self.text_span(" ");
                self.render_children(cell);
                self.text_span(" ");
                self.marker("|");
            }
            self.newline();

            if header {
                self.marker("|");
                for a in alignments {
                    let text = match a {
                        TableAlignment::None => " --- |",
                        TableAlignment::Left => " :-- |",
                        TableAlignment::Center => " :-: |",
                        TableAlignment::Right => " --: |",
                    };
                    self.marker(text);
                }
                self.newline();
            }
        }
        self.blank();
    }
}
