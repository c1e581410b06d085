//! The WYSIWYG DOM: fully rendered blocks, with just enough data attributes
//! that the DOM converter can map the browser's edited markup back onto a
//! document tree. Syntax markers are dropped entirely; literal-content
//! constructs carry their source in `pre > code` or `data-content`.

use crate::editor::{caret_to_dom, node_id, EdWriter};
use crate::html;
use crate::nodes::{
    AstNode, EmojiValue, ListDelimType, ListType, NodeCodeBlock, NodeValue, TableAlignment,
};
use crate::parser::Options;
use crate::strings;

/// Renders a document to the WYSIWYG DOM.
pub fn render_document<'a>(root: &'a AstNode<'a>, options: &Options) -> String {
    let mut r = Wysiwyg {
        w: EdWriter::new(),
        options,
    };
    r.render_node(root);
    caret_to_dom(r.w.into_inner())
}

struct Wysiwyg<'o> {
    w: EdWriter,
    options: &'o Options,
}

impl<'o> Wysiwyg<'o> {
    fn block_open<'a>(&mut self, node: &'a AstNode<'a>, tag: &str, data_type: Option<&str>) {
        let id = node_id(node);
        let mut attrs: Vec<(&str, &str)> = vec![("data-block", "0"), ("data-node-id", &id)];
        if let Some(dt) = data_type {
            attrs.push(("data-type", dt));
        }
        self.w.tag(tag, &attrs, false);
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
                self.block_open(node, "div", Some("yaml-front-matter"));
                self.w
                    .tag("pre", &[("data-type", "yaml-front-matter-content")], false);
                self.w.tag("code", &[], false);
                self.w.escaped(strings::front_matter_content(fm));
                self.w.push_str("</code></pre></div>");
            }

            NodeValue::Paragraph => {
                let tight = node
                    .parent()
                    .and_then(|n| n.parent())
                    .map_or(false, |n| match n.data.borrow().value {
                        NodeValue::List(nl) => nl.tight,
                        _ => false,
                    });
                if tight {
                    self.render_children(node);
                } else {
                    self.block_open(node, "p", None);
                    self.render_children(node);
                    self.w.push_str("</p>");
                }
            }

            NodeValue::BlockQuote => {
                self.block_open(node, "blockquote", None);
                self.render_children(node);
                self.w.push_str("</blockquote>");
            }

            NodeValue::List(ref nl) => {
                let id = node_id(node);
                let marker: String;
                let mut attrs: Vec<(&str, &str)> =
                    vec![("data-block", "0"), ("data-node-id", &id)];
                let tag = match nl.list_type {
                    ListType::Bullet => {
                        marker = (if nl.bullet_char == 0 {
                            '-'
                        } else {
                            nl.bullet_char as char
                        })
                        .to_string();
                        attrs.push(("data-marker", &marker));
                        "ul"
                    }
                    ListType::Ordered => {
                        marker = format!(
                            "{}{}",
                            nl.start,
                            match nl.delimiter {
                                ListDelimType::Period => '.',
                                ListDelimType::Paren => ')',
                            }
                        );
                        attrs.push(("data-marker", &marker));
                        "ol"
                    }
                };
                self.w.tag(tag, &attrs, false);
                self.render_children(node);
                self.w.push_str(if tag == "ul" { "</ul>" } else { "</ol>" });
            }

            NodeValue::Item(..) => {
                self.block_open(node, "li", None);
                self.render_children(node);
                self.w.push_str("</li>");
            }

            NodeValue::TaskItem(symbol) => {
                let id = node_id(node);
                let marker = match symbol {
                    Some(c) => format!("[{}]", c),
                    None => "[ ]".to_string(),
                };
                self.w.tag(
                    "li",
                    &[
                        ("data-block", "0"),
                        ("data-node-id", &id),
                        ("class", "task-list-item"),
                        ("data-marker", &marker),
                    ],
                    false,
                );
                if symbol.is_some() {
                    self.w
                        .tag("input", &[("checked", "checked"), ("type", "checkbox")], true);
                } else {
                    self.w.tag("input", &[("type", "checkbox")], true);
                }
                self.w.push_str(" ");
                self.render_children(node);
                self.w.push_str("</li>");
            }

            NodeValue::Heading(ref nh) => {
                let tag = format!("h{}", nh.level);
                let id = node_id(node);
                let mut attrs: Vec<(&str, &str)> =
                    vec![("data-block", "0"), ("data-node-id", &id)];
                let anchor;
                if self.options.extension.heading_anchors {
                    anchor = heading_anchor_text(node);
                    attrs.push(("data-id", &anchor));
                }
                self.w.tag(&tag, &attrs, false);
                self.render_children(node);
                self.w.push_str(&format!("</{}>", tag));
            }

            NodeValue::CodeBlock(ref ncb) => self.render_code_block(node, ncb),

            NodeValue::HtmlBlock(ref nhb) => {
                self.block_open(node, "div", Some("html-block"));
                self.w.tag("pre", &[], false);
                self.w.tag("code", &[], false);
                self.w.escaped(nhb.literal.trim_end_matches('\n'));
                self.w.push_str("</code></pre></div>");
            }

            NodeValue::ThematicBreak => {
                let id = node_id(node);
                self.w
                    .tag("hr", &[("data-block", "0"), ("data-node-id", &id)], true);
            }

            NodeValue::FootnoteDefinition(ref nfd) => {
                let id = node_id(node);
                self.w.tag(
                    "div",
                    &[
                        ("data-block", "0"),
                        ("data-node-id", &id),
                        ("data-type", "footnotes-def"),
                        ("data-footnotes-label", &nfd.name),
                    ],
                    false,
                );
                self.render_children(node);
                self.w.push_str("</div>");
            }

            NodeValue::Table(ref nt) => self.render_table(node, &nt.alignments),
            NodeValue::TableRow(..) | NodeValue::TableCell => (),

            NodeValue::MathBlock(ref nmb) => {
                self.block_open(node, "div", Some("math-block"));
                self.w.tag("pre", &[], false);
                self.w.tag("code", &[("data-type", "math-block")], false);
                self.w.escaped(nmb.literal.trim_end_matches('\n'));
                self.w.push_str("</code></pre></div>");
            }

            NodeValue::TableOfContents => {
                self.block_open(node, "div", Some("toc-block"));
                self.w.escaped("[toc]");
                self.w.push_str("</div>");
            }

            NodeValue::BlockAttributes(ref raw) => {
                self.block_open(node, "div", Some("kramdown-ial"));
                self.w.escaped(raw);
                self.w.push_str("</div>");
            }

            NodeValue::Text(ref literal) => self.w.escaped(literal),

            NodeValue::SoftBreak => self.w.push_str("\n"),

            NodeValue::LineBreak => self.w.tag("br", &[], true),

            NodeValue::Code(ref nc) => {
                let marker = "`".repeat(nc.num_backticks.max(1));
                self.w.tag("code", &[("data-marker", &marker)], false);
                self.w.escaped(&nc.literal);
                self.w.push_str("</code>");
            }

            NodeValue::HtmlInline(ref literal) => {
                self.w.tag("code", &[("data-type", "html-inline")], false);
                self.w.escaped(literal);
                self.w.push_str("</code>");
            }

            NodeValue::HtmlEntity(ref ne) => {
                self.w.tag(
                    "span",
                    &[("data-type", "html-entity"), ("data-content", &ne.origin)],
                    false,
                );
                self.w.escaped(&ne.resolved);
                self.w.push_str("</span>");
            }

            NodeValue::Emph => self.render_tag(node, "em"),
            NodeValue::Strong => self.render_tag(node, "strong"),
            NodeValue::Strikethrough => self.render_tag(node, "s"),
            NodeValue::Highlight => self.render_tag(node, "mark"),

            NodeValue::Marker(..) => (),

            NodeValue::Escaped => {
                self.w.tag("span", &[("data-type", "backslash")], false);
                if let Some(child) = node.first_child() {
                    if let NodeValue::Text(ref t) = child.data.borrow().value {
                        self.w.escaped(t);
                    }
                }
                self.w.push_str("</span>");
            }

            NodeValue::Link(ref nl) => {
                let url = html::rebase_url(self.options, &nl.url);
                let mut href = String::new();
                if self.options.render.unsafe_ || !html::dangerous_url(&url) {
                    let _ = html::escape_href(&mut href, &url);
                }
                if nl.title.is_empty() {
                    self.w.tag("a", &[("href", &href)], false);
                } else {
                    self.w.tag("a", &[("href", &href), ("title", &nl.title)], false);
                }
                self.render_children(node);
                self.w.push_str("</a>");
            }

            NodeValue::Image(ref nl) => {
                let url = html::rebase_url(self.options, &nl.url);
                let mut src = String::new();
                if self.options.render.unsafe_ || !html::dangerous_url(&url) {
                    let _ = html::escape_href(&mut src, &url);
                }
                let alt = html::collect_text(node);
                if nl.title.is_empty() {
                    self.w.tag("img", &[("src", &src), ("alt", &alt)], true);
                } else {
                    self.w.tag(
                        "img",
                        &[("src", &src), ("alt", &alt), ("title", &nl.title)],
                        true,
                    );
                }
            }

            NodeValue::FootnoteReference(ref nfr) => {
                self.w.tag(
                    "sup",
                    &[("data-type", "footnotes-ref"), ("data-footnotes-label", &nfr.name)],
                    false,
                );
                self.w.escaped(&format!("{}", nfr.ix));
                self.w.push_str("</sup>");
            }

            NodeValue::Math(ref nm) => {
                self.w.tag(
                    "code",
                    &[(
                        "data-type",
                        if nm.display { "display-math" } else { "inline-math" },
                    )],
                    false,
                );
                self.w.escaped(&nm.literal);
                self.w.push_str("</code>");
            }

            NodeValue::Emoji(ref ne) => match ne.resolved {
                Some(EmojiValue::Unicode(ref s)) => {
                    self.w.tag("span", &[("data-type", "emoji"), ("data-alias", &ne.alias)], false);
                    self.w.escaped(s);
                    self.w.push_str("</span>");
                }
                Some(EmojiValue::Image(ref url)) => {
                    let mut src = String::new();
                    let _ = html::escape_href(&mut src, url);
                    self.w.tag(
                        "img",
                        &[
                            ("data-type", "emoji"),
                            ("data-alias", &ne.alias),
                            ("class", "emoji"),
                            ("src", &src),
                        ],
                        true,
                    );
                }
                None => self.w.escaped(&format!(":{}:", ne.alias)),
            },
        }
    }

    fn render_tag<'a>(&mut self, node: &'a AstNode<'a>, tag: &str) {
        self.w.tag(tag, &[], false);
        self.render_children(node);
        self.w.push_str(&format!("</{}>", tag));
    }

    fn render_code_block<'a>(&mut self, node: &'a AstNode<'a>, ncb: &NodeCodeBlock) {
        let fence_char = if ncb.fence_char == b'~' { '~' } else { '`' };
        let marker = fence_char.to_string().repeat(ncb.fence_length.max(3));

        let id = node_id(node);
        self.w.tag(
            "div",
            &[
                ("data-block", "0"),
                ("data-node-id", &id),
                ("data-type", "code-block"),
                ("data-marker", &marker),
            ],
            false,
        );
        self.w.tag("pre", &[], false);
        if ncb.info.is_empty() {
            self.w.tag("code", &[], false);
        } else {
            let lang = ncb.info.split_whitespace().next().unwrap_or("");
            let class = format!("language-{}", lang);
            self.w.tag("code", &[("class", &class)], false);
        }
        self.w.escaped(&ncb.literal);
        self.w.push_str("</code></pre></div>");
    }

    fn render_table<'a>(&mut self, node: &'a AstNode<'a>, alignments: &[TableAlignment]) {
        self.block_open(node, "table", None);
        let mut in_body = false;
        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            if header {
                self.w.push_str("<thead><tr>");
            } else {
                if !in_body {
                    self.w.push_str("<tbody>");
                    in_body = true;
                }
                self.w.push_str("<tr>");
            }

            for (i, cell) in row.children().enumerate() {
                let tag = if header { "th" } else { "td" };
                let align = match alignments.get(i) {
                    Some(TableAlignment::Left) => Some("left"),
                    Some(TableAlignment::Center) => Some("center"),
                    Some(TableAlignment::Right) => Some("right"),
                    _ => None,
                };
                match align {
                    Some(a) => self.w.tag(tag, &[("align", a)], false),
                    None => self.w.tag(tag, &[], false),
                }
                self.render_children(cell);
                self.w.push_str(&format!("</{}>", tag));
            }

            self.w.push_str("</tr>");
            if header {
                self.w.push_str("</thead>");
            }
        }
        if in_body {
            self.w.push_str("</tbody>");
        }
        self.w.push_str("</table>");
    }
}

fn heading_anchor_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut anchorizer = crate::html::Anchorizer::new();
    anchorizer.anchorize(&html::collect_text(node))
}
