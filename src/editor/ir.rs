//! The Instant-Render DOM: rendered blocks that keep their syntax markers
//! alongside in `ir__marker` spans, so the editor can reveal the source of
//! the construct under the cursor. Every block root carries `data-block="0"`
//! and its stable `data-node-id`.

use crate::editor::{caret_to_dom, node_id, EdWriter};
use crate::html;
use crate::nodes::{
    AstNode, EmojiValue, ListDelimType, ListType, NodeCodeBlock, NodeValue, TableAlignment,
};
use crate::parser::Options;
use crate::strings;

/// Renders a document to the Instant-Render DOM.
pub fn render_document<'a>(root: &'a AstNode<'a>, options: &Options) -> String {
    let mut r = InstantRender {
        w: EdWriter::new(),
        options,
    };
    r.render_node(root);
    caret_to_dom(r.w.into_inner())
}

struct InstantRender<'o> {
    w: EdWriter,
    options: &'o Options,
}

impl<'o> InstantRender<'o> {
    fn marker(&mut self, text: &str) {
        self.w.tag("span", &[("class", "ir__marker")], false);
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

    fn marker_typed(&mut self, data_type: &str, text: &str) {
        self.w.tag(
            "span",
            &[("class", "ir__marker"), ("data-type", data_type)],
            false,
        );
        self.w.escaped(text);
        self.w.tag("/span", &[], false);
    }

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
                self.marker_typed("yaml-front-matter-open-marker", "---");
                self.w.tag(
                    "pre",
                    &[("class", "ir__marker--pre"), ("data-type", "yaml-front-matter-content")],
                    false,
                );
                self.w.tag("code", &[("data-type", "yaml-front-matter")], false);
                self.w.escaped(strings::front_matter_content(fm));
                self.w.push_str("</code></pre>");
                self.marker_typed("yaml-front-matter-close-marker", "---");
                self.w.push_str("</div>");
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
                self.block_open(node, "blockquote", Some("blockquote"));
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
                self.w.tag(
                    "li",
                    &[
                        ("data-block", "0"),
                        ("data-node-id", &id),
                        ("class", "ir--task"),
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
                let marker = "#".repeat(nh.level as usize);
                let id = node_id(node);
                self.w.tag(
                    &tag,
                    &[
                        ("data-block", "0"),
                        ("data-node-id", &id),
                        ("data-marker", &marker),
                    ],
                    false,
                );
                self.marker_typed("heading-marker", &format!("{} ", marker));
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
                self.w.tag(
                    "hr",
                    &[("data-block", "0"), ("data-node-id", &id)],
                    true,
                );
            }

            NodeValue::FootnoteDefinition(ref nfd) => {
                self.block_open(node, "div", Some("footnotes-def"));
                self.marker(&format!("[^{}]: ", nfd.name));
                self.render_children(node);
                self.w.push_str("</div>");
            }

            NodeValue::Table(ref nt) => self.render_table(node, &nt.alignments),
            NodeValue::TableRow(..) | NodeValue::TableCell => (),

            NodeValue::MathBlock(ref nmb) => {
                self.block_open(node, "div", Some("math-block"));
                self.marker_typed("math-block-open-marker", "$$");
                self.w.tag(
                    "pre",
                    &[("class", "ir__marker--pre"), ("data-type", "math-block-content")],
                    false,
                );
                self.w.tag("code", &[("data-type", "math-block")], false);
                self.w.escaped(nmb.literal.trim_end_matches('\n'));
                self.w.push_str("</code></pre>");
                self.marker_typed("math-block-close-marker", "$$");
                self.w.push_str("</div>");
            }

            NodeValue::TableOfContents => {
                self.block_open(node, "div", Some("toc-block"));
                let root = node.ancestors().last().unwrap();
                for heading in root.descendants() {
                    let level = match heading.data.borrow().value {
                        NodeValue::Heading(nh) => nh.level,
                        _ => continue,
                    };
                    let text = html::collect_text(heading);
                    self.w.tag("span", &[("data-type", "toc-h")], false);
                    self.w.push_str(&"&emsp;".repeat(((level - 1) * 2) as usize));
                    self.w.escaped(&text);
                    self.w.push_str("</span><br />");
                }
                self.w.push_str("</div>");
            }

            NodeValue::BlockAttributes(ref raw) => {
                let id = node_id(node);
                self.w.tag(
                    "div",
                    &[
                        ("data-block", "0"),
                        ("data-node-id", &id),
                        ("data-type", "kramdown-ial"),
                        ("class", "ir__marker"),
                    ],
                    false,
                );
                self.w.escaped(raw);
                self.w.push_str("</div>");
            }

            NodeValue::Text(ref literal) => self.w.escaped(literal),

            NodeValue::SoftBreak => self.w.push_str("\n"),

            NodeValue::LineBreak => self.w.tag("br", &[], true),

            NodeValue::Code(ref nc) => {
                let ticks = "`".repeat(nc.num_backticks.max(1));
                self.w.tag("span", &[("data-type", "code-inline")], false);
                self.marker(&ticks);
                self.w.tag("code", &[], false);
                self.w.escaped(&nc.literal);
                self.w.push_str("</code>");
                self.marker(&ticks);
                self.w.tag("/span", &[], false);
            }

            NodeValue::HtmlInline(ref literal) => {
                self.w.tag(
                    "span",
                    &[("class", "ir__marker"), ("data-type", "html-inline")],
                    false,
                );
                self.w.escaped(literal);
                self.w.tag("/span", &[], false);
            }

            NodeValue::HtmlEntity(ref ne) => {
                self.w.tag(
                    "span",
                    &[("class", "ir__marker--pre"), ("data-type", "html-entity")],
                    false,
                );
                self.w.escaped(&ne.origin);
                self.w.tag("/span", &[], false);
            }

            NodeValue::Emph => self.render_emphasis_like(node, "em", "em"),
            NodeValue::Strong => self.render_emphasis_like(node, "strong", "strong"),
            NodeValue::Strikethrough => self.render_emphasis_like(node, "s", "s"),
            NodeValue::Highlight => self.render_emphasis_like(node, "mark", "mark"),

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
                self.w.tag("span", &[("data-type", "a")], false);
                self.marker_typed("link-bracket", "[");
                self.w.tag("span", &[("data-type", "link-text")], false);
                self.render_children(node);
                self.w.tag("/span", &[], false);
                self.marker_typed("link-bracket", "]");
                self.render_link_tail(&nl.url, &nl.title);
                self.w.tag("/span", &[], false);
            }

            NodeValue::Image(ref nl) => {
                self.w.tag("span", &[("data-type", "img")], false);
                self.marker("!");
                self.marker_typed("link-bracket", "[");
                self.w.tag("span", &[("data-type", "link-text")], false);
                self.render_children(node);
                self.w.tag("/span", &[], false);
                self.marker_typed("link-bracket", "]");
                self.render_link_tail(&nl.url, &nl.title);
                let url = html::rebase_url(self.options, &nl.url);
                if !html::dangerous_url(&url) {
                    let mut href = String::new();
                    let _ = html::escape_href(&mut href, &url);
                    self.w.tag("img", &[("src", &href)], true);
                }
                self.w.tag("/span", &[], false);
            }

            NodeValue::FootnoteReference(ref nfr) => {
                self.w.tag(
                    "sup",
                    &[("data-type", "footnotes-ref"), ("data-footnotes-label", &nfr.name)],
                    false,
                );
                self.marker(&format!("[^{}]", nfr.name));
                self.w.escaped(&format!("{}", nfr.ix));
                self.w.push_str("</sup>");
            }

            NodeValue::Math(ref nm) => {
                let fence = if nm.display { "$$" } else { "$" };
                self.w.tag("span", &[("data-type", "inline-math")], false);
                self.marker(fence);
                self.w.tag(
                    "code",
                    &[("data-type", "inline-math-content")],
                    false,
                );
                self.w.escaped(&nm.literal);
                self.w.push_str("</code>");
                self.marker(fence);
                self.w.tag("/span", &[], false);
            }

            NodeValue::Emoji(ref ne) => {
                self.w.tag(
                    "span",
                    &[("data-type", "emoji"), ("data-alias", &ne.alias)],
                    false,
                );
                self.marker(&format!(":{}:", ne.alias));
                match ne.resolved {
                    Some(EmojiValue::Unicode(ref s)) => self.w.escaped(s),
                    Some(EmojiValue::Image(ref url)) => {
                        let mut href = String::new();
                        let _ = html::escape_href(&mut href, url);
                        self.w.tag(
                            "img",
                            &[("alt", &ne.alias), ("class", "emoji"), ("src", &href)],
                            true,
                        );
                    }
                    None => (),
                }
                self.w.tag("/span", &[], false);
            }
        }
    }

    fn render_emphasis_like<'a>(&mut self, node: &'a AstNode<'a>, tag: &str, data_type: &str) {
        self.w.tag(tag, &[("data-type", data_type)], false);
        self.render_children(node);
        self.w.push_str(&format!("</{}>", tag));
    }

    fn render_link_tail(&mut self, url: &str, title: &str) {
        self.marker_typed("link-paren", "(");
        self.w.tag(
            "span",
            &[("class", "ir__marker"), ("data-type", "link-dest")],
            false,
        );
        self.w.escaped(url);
        self.w.tag("/span", &[], false);
        if !title.is_empty() {
            self.marker(" \"");
            self.w.tag(
                "span",
                &[("class", "ir__marker"), ("data-type", "link-title")],
                false,
            );
            self.w.escaped(title);
            self.w.tag("/span", &[], false);
            self.marker("\"");
        }
        self.marker_typed("link-paren", ")");
    }

    fn render_code_block<'a>(&mut self, node: &'a AstNode<'a>, ncb: &NodeCodeBlock) {
        let fence_char = if ncb.fence_char == b'~' { '~' } else { '`' };
        let fence = fence_char.to_string().repeat(ncb.fence_length.max(3));

        self.block_open(node, "div", Some("code-block"));
        self.marker_typed("code-block-open-marker", &fence);
        if !ncb.info.is_empty() {
            self.w.tag(
                "span",
                &[("class", "ir__marker"), ("data-type", "code-block-info")],
                false,
            );
            self.w.escaped(&ncb.info);
            self.w.tag("/span", &[], false);
        }

        let mut pre_attrs: Vec<(&str, &str)> = vec![];
        let lang_class;
        if !ncb.info.is_empty() {
            let lang = ncb.info.split_whitespace().next().unwrap_or("");
            lang_class = format!("language-{}", lang);
            pre_attrs.push(("class", &lang_class));
        }
        self.w.tag("pre", &[], false);
        self.w.tag("code", &pre_attrs, false);
        self.w.escaped(&ncb.literal);
        self.w.push_str("</code></pre>");

        self.marker_typed("code-block-close-marker", &fence);
        self.w.push_str("</div>");
    }

    fn render_table<'a>(&mut self, node: &'a AstNode<'a>, alignments: &[TableAlignment]) {
        self.block_open(node, "table", Some("table"));
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
