//! The canonical-Markdown renderer: tree → Markdown source such that
//! re-parsing yields the same document.

use std::cmp::max;
use std::fmt::{self, Write};
use std::str;

use crate::nodes::{
    AstNode, ListDelimType, ListType, NodeCodeBlock, NodeHeading, NodeLink, NodeValue,
    TableAlignment,
};
use crate::parser::Options;

/// Formats a document tree as canonical Markdown.
pub fn format_document<'a>(
    root: &'a AstNode<'a>,
    options: &Options,
    output: &mut dyn Write,
) -> fmt::Result {
    let mut f = Formatter::new(options);
    f.format(root);
    if !f.v.is_empty() && f.v[f.v.len() - 1] != b'\n' {
        f.v.push(b'\n');
    }
    output.write_str(str::from_utf8(&f.v).unwrap())
}

#[derive(PartialEq, Clone, Copy)]
enum Escaping {
    /// No escaping at all (code, raw HTML).
    Literal,
    /// Ordinary text content.
    Normal,
    /// Link destinations.
    Url,
    /// Link titles.
    Title,
}

struct Formatter<'o> {
    options: &'o Options,
    v: Vec<u8>,
    prefix: Vec<u8>,
    column: usize,
    need_cr: u8,
    begin_line: bool,
    begin_content: bool,
    no_linebreaks: bool,
}

impl<'o> Formatter<'o> {
    fn new(options: &'o Options) -> Self {
        Formatter {
            options,
            v: vec![],
            prefix: vec![],
            column: 0,
            need_cr: 0,
            begin_line: true,
            begin_content: true,
            no_linebreaks: false,
        }
    }

    fn cr(&mut self) {
        self.need_cr = max(self.need_cr, 1);
    }

    fn blankline(&mut self) {
        self.need_cr = 2;
    }

    fn flush_cr(&mut self) {
        if self.need_cr == 0 {
            return;
        }
        if !self.v.is_empty() {
            if self.v[self.v.len() - 1] != b'\n' {
                self.v.push(b'\n');
            }
            if self.need_cr == 2 {
                let mut p = self.prefix.clone();
                while p.last() == Some(&b' ') {
                    p.pop();
                }
                self.v.extend_from_slice(&p);
                self.v.push(b'\n');
            }
        }
        self.need_cr = 0;
        self.begin_line = true;
        self.begin_content = true;
        self.column = 0;
    }

    fn output(&mut self, buf: &[u8], escaping: Escaping) {
        self.flush_cr();
        for i in 0..buf.len() {
            self.outc(buf[i], escaping);
        }
    }

    fn outs(&mut self, s: &str, escaping: Escaping) {
        self.output(s.as_bytes(), escaping);
    }

    fn outc(&mut self, c: u8, escaping: Escaping) {
        if self.begin_line {
            self.v.extend_from_slice(&self.prefix);
            self.column = self.prefix.len();
            self.begin_line = false;
        }

        if c == b'\n' {
            self.v.push(b'\n');
            self.begin_line = true;
            self.begin_content = true;
            self.column = 0;
            return;
        }

        let needs_escaping = match escaping {
            Escaping::Literal => false,
            Escaping::Normal => {
                matches!(c, b'*' | b'_' | b'[' | b']' | b'<' | b'>' | b'`' | b'\\' | b'&')
                    || (self.begin_content && matches!(c, b'#' | b'-' | b'+' | b'=' | b'>' | b'|'))
                    || (self.options.extension.strikethrough && c == b'~')
            }
            Escaping::Url => matches!(c, b'(' | b')' | b' '),
            Escaping::Title => c == b'"',
        };

        if needs_escaping {
            if escaping == Escaping::Url && c == b' ' {
                self.v.extend_from_slice(b"%20");
                self.column += 3;
            } else {
                self.v.push(b'\\');
                self.v.push(c);
                self.column += 2;
            }
        } else {
            self.v.push(c);
            self.column += 1;
        }

        self.begin_content = false;
    }

    fn format<'a>(&mut self, node: &'a AstNode<'a>) {
        enum Phase<'a, 'n: 'a> {
            Pre(&'a AstNode<'n>),
            Post(&'a AstNode<'n>),
        }

        let mut stack = vec![Phase::Pre(node)];
        while let Some(phase) = stack.pop() {
            match phase {
                Phase::Pre(node) => {
                    if self.format_node(node, true) {
                        stack.push(Phase::Post(node));
                        for ch in node.reverse_children() {
                            stack.push(Phase::Pre(ch));
                        }
                    }
                }
                Phase::Post(node) => {
                    self.format_node(node, false);
                }
            }
        }
    }

    fn format_node<'a>(&mut self, node: &'a AstNode<'a>, entering: bool) -> bool {
        match node.data.borrow().value {
            NodeValue::Document => (),
            NodeValue::FrontMatter(ref fm) => self.format_front_matter(fm, entering),
            NodeValue::BlockQuote => self.format_block_quote(entering),
            NodeValue::List(..) => self.format_list(node, entering),
            NodeValue::Item(..) => self.format_item(node, entering, None),
            NodeValue::TaskItem(symbol) => self.format_item(node, entering, Some(symbol)),
            NodeValue::Paragraph => self.format_paragraph(node, entering),
            NodeValue::Heading(ref nh) => self.format_heading(nh, entering),
            NodeValue::CodeBlock(ref ncb) => self.format_code_block(ncb, entering),
            NodeValue::HtmlBlock(ref nhb) => self.format_html_block(&nhb.literal, entering),
            NodeValue::ThematicBreak => self.format_thematic_break(entering),
            NodeValue::FootnoteDefinition(ref nfd) => {
                self.format_footnote_definition(&nfd.name, entering)
            }
            NodeValue::Table(..) => self.format_table(entering),
            NodeValue::TableRow(..) => self.format_table_row(node, entering),
            NodeValue::TableCell => self.format_table_cell(node, entering),
            NodeValue::MathBlock(ref nmb) => self.format_math_block(&nmb.literal, entering),
            NodeValue::TableOfContents => {
                if entering {
                    self.outs("[toc]", Escaping::Literal);
                    self.blankline();
                }
            }
            NodeValue::BlockAttributes(ref raw) => {
                if entering {
                    self.cr();
                    self.outs(raw, Escaping::Literal);
                    self.blankline();
                }
            }
            NodeValue::Text(ref literal) => {
                if entering {
                    self.outs(literal, Escaping::Normal);
                }
            }
            NodeValue::SoftBreak => {
                if entering {
                    if self.no_linebreaks {
                        self.outs(" ", Escaping::Literal);
                    } else {
                        self.cr();
                    }
                }
            }
            NodeValue::LineBreak => {
                if entering {
                    if self.no_linebreaks {
                        self.outs(" ", Escaping::Literal);
                    } else {
                        self.outs("\\\n", Escaping::Literal);
                    }
                }
            }
            NodeValue::Code(ref nc) => {
                if entering {
                    self.format_code_span(&nc.literal);
                }
            }
            NodeValue::HtmlInline(ref literal) => {
                if entering {
                    self.outs(literal, Escaping::Literal);
                }
            }
            NodeValue::HtmlEntity(ref ne) => {
                if entering {
                    self.outs(&ne.origin, Escaping::Literal);
                }
            }
            NodeValue::Emph
            | NodeValue::Strong
            | NodeValue::Strikethrough
            | NodeValue::Highlight => (),
            NodeValue::Marker(ref m) => {
                // The framing markers carry the exact source delimiters.
                if entering {
                    self.outs(m, Escaping::Literal);
                }
                return false;
            }
            NodeValue::Escaped => return self.format_escaped(node, entering),
            NodeValue::Link(ref nl) => return self.format_link(node, nl, entering),
            NodeValue::Image(ref nl) => {
                if entering {
                    self.outs("![", Escaping::Literal);
                } else {
                    self.format_link_tail(nl);
                }
            }
            NodeValue::FootnoteReference(ref nfr) => {
                if entering {
                    self.outs("[^", Escaping::Literal);
                    self.outs(&nfr.name, Escaping::Literal);
                    self.outs("]", Escaping::Literal);
                }
            }
            NodeValue::Math(ref nm) => {
                if entering {
                    let fence = if nm.display { "$$" } else { "$" };
                    self.outs(fence, Escaping::Literal);
                    self.outs(&nm.literal, Escaping::Literal);
                    self.outs(fence, Escaping::Literal);
                }
            }
            NodeValue::Emoji(ref ne) => {
                if entering {
                    self.outs(":", Escaping::Literal);
                    self.outs(&ne.alias, Escaping::Literal);
                    self.outs(":", Escaping::Literal);
                }
            }
        }
        true
    }

    fn format_front_matter(&mut self, front_matter: &str, entering: bool) {
        if entering {
            self.output(front_matter.as_bytes(), Escaping::Literal);
            self.blankline();
        }
    }

    fn format_block_quote(&mut self, entering: bool) {
        if entering {
            self.cr();
            self.prefix.extend_from_slice(b"> ");
        } else {
            let new_len = self.prefix.len() - 2;
            self.prefix.truncate(new_len);
            self.blankline();
        }
    }

    fn format_list<'a>(&mut self, node: &'a AstNode<'a>, entering: bool) {
        if !entering {
            self.blankline();
            // Two lists in a row need something to keep them apart.
            if node
                .next_sibling()
                .map_or(false, |n| matches!(n.data.borrow().value, NodeValue::List(..)))
            {
                self.outs("<!-- end list -->", Escaping::Literal);
                self.blankline();
            }
        }
    }

    fn format_item<'a>(&mut self, node: &'a AstNode<'a>, entering: bool, task: Option<Option<char>>) {
        let parent = match node.parent().unwrap().data.borrow().value {
            NodeValue::List(nl) => nl,
            _ => unreachable!(),
        };

        let marker_width = if entering {
            let mut listmarker = String::new();
            match parent.list_type {
                ListType::Bullet => {
                    let bullet = if parent.bullet_char == 0 {
                        b'-'
                    } else {
                        parent.bullet_char
                    };
                    listmarker.push(bullet as char);
                    listmarker.push(' ');
                }
                ListType::Ordered => {
                    let mut ix = parent.start;
                    let mut sibling = node.previous_sibling();
                    while let Some(s) = sibling {
                        ix += 1;
                        sibling = s.previous_sibling();
                    }
                    let delim = match parent.delimiter {
                        ListDelimType::Period => '.',
                        ListDelimType::Paren => ')',
                    };
                    listmarker = format!("{}{} ", ix, delim);
                }
            }

            self.cr();
            self.outs(&listmarker, Escaping::Literal);
            if let Some(symbol) = task {
                match symbol {
                    Some(c) => self.outs(&format!("[{}] ", c), Escaping::Literal),
                    None => self.outs("[ ] ", Escaping::Literal),
                }
            }
            self.begin_content = false;
            listmarker.len()
        } else {
            0
        };

        if entering {
            for _ in 0..marker_width {
                self.prefix.push(b' ');
            }
        } else {
            let new_len = self.prefix.len().saturating_sub(item_prefix_width(&parent, node));
            self.prefix.truncate(new_len);
            self.cr();
        }
    }

    fn format_paragraph<'a>(&mut self, node: &'a AstNode<'a>, entering: bool) {
        if !entering {
            let tight = node
                .parent()
                .and_then(|n| n.parent())
                .map_or(false, |n| match n.data.borrow().value {
                    NodeValue::List(nl) => nl.tight,
                    _ => false,
                });
            if tight {
                self.cr();
            } else {
                self.blankline();
            }
        }
    }

    fn format_heading(&mut self, nh: &NodeHeading, entering: bool) {
        if entering {
            self.cr();
            for _ in 0..nh.level {
                self.outs("#", Escaping::Literal);
            }
            self.outs(" ", Escaping::Literal);
            self.begin_content = false;
            self.no_linebreaks = true;
        } else {
            self.no_linebreaks = false;
            self.blankline();
        }
    }

    fn format_code_block(&mut self, ncb: &NodeCodeBlock, entering: bool) {
        if !entering {
            return;
        }

        self.blankline();
        let fence = fence_for(&ncb.literal, if ncb.fence_char == b'~' { b'~' } else { b'`' });
        self.outs(&fence, Escaping::Literal);
        self.outs(&ncb.info, Escaping::Literal);
        self.cr();
        self.output(ncb.literal.as_bytes(), Escaping::Literal);
        self.cr();
        self.outs(&fence, Escaping::Literal);
        self.blankline();
    }

    fn format_html_block(&mut self, literal: &str, entering: bool) {
        if entering {
            self.blankline();
            self.output(literal.as_bytes(), Escaping::Literal);
            self.blankline();
        }
    }

    fn format_math_block(&mut self, literal: &str, entering: bool) {
        if entering {
            self.blankline();
            self.outs("$$", Escaping::Literal);
            self.cr();
            self.output(literal.as_bytes(), Escaping::Literal);
            self.cr();
            self.outs("$$", Escaping::Literal);
            self.blankline();
        }
    }

    fn format_thematic_break(&mut self, entering: bool) {
        if entering {
            self.blankline();
            self.outs("---", Escaping::Literal);
            self.blankline();
        }
    }

    fn format_footnote_definition(&mut self, name: &str, entering: bool) {
        if entering {
            self.cr();
            self.outs("[^", Escaping::Literal);
            self.outs(name, Escaping::Literal);
            self.outs("]: ", Escaping::Literal);
            self.begin_content = false;
            self.prefix.extend_from_slice(b"    ");
        } else {
            let new_len = self.prefix.len() - 4;
            self.prefix.truncate(new_len);
            self.blankline();
        }
    }

    fn format_table(&mut self, entering: bool) {
        if entering {
            self.cr();
            self.no_linebreaks = true;
        } else {
            self.no_linebreaks = false;
            self.blankline();
        }
    }

    fn format_table_row<'a>(&mut self, node: &'a AstNode<'a>, entering: bool) {
        if entering {
            self.cr();
            self.outs("|", Escaping::Literal);
        } else {
            self.cr();
            let header = matches!(node.data.borrow().value, NodeValue::TableRow(true));
            if header {
                let alignments = match node.parent().unwrap().data.borrow().value {
                    NodeValue::Table(ref nt) => nt.alignments.clone(),
                    _ => vec![],
                };
                self.outs("|", Escaping::Literal);
                for a in alignments {
                    let cell = match a {
                        TableAlignment::None => " --- |",
                        TableAlignment::Left => " :-- |",
                        TableAlignment::Center => " :-: |",
                        TableAlignment::Right => " --: |",
                    };
                    self.outs(cell, Escaping::Literal);
                }
                self.cr();
            }
        }
    }

    fn format_table_cell<'a>(&mut self, _node: &'a AstNode<'a>, entering: bool) {
        if entering {
            self.outs(" ", Escaping::Literal);
        } else {
            self.outs(" |", Escaping::Literal);
        }
    }

    fn format_code_span(&mut self, literal: &str) {
        let mut longest = 0;
        let mut current = 0;
        for b in literal.bytes() {
            if b == b'`' {
                current += 1;
                longest = max(longest, current);
            } else {
                current = 0;
            }
        }
        let ticks = "`".repeat(longest + 1);
        let pad = literal.is_empty()
            || literal.starts_with('`')
            || literal.ends_with('`')
            || (literal.starts_with(' ') && literal.ends_with(' '));

        self.outs(&ticks, Escaping::Literal);
        if pad {
            self.outs(" ", Escaping::Literal);
        }
        self.outs(literal, Escaping::Literal);
        if pad {
            self.outs(" ", Escaping::Literal);
        }
        self.outs(&ticks, Escaping::Literal);
    }

    fn format_escaped<'a>(&mut self, node: &'a AstNode<'a>, entering: bool) -> bool {
        if entering {
            self.outs("\\", Escaping::Literal);
            if let Some(child) = node.first_child() {
                if let NodeValue::Text(ref t) = child.data.borrow().value {
                    self.outs(t, Escaping::Literal);
                }
            }
        }
        false
    }

    fn format_link<'a>(&mut self, node: &'a AstNode<'a>, nl: &NodeLink, entering: bool) -> bool {
        // Autolinks keep their pointy-bracket form.
        if is_autolink(node, nl) {
            if entering {
                self.outs("<", Escaping::Literal);
                let stripped = nl.url.strip_prefix("mailto:").unwrap_or(&nl.url);
                self.outs(stripped, Escaping::Literal);
                self.outs(">", Escaping::Literal);
            }
            return false;
        }

        if entering {
            self.outs("[", Escaping::Literal);
        } else {
            self.format_link_tail(nl);
        }
        true
    }

    fn format_link_tail(&mut self, nl: &NodeLink) {
        self.outs("](", Escaping::Literal);
        self.outs(&nl.url, Escaping::Url);
        if !nl.title.is_empty() {
            self.outs(" \"", Escaping::Literal);
            self.outs(&nl.title, Escaping::Title);
            self.outs("\"", Escaping::Literal);
        }
        self.outs(")", Escaping::Literal);
    }
}

fn item_prefix_width<'a>(list: &crate::nodes::NodeList, node: &'a AstNode<'a>) -> usize {
    match list.list_type {
        ListType::Bullet => 2,
        ListType::Ordered => {
            let mut ix = list.start;
            let mut sibling = node.previous_sibling();
            while let Some(s) = sibling {
                ix += 1;
                sibling = s.previous_sibling();
            }
            format!("{}", ix).len() + 2
        }
    }
}

fn fence_for(literal: &str, fence_char: u8) -> String {
    let mut longest = 0;
    let mut current = 0;
    for b in literal.bytes() {
        if b == fence_char {
            current += 1;
            longest = max(longest, current);
        } else {
            current = 0;
        }
    }
    (fence_char as char).to_string().repeat(max(3, longest + 1))
}

fn is_autolink<'a>(node: &'a AstNode<'a>, nl: &NodeLink) -> bool {
    if nl.url.is_empty() || !nl.title.is_empty() {
        return false;
    }

    let link_text = match node.first_child() {
        None => return false,
        Some(child) => {
            if child.next_sibling().is_some() {
                return false;
            }
            match child.data.borrow().value {
                NodeValue::Text(ref t) => t.clone(),
                _ => return false,
            }
        }
    };

    nl.url == link_text || nl.url == format!("mailto:{}", link_text)
}
