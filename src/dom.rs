//! The reverse path: an HTML fragment produced by one of the editor
//! renderers (and then possibly mangled by the browser) is rebuilt into a
//! document tree.
//!
//! The fragment is parsed with html5ever; elements are dispatched on their
//! tag name plus the `data-type` attribute contract. Block structure is
//! rebuilt directly; inline content is reconstructed as Markdown source text
//! and re-parsed in inline mode, which guarantees the converter can never
//! disagree with the forward parser about inline semantics.

use std::cell::RefCell;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use thiserror::Error;
use typed_arena::Arena;

use crate::arena::Node;
use crate::editor::caret_from_dom;
use crate::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeCodeBlock, NodeFootnoteDefinition, NodeHeading,
    NodeHtmlBlock, NodeList, NodeMathBlock, NodeTable, NodeValue, TableAlignment,
};
use crate::parser::{parse_inline_fragment, Options};

/// The only failure the engine surfaces: the external HTML tokenizer
/// rejected the fragment.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("failed to parse DOM fragment: {0}")]
    Parse(String),
}

/// Converts an editor-DOM fragment back into a document tree.
pub fn fragment_to_tree<'a>(
    arena: &'a Arena<AstNode<'a>>,
    fragment: &str,
    options: &Options,
) -> Result<&'a AstNode<'a>, DomError> {
    let source = caret_from_dom(fragment);

    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut source.as_bytes())
        .map_err(|e| DomError::Parse(e.to_string()))?;

    let root: &'a AstNode<'a> =
        arena.alloc(Node::new(RefCell::new(Ast::new(NodeValue::Document))));

    let converter = Converter { arena, options };
    if let Some(body) = find_body(&dom.document) {
        converter.convert_blocks(&body, root);
    }

    Ok(root)
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if name.local.as_ref() == "body" {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_body(child) {
            return Some(found);
        }
    }
    None
}

fn element_name(handle: &Handle) -> Option<String> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

fn attr(handle: &Handle, name: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn data_type(handle: &Handle) -> Option<String> {
    attr(handle, "data-type")
}

fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

fn is_block_element(handle: &Handle) -> bool {
    match element_name(handle) {
        Some(name) => matches!(
            name.as_str(),
            "p" | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "ul"
                | "ol"
                | "li"
                | "blockquote"
                | "pre"
                | "hr"
                | "table"
                | "div"
                | "section"
        ),
        None => false,
    }
}

struct Converter<'a, 'o> {
    arena: &'a Arena<AstNode<'a>>,
    options: &'o Options,
}

impl<'a, 'o> Converter<'a, 'o> {
    fn make_node(&self, value: NodeValue) -> &'a AstNode<'a> {
        let mut ast = Ast::new(value);
        ast.open = false;
        self.arena.alloc(Node::new(RefCell::new(ast)))
    }

    /// Converts the element children of `handle` as blocks. Runs of loose
    /// content between block elements are reconstructed as Markdown source
    /// and parsed as a document; that is how a Split-View fragment, which
    /// is nothing but source tokens in spans, comes back.
    fn convert_blocks(&self, handle: &Handle, parent: &'a AstNode<'a>) {
        let children = handle.children.borrow();
        let mut pending_source = String::new();

        for child in children.iter() {
            if is_block_element(child) {
                self.flush_pending(&mut pending_source, parent);
                self.convert_block(child, parent);
            } else {
                pending_source.push_str(&source_text(child));
            }
        }
        self.flush_pending(&mut pending_source, parent);
    }

    fn flush_pending(&self, source: &mut String, parent: &'a AstNode<'a>) {
        let text = std::mem::take(source);
        if text.trim().is_empty() {
            return;
        }
        let doc = crate::parser::parse_document(self.arena, &text, self.options);
        let mut ch = doc.first_child();
        while let Some(c) = ch {
            ch = c.next_sibling();
            c.detach();
            parent.append(c);
        }
    }

    fn fill_inlines(&self, node: &'a AstNode<'a>, source: &str) {
        for inline in parse_inline_fragment(self.arena, self.options, source) {
            node.append(inline);
        }
    }

    fn convert_block(&self, handle: &Handle, parent: &'a AstNode<'a>) {
        let name = match element_name(handle) {
            Some(n) => n,
            None => return,
        };
        let dt = data_type(handle).unwrap_or_default();

        match (name.as_str(), dt.as_str()) {
            ("div", "yaml-front-matter") => {
                let content = text_content(handle);
                let fm = format!("---\n{}\n---\n", content.trim_end_matches('\n'));
                parent.append(self.make_node(NodeValue::FrontMatter(fm)));
            }
            ("div", "math-block") => {
                let mut literal = self.literal_content(handle);
                if !literal.ends_with('\n') {
                    literal.push('\n');
                }
                parent.append(self.make_node(NodeValue::MathBlock(NodeMathBlock {
                    fence_offset: 0,
                    literal,
                })));
            }
            ("div", "html-block") => {
                let literal = self.literal_content(handle);
                parent.append(self.make_node(NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 6,
                    literal,
                })));
            }
            ("div", "code-block") => self.convert_code_block(handle, parent),
            ("div", "toc-block") => {
                parent.append(self.make_node(NodeValue::TableOfContents));
            }
            ("div", "kramdown-ial") => {
                let raw = text_content(handle).trim().to_string();
                let node = self.make_node(NodeValue::BlockAttributes(raw.clone()));
                parent.append(node);
                if let Some(prev) = node.previous_sibling() {
                    prev.data
                        .borrow_mut()
                        .attributes
                        .extend(crate::parser::parse_block_attributes(&raw));
                }
            }
            ("div", "footnotes-def") => {
                let label = attr(handle, "data-footnotes-label").unwrap_or_default();
                let def = self.make_node(NodeValue::FootnoteDefinition(NodeFootnoteDefinition {
                    name: label,
                    total_references: 0,
                }));
                parent.append(def);
                self.convert_blocks(handle, def);
            }
            ("div", _) | ("section", _) => {
                self.convert_blocks(handle, parent);
            }
            ("p", _) => {
                let para = self.make_node(NodeValue::Paragraph);
                parent.append(para);
                let source = self.inline_children_source(handle);
                self.fill_inlines(para, source.trim());
            }
            ("h1", _) | ("h2", _) | ("h3", _) | ("h4", _) | ("h5", _) | ("h6", _) => {
                let level = name.as_bytes()[1] - b'0';
                let heading = self.make_node(NodeValue::Heading(NodeHeading {
                    level: level as u32,
                    setext: false,
                }));
                parent.append(heading);
                let source = self.inline_children_source(handle);
                self.fill_inlines(heading, source.trim());
            }
            ("blockquote", _) => {
                let bq = self.make_node(NodeValue::BlockQuote);
                parent.append(bq);
                self.convert_blocks(handle, bq);
            }
            ("ul", _) | ("ol", _) => self.convert_list(handle, parent, name == "ol"),
            ("li", _) => {
                // A stray list item outside a list: recover by giving it one.
                let nl = NodeList::default();
                let list = self.make_node(NodeValue::List(nl));
                parent.append(list);
                self.convert_list_item(handle, list, &nl);
            }
            ("pre", _) => self.convert_code_block(handle, parent),
            ("hr", _) => {
                parent.append(self.make_node(NodeValue::ThematicBreak));
            }
            ("table", _) => self.convert_table(handle, parent),
            _ => {
                // Unknown block container: unwrap to its children.
                self.convert_blocks(handle, parent);
            }
        }
    }

    fn convert_list(&self, handle: &Handle, parent: &'a AstNode<'a>, ordered: bool) {
        let marker = attr(handle, "data-marker").unwrap_or_default();
        let mut nl = NodeList {
            list_type: if ordered {
                ListType::Ordered
            } else {
                ListType::Bullet
            },
            marker_offset: 0,
            padding: 2,
            start: 1,
            delimiter: ListDelimType::Period,
            bullet_char: b'-',
            tight: true,
            is_task_list: false,
        };
        if ordered {
            let digits: String = marker.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(start) = digits.parse() {
                nl.start = start;
            }
            if marker.ends_with(')') {
                nl.delimiter = ListDelimType::Paren;
            }
        } else if let Some(c) = marker.bytes().next() {
            if matches!(c, b'-' | b'+' | b'*') {
                nl.bullet_char = c;
            }
        }

        let list = self.make_node(NodeValue::List(nl));
        parent.append(list);

        for child in handle.children.borrow().iter() {
            if element_name(child).as_deref() == Some("li") {
                self.convert_list_item(child, list, &nl);
            }
        }

        let is_task = list
            .children()
            .any(|c| matches!(c.data.borrow().value, NodeValue::TaskItem(..)));
        if is_task {
            if let NodeValue::List(ref mut l) = list.data.borrow_mut().value {
                l.is_task_list = true;
            }
        }
    }

    fn convert_list_item(&self, handle: &Handle, list: &'a AstNode<'a>, nl: &NodeList) {
        // A leading checkbox makes it a task item.
        let mut task: Option<Option<char>> = None;
        for child in handle.children.borrow().iter() {
            if element_name(child).as_deref() == Some("input") {
                let checked = attr(child, "checked").is_some();
                task = Some(if checked { Some('x') } else { None });
                break;
            }
            if matches!(child.data, NodeData::Text { .. }) && !text_content(child).trim().is_empty()
            {
                break;
            }
            if is_block_element(child) {
                break;
            }
        }

        let item = match task {
            Some(symbol) => self.make_node(NodeValue::TaskItem(symbol)),
            None => self.make_node(NodeValue::Item(*nl)),
        };
        list.append(item);

        let children = handle.children.borrow();
        let has_block_child = children.iter().any(is_block_element);

        if has_block_child {
            self.convert_blocks(handle, item);
        } else {
            let mut source = String::new();
            for child in children.iter() {
                if element_name(child).as_deref() == Some("input") {
                    continue;
                }
                source.push_str(&self.inline_source(child));
            }
            let trimmed = source.trim();
            if !trimmed.is_empty() {
                let para = self.make_node(NodeValue::Paragraph);
                item.append(para);
                self.fill_inlines(para, trimmed);
            }
        }
    }

    fn convert_code_block(&self, handle: &Handle, parent: &'a AstNode<'a>) {
        let code = find_descendant(handle, "code");
        let (literal, info) = match code {
            Some(ref code) => {
                let mut info = String::new();
                if let Some(class) = attr(code, "class") {
                    for c in class.split_whitespace() {
                        if let Some(lang) = c.strip_prefix("language-") {
                            info = lang.to_string();
                        }
                    }
                }
                (text_content(code), info)
            }
            None => (text_content(handle), String::new()),
        };

        // An editor may have tagged the pre>code with a richer type.
        let inner_type = code.as_ref().and_then(data_type).unwrap_or_default();
        match inner_type.as_str() {
            "math-block" => {
                let mut literal = literal;
                if !literal.ends_with('\n') {
                    literal.push('\n');
                }
                parent.append(self.make_node(NodeValue::MathBlock(NodeMathBlock {
                    fence_offset: 0,
                    literal,
                })));
                return;
            }
            "yaml-front-matter" => {
                let fm = format!("---\n{}\n---\n", literal.trim_end_matches('\n'));
                parent.append(self.make_node(NodeValue::FrontMatter(fm)));
                return;
            }
            _ => {}
        }

        let mut literal = literal;
        if !literal.is_empty() && !literal.ends_with('\n') {
            literal.push('\n');
        }

        let marker = attr(handle, "data-marker").unwrap_or_default();
        let fence_char = if marker.starts_with('~') { b'~' } else { b'`' };

        parent.append(self.make_node(NodeValue::CodeBlock(NodeCodeBlock {
            fenced: true,
            fence_char,
            fence_length: marker.len().max(3),
            fence_offset: 0,
            info,
            literal,
        })));
    }

    fn convert_table(&self, handle: &Handle, parent: &'a AstNode<'a>) {
        let mut alignments = vec![];
        let mut rows: Vec<(bool, Handle)> = vec![];
        collect_table_rows(handle, &mut rows);

        for (header, row) in &rows {
            if *header {
                for cell in row.children.borrow().iter() {
                    if element_name(cell).as_deref() == Some("th") {
                        alignments.push(match attr(cell, "align").as_deref() {
                            Some("left") => TableAlignment::Left,
                            Some("center") => TableAlignment::Center,
                            Some("right") => TableAlignment::Right,
                            _ => TableAlignment::None,
                        });
                    }
                }
            }
        }

        let table = self.make_node(NodeValue::Table(NodeTable {
            alignments: alignments.clone(),
        }));
        parent.append(table);

        for (header, row) in rows {
            let row_node = self.make_node(NodeValue::TableRow(header));
            table.append(row_node);
            for cell in row.children.borrow().iter() {
                if matches!(element_name(cell).as_deref(), Some("th") | Some("td")) {
                    let cell_node = self.make_node(NodeValue::TableCell);
                    row_node.append(cell_node);
                    let source = self.inline_children_source(cell);
                    self.fill_inlines(cell_node, source.trim());
                }
            }
        }
    }

    /// Markdown source reconstruction for one inline DOM node.
    fn inline_source(&self, handle: &Handle) -> String {
        match handle.data {
            NodeData::Text { ref contents } => contents.borrow().to_string(),
            NodeData::Element { .. } => self.inline_element_source(handle),
            _ => String::new(),
        }
    }

    fn inline_children_source(&self, handle: &Handle) -> String {
        let mut out = String::new();
        for child in handle.children.borrow().iter() {
            out.push_str(&self.inline_source(child));
        }
        out
    }

    fn inline_element_source(&self, handle: &Handle) -> String {
        let name = element_name(handle).unwrap_or_default();
        let dt = data_type(handle).unwrap_or_default();

        // Spans of block syntax are structural, not content.
        if matches!(
            dt.as_str(),
            "heading-marker"
                | "blockquote-marker"
                | "list-marker"
                | "task-marker"
                | "code-block-open-marker"
                | "code-block-close-marker"
                | "code-block-info"
                | "math-block-open-marker"
                | "math-block-close-marker"
                | "yaml-front-matter-open-marker"
                | "yaml-front-matter-close-marker"
                | "padding"
                | "toc-block"
                | "kramdown-ial"
        ) {
            return String::new();
        }

        if dt == "newline" {
            return "\n".to_string();
        }

        match name.as_str() {
            "wbr" => crate::strings::CARET.to_string(),
            "br" => "\n".to_string(),
            "em" | "i" => self.wrap_unless_marked(handle, "*"),
            "strong" | "b" => self.wrap_unless_marked(handle, "**"),
            "del" | "s" | "strike" => self.wrap_unless_marked(handle, "~~"),
            "mark" => self.wrap_unless_marked(handle, "=="),
            "code" => match dt.as_str() {
                "inline-math" => format!("${}$", text_content(handle)),
                "display-math" => format!("$${}$$", text_content(handle)),
                "html-inline" => text_content(handle),
                "inline-math-content" => text_content(handle),
                _ => {
                    let literal = text_content(handle);
                    let marker = attr(handle, "data-marker")
                        .unwrap_or_else(|| backticks_for(&literal));
                    let pad = literal.starts_with('`') || literal.ends_with('`');
                    if pad {
                        format!("{} {} {}", marker, literal, marker)
                    } else {
                        format!("{}{}{}", marker, literal, marker)
                    }
                }
            },
            "a" => {
                if has_marker_child(handle) {
                    self.inline_children_source(handle)
                } else {
                    let href = attr(handle, "href").unwrap_or_default();
                    let title = attr(handle, "title").unwrap_or_default();
                    let text = self.inline_children_source(handle);
                    if title.is_empty() {
                        format!("[{}]({})", text, href)
                    } else {
                        format!("[{}]({} \"{}\")", text, href, title)
                    }
                }
            }
            "img" => {
                if dt == "emoji" {
                    let alias = attr(handle, "data-alias").unwrap_or_default();
                    return format!(":{}:", alias);
                }
                let src = attr(handle, "src").unwrap_or_default();
                let alt = attr(handle, "alt").unwrap_or_default();
                let title = attr(handle, "title").unwrap_or_default();
                if title.is_empty() {
                    format!("![{}]({})", alt, src)
                } else {
                    format!("![{}]({} \"{}\")", alt, src, title)
                }
            }
            "input" => {
                let checked = attr(handle, "checked").is_some();
                if checked { "[x] " } else { "[ ] " }.to_string()
            }
            "sup" => {
                if dt == "footnotes-ref" {
                    match attr(handle, "data-footnotes-label") {
                        Some(label) => format!("[^{}]", label),
                        None => self.inline_children_source(handle),
                    }
                } else {
                    self.inline_children_source(handle)
                }
            }
            "span" => match dt.as_str() {
                "backslash" => {
                    let inner = text_content(handle);
                    let ch = inner.trim_start_matches('\\');
                    format!("\\{}", ch)
                }
                "html-entity" => attr(handle, "data-content")
                    .unwrap_or_else(|| text_content(handle)),
                "emoji" => match attr(handle, "data-alias") {
                    Some(alias) => format!(":{}:", alias),
                    None => text_content(handle),
                },
                "inline-math" => {
                    if has_marker_child(handle) {
                        self.inline_children_source(handle)
                    } else {
                        format!("${}$", text_content(handle))
                    }
                }
                "code-inline" => {
                    // The marker spans carry the backticks; the code child
                    // contributes its literal bare.
                    let mut out = String::new();
                    for child in handle.children.borrow().iter() {
                        if element_name(child).as_deref() == Some("code") {
                            out.push_str(&text_content(child));
                        } else {
                            out.push_str(&self.inline_source(child));
                        }
                    }
                    out
                }
                _ => self.inline_children_source(handle),
            },
            _ => self.inline_children_source(handle),
        }
    }

    fn wrap_unless_marked(&self, handle: &Handle, delim: &str) -> String {
        if has_marker_child(handle) {
            self.inline_children_source(handle)
        } else {
            format!("{}{}{}", delim, self.inline_children_source(handle), delim)
        }
    }

    fn literal_content(&self, handle: &Handle) -> String {
        match find_descendant(handle, "code") {
            Some(code) => text_content(&code),
            None => text_content(handle),
        }
    }
}

/// Recovers raw Markdown source from a subtree of a source-view fragment:
/// every span's text is source text, newline spans become `\n`.
fn source_text(handle: &Handle) -> String {
    match handle.data {
        NodeData::Text { ref contents } => contents.borrow().to_string(),
        NodeData::Element { .. } => {
            if data_type(handle).as_deref() == Some("newline") {
                return "\n".to_string();
            }
            match element_name(handle).as_deref() {
                Some("br") => "\n".to_string(),
                _ => {
                    let mut out = String::new();
                    for child in handle.children.borrow().iter() {
                        out.push_str(&source_text(child));
                    }
                    out
                }
            }
        }
        _ => String::new(),
    }
}

fn backticks_for(literal: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for b in literal.bytes() {
        if b == b'`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat(longest + 1)
}

fn has_marker_child(handle: &Handle) -> bool {
    handle.children.borrow().iter().any(|c| {
        attr(c, "class")
            .map_or(false, |cls| cls.contains("marker"))
    })
}

fn find_descendant(handle: &Handle, name: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if element_name(child).as_deref() == Some(name) {
            return Some(child.clone());
        }
        if let Some(found) = find_descendant(child, name) {
            return Some(found);
        }
    }
    None
}

fn collect_table_rows(handle: &Handle, rows: &mut Vec<(bool, Handle)>) {
    for child in handle.children.borrow().iter() {
        match element_name(child).as_deref() {
            Some("thead") => {
                for row in child.children.borrow().iter() {
                    if element_name(row).as_deref() == Some("tr") {
                        rows.push((true, row.clone()));
                    }
                }
            }
            Some("tbody") => {
                for row in child.children.borrow().iter() {
                    if element_name(row).as_deref() == Some("tr") {
                        rows.push((false, row.clone()));
                    }
                }
            }
            Some("tr") => rows.push((false, child.clone())),
            _ => {}
        }
    }
}
