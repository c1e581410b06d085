//! The line-driven block parser.
//!
//! Each input line is matched against the chain of open containers
//! (continue phase), then offered to the block openers in precedence order
//! (new-container phase), and whatever remains lands on the tip leaf as
//! unparsed content. Finalisation runs when a container closes; after the
//! whole document is fed, the inline pass fills in every leaf that carries
//! inline content.

mod autolink;
mod inlines;
pub mod options;
mod table;

use std::cell::RefCell;
use std::cmp::min;
use std::str;

use rustc_hash::FxHashMap;
use typed_arena::Arena;

use crate::arena::Node;
use crate::ctype::{isdigit, isspace};
use crate::lexer::Lexer;
use crate::node_matches;
use crate::nodes::{
    self, Ast, AstNode, ListDelimType, ListType, NodeCodeBlock, NodeFootnoteDefinition,
    NodeHeading, NodeHtmlBlock, NodeList, NodeMathBlock, NodeValue,
};
use crate::scanners;
use crate::strings::{self, Case};
use crate::typography;

pub use self::inlines::RefMap;
pub use self::options::{ExtensionOptions, Options, ParseOptions, RenderOptions};

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

// Very deeply nested lists can cause quadratic behaviour; no real document
// nests anywhere near this far.
const MAX_LIST_DEPTH: usize = 100;

/// A resolved link reference: what `[label]: dest "title"` put in the map.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkType {
    Uri,
    Email,
}

/// Parse a Markdown document to a tree allocated in `arena`.
pub fn parse_document<'a>(
    arena: &'a Arena<AstNode<'a>>,
    buffer: &str,
    options: &Options,
) -> &'a AstNode<'a> {
    parse_document_with_refmap(arena, buffer, options).0
}

/// Like [`parse_document`], but also hands back the link-reference registry
/// the parse populated. The Split-View renderer uses it to re-emit pending
/// reference definitions.
pub fn parse_document_with_refmap<'a>(
    arena: &'a Arena<AstNode<'a>>,
    buffer: &str,
    options: &Options,
) -> (&'a AstNode<'a>, RefMap) {
    let root: &'a AstNode<'a> = arena.alloc(Node::new(RefCell::new(Ast::new(NodeValue::Document))));
    let mut parser = Parser::new(arena, root, options);
    parser.feed(buffer);
    let root = parser.finish();
    (root, std::mem::take(&mut parser.refmap))
}

pub struct Parser<'a, 'o> {
    arena: &'a Arena<AstNode<'a>>,
    refmap: RefMap,
    root: &'a AstNode<'a>,
    current: &'a AstNode<'a>,
    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    thematic_break_kill_pos: usize,
    options: &'o Options,
}

impl<'a, 'o> Parser<'a, 'o> {
    fn new(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, options: &'o Options) -> Self {
        Parser {
            arena,
            refmap: RefMap::new(),
            root,
            current: root,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            thematic_break_kill_pos: 0,
            options,
        }
    }

    fn feed(&mut self, mut buffer: &str) {
        if self.options.extension.front_matter {
            if let Some((front_matter, rest)) = strings::split_off_front_matter(buffer) {
                let node = self.add_child(
                    self.root,
                    NodeValue::FrontMatter(front_matter.to_string()),
                );
                self.finalize(node).unwrap();
                self.line_number = front_matter.bytes().filter(|&b| b == b'\n').count();
                buffer = rest;
            }
        }

        for line in Lexer::new(buffer.as_bytes()) {
            self.process_line(line.bytes());
        }
    }

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            loop {
                if self.first_nonspace >= line.len() {
                    break;
                }
                match line[self.first_nonspace] {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = self.first_nonspace < line.len()
            && strings::is_line_end_char(line[self.first_nonspace]);
    }

    fn process_line(&mut self, line: &[u8]) {
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        self.thematic_break_kill_pos = 0;
        self.line_number += 1;

        let mut all_matched = true;
        if let Some(last_matched_container) = self.check_open_blocks(line, &mut all_matched) {
            let mut container = last_matched_container;
            let current = self.current;
            self.open_new_blocks(&mut container, line, all_matched);

            if current.same_node(self.current) {
                self.add_text_to_container(container, last_matched_container, line);
            }
        }
    }

    fn check_open_blocks(
        &mut self,
        line: &[u8],
        all_matched: &mut bool,
    ) -> Option<&'a AstNode<'a>> {
        let (new_all_matched, mut container, should_continue) =
            self.check_open_blocks_inner(self.root, line);

        *all_matched = new_all_matched;
        if !*all_matched {
            container = container.parent().unwrap();
        }

        if should_continue {
            Some(container)
        } else {
            None
        }
    }

    fn check_open_blocks_inner(
        &mut self,
        mut container: &'a AstNode<'a>,
        line: &[u8],
    ) -> (bool, &'a AstNode<'a>, bool) {
        let mut should_continue = true;

        while nodes::last_child_is_open(container) {
            container = container.last_child().unwrap();
            let ast = &mut *container.data.borrow_mut();

            self.find_first_nonspace(line);

            match ast.value {
                NodeValue::BlockQuote => {
                    if !self.parse_block_quote_prefix(line) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::Item(ref nl) => {
                    let nl = *nl;
                    if !self.parse_node_item_prefix(line, container, &nl) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::TaskItem(..) => {
                    // A converted task item keeps its list data on the
                    // parent list; continuation only needs offset + padding.
                    let nl = match container.parent().unwrap().data.borrow().value {
                        NodeValue::List(nl) => nl,
                        _ => NodeList::default(),
                    };
                    if !self.parse_node_item_prefix(line, container, &nl) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::CodeBlock(..) => {
                    if !self.parse_code_block_prefix(line, container, ast, &mut should_continue) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::MathBlock(..) => {
                    if !self.parse_math_block_prefix(line, container, ast, &mut should_continue) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::HtmlBlock(ref nhb) => {
                    if !self.parse_html_block_prefix(nhb.block_type) {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::Paragraph => {
                    if self.blank {
                        return (false, container, should_continue);
                    }
                }
                NodeValue::Heading(..) | NodeValue::TableRow(..) | NodeValue::TableCell => {
                    return (false, container, should_continue);
                }
                NodeValue::FootnoteDefinition(..) => {
                    if !self.parse_footnote_definition_block_prefix(line) {
                        return (false, container, should_continue);
                    }
                }
                _ => {}
            }
        }

        (true, container, should_continue)
    }

    fn parse_block_quote_prefix(&mut self, line: &[u8]) -> bool {
        let indent = self.indent;
        if indent <= 3 && line[self.first_nonspace] == b'>' {
            self.advance_offset(line, indent + 1, true);
            if strings::is_space_or_tab(line[self.offset]) {
                self.advance_offset(line, 1, true);
            }
            return true;
        }
        false
    }

    fn parse_node_item_prefix(
        &mut self,
        line: &[u8],
        container: &'a AstNode<'a>,
        nl: &NodeList,
    ) -> bool {
        if self.indent >= nl.marker_offset + nl.padding {
            self.advance_offset(line, nl.marker_offset + nl.padding, true);
            true
        } else if self.blank && container.first_child().is_some() {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    fn parse_code_block_prefix(
        &mut self,
        line: &[u8],
        container: &'a AstNode<'a>,
        ast: &mut Ast,
        should_continue: &mut bool,
    ) -> bool {
        let (fenced, fence_char, fence_length, fence_offset) = match ast.value {
            NodeValue::CodeBlock(ref ncb) => (
                ncb.fenced,
                ncb.fence_char,
                ncb.fence_length,
                ncb.fence_offset,
            ),
            _ => unreachable!(),
        };

        if !fenced {
            if self.indent >= CODE_INDENT {
                self.advance_offset(line, CODE_INDENT, true);
                return true;
            } else if self.blank {
                let offset = self.first_nonspace - self.offset;
                self.advance_offset(line, offset, false);
                return true;
            }
            return false;
        }

        let matched = if self.indent <= 3 && line[self.first_nonspace] == fence_char {
            scanners::close_code_fence(&line[self.first_nonspace..]).unwrap_or(0)
        } else {
            0
        };

        if matched >= fence_length {
            *should_continue = false;
            self.advance_offset(line, matched, false);
            self.current = self.finalize_borrowed(container, ast).unwrap();
            return false;
        }

        let mut i = fence_offset;
        while i > 0 && strings::is_space_or_tab(line[self.offset]) {
            self.advance_offset(line, 1, true);
            i -= 1;
        }
        true
    }

    fn parse_math_block_prefix(
        &mut self,
        line: &[u8],
        container: &'a AstNode<'a>,
        ast: &mut Ast,
        should_continue: &mut bool,
    ) -> bool {
        let fence_offset = match ast.value {
            NodeValue::MathBlock(ref nmb) => nmb.fence_offset,
            _ => unreachable!(),
        };

        let matched = if self.indent <= 3 && line[self.first_nonspace] == b'$' {
            scanners::math_fence(&line[self.first_nonspace..]).unwrap_or(0)
        } else {
            0
        };

        if matched > 0 {
            *should_continue = false;
            self.advance_offset(line, matched, false);
            self.current = self.finalize_borrowed(container, ast).unwrap();
            return false;
        }

        let mut i = fence_offset;
        while i > 0 && strings::is_space_or_tab(line[self.offset]) {
            self.advance_offset(line, 1, true);
            i -= 1;
        }
        true
    }

    fn parse_html_block_prefix(&mut self, t: u8) -> bool {
        match t {
            1..=5 => true,
            6 | 7 => !self.blank,
            _ => unreachable!(),
        }
    }

    fn parse_footnote_definition_block_prefix(&mut self, line: &[u8]) -> bool {
        if self.indent >= 4 {
            self.advance_offset(line, 4, true);
            true
        } else {
            line == b"\n" || line == b"\r\n"
        }
    }

    fn open_new_blocks(&mut self, container: &mut &'a AstNode<'a>, line: &[u8], all_matched: bool) {
        let mut matched: usize = 0;
        let mut nl: NodeList = NodeList::default();
        let mut sc = scanners::SetextChar::Equals;
        let mut maybe_lazy = node_matches!(self.current, NodeValue::Paragraph);
        let mut depth = 0;

        while !node_matches!(
            container,
            NodeValue::CodeBlock(..) | NodeValue::HtmlBlock(..) | NodeValue::MathBlock(..)
        ) {
            depth += 1;
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;

            if self.handle_blockquote(container, line, indented)
                || self.handle_atx_heading(container, line, indented, &mut matched)
                || self.handle_code_fence(container, line, indented, &mut matched)
                || self.handle_html_block(container, line, indented)
                || self.handle_setext_heading(container, line, indented, &mut sc)
                || self.handle_thematic_break(container, line, indented, &mut matched, all_matched)
                || self.handle_footnote(container, line, indented, &mut matched, depth)
                || self.handle_math_block(container, line, indented)
                || self.handle_block_attributes(container, line, indented)
                || self.handle_list(container, line, indented, &mut matched, depth, &mut nl)
                || self.handle_code_block(container, line, indented, maybe_lazy)
            {
                // a block opened
            } else {
                break;
            }

            if container.data.borrow().value.accepts_lines() {
                break;
            }

            maybe_lazy = false;
        }
    }

    fn handle_blockquote(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
    ) -> bool {
        if indented || line[self.first_nonspace] != b'>' {
            return false;
        }

        let offset = self.first_nonspace + 1 - self.offset;
        self.advance_offset(line, offset, false);
        if strings::is_space_or_tab(line[self.offset]) {
            self.advance_offset(line, 1, true);
        }
        *container = self.add_child(container, NodeValue::BlockQuote);
        true
    }

    fn handle_atx_heading(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        matched: &mut usize,
    ) -> bool {
        if indented
            || !unwrap_into(
                scanners::atx_heading_start(&line[self.first_nonspace..]),
                matched,
            )
        {
            return false;
        }

        let heading_startpos = self.first_nonspace;
        let offset = self.offset;
        self.advance_offset(line, heading_startpos + *matched - offset, false);
        *container = self.add_child(container, NodeValue::Heading(NodeHeading::default()));

        let mut hashpos = line[self.first_nonspace..]
            .iter()
            .position(|&c| c == b'#')
            .unwrap()
            + self.first_nonspace;
        let mut level = 0;
        while line[hashpos] == b'#' {
            level += 1;
            hashpos += 1;
        }

        container.data.borrow_mut().value = NodeValue::Heading(NodeHeading {
            level,
            setext: false,
        });
        true
    }

    fn handle_code_fence(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        matched: &mut usize,
    ) -> bool {
        if indented
            || !unwrap_into(
                scanners::open_code_fence(&line[self.first_nonspace..]),
                matched,
            )
        {
            return false;
        }

        let first_nonspace = self.first_nonspace;
        let offset = self.offset;
        let ncb = NodeCodeBlock {
            fenced: true,
            fence_char: line[first_nonspace],
            fence_length: *matched,
            fence_offset: first_nonspace - offset,
            info: String::with_capacity(10),
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::CodeBlock(ncb));
        self.advance_offset(line, first_nonspace + *matched - offset, false);
        true
    }

    fn handle_html_block(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
    ) -> bool {
        if indented {
            return false;
        }

        let block_type = match scanners::html_block_start(&line[self.first_nonspace..]) {
            Some(t) => t,
            None => {
                if !node_matches!(container, NodeValue::Paragraph) {
                    match scanners::html_block_start_7(&line[self.first_nonspace..]) {
                        Some(t) => t,
                        None => return false,
                    }
                } else {
                    return false;
                }
            }
        };

        let nhb = NodeHtmlBlock {
            block_type,
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::HtmlBlock(nhb));
        true
    }

    fn handle_setext_heading(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        sc: &mut scanners::SetextChar,
    ) -> bool {
        if indented
            || !node_matches!(container, NodeValue::Paragraph)
            || !unwrap_into(
                scanners::setext_heading_line(&line[self.first_nonspace..]),
                sc,
            )
        {
            return false;
        }

        let has_content = {
            let mut ast = container.data.borrow_mut();
            let mut content = std::mem::take(&mut ast.content);
            drop(ast);
            let has_content = self.resolve_reference_link_definitions(&mut content);
            container.data.borrow_mut().content = content;
            has_content
        };
        if has_content {
            container.data.borrow_mut().value = NodeValue::Heading(NodeHeading {
                level: match sc {
                    scanners::SetextChar::Equals => 1,
                    scanners::SetextChar::Hyphen => 2,
                },
                setext: true,
            });
            let adv = line.len() - 1 - self.offset;
            self.advance_offset(line, adv, false);
        }
        true
    }

    fn scan_thematic_break(&mut self, line: &[u8]) -> Option<usize> {
        let mut i = self.first_nonspace;
        if i >= line.len() {
            self.thematic_break_kill_pos = i;
            return None;
        }

        let c = line[i];
        if c != b'*' && c != b'_' && c != b'-' {
            self.thematic_break_kill_pos = i;
            return None;
        }

        let mut count = 1;
        let mut nextc;
        loop {
            i += 1;
            if i >= line.len() {
                self.thematic_break_kill_pos = i;
                return None;
            }
            nextc = line[i];
            if nextc == c {
                count += 1;
            } else if nextc != b' ' && nextc != b'\t' {
                break;
            }
        }

        if count >= 3 && (nextc == b'\r' || nextc == b'\n') {
            Some((i - self.first_nonspace) + 1)
        } else {
            self.thematic_break_kill_pos = i;
            None
        }
    }

    fn handle_thematic_break(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        matched: &mut usize,
        all_matched: bool,
    ) -> bool {
        if indented
            || matches!(
                (&container.data.borrow().value, all_matched),
                (&NodeValue::Paragraph, false)
            )
            || self.thematic_break_kill_pos > self.first_nonspace
            || !unwrap_into(self.scan_thematic_break(line), matched)
        {
            return false;
        }

        *container = self.add_child(container, NodeValue::ThematicBreak);
        let adv = line.len() - 1 - self.offset;
        self.advance_offset(line, adv, false);
        true
    }

    fn handle_footnote(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        matched: &mut usize,
        depth: usize,
    ) -> bool {
        if indented
            || !self.options.extension.footnotes
            || depth >= MAX_LIST_DEPTH
            || !unwrap_into(
                scanners::footnote_definition(&line[self.first_nonspace..]),
                matched,
            )
        {
            return false;
        }

        let mut c = &line[self.first_nonspace + 2..self.first_nonspace + *matched];
        c = c.split(|&e| e == b']').next().unwrap();
        let offset = self.first_nonspace + *matched - self.offset;
        self.advance_offset(line, offset, false);
        *container = self.add_child(
            container,
            NodeValue::FootnoteDefinition(NodeFootnoteDefinition {
                name: str::from_utf8(c).unwrap().to_string(),
                total_references: 0,
            }),
        );
        true
    }

    fn handle_math_block(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
    ) -> bool {
        if indented
            || !self.options.extension.math_block
            || scanners::math_fence(&line[self.first_nonspace..]).is_none()
        {
            return false;
        }

        let first_nonspace = self.first_nonspace;
        let offset = self.offset;
        let nmb = NodeMathBlock {
            fence_offset: first_nonspace - offset,
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::MathBlock(nmb));
        self.advance_offset(line, first_nonspace + 2 - offset, false);
        true
    }

    fn handle_block_attributes(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
    ) -> bool {
        let matched = if indented || !self.options.extension.block_attributes {
            return false;
        } else {
            match scanners::block_attributes(&line[self.first_nonspace..]) {
                Some(m) => m,
                None => return false,
            }
        };

        let text = str::from_utf8(&line[self.first_nonspace..self.first_nonspace + matched])
            .unwrap()
            .to_string();
        let attrs = parse_block_attributes(&text);

        let node = self.add_child(container, NodeValue::BlockAttributes(text));
        if let Some(prev) = node.previous_sibling() {
            prev.data.borrow_mut().attributes.extend(attrs);
        }
        let parent = self.finalize(node).unwrap();
        *container = parent;

        let adv = line.len() - 1 - self.offset;
        self.advance_offset(line, adv, false);
        true
    }

    fn handle_list(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        matched: &mut usize,
        depth: usize,
        nl: &mut NodeList,
    ) -> bool {
        if (indented && !node_matches!(container, NodeValue::List(..)))
            || self.indent >= 4
            || depth >= MAX_LIST_DEPTH
            || !unwrap_into_2(
                parse_list_marker(
                    line,
                    self.first_nonspace,
                    node_matches!(container, NodeValue::Paragraph),
                ),
                matched,
                nl,
            )
        {
            return false;
        }

        let offset = self.first_nonspace + *matched - self.offset;
        self.advance_offset(line, offset, false);
        let (save_partially_consumed_tab, save_offset, save_column) =
            (self.partially_consumed_tab, self.offset, self.column);

        while self.column - save_column <= 5 && strings::is_space_or_tab(line[self.offset]) {
            self.advance_offset(line, 1, true);
        }

        let i = self.column - save_column;
        if !(1..5).contains(&i) || strings::is_line_end_char(line[self.offset]) {
            nl.padding = *matched + 1;
            self.offset = save_offset;
            self.column = save_column;
            self.partially_consumed_tab = save_partially_consumed_tab;
            if i > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            nl.padding = *matched + i;
        }

        nl.marker_offset = self.indent;

        if match container.data.borrow().value {
            NodeValue::List(ref mnl) => !lists_match(nl, mnl),
            _ => true,
        } {
            *container = self.add_child(container, NodeValue::List(*nl));
        }

        *container = self.add_child(container, NodeValue::Item(*nl));
        true
    }

    fn handle_code_block(
        &mut self,
        container: &mut &'a AstNode<'a>,
        line: &[u8],
        indented: bool,
        maybe_lazy: bool,
    ) -> bool {
        if !indented || maybe_lazy || self.blank {
            return false;
        }

        self.advance_offset(line, CODE_INDENT, true);
        let ncb = NodeCodeBlock {
            fenced: false,
            fence_char: 0,
            fence_length: 0,
            fence_offset: 0,
            info: String::new(),
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::CodeBlock(ncb));
        true
    }

    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 {
            match line[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let chars_to_advance = min(count, chars_to_tab);
                        self.column += chars_to_advance;
                        self.offset += if self.partially_consumed_tab { 0 } else { 1 };
                        count -= chars_to_advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    fn add_child(&mut self, mut parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        while !nodes::can_contain_type(parent, &value) {
            parent = self.finalize(parent).unwrap();
        }

        let child = Ast::new(value);
        let node = self.arena.alloc(Node::new(RefCell::new(child)));
        parent.append(node);
        node
    }

    fn add_text_to_container(
        &mut self,
        mut container: &'a AstNode<'a>,
        last_matched_container: &'a AstNode<'a>,
        line: &[u8],
    ) {
        self.find_first_nonspace(line);

        if self.blank {
            if let Some(last_child) = container.last_child() {
                last_child.data.borrow_mut().last_line_blank = true;
            }
        }

        container.data.borrow_mut().last_line_blank = self.blank
            && match container.data.borrow().value {
                NodeValue::BlockQuote | NodeValue::Heading(..) | NodeValue::ThematicBreak => false,
                NodeValue::CodeBlock(ref ncb) => !ncb.fenced,
                NodeValue::Item(..) | NodeValue::TaskItem(..) => {
                    container.first_child().is_some()
                }
                _ => true,
            };

        let mut tmp = container;
        while let Some(parent) = tmp.parent() {
            parent.data.borrow_mut().last_line_blank = false;
            tmp = parent;
        }

        if !self.current.same_node(last_matched_container)
            && container.same_node(last_matched_container)
            && !self.blank
            && node_matches!(self.current, NodeValue::Paragraph)
        {
            self.add_line(self.current, line);
        } else {
            while !self.current.same_node(last_matched_container) {
                self.current = self.finalize(self.current).unwrap();
            }

            enum AddText {
                Literal,
                HtmlBlock(u8),
                Otherwise,
            }

            let add_text = match container.data.borrow().value {
                NodeValue::CodeBlock(..) | NodeValue::MathBlock(..) => AddText::Literal,
                NodeValue::HtmlBlock(ref nhb) => AddText::HtmlBlock(nhb.block_type),
                _ => AddText::Otherwise,
            };

            match add_text {
                AddText::Literal => self.add_line(container, line),
                AddText::HtmlBlock(block_type) => {
                    self.add_line(container, line);

                    let matches_end_condition = match block_type {
                        1 => scanners::html_block_end_1(&line[self.first_nonspace..]),
                        2 => scanners::html_block_end_2(&line[self.first_nonspace..]),
                        3 => scanners::html_block_end_3(&line[self.first_nonspace..]),
                        4 => scanners::html_block_end_4(&line[self.first_nonspace..]),
                        5 => scanners::html_block_end_5(&line[self.first_nonspace..]),
                        _ => false,
                    };

                    if matches_end_condition {
                        container = self.finalize(container).unwrap();
                    }
                }
                AddText::Otherwise => {
                    if self.blank {
                        // nothing to add
                    } else if container.data.borrow().value.accepts_lines() {
                        let mut line_vec: Vec<u8> = line.into();
                        if let NodeValue::Heading(ref nh) = container.data.borrow().value {
                            if !nh.setext {
                                let mut s = String::from_utf8(line_vec).unwrap();
                                strings::chop_trailing_hashtags(&mut s);
                                s.push('\n');
                                line_vec = s.into_bytes();
                            }
                        };
                        if self.first_nonspace <= line_vec.len() {
                            let count = self.first_nonspace - self.offset;
                            self.advance_offset(&line_vec, count, false);
                            self.add_line(container, &line_vec);
                        }
                    } else {
                        container = self.add_child(container, NodeValue::Paragraph);
                        let count = self.first_nonspace - self.offset;
                        self.advance_offset(line, count, false);
                        self.add_line(container, line);
                    }
                }
            }

            self.current = container;
        }
    }

    fn add_line(&mut self, node: &'a AstNode<'a>, line: &[u8]) {
        let mut ast = node.data.borrow_mut();
        assert!(ast.open);
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            for _ in 0..chars_to_tab {
                ast.content.push(' ');
            }
        }
        if self.offset < line.len() {
            ast.content
                .push_str(str::from_utf8(&line[self.offset..]).unwrap());
        }
    }

    fn finish(&mut self) -> &'a AstNode<'a> {
        while !self.current.same_node(self.root) {
            self.current = self.finalize(self.current).unwrap();
        }
        self.finalize(self.root);

        self.process_inlines();
        self.merge_adjacent_text_nodes(self.root);
        if self.options.extension.footnotes {
            self.process_footnotes();
        }
        if self.options.extension.autolink {
            autolink::process_email_autolinks(self.arena, self.root);
        }
        typography::process_document(self.root, self.options);
        self.assign_node_ids();

        self.root
    }

    fn finalize(&mut self, node: &'a AstNode<'a>) -> Option<&'a AstNode<'a>> {
        self.finalize_borrowed(node, &mut node.data.borrow_mut())
    }

    fn resolve_reference_link_definitions(&mut self, content: &mut String) -> bool {
        let mut seeked = 0;
        {
            let mut pos = 0;
            let mut seek: &str = content;
            while !seek.is_empty()
                && seek.as_bytes()[0] == b'['
                && unwrap_into(self.parse_reference_inline(seek), &mut pos)
            {
                seek = &seek[pos..];
                seeked += pos;
            }
        }

        if seeked != 0 {
            *content = content[seeked..].to_string();
        }

        !strings::is_blank(content.as_bytes())
    }

    fn finalize_borrowed(
        &mut self,
        node: &'a AstNode<'a>,
        ast: &mut Ast,
    ) -> Option<&'a AstNode<'a>> {
        assert!(ast.open);
        ast.open = false;

        let parent = node.parent();

        match ast.value {
            NodeValue::Paragraph => {
                let mut content = std::mem::take(&mut ast.content);
                strings::rtrim(&mut content);
                let has_content = self.resolve_reference_link_definitions(&mut content);
                ast.content = content;
                if !has_content {
                    node.detach();
                } else {
                    if self.options.extension.tasklist {
                        self.try_task_item(node, ast);
                    }
                    if self.options.extension.table {
                        table::try_convert_paragraph(self.arena, node, ast);
                    }
                    if self.options.extension.toc {
                        let trimmed = strings::trim_slice(&ast.content);
                        if trimmed.eq_ignore_ascii_case("[toc]") {
                            ast.value = NodeValue::TableOfContents;
                            ast.content.clear();
                        }
                    }
                }
            }
            NodeValue::CodeBlock(ref mut ncb) => {
                if !ncb.fenced {
                    strings::remove_trailing_blank_lines(&mut ast.content);
                    ast.content.push('\n');
                } else {
                    let mut pos = 0;
                    while pos < ast.content.len() {
                        if strings::is_line_end_char(ast.content.as_bytes()[pos]) {
                            break;
                        }
                        pos += 1;
                    }
                    assert!(pos < ast.content.len());

                    let mut info = crate::entity::unescape_html(&ast.content[..pos]);
                    strings::trim(&mut info);
                    strings::unescape(&mut info);
                    if info.is_empty() {
                        ncb.info = self
                            .options
                            .parse
                            .default_info_string
                            .clone()
                            .unwrap_or_default();
                    } else {
                        ncb.info = info;
                    }

                    if ast.content.as_bytes()[pos] == b'\r' {
                        pos += 1;
                    }
                    if pos < ast.content.len() && ast.content.as_bytes()[pos] == b'\n' {
                        pos += 1;
                    }
                    ast.content.drain(..pos);
                }
                std::mem::swap(&mut ncb.literal, &mut ast.content);
            }
            NodeValue::MathBlock(ref mut nmb) => {
                // The remainder of the opening-fence line is not content.
                let bytes = ast.content.as_bytes();
                let mut pos = 0;
                while pos < bytes.len() && strings::is_space_or_tab(bytes[pos]) {
                    pos += 1;
                }
                if pos < bytes.len() && bytes[pos] == b'\r' {
                    pos += 1;
                }
                if pos < bytes.len() && bytes[pos] == b'\n' {
                    pos += 1;
                }
                ast.content.drain(..pos);
                std::mem::swap(&mut nmb.literal, &mut ast.content);
            }
            NodeValue::HtmlBlock(ref mut nhb) => {
                std::mem::swap(&mut nhb.literal, &mut ast.content);
            }
            NodeValue::List(ref mut nl) => {
                nl.tight = true;
                let mut ch = node.first_child();

                while let Some(item) = ch {
                    if item.data.borrow().last_line_blank && item.next_sibling().is_some() {
                        nl.tight = false;
                        break;
                    }

                    let mut subch = item.first_child();
                    while let Some(subitem) = subch {
                        if (item.next_sibling().is_some() || subitem.next_sibling().is_some())
                            && nodes::ends_with_blank_line(subitem)
                        {
                            nl.tight = false;
                            break;
                        }
                        subch = subitem.next_sibling();
                    }

                    if !nl.tight {
                        break;
                    }

                    ch = item.next_sibling();
                }
            }
            _ => (),
        }

        parent
    }

    /// Converts `[ ]` / `[x]` at the start of a list item's first paragraph
    /// into task-item state on the item.
    fn try_task_item(&mut self, node: &'a AstNode<'a>, ast: &mut Ast) {
        let parent = match node.parent() {
            Some(p) => p,
            None => return,
        };
        if !node_matches!(parent, NodeValue::Item(..)) {
            return;
        }
        if !parent
            .first_child()
            .map_or(false, |fc| fc.same_node(node))
        {
            return;
        }

        // The editor cursor may sit in front of the marker.
        let caret_prefixed = ast.content.starts_with(strings::CARET);
        let probe: &str = if caret_prefixed {
            &ast.content[strings::CARET.len()..]
        } else {
            &ast.content
        };

        let (end, symbol) = match scanners::tasklist(probe.as_bytes()) {
            Some(t) => t,
            None => return,
        };

        let mut rest = probe[end..].to_string();
        if caret_prefixed {
            rest.insert_str(0, strings::CARET);
        }
        ast.content = rest;

        parent.data.borrow_mut().value = NodeValue::TaskItem(if symbol == b' ' {
            None
        } else {
            Some(symbol as char)
        });

        if let Some(grandparent) = parent.parent() {
            if let NodeValue::List(ref mut list) = grandparent.data.borrow_mut().value {
                list.is_task_list = true;
            }
        }
    }

    fn process_inlines(&mut self) {
        for node in self.root.descendants() {
            let contains = node.data.borrow().value.contains_inlines();
            if contains {
                self.parse_inlines(node);
            }
        }
    }

    fn parse_inlines(&mut self, node: &'a AstNode<'a>) {
        let delimiter_arena = Arena::new();
        let content = {
            let mut ast = node.data.borrow_mut();
            let content = std::mem::take(&mut ast.content);
            content
        };
        let content = strings::rtrim_slice(&content).to_string();

        let mut subj = inlines::Subject::new(
            self.arena,
            self.options,
            content,
            &mut self.refmap,
            &delimiter_arena,
        );

        while subj.parse_inline(node) {}

        subj.process_emphasis(0);
        subj.clear_brackets();
    }

    fn parse_reference_inline(&mut self, content: &str) -> Option<usize> {
        let delimiter_arena = Arena::with_capacity(0);
        let mut subj = inlines::Subject::new(
            self.arena,
            self.options,
            content.to_string(),
            &mut self.refmap,
            &delimiter_arena,
        );

        let lab = match subj.link_label() {
            Some(lab) if !lab.is_empty() => lab.to_string(),
            _ => return None,
        };

        if subj.peek_byte() != Some(b':') {
            return None;
        }
        subj.pos += 1;
        subj.spnl();

        let (url, matchlen) = inlines::manual_scan_link_url(&subj.input[subj.pos..])?;
        let url = url.to_string();
        subj.pos += matchlen;

        let beforetitle = subj.pos;
        subj.spnl();
        let title_search = if subj.pos == beforetitle {
            None
        } else {
            scanners::link_title(subj.input[subj.pos..].as_bytes())
        };
        let title = match title_search {
            Some(matchlen) => {
                let t = subj.input[subj.pos..subj.pos + matchlen].to_string();
                subj.pos += matchlen;
                t
            }
            None => {
                subj.pos = beforetitle;
                String::new()
            }
        };

        subj.skip_spaces();
        if !subj.skip_line_end() {
            if !title.is_empty() {
                subj.pos = beforetitle;
                subj.skip_spaces();
                if !subj.skip_line_end() {
                    return None;
                }
            } else {
                return None;
            }
        }

        let lab = strings::normalize_label(&lab, Case::Fold);
        if !lab.is_empty() {
            subj.refmap.map.entry(lab).or_insert(ResolvedReference {
                url: strings::clean_url(&url),
                title: strings::clean_title(&title),
            });
        }
        Some(subj.pos)
    }

    fn process_footnotes(&mut self) {
        let mut map = FxHashMap::default();
        Self::find_footnote_definitions(self.root, &mut map);

        let mut ix = 0;
        Self::find_footnote_references(self.root, &mut map, &mut ix);

        if !map.is_empty() {
            // References inside definitions were resolvable only while the
            // definitions were still in the tree; now detach them all.
            Self::cleanup_footnote_definitions(self.root);
        }

        if ix > 0 {
            let mut v = map.into_values().collect::<Vec<_>>();
            v.sort_unstable_by(|a, b| a.ix.cmp(&b.ix));
            for f in v {
                if f.ix.is_some() {
                    match f.node.data.borrow_mut().value {
                        NodeValue::FootnoteDefinition(ref mut nfd) => {
                            nfd.name = f.name.to_string();
                            nfd.total_references = f.total_references;
                        }
                        _ => unreachable!(),
                    }
                    self.root.append(f.node);
                }
            }
        }
    }

    fn find_footnote_definitions(
        node: &'a AstNode<'a>,
        map: &mut FxHashMap<String, FootnoteDefinition<'a>>,
    ) {
        match node.data.borrow().value {
            NodeValue::FootnoteDefinition(ref nfd) => {
                map.insert(
                    strings::normalize_label(&nfd.name, Case::Fold),
                    FootnoteDefinition {
                        ix: None,
                        node,
                        name: strings::normalize_label(&nfd.name, Case::Preserve),
                        total_references: 0,
                    },
                );
            }
            _ => {
                for n in node.children() {
                    Self::find_footnote_definitions(n, map);
                }
            }
        }
    }

    fn find_footnote_references(
        node: &'a AstNode<'a>,
        map: &mut FxHashMap<String, FootnoteDefinition>,
        ixp: &mut u32,
    ) {
        let mut ast = node.data.borrow_mut();
        let mut replace = None;
        match ast.value {
            NodeValue::FootnoteReference(ref mut nfr) => {
                let normalized = strings::normalize_label(&nfr.name, Case::Fold);
                if let Some(ref mut footnote) = map.get_mut(&normalized) {
                    let ix = match footnote.ix {
                        Some(ix) => ix,
                        None => {
                            *ixp += 1;
                            footnote.ix = Some(*ixp);
                            *ixp
                        }
                    };
                    footnote.total_references += 1;
                    nfr.ref_num = footnote.total_references;
                    nfr.ix = ix;
                    nfr.name = strings::normalize_label(&footnote.name, Case::Preserve);
                } else {
                    replace = Some(nfr.name.clone());
                }
            }
            _ => {
                drop(ast);
                for n in node.children() {
                    Self::find_footnote_references(n, map, ixp);
                }
                return;
            }
        }

        if let Some(mut label) = replace {
            label.insert_str(0, "[^");
            label.push(']');
            ast.value = NodeValue::Text(label);
        }
    }

    fn cleanup_footnote_definitions(node: &'a AstNode<'a>) {
        match node.data.borrow().value {
            NodeValue::FootnoteDefinition(_) => {
                node.detach();
            }
            _ => {
                for n in node.children() {
                    Self::cleanup_footnote_definitions(n);
                }
            }
        }
    }

    // Several inline triggers (`w`, `:`, `!`) split what reads as one text
    // run into multiple Text nodes; joining them back keeps renderers and
    // the typography passes looking at whole words.
    fn merge_adjacent_text_nodes(&mut self, node: &'a AstNode<'a>) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            let mut nch = node.first_child();
            while let Some(n) = nch {
                let mut emptied = false;
                if node_matches!(n, NodeValue::Text(..)) {
                    let mut ast = n.data.borrow_mut();
                    let root = ast.value.text_mut().unwrap();
                    while let Some(ns) = n.next_sibling() {
                        match ns.data.borrow().value {
                            NodeValue::Text(ref adj) => {
                                root.push_str(adj);
                                ns.detach();
                            }
                            _ => break,
                        }
                    }
                    emptied = root.is_empty();
                }

                let next = n.next_sibling();
                if emptied {
                    n.detach();
                } else {
                    stack.push(n);
                }
                nch = next;
            }
        }
    }

    /// Blocks get a deterministic id so editor DOMs are a pure function of
    /// `(tree, options)`.
    fn assign_node_ids(&mut self) {
        let mut seq = 0;
        for node in self.root.descendants() {
            let mut ast = node.data.borrow_mut();
            if ast.value.block() && !matches!(ast.value, NodeValue::Document) {
                seq += 1;
                ast.node_id = seq;
            }
        }
    }
}

struct FootnoteDefinition<'a> {
    ix: Option<u32>,
    node: &'a AstNode<'a>,
    name: String,
    total_references: u32,
}

/// Parses a kramdown attribute list body: `#id`, `.class`, `key="value"`,
/// `key=value`.
pub fn parse_block_attributes(text: &str) -> Vec<(String, String)> {
    let inner = text
        .trim_start_matches('{')
        .trim_start_matches(':')
        .trim_end_matches('}')
        .trim();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut push = |k: String, v: String| {
        if k == "class" {
            if let Some(existing) = attrs.iter_mut().find(|(ek, _)| ek == "class") {
                existing.1.push(' ');
                existing.1.push_str(&v);
                return;
            }
        }
        attrs.push((k, v));
    };

    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && isspace(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        match bytes[i] {
            b'#' | b'.' => {
                i += 1;
                while i < bytes.len() && !isspace(bytes[i]) {
                    i += 1;
                }
                let word = &inner[start + 1..i];
                if !word.is_empty() {
                    if bytes[start] == b'#' {
                        push("id".to_string(), word.to_string());
                    } else {
                        push("class".to_string(), word.to_string());
                    }
                }
            }
            _ => {
                while i < bytes.len() && bytes[i] != b'=' && !isspace(bytes[i]) {
                    i += 1;
                }
                let key = &inner[start..i];
                if i < bytes.len() && bytes[i] == b'=' {
                    i += 1;
                    let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                        let quote = bytes[i];
                        i += 1;
                        let vstart = i;
                        while i < bytes.len() && bytes[i] != quote {
                            i += 1;
                        }
                        let v = &inner[vstart..i];
                        if i < bytes.len() {
                            i += 1;
                        }
                        v
                    } else {
                        let vstart = i;
                        while i < bytes.len() && !isspace(bytes[i]) {
                            i += 1;
                        }
                        &inner[vstart..i]
                    };
                    if !key.is_empty() {
                        push(key.to_string(), value.to_string());
                    }
                } else if !key.is_empty() {
                    push(key.to_string(), String::new());
                }
            }
        }
    }

    attrs
}

fn parse_list_marker(
    line: &[u8],
    mut pos: usize,
    interrupts_paragraph: bool,
) -> Option<(usize, NodeList)> {
    let mut c = line[pos];
    let startpos = pos;

    if c == b'*' || c == b'-' || c == b'+' {
        pos += 1;
        if !isspace(line[pos]) {
            return None;
        }

        if interrupts_paragraph {
            let mut i = pos;
            while strings::is_space_or_tab(line[i]) {
                i += 1;
            }
            if line[i] == b'\n' {
                return None;
            }
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Bullet,
                marker_offset: 0,
                padding: 0,
                start: 1,
                delimiter: ListDelimType::Period,
                bullet_char: c,
                tight: false,
                is_task_list: false,
            },
        ));
    } else if isdigit(c) {
        let mut start: usize = 0;
        let mut digits = 0;

        loop {
            start = (10 * start) + (line[pos] - b'0') as usize;
            pos += 1;
            digits += 1;

            if !(digits < 9 && isdigit(line[pos])) {
                break;
            }
        }

        if interrupts_paragraph && start != 1 {
            return None;
        }

        c = line[pos];
        if c != b'.' && c != b')' {
            return None;
        }

        pos += 1;

        if !isspace(line[pos]) {
            return None;
        }

        if interrupts_paragraph {
            let mut i = pos;
            while strings::is_space_or_tab(line[i]) {
                i += 1;
            }
            if strings::is_line_end_char(line[i]) {
                return None;
            }
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Ordered,
                marker_offset: 0,
                padding: 0,
                start,
                delimiter: if c == b'.' {
                    ListDelimType::Period
                } else {
                    ListDelimType::Paren
                },
                bullet_char: 0,
                tight: false,
                is_task_list: false,
            },
        ));
    }

    None
}

fn lists_match(list_data: &NodeList, item_data: &NodeList) -> bool {
    list_data.list_type == item_data.list_type
        && list_data.delimiter == item_data.delimiter
        && list_data.bullet_char == item_data.bullet_char
}

pub fn unwrap_into<T>(t: Option<T>, out: &mut T) -> bool {
    match t {
        Some(v) => {
            *out = v;
            true
        }
        _ => false,
    }
}

fn unwrap_into_2<T, U>(tu: Option<(T, U)>, out_t: &mut T, out_u: &mut U) -> bool {
    match tu {
        Some((t, u)) => {
            *out_t = t;
            *out_u = u;
            true
        }
        _ => false,
    }
}

/// Parses `content` in inline mode and returns the resulting nodes, for
/// callers (like the DOM converter) that rebuild inline trees from
/// reconstructed source.
pub(crate) fn parse_inline_fragment<'a>(
    arena: &'a Arena<AstNode<'a>>,
    options: &Options,
    content: &str,
) -> Vec<&'a AstNode<'a>> {
    let holder: &'a AstNode<'a> =
        arena.alloc(Node::new(RefCell::new(Ast::new(NodeValue::Paragraph))));
    let mut refmap = RefMap::new();
    let delimiter_arena = Arena::new();
    let content = strings::rtrim_slice(content).to_string();

    let mut subj = inlines::Subject::new(arena, options, content, &mut refmap, &delimiter_arena);
    while subj.parse_inline(holder) {}
    subj.process_emphasis(0);
    subj.clear_brackets();

    let mut out = vec![];
    let mut ch = holder.first_child();
    while let Some(c) = ch {
        ch = c.next_sibling();
        c.detach();
        out.push(c);
    }
    out
}
