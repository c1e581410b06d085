//! The inline pass: turns a leaf block's unparsed content into inline nodes.
//!
//! A `Subject` owns the text being scanned plus the two pieces of state the
//! CommonMark inline grammar needs: the delimiter stack (for `*` `_` `~` `=`
//! runs) and the bracket stack (for `[` / `![` … `]`). Dispatch is by the
//! lexer's classification of the byte at the cursor.

use std::cell::Cell;
use std::ptr;

use smallvec::SmallVec;
use typed_arena::Arena;
use unicode_categories::UnicodeCategories;

use crate::arena::Node;
use crate::ctype::{isdigit, ispunct, isspace};
use crate::emoji;
use crate::entity;
use crate::lexer::ItemKind;
use crate::nodes::{
    Ast, AstNode, NodeCode, NodeFootnoteReference, NodeHtmlEntity, NodeLink, NodeMath, NodeValue,
};
use crate::parser::{autolink, AutolinkType, Options, ResolvedReference};
use crate::scanners;
use crate::strings::{self, Case};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

const MAXBACKTICKS: usize = 80;
const MAX_LINK_LABEL_LENGTH: usize = 1000;
const MAX_MATH_DOLLARS: usize = 2;

/// The link-reference registry. Labels are stored normalised
/// ([`strings::normalize_label`] with case folding); the first definition of
/// a label wins.
pub struct RefMap {
    pub map: FxHashMap<String, ResolvedReference>,
}

impl RefMap {
    pub fn new() -> Self {
        RefMap {
            map: FxHashMap::default(),
        }
    }

    pub fn lookup(&self, lab: &str) -> Option<&ResolvedReference> {
        self.map.get(lab)
    }
}

impl Default for RefMap {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Delimiter<'a: 'd, 'd> {
    inl: &'a AstNode<'a>,
    position: usize,
    length: usize,
    delim_byte: u8,
    can_open: bool,
    can_close: bool,
    prev: Cell<Option<&'d Delimiter<'a, 'd>>>,
    next: Cell<Option<&'d Delimiter<'a, 'd>>>,
}

impl<'d> PartialEq for &'d Delimiter<'_, 'd> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(*self, *other)
    }
}

struct Bracket<'a> {
    inl_text: &'a AstNode<'a>,
    position: usize,
    image: bool,
    bracket_after: bool,
}

#[derive(Default)]
struct HtmlSkipFlags {
    cdata: bool,
    declaration: bool,
    pi: bool,
    comment: bool,
}

pub struct Subject<'a: 'd, 'r, 'o, 'd> {
    pub arena: &'a Arena<AstNode<'a>>,
    pub options: &'o Options,
    pub input: String,
    pub pos: usize,
    pub refmap: &'r mut RefMap,
    delimiter_arena: &'d Arena<Delimiter<'a, 'd>>,
    last_delimiter: Option<&'d Delimiter<'a, 'd>>,
    brackets: SmallVec<[Bracket<'a>; 8]>,
    within_brackets: bool,
    pub backticks: [usize; MAXBACKTICKS + 1],
    pub scanned_for_backticks: bool,
    no_link_openers: bool,
    flags: HtmlSkipFlags,
    special_char_bytes: [bool; 256],
    emph_delim_bytes: [bool; 256],
}

impl<'a, 'r, 'o, 'd> Subject<'a, 'r, 'o, 'd> {
    pub fn new(
        arena: &'a Arena<AstNode<'a>>,
        options: &'o Options,
        input: String,
        refmap: &'r mut RefMap,
        delimiter_arena: &'d Arena<Delimiter<'a, 'd>>,
    ) -> Self {
        let mut s = Subject {
            arena,
            options,
            input,
            pos: 0,
            refmap,
            delimiter_arena,
            last_delimiter: None,
            brackets: SmallVec::new(),
            within_brackets: false,
            backticks: [0; MAXBACKTICKS + 1],
            scanned_for_backticks: false,
            no_link_openers: true,
            flags: HtmlSkipFlags::default(),
            special_char_bytes: [false; 256],
            emph_delim_bytes: [false; 256],
        };
        for &b in b"\n\r_*`\\&<[]!" {
            s.special_char_bytes[b as usize] = true;
        }
        if options.extension.strikethrough {
            s.special_char_bytes[b'~' as usize] = true;
            s.emph_delim_bytes[b'~' as usize] = true;
        }
        if options.extension.highlight {
            s.special_char_bytes[b'=' as usize] = true;
            s.emph_delim_bytes[b'=' as usize] = true;
        }
        if options.extension.inline_math || options.extension.math_block {
            s.special_char_bytes[b'$' as usize] = true;
        }
        if options.extension.emoji || options.extension.autolink {
            s.special_char_bytes[b':' as usize] = true;
        }
        if options.extension.autolink {
            s.special_char_bytes[b'w' as usize] = true;
        }
        for &b in b"*_" {
            s.emph_delim_bytes[b as usize] = true;
        }
        s
    }

    fn make_inline(&self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena.alloc(Node::new(RefCell::new(Ast::inline(value))))
    }

    fn make_autolink(&self, url: &str, kind: AutolinkType) -> &'a AstNode<'a> {
        let inl = self.make_inline(NodeValue::Link(NodeLink {
            url: strings::clean_autolink(url, kind),
            title: String::new(),
        }));
        inl.append(self.make_inline(NodeValue::Text(entity::unescape_html(url))));
        inl
    }

    /// Consumes one construct at the cursor, appending the produced node to
    /// `node`. Returns `false` at end of input.
    pub fn parse_inline(&mut self, node: &'a AstNode<'a>) -> bool {
        let b = match self.peek_byte() {
            None => return false,
            Some(b) => b,
        };

        let new_inl: Option<&'a AstNode<'a>> = match ItemKind::of(b) {
            ItemKind::Newline => Some(self.handle_newline()),
            ItemKind::Backtick => Some(self.handle_backticks()),
            ItemKind::Backslash => Some(self.handle_backslash()),
            ItemKind::Ampersand => Some(self.handle_entity()),
            ItemKind::Less => Some(self.handle_pointy_brace()),
            ItemKind::Asterisk | ItemKind::Underscore => Some(self.handle_delim(b)),
            ItemKind::Tilde if self.options.extension.strikethrough => {
                Some(self.handle_delim(b))
            }
            ItemKind::Equal if self.options.extension.highlight => Some(self.handle_delim(b)),
            ItemKind::Dollar
                if self.options.extension.inline_math || self.options.extension.math_block =>
            {
                Some(self.handle_dollars())
            }
            ItemKind::OpenBracket => {
                self.pos += 1;
                let inl = self.make_inline(NodeValue::Text("[".to_string()));
                self.push_bracket(false, inl);
                self.within_brackets = true;
                Some(inl)
            }
            ItemKind::CloseBracket => {
                self.within_brackets = false;
                self.handle_close_bracket()
            }
            ItemKind::Bang => {
                self.pos += 1;
                if self.peek_byte() == Some(b'[') && self.peek_byte_n(1) != Some(b'^') {
                    self.pos += 1;
                    let inl = self.make_inline(NodeValue::Text("![".to_string()));
                    self.push_bracket(true, inl);
                    self.within_brackets = true;
                    Some(inl)
                } else {
                    Some(self.make_inline(NodeValue::Text("!".to_string())))
                }
            }
            ItemKind::Colon => {
                let mut res = None;
                if self.options.extension.autolink {
                    res = self.handle_autolink_with(node, autolink::url_match);
                }
                if res.is_none() && self.options.extension.emoji {
                    res = self.handle_emoji_colon();
                }
                if res.is_none() {
                    self.pos += 1;
                    res = Some(self.make_inline(NodeValue::Text(":".to_string())));
                }
                res
            }
            ItemKind::Letter if b == b'w' && self.options.extension.autolink => {
                match self.handle_autolink_with(node, autolink::www_match) {
                    Some(inl) => Some(inl),
                    None => {
                        self.pos += 1;
                        Some(self.make_inline(NodeValue::Text("w".to_string())))
                    }
                }
            }
            _ => {
                let endpos = self.find_special_char();
                let startpos = self.pos;
                self.pos = endpos;

                let mut contents = self.input[startpos..endpos].to_string();
                if self
                    .peek_byte()
                    .map_or(false, strings::is_line_end_char)
                {
                    strings::rtrim(&mut contents);
                }

                if !contents.is_empty() {
                    Some(self.make_inline(NodeValue::Text(contents)))
                } else {
                    None
                }
            }
        };

        if let Some(inl) = new_inl {
            node.append(inl);
        }

        true
    }

    fn handle_newline(&mut self) -> &'a AstNode<'a> {
        let nlpos = self.pos;
        if self.peek_byte() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'\n') {
            self.pos += 1;
        }

        let inl = if nlpos > 1
            && self.input.as_bytes()[nlpos - 1] == b' '
            && self.input.as_bytes()[nlpos - 2] == b' '
        {
            self.make_inline(NodeValue::LineBreak)
        } else {
            self.make_inline(NodeValue::SoftBreak)
        };
        self.skip_spaces();
        inl
    }

    fn handle_backticks(&mut self) -> &'a AstNode<'a> {
        let startpos = self.pos;
        let openticks = self.take_while(b'`');
        let endpos = self.scan_to_closing_backtick(openticks);

        match endpos {
            None => {
                self.pos = startpos + openticks;
                self.make_inline(NodeValue::Text("`".repeat(openticks)))
            }
            Some(endpos) => {
                let buf = &self.input[startpos + openticks..endpos - openticks];
                let buf = strings::normalize_code(buf);
                self.make_inline(NodeValue::Code(NodeCode {
                    num_backticks: openticks,
                    literal: buf,
                }))
            }
        }
    }

    fn scan_to_closing_backtick(&mut self, openticklength: usize) -> Option<usize> {
        if openticklength > MAXBACKTICKS {
            return None;
        }

        if self.scanned_for_backticks && self.backticks[openticklength] <= self.pos {
            return None;
        }

        loop {
            while self.peek_byte().map_or(false, |b| b != b'`') {
                self.pos += 1;
            }
            if self.pos >= self.input.len() {
                self.scanned_for_backticks = true;
                return None;
            }
            let numticks = self.take_while(b'`');
            if numticks <= MAXBACKTICKS {
                self.backticks[numticks] = self.pos - numticks;
            }
            if numticks == openticklength {
                return Some(self.pos);
            }
        }
    }

    fn handle_backslash(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;

        if self.peek_byte().map_or(false, ispunct) {
            self.pos += 1;
            let literal = self.input[self.pos - 1..self.pos].to_string();
            let inl = self.make_inline(NodeValue::Escaped);
            inl.append(self.make_inline(NodeValue::Text(literal)));
            inl
        } else if !self.eof() && self.skip_line_end() {
            let inl = self.make_inline(NodeValue::LineBreak);
            self.skip_spaces();
            inl
        } else {
            self.make_inline(NodeValue::Text("\\".to_string()))
        }
    }

    fn handle_entity(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;

        match entity::unescape(&self.input[self.pos..]) {
            None => self.make_inline(NodeValue::Text("&".to_string())),
            Some((resolved, len)) => {
                let origin = format!("&{}", &self.input[self.pos..self.pos + len]);
                self.pos += len;
                self.make_inline(NodeValue::HtmlEntity(NodeHtmlEntity { origin, resolved }))
            }
        }
    }

    fn handle_pointy_brace(&mut self) -> &'a AstNode<'a> {
        self.pos += 1;

        if let Some(matchlen) = scanners::autolink_uri(self.input[self.pos..].as_bytes()) {
            let inl = self.make_autolink(
                &self.input[self.pos..self.pos + matchlen - 1],
                AutolinkType::Uri,
            );
            self.pos += matchlen;
            return inl;
        }

        if let Some(matchlen) = scanners::autolink_email(self.input[self.pos..].as_bytes()) {
            let inl = self.make_autolink(
                &self.input[self.pos..self.pos + matchlen - 1],
                AutolinkType::Email,
            );
            self.pos += matchlen;
            return inl;
        }

        let mut matchlen: Option<usize> = None;

        if self.pos + 2 <= self.input.len() {
            let b = self.input.as_bytes()[self.pos];
            if b == b'!' && !self.flags.comment {
                let b2 = self.input.as_bytes()[self.pos + 1];
                if b2 == b'-' && self.peek_byte_n(2) == Some(b'-') {
                    if self.peek_byte_n(3) == Some(b'>') {
                        matchlen = Some(4);
                    } else if self.peek_byte_n(3) == Some(b'-') && self.peek_byte_n(4) == Some(b'>')
                    {
                        matchlen = Some(5);
                    } else if let Some(m) =
                        scanners::html_comment(self.input[self.pos + 3..].as_bytes())
                    {
                        matchlen = Some(m + 3);
                    } else {
                        self.flags.comment = true;
                    }
                } else if b2 == b'[' {
                    if !self.flags.cdata && self.input[self.pos..].starts_with("![CDATA[") {
                        if let Some(m) =
                            scanners::html_cdata(self.input[self.pos + 8..].as_bytes())
                        {
                            matchlen = Some(m + 8);
                        } else {
                            self.flags.cdata = true;
                        }
                    }
                } else if !self.flags.declaration {
                    if let Some(m) =
                        scanners::html_declaration(self.input[self.pos + 1..].as_bytes())
                    {
                        matchlen = Some(m + 1);
                    } else {
                        self.flags.declaration = true;
                    }
                }
            } else if b == b'?' {
                if !self.flags.pi {
                    if let Some(m) =
                        scanners::html_processing_instruction(self.input[self.pos + 1..].as_bytes())
                    {
                        matchlen = Some(m + 1);
                    } else {
                        self.flags.pi = true;
                    }
                }
            } else {
                matchlen = scanners::html_tag(self.input[self.pos..].as_bytes());
            }
        }

        if let Some(matchlen) = matchlen {
            let contents = self.input[self.pos - 1..self.pos + matchlen].to_string();
            self.pos += matchlen;
            return self.make_inline(NodeValue::HtmlInline(contents));
        }

        self.make_inline(NodeValue::Text("<".to_string()))
    }

    fn handle_autolink_with(
        &mut self,
        node: &'a AstNode<'a>,
        f: fn(&mut Subject<'a, '_, '_, '_>) -> Option<(&'a AstNode<'a>, usize, usize)>,
    ) -> Option<&'a AstNode<'a>> {
        if self.within_brackets {
            return None;
        }
        let (post, need_reverse, skip) = f(self)?;

        self.pos += skip - need_reverse;

        // The scheme (or "www") characters preceding the trigger byte were
        // already emitted as Text; pull them back off the tail of the tree.
        let mut reverse = need_reverse;
        while reverse > 0 {
            let last_child = node.last_child().unwrap();
            let mut ast = last_child.data.borrow_mut();
            let prev = match ast.value.text_mut() {
                Some(t) => t,
                None => return None,
            };
            let prev_len = prev.len();
            if reverse < prev_len {
                prev.truncate(prev_len - reverse);
                reverse = 0;
            } else {
                reverse -= prev_len;
                drop(ast);
                last_child.detach();
            }
        }

        Some(post)
    }

    fn handle_emoji_colon(&mut self) -> Option<&'a AstNode<'a>> {
        let alias_len = scanners::emoji_alias(self.input[self.pos + 1..].as_bytes())?;
        let alias = self.input[self.pos + 1..self.pos + 1 + alias_len].to_string();
        let resolved = emoji::resolve(&alias, &self.options.extension.emoji_aliases);
        resolved.as_ref()?;

        self.pos += alias_len + 2;
        Some(self.make_inline(NodeValue::Emoji(crate::nodes::NodeEmoji {
            alias,
            resolved,
        })))
    }

    // Inline math per the dollar heuristics: no space just inside a single
    // `$` pair, closer not followed by a digit, `\$` escapes inside.
    fn handle_dollars(&mut self) -> &'a AstNode<'a> {
        let startpos = self.pos;
        let opendollars = self.take_while_with_limit(b'$', MAX_MATH_DOLLARS);

        if opendollars == 1 && !self.options.extension.inline_math {
            return self.make_inline(NodeValue::Text("$".to_string()));
        }

        let endpos = self
            .scan_to_closing_dollar(opendollars)
            .filter(|endpos| endpos - startpos >= opendollars * 2 + 1);

        match endpos {
            Some(endpos) => {
                let buf = &self.input[startpos + opendollars..endpos - opendollars];
                let buf = if opendollars == 1 {
                    strings::normalize_code(buf)
                } else {
                    buf.to_string()
                };
                self.make_inline(NodeValue::Math(NodeMath {
                    display: opendollars == 2,
                    literal: buf,
                }))
            }
            None => {
                self.pos = startpos + opendollars;
                self.make_inline(NodeValue::Text("$".repeat(opendollars)))
            }
        }
    }

    fn scan_to_closing_dollar(&mut self, opendollarlength: usize) -> Option<usize> {
        if opendollarlength == 1 && self.peek_byte().map_or(false, isspace) {
            return None;
        }

        loop {
            while self.peek_byte().map_or(false, |b| b != b'$') {
                self.pos += 1;
            }

            if self.pos >= self.input.len() {
                return None;
            }

            let c = self.input.as_bytes()[self.pos - 1];

            if opendollarlength == 1 && isspace(c) {
                return None;
            }

            if opendollarlength == 1 && c == b'\\' {
                self.pos += 1;
                continue;
            }

            let numdollars = self.take_while_with_limit(b'$', opendollarlength);

            if opendollarlength == 1 && self.peek_byte().map_or(false, isdigit) {
                return None;
            }

            if numdollars == opendollarlength {
                return Some(self.pos);
            }
        }
    }

    fn handle_delim(&mut self, b: u8) -> &'a AstNode<'a> {
        let (numdelims, can_open, can_close) = self.scan_delims(b);

        let contents = self.input[self.pos - numdelims..self.pos].to_string();
        let inl = self.make_inline(NodeValue::Text(contents));

        let run_length_acceptable = match b {
            b'~' => numdelims <= 2,
            b'=' => numdelims == 2,
            _ => true,
        };

        if (can_open || can_close) && run_length_acceptable {
            self.push_delimiter(b, can_open, can_close, inl);
        }

        inl
    }

    fn char_ending_at(&self, pos: usize) -> char {
        if pos == 0 {
            return '\n';
        }
        let bytes = self.input.as_bytes();
        let mut start = pos - 1;
        while start > 0 && bytes[start] >> 6 == 0b10 {
            start -= 1;
        }
        self.input[start..pos].chars().next().unwrap_or('\n')
    }

    fn char_starting_at(&self, pos: usize) -> char {
        if pos >= self.input.len() {
            return '\n';
        }
        self.input[pos..].chars().next().unwrap_or('\n')
    }

    fn scan_delims(&mut self, b: u8) -> (usize, bool, bool) {
        let before_char = self.char_ending_at(self.pos);

        let mut numdelims = 0;
        while self.peek_byte() == Some(b) {
            numdelims += 1;
            self.pos += 1;
        }

        let after_char = self.char_starting_at(self.pos);

        let is_punct = |c: char| {
            if (c as u32) < 128 {
                ispunct(c as u8)
            } else {
                c.is_punctuation() || c.is_symbol()
            }
        };

        let left_flanking = numdelims > 0
            && !after_char.is_whitespace()
            && (!is_punct(after_char)
                || before_char.is_whitespace()
                || is_punct(before_char));
        let right_flanking = numdelims > 0
            && !before_char.is_whitespace()
            && (!is_punct(before_char)
                || after_char.is_whitespace()
                || is_punct(after_char));

        if b == b'_' {
            (
                numdelims,
                left_flanking && (!right_flanking || is_punct(before_char)),
                right_flanking && (!left_flanking || is_punct(after_char)),
            )
        } else {
            (numdelims, left_flanking, right_flanking)
        }
    }

    fn push_delimiter(&mut self, b: u8, can_open: bool, can_close: bool, inl: &'a AstNode<'a>) {
        let length = inl.data.borrow().value.text().unwrap().len();
        let d = self.delimiter_arena.alloc(Delimiter {
            prev: Cell::new(self.last_delimiter),
            next: Cell::new(None),
            inl,
            position: self.pos,
            length,
            delim_byte: b,
            can_open,
            can_close,
        });
        if let Some(last) = self.last_delimiter {
            last.next.set(Some(d));
        }
        self.last_delimiter = Some(d);
    }

    /// Resolves the delimiter stack above `stack_bottom` into emphasis-family
    /// nodes: walk closers bottom-up, search down for a matching opener,
    /// honouring the mod-three "odd match" restriction, with a per-kind
    /// openers-bottom lower bound keeping the whole thing linear.
    pub fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom: [usize; 9] = [stack_bottom; 9];

        let mut candidate = self.last_delimiter;
        let mut closer: Option<&Delimiter> = None;
        while candidate.map_or(false, |c| c.position >= stack_bottom) {
            closer = candidate;
            candidate = candidate.unwrap().prev.get();
        }

        while let Some(c) = closer {
            if c.can_close {
                let mut opener = c.prev.get();
                let mut opener_found = false;
                let mut mod_three_rule_invoked = false;

                let ix = match c.delim_byte {
                    b'~' => 0,
                    b'=' => 1,
                    b'_' => 2,
                    b'*' => 3 + (if c.can_open { 3 } else { 0 }) + (c.length % 3),
                    _ => unreachable!(),
                };

                while opener.map_or(false, |o| o.position >= openers_bottom[ix]) {
                    let o = opener.unwrap();
                    if o.can_open && o.delim_byte == c.delim_byte {
                        // Mod-three restriction on runs that can both open
                        // and close, per the CommonMark emphasis appendix.
                        let odd_match = (c.can_open || o.can_close)
                            && ((o.length + c.length) % 3 == 0)
                            && !(o.length % 3 == 0 && c.length % 3 == 0);
                        if !odd_match {
                            opener_found = true;
                            break;
                        } else {
                            mod_three_rule_invoked = true;
                        }
                    }
                    opener = o.prev.get();
                }

                let old_c = c;

                if self.emph_delim_bytes[c.delim_byte as usize] {
                    if opener_found {
                        closer = self.insert_emph(opener.unwrap(), c);
                    } else {
                        closer = c.next.get();
                    }
                }

                if !opener_found {
                    if !mod_three_rule_invoked {
                        openers_bottom[ix] = old_c.position;
                    }
                    if !old_c.can_open {
                        self.remove_delimiter(old_c);
                    }
                }
            } else {
                closer = c.next.get();
            }
        }

        self.remove_delimiters(stack_bottom);
    }

    fn remove_delimiter(&mut self, delimiter: &'d Delimiter<'a, 'd>) {
        if let Some(next) = delimiter.next.get() {
            next.prev.set(delimiter.prev.get());
        } else {
            assert!(Some(delimiter) == self.last_delimiter);
            self.last_delimiter = delimiter.prev.get();
        }
        if let Some(prev) = delimiter.prev.get() {
            prev.next.set(delimiter.next.get());
        }
    }

    fn remove_delimiters(&mut self, stack_bottom: usize) {
        while let Some(last) = self.last_delimiter {
            if last.position < stack_bottom {
                break;
            }
            self.remove_delimiter(last);
        }
    }

    // Builds the wrapper node for one matched opener/closer pair. The
    // consumed delimiter text becomes the wrapper's framing Marker children;
    // longer runs are truncated in place and handed back for re-matching.
    fn insert_emph(
        &mut self,
        opener: &'d Delimiter<'a, 'd>,
        closer: &'d Delimiter<'a, 'd>,
    ) -> Option<&'d Delimiter<'a, 'd>> {
        let opener_byte = opener.inl.data.borrow().value.text().unwrap().as_bytes()[0];
        let mut opener_num_bytes = opener.inl.data.borrow().value.text().unwrap().len();
        let mut closer_num_bytes = closer.inl.data.borrow().value.text().unwrap().len();
        let use_delims = if closer_num_bytes >= 2 && opener_num_bytes >= 2 {
            2
        } else {
            1
        };

        opener_num_bytes -= use_delims;
        closer_num_bytes -= use_delims;

        // Strikethrough only matches a whole run against an equal whole run.
        if opener_byte == b'~' && (opener_num_bytes != closer_num_bytes || opener_num_bytes > 0) {
            return None;
        }

        opener
            .inl
            .data
            .borrow_mut()
            .value
            .text_mut()
            .unwrap()
            .truncate(opener_num_bytes);
        closer
            .inl
            .data
            .borrow_mut()
            .value
            .text_mut()
            .unwrap()
            .truncate(closer_num_bytes);

        let mut prev = closer.prev.get();
        while let Some(delim) = prev {
            if delim == opener {
                break;
            }
            self.remove_delimiter(delim);
            prev = delim.prev.get();
        }

        let value = match opener_byte {
            b'~' => NodeValue::Strikethrough,
            b'=' => NodeValue::Highlight,
            _ if use_delims == 1 => NodeValue::Emph,
            _ => NodeValue::Strong,
        };
        let emph = self.make_inline(value);
        let marker = (opener_byte as char).to_string().repeat(use_delims);
        emph.append(self.make_inline(NodeValue::Marker(marker.clone())));

        let mut it = opener.inl.next_sibling().unwrap();
        while !it.same_node(closer.inl) {
            let next = it.next_sibling();
            emph.append(it);
            match next {
                Some(n) => it = n,
                None => break,
            }
        }

        emph.append(self.make_inline(NodeValue::Marker(marker)));
        opener.inl.insert_after(emph);

        if opener_num_bytes == 0 {
            opener.inl.detach();
            self.remove_delimiter(opener);
        }

        if closer_num_bytes == 0 {
            closer.inl.detach();
            self.remove_delimiter(closer);
            closer.next.get()
        } else {
            Some(closer)
        }
    }

    fn push_bracket(&mut self, image: bool, inl_text: &'a AstNode<'a>) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl_text,
            position: self.pos,
            image,
            bracket_after: false,
        });
        if !image {
            self.no_link_openers = false;
        }
    }

    fn handle_close_bracket(&mut self) -> Option<&'a AstNode<'a>> {
        self.pos += 1;
        let initial_pos = self.pos;

        let last = match self.brackets.last() {
            Some(l) => l,
            None => {
                return Some(self.make_inline(NodeValue::Text("]".to_string())));
            }
        };

        let is_image = last.image;

        if !is_image && self.no_link_openers {
            self.brackets.pop();
            return Some(self.make_inline(NodeValue::Text("]".to_string())));
        }

        let after_link_text_pos = self.pos;

        // Inline form: `](dest "title")`.
        if self.peek_byte() == Some(b'(') {
            let sps = scanners::spacechars(self.input[self.pos + 1..].as_bytes()).unwrap_or(0);
            let offset = self.pos + 1 + sps;
            if offset < self.input.len() {
                if let Some((url, n)) = manual_scan_link_url(&self.input[offset..]) {
                    let url = url.to_string();
                    let starturl = offset;
                    let endurl = starturl + n;
                    let starttitle = endurl
                        + scanners::spacechars(self.input[endurl..].as_bytes()).unwrap_or(0);
                    let endtitle = if starttitle == endurl {
                        starttitle
                    } else {
                        starttitle
                            + scanners::link_title(self.input[starttitle..].as_bytes())
                                .unwrap_or(0)
                    };
                    let endall = endtitle
                        + scanners::spacechars(self.input[endtitle..].as_bytes()).unwrap_or(0);

                    if endall < self.input.len() && self.input.as_bytes()[endall] == b')' {
                        self.pos = endall + 1;
                        let url = strings::clean_url(&url);
                        let title =
                            strings::clean_title(&self.input[starttitle..endtitle]);
                        self.close_bracket_match(is_image, url, title);
                        return None;
                    } else {
                        self.pos = after_link_text_pos;
                    }
                }
            }
        }

        // Reference forms: full `[label]`, else collapsed/shortcut.
        let (mut lab, mut found_label) = match self.link_label() {
            Some(lab) => (lab, true),
            None => (String::new(), false),
        };

        if !found_label {
            self.pos = initial_pos;
        }

        let last = self.brackets.last().unwrap();
        if (!found_label || lab.is_empty()) && !last.bracket_after {
            lab = self.input[last.position..initial_pos - 1].to_string();
            found_label = true;
        }

        let normalized_lab = strings::normalize_label(&lab, Case::Fold);
        let reff = if found_label {
            self.refmap.lookup(&normalized_lab).cloned()
        } else {
            None
        };

        if let Some(reff) = reff {
            self.close_bracket_match(is_image, reff.url, reff.title);
            return None;
        }

        // Footnote reference: `[^name]`.
        let bracket_inl_text = self.brackets.last().unwrap().inl_text;
        if self.options.extension.footnotes
            && bracket_inl_text.next_sibling().map_or(false, |n| {
                n.data
                    .borrow()
                    .value
                    .text()
                    .map_or(false, |t| t.starts_with('^'))
            })
        {
            let mut text = String::new();
            let mut usable = true;
            let mut sibling_iterator = bracket_inl_text.following_siblings();
            sibling_iterator.next().unwrap();
            for sibling in sibling_iterator {
                match sibling.data.borrow().value {
                    NodeValue::Text(ref literal) | NodeValue::HtmlInline(ref literal) => {
                        text.push_str(literal);
                    }
                    _ => {
                        usable = false;
                        break;
                    }
                }
            }

            if usable && text.len() > 1 {
                self.pos = initial_pos;
                let inl = self.make_inline(NodeValue::FootnoteReference(NodeFootnoteReference {
                    name: text[1..].to_string(),
                    ref_num: 0,
                    ix: 0,
                }));
                bracket_inl_text.insert_before(inl);

                let mut sibling_iterator = bracket_inl_text.following_siblings();
                for sibling in sibling_iterator.by_ref() {
                    match sibling.data.borrow().value {
                        NodeValue::Text(_) | NodeValue::HtmlInline(_) => sibling.detach(),
                        _ => {}
                    }
                }

                let position = self.brackets.last().unwrap().position;
                self.remove_delimiters(position);
                self.brackets.pop();
                return None;
            }
        }

        self.brackets.pop();
        self.pos = initial_pos;
        Some(self.make_inline(NodeValue::Text("]".to_string())))
    }

    fn close_bracket_match(&mut self, is_image: bool, url: String, title: String) {
        let last = self.brackets.pop().unwrap();

        let nl = NodeLink { url, title };
        let inl = self.make_inline(if is_image {
            NodeValue::Image(nl)
        } else {
            NodeValue::Link(nl)
        });

        last.inl_text.insert_before(inl);
        let mut itm = last.inl_text.next_sibling();
        while let Some(it) = itm {
            itm = it.next_sibling();
            inl.append(it);
        }
        last.inl_text.detach();
        self.process_emphasis(last.position);

        if !is_image {
            // No links inside links: every earlier link opener dies here.
            self.no_link_openers = true;
        }
    }

    pub fn clear_brackets(&mut self) {
        self.brackets.clear();
    }

    /// Scans a `[label]` at the cursor, returning the trimmed label text and
    /// leaving the cursor after the `]` on success.
    pub fn link_label(&mut self) -> Option<String> {
        let startpos = self.pos;

        if self.peek_byte() != Some(b'[') {
            return None;
        }
        self.pos += 1;

        let mut length = 0;
        while let Some(b) = self.peek_byte() {
            if b == b']' {
                let raw_label =
                    strings::trim_slice(&self.input[startpos + 1..self.pos]).to_string();
                self.pos += 1;
                return Some(raw_label);
            }
            if b == b'[' {
                break;
            }
            if b == b'\\' {
                self.pos += 1;
                length += 1;
                if self.peek_byte().map_or(false, ispunct) {
                    self.pos += 1;
                    length += 1;
                }
            } else {
                self.pos += 1;
                length += 1;
            }
            if length > MAX_LINK_LABEL_LENGTH {
                break;
            }
        }

        self.pos = startpos;
        None
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.peek_byte_n(0)
    }

    #[inline]
    pub fn peek_byte_n(&self, n: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + n).copied()
    }

    pub fn spnl(&mut self) {
        self.skip_spaces();
        if self.skip_line_end() {
            self.skip_spaces();
        }
    }

    pub fn skip_spaces(&mut self) -> bool {
        let mut skipped = false;
        while self
            .peek_byte()
            .map_or(false, |b| b == b' ' || b == b'\t')
        {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    pub fn skip_line_end(&mut self) -> bool {
        let old_pos = self.pos;
        if self.peek_byte() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'\n') {
            self.pos += 1;
        }
        self.pos > old_pos || self.eof()
    }

    fn take_while(&mut self, b: u8) -> usize {
        let start_pos = self.pos;
        while self.peek_byte() == Some(b) {
            self.pos += 1;
        }
        self.pos - start_pos
    }

    fn take_while_with_limit(&mut self, b: u8, limit: usize) -> usize {
        let start_pos = self.pos;
        let mut count = 0;
        while count < limit && self.peek_byte() == Some(b) {
            self.pos += 1;
            count += 1;
        }
        self.pos - start_pos
    }

    fn find_special_char(&self) -> usize {
        let bytes = &self.input.as_bytes()[self.pos..];
        let index = bytes
            .iter()
            .position(|&b| self.special_char_bytes[b as usize])
            .unwrap_or(bytes.len());
        self.pos + index
    }
}

/// Scans a link destination: either `<…>` (no unescaped `<`, `>` or
/// newlines) or a run of non-space bytes with balanced parentheses. Returns
/// the destination text and bytes consumed.
pub(crate) fn manual_scan_link_url(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    let len = input.len();
    let mut i = 0;

    if i < len && bytes[i] == b'<' {
        i += 1;
        while i < len {
            let b = bytes[i];
            if b == b'>' {
                i += 1;
                break;
            } else if b == b'\\' {
                i += 2;
            } else if b == b'\n' || b == b'\r' || b == b'<' {
                return None;
            } else {
                i += 1;
            }
        }
    } else {
        return manual_scan_link_url_2(input);
    }

    if i >= len {
        None
    } else {
        Some((&input[1..i - 1], i))
    }
}

pub(crate) fn manual_scan_link_url_2(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    let len = input.len();
    let mut i = 0;
    let mut nb_p = 0;

    while i < len {
        if bytes[i] == b'\\' && i + 1 < len && ispunct(bytes[i + 1]) {
            i += 2;
        } else if bytes[i] == b'(' {
            nb_p += 1;
            i += 1;
            if nb_p > 32 {
                return None;
            }
        } else if bytes[i] == b')' {
            if nb_p == 0 {
                break;
            }
            nb_p -= 1;
            i += 1;
        } else if isspace(bytes[i]) || bytes[i].is_ascii_control() {
            if i == 0 {
                return None;
            }
            break;
        } else {
            i += 1;
        }
    }

    if len == 0 || nb_p != 0 {
        None
    } else {
        Some((&input[..i], i))
    }
}
