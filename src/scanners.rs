//! Hand-written recognisers for line prefixes and inline constructs. Each
//! takes a byte slice positioned at the candidate construct and returns how
//! many bytes matched (`None` for no match), so callers can advance their
//! own offsets.

use crate::ctype::{isalnum, isalpha, isdigit, isspace};
use crate::strings::is_line_end_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetextChar {
    Equals,
    Hyphen,
}

/// A run of `=` or `-` with nothing but trailing spaces: a setext underline.
pub fn setext_heading_line(line: &[u8]) -> Option<SetextChar> {
    if line.is_empty() || (line[0] != b'=' && line[0] != b'-') {
        return None;
    }
    let c = line[0];
    let mut i = 0;
    while i < line.len() && line[i] == c {
        i += 1;
    }
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    if i < line.len() && !is_line_end_char(line[i]) {
        return None;
    }
    Some(if c == b'=' {
        SetextChar::Equals
    } else {
        SetextChar::Hyphen
    })
}

/// `#{1,6}` followed by spacing or end of line. Returns the number of bytes
/// making up the marker, including one following space.
pub fn atx_heading_start(line: &[u8]) -> Option<usize> {
    if line.is_empty() || line[0] != b'#' {
        return None;
    }
    let mut hashes = 0;
    while hashes < line.len() && line[hashes] == b'#' {
        hashes += 1;
    }
    if hashes > 6 {
        return None;
    }
    if hashes < line.len() && !isspace(line[hashes]) {
        return None;
    }
    if hashes < line.len() && (line[hashes] == b' ' || line[hashes] == b'\t') {
        Some(hashes + 1)
    } else {
        Some(hashes)
    }
}

/// An opening code fence: three or more backticks or tildes. A backtick
/// fence's info string may not contain a backtick. Returns the fence length.
pub fn open_code_fence(line: &[u8]) -> Option<usize> {
    if line.is_empty() || (line[0] != b'`' && line[0] != b'~') {
        return None;
    }
    let c = line[0];
    let mut len = 0;
    while len < line.len() && line[len] == c {
        len += 1;
    }
    if len < 3 {
        return None;
    }
    if c == b'`' && line[len..].iter().take_while(|&&b| !is_line_end_char(b)).any(|&b| b == b'`') {
        return None;
    }
    Some(len)
}

/// A closing fence: a long-enough run of the fence character followed only
/// by spaces. Returns the run length.
pub fn close_code_fence(line: &[u8]) -> Option<usize> {
    if line.is_empty() || (line[0] != b'`' && line[0] != b'~') {
        return None;
    }
    let c = line[0];
    let mut len = 0;
    while len < line.len() && line[len] == c {
        len += 1;
    }
    if len < 3 {
        return None;
    }
    let mut i = len;
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    if i < line.len() && !is_line_end_char(line[i]) {
        return None;
    }
    Some(len)
}

/// A `$$` math fence with nothing else on the line.
pub fn math_fence(line: &[u8]) -> Option<usize> {
    if line.len() < 2 || line[0] != b'$' || line[1] != b'$' {
        return None;
    }
    let mut i = 2;
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    if i < line.len() && !is_line_end_char(line[i]) {
        return None;
    }
    Some(2)
}

/// Tag names that open an HTML block of type 6.
const BLOCK_TAG_NAMES: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section", "source",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

fn starts_with_ignore_case(line: &[u8], prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// HTML block types 1 through 6, given a line starting at `<`. Returns the
/// block type.
pub fn html_block_start(line: &[u8]) -> Option<u8> {
    if line.is_empty() || line[0] != b'<' {
        return None;
    }

    for tag in &["<script", "<pre", "<style", "<textarea"] {
        if starts_with_ignore_case(line, tag) {
            let rest = &line[tag.len()..];
            if rest.is_empty() || isspace(rest[0]) || rest[0] == b'>' {
                return Some(1);
            }
        }
    }

    if line.starts_with(b"<!--") {
        return Some(2);
    }
    if line.starts_with(b"<?") {
        return Some(3);
    }
    if line.starts_with(b"<![CDATA[") {
        return Some(5);
    }
    if line.len() > 2 && line[1] == b'!' && line[2].is_ascii_uppercase() {
        return Some(4);
    }

    let name_start = if line.len() > 1 && line[1] == b'/' { 2 } else { 1 };
    let mut name_end = name_start;
    while name_end < line.len() && (isalnum(line[name_end]) || line[name_end] == b'-') {
        name_end += 1;
    }
    if name_end > name_start {
        let name = &line[name_start..name_end];
        let known = BLOCK_TAG_NAMES
            .iter()
            .any(|t| name.eq_ignore_ascii_case(t.as_bytes()));
        if known {
            let rest = &line[name_end..];
            if rest.is_empty()
                || isspace(rest[0])
                || rest[0] == b'>'
                || (rest[0] == b'/' && rest.len() > 1 && rest[1] == b'>')
            {
                return Some(6);
            }
        }
    }

    None
}

/// HTML block type 7: a complete open or close tag with only trailing
/// whitespace on the line.
pub fn html_block_start_7(line: &[u8]) -> Option<u8> {
    if line.is_empty() || line[0] != b'<' {
        return None;
    }
    let matched = html_tag(&line[1..])?;
    let mut i = 1 + matched;
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    if i < line.len() && !is_line_end_char(line[i]) {
        return None;
    }
    Some(7)
}

fn contains_ignore_case(line: &[u8], needle: &str) -> bool {
    if line.len() < needle.len() {
        return false;
    }
    (0..=line.len() - needle.len())
        .any(|i| line[i..i + needle.len()].eq_ignore_ascii_case(needle.as_bytes()))
}

pub fn html_block_end_1(line: &[u8]) -> bool {
    contains_ignore_case(line, "</script>")
        || contains_ignore_case(line, "</pre>")
        || contains_ignore_case(line, "</style>")
        || contains_ignore_case(line, "</textarea>")
}

pub fn html_block_end_2(line: &[u8]) -> bool {
    line.windows(3).any(|w| w == b"-->")
}

pub fn html_block_end_3(line: &[u8]) -> bool {
    line.windows(2).any(|w| w == b"?>")
}

pub fn html_block_end_4(line: &[u8]) -> bool {
    line.contains(&b'>')
}

pub fn html_block_end_5(line: &[u8]) -> bool {
    line.windows(3).any(|w| w == b"]]>")
}

fn scan_attribute(s: &[u8], mut i: usize) -> Option<usize> {
    // name
    if i >= s.len() || (!isalpha(s[i]) && s[i] != b'_' && s[i] != b':') {
        return None;
    }
    i += 1;
    while i < s.len()
        && (isalnum(s[i]) || s[i] == b'_' || s[i] == b'.' || s[i] == b':' || s[i] == b'-')
    {
        i += 1;
    }

    // optional = value
    let mut j = i;
    while j < s.len() && isspace(s[j]) {
        j += 1;
    }
    if j >= s.len() || s[j] != b'=' {
        return Some(i);
    }
    j += 1;
    while j < s.len() && isspace(s[j]) {
        j += 1;
    }
    if j >= s.len() {
        return None;
    }

    match s[j] {
        b'\'' | b'"' => {
            let quote = s[j];
            j += 1;
            while j < s.len() && s[j] != quote {
                j += 1;
            }
            if j >= s.len() {
                return None;
            }
            Some(j + 1)
        }
        _ => {
            let start = j;
            while j < s.len()
                && !isspace(s[j])
                && !matches!(s[j], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                j += 1;
            }
            if j == start {
                None
            } else {
                Some(j)
            }
        }
    }
}

/// A complete open or close tag, starting *after* the `<`. The returned
/// length includes the closing `>`.
pub fn html_tag(s: &[u8]) -> Option<usize> {
    if s.is_empty() {
        return None;
    }

    if s[0] == b'/' {
        // close tag
        let mut i = 1;
        if i >= s.len() || !isalpha(s[i]) {
            return None;
        }
        i += 1;
        while i < s.len() && (isalnum(s[i]) || s[i] == b'-') {
            i += 1;
        }
        while i < s.len() && isspace(s[i]) {
            i += 1;
        }
        if i < s.len() && s[i] == b'>' {
            return Some(i + 1);
        }
        return None;
    }

    if !isalpha(s[0]) {
        return None;
    }
    let mut i = 1;
    while i < s.len() && (isalnum(s[i]) || s[i] == b'-') {
        i += 1;
    }

    loop {
        let mut j = i;
        while j < s.len() && isspace(s[j]) {
            j += 1;
        }
        if j == i {
            break;
        }
        match scan_attribute(s, j) {
            Some(end) => i = end,
            None => {
                i = j;
                break;
            }
        }
    }

    if i < s.len() && s[i] == b'/' {
        i += 1;
    }
    if i < s.len() && s[i] == b'>' {
        Some(i + 1)
    } else {
        None
    }
}

/// An HTML comment body, starting after `<!--`. The returned length includes
/// the closing `-->`.
pub fn html_comment(s: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 2 < s.len() {
        if s[i] == b'-' && s[i + 1] == b'-' && s[i + 2] == b'>' {
            return Some(i + 3);
        }
        i += 1;
    }
    None
}

/// A CDATA section body, starting after `<![CDATA[`; length includes `]]>`.
pub fn html_cdata(s: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 2 < s.len() {
        if s[i] == b']' && s[i + 1] == b']' && s[i + 2] == b'>' {
            return Some(i + 3);
        }
        i += 1;
    }
    None
}

/// A declaration body, starting after `<!`; length includes the `>`.
pub fn html_declaration(s: &[u8]) -> Option<usize> {
    if s.is_empty() || !s[0].is_ascii_uppercase() {
        return None;
    }
    let mut i = 1;
    while i < s.len() {
        if s[i] == b'>' {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// A processing-instruction body, starting after `<?`; length includes `?>`.
pub fn html_processing_instruction(s: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < s.len() {
        if s[i] == b'?' && s[i + 1] == b'>' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

/// A `<scheme:…>` autolink, starting after the `<`; length includes the
/// closing `>`.
pub fn autolink_uri(s: &[u8]) -> Option<usize> {
    if s.is_empty() || !isalpha(s[0]) {
        return None;
    }
    let mut i = 1;
    while i < s.len() && (isalnum(s[i]) || s[i] == b'+' || s[i] == b'.' || s[i] == b'-') {
        i += 1;
    }
    if !(2..=32).contains(&i) || i >= s.len() || s[i] != b':' {
        return None;
    }
    i += 1;
    while i < s.len() {
        match s[i] {
            b'>' => return Some(i + 1),
            b'<' => return None,
            c if isspace(c) || c.is_ascii_control() => return None,
            _ => i += 1,
        }
    }
    None
}

/// An `<addr@host>` autolink, starting after the `<`; length includes the
/// closing `>`.
pub fn autolink_email(s: &[u8]) -> Option<usize> {
    let atext =
        |c: u8| isalnum(c) || b".!#$%&'*+/=?^_`{|}~-".contains(&c);

    let mut i = 0;
    while i < s.len() && atext(s[i]) {
        i += 1;
    }
    if i == 0 || i >= s.len() || s[i] != b'@' {
        return None;
    }
    i += 1;

    loop {
        let label_start = i;
        if i >= s.len() || !isalnum(s[i]) {
            return None;
        }
        while i < s.len() && (isalnum(s[i]) || s[i] == b'-') {
            i += 1;
        }
        if i - label_start > 63 || s[i - 1] == b'-' {
            return None;
        }
        if i < s.len() && s[i] == b'.' {
            i += 1;
            continue;
        }
        break;
    }

    if i < s.len() && s[i] == b'>' {
        Some(i + 1)
    } else {
        None
    }
}

/// A link title delimited by `"…"`, `'…'` or `(…)`, with backslash escapes.
/// Returns the full delimited length.
pub fn link_title(s: &[u8]) -> Option<usize> {
    if s.len() < 2 {
        return None;
    }
    let (open, close) = match s[0] {
        b'"' => (b'"', b'"'),
        b'\'' => (b'\'', b'\''),
        b'(' => (b'(', b')'),
        _ => return None,
    };
    let mut i = 1;
    while i < s.len() {
        let c = s[i];
        if c == b'\\' && i + 1 < s.len() {
            i += 2;
            continue;
        }
        if c == close {
            return Some(i + 1);
        }
        if c == open && open != close {
            return None;
        }
        i += 1;
    }
    None
}

/// A run of spaces, tabs and newlines. `None` when empty.
pub fn spacechars(s: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < s.len() && isspace(s[i]) {
        i += 1;
    }
    if i > 0 {
        Some(i)
    } else {
        None
    }
}

/// A footnote definition marker `[^label]:`, returning bytes consumed
/// including trailing spaces.
pub fn footnote_definition(line: &[u8]) -> Option<usize> {
    if line.len() < 5 || line[0] != b'[' || line[1] != b'^' {
        return None;
    }
    let mut i = 2;
    while i < line.len() && line[i] != b']' {
        if is_line_end_char(line[i]) || line[i] == b'[' {
            return None;
        }
        i += 1;
    }
    if i == 2 || i + 1 >= line.len() || line[i + 1] != b':' {
        return None;
    }
    i += 2;
    while i < line.len() && line[i] == b' ' {
        i += 1;
    }
    Some(i)
}

/// A task-list marker `[ ]`, `[x]` or `[X]` followed by whitespace, at the
/// start of item text. Returns `(bytes consumed, state byte)`.
pub fn tasklist(s: &[u8]) -> Option<(usize, u8)> {
    if s.len() < 4 || s[0] != b'[' || s[2] != b']' {
        return None;
    }
    let symbol = s[1];
    if !matches!(symbol, b' ' | b'x' | b'X') {
        return None;
    }
    if !isspace(s[3]) {
        return None;
    }
    let mut i = 4;
    while i < s.len() && (s[i] == b' ' || s[i] == b'\t') {
        i += 1;
    }
    Some((i, symbol))
}

/// A kramdown attribute list making up a whole line: `{: …}` plus trailing
/// whitespace. Returns the length of the `{: …}` part.
pub fn block_attributes(line: &[u8]) -> Option<usize> {
    if line.len() < 3 || line[0] != b'{' || line[1] != b':' {
        return None;
    }
    let mut i = 2;
    while i < line.len() && line[i] != b'}' {
        if is_line_end_char(line[i]) {
            return None;
        }
        i += 1;
    }
    if i >= line.len() {
        return None;
    }
    let end = i + 1;
    let mut j = end;
    while j < line.len() && (line[j] == b' ' || line[j] == b'\t') {
        j += 1;
    }
    if j < line.len() && !is_line_end_char(line[j]) {
        return None;
    }
    Some(end)
}

/// Schemes whose links are dropped by renderers unless raw output is
/// explicitly allowed.
pub fn dangerous_url(url: &[u8]) -> bool {
    for scheme in &["javascript:", "vbscript:", "file:"] {
        if starts_with_ignore_case(url, scheme) {
            return true;
        }
    }
    if starts_with_ignore_case(url, "data:") {
        for ok in &["data:image/png", "data:image/gif", "data:image/jpeg", "data:image/webp"] {
            if starts_with_ignore_case(url, ok) {
                return false;
            }
        }
        return true;
    }
    false
}

/// An `:alias:` emoji body, starting after the opening colon. Returns the
/// alias length (excluding both colons).
pub fn emoji_alias(s: &[u8]) -> Option<usize> {
    let ok = |c: u8| isalnum(c) || c == b'_' || c == b'+' || c == b'-';
    let mut i = 0;
    while i < s.len() && i <= 36 && ok(s[i]) {
        i += 1;
    }
    if i == 0 || i >= s.len() || s[i] != b':' {
        return None;
    }
    Some(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences() {
        assert_eq!(open_code_fence(b"```go\n"), Some(3));
        assert_eq!(open_code_fence(b"``` a`b\n"), None);
        assert_eq!(open_code_fence(b"~~~~\n"), Some(4));
        assert_eq!(close_code_fence(b"```  \n"), Some(3));
        assert_eq!(close_code_fence(b"``` x\n"), None);
    }

    #[test]
    fn html_blocks() {
        assert_eq!(html_block_start(b"<script src=x>\n"), Some(1));
        assert_eq!(html_block_start(b"<!-- c -->\n"), Some(2));
        assert_eq!(html_block_start(b"<?php\n"), Some(3));
        assert_eq!(html_block_start(b"<!DOCTYPE html>\n"), Some(4));
        assert_eq!(html_block_start(b"<![CDATA[x\n"), Some(5));
        assert_eq!(html_block_start(b"<div class=a>\n"), Some(6));
        assert_eq!(html_block_start(b"</table>\n"), Some(6));
        assert_eq!(html_block_start(b"<span>\n"), None);
        assert_eq!(html_block_start_7(b"<span class=\"x\">\n"), Some(7));
        assert_eq!(html_block_start_7(b"<span> text\n"), None);
    }

    #[test]
    fn autolinks() {
        assert_eq!(autolink_uri(b"https://x.example>"), Some(18));
        assert_eq!(autolink_uri(b"https://x y>"), None);
        assert_eq!(autolink_email(b"a@b.example>"), Some(12));
    }

    #[test]
    fn misc() {
        assert_eq!(link_title(b"\"a \\\" b\" x"), Some(8));
        assert_eq!(footnote_definition(b"[^a]: x\n"), Some(6));
        assert_eq!(tasklist(b"[x] done\n"), Some((4, b'x')));
        assert_eq!(block_attributes(b"{: id=\"x\"}  \n"), Some(10));
        assert!(dangerous_url(b"javascript:alert(1)"));
        assert!(!dangerous_url(b"data:image/png;base64,x"));
        assert_eq!(emoji_alias(b"smile: x"), Some(5));
    }
}
