//! Small string utilities shared across the parser and renderers.

use crate::ctype::{ispunct, isspace};
use crate::entity;
use crate::parser::AutolinkType;

/// The caret sentinel an editor embeds in source text to mark the cursor.
/// It travels through the pipeline as ordinary text; the editor renderers
/// turn it into `<wbr>` on output and the DOM converter turns `<wbr>` back.
pub const CARET: &str = "\u{2038}";

/// Zero-width space used to pad otherwise-empty editor spans.
pub const ZWSP: &str = "\u{200b}";

pub fn is_line_end_char(ch: u8) -> bool {
    matches!(ch, b'\n' | b'\r')
}

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t')
}

pub fn is_blank(s: &[u8]) -> bool {
    for &c in s {
        match c {
            b'\n' | b'\r' => return true,
            b' ' | b'\t' => (),
            _ => return false,
        }
    }
    true
}

pub fn ltrim(s: &mut String) {
    let count = s.bytes().take_while(|&b| isspace(b)).count();
    if count > 0 {
        s.drain(..count);
    }
}

pub fn rtrim(s: &mut String) {
    let new_len = s
        .as_bytes()
        .iter()
        .rposition(|&b| !isspace(b))
        .map_or(0, |p| p + 1);
    s.truncate(new_len);
}

pub fn trim(s: &mut String) {
    ltrim(s);
    rtrim(s);
}

pub fn trim_slice(mut s: &str) -> &str {
    while !s.is_empty() && isspace(s.as_bytes()[0]) {
        s = &s[1..];
    }
    while !s.is_empty() && isspace(s.as_bytes()[s.len() - 1]) {
        s = &s[..s.len() - 1];
    }
    s
}

pub fn rtrim_slice(mut s: &str) -> &str {
    while !s.is_empty() && isspace(s.as_bytes()[s.len() - 1]) {
        s = &s[..s.len() - 1];
    }
    s
}

/// Removes trailing whitespace-only lines, leaving no trailing newline.
pub fn remove_trailing_blank_lines(line: &mut String) {
    let bytes = line.as_bytes();
    let mut i = match bytes
        .iter()
        .rposition(|&c| c != b' ' && c != b'\t' && !is_line_end_char(c))
    {
        Some(i) => i,
        None => {
            line.clear();
            return;
        }
    };

    while i < line.len() {
        if is_line_end_char(line.as_bytes()[i]) {
            line.truncate(i);
            break;
        }
        i += 1;
    }
}

/// Strips a closing run of `#`s from an ATX heading line, per spec only when
/// preceded by a space or making up the whole text.
pub fn chop_trailing_hashtags(line: &mut String) {
    rtrim(line);
    if line.is_empty() {
        return;
    }

    let orig_n = line.len() - 1;
    let mut n = orig_n;
    while line.as_bytes()[n] == b'#' {
        if n == 0 {
            return;
        }
        n -= 1;
    }

    if n != orig_n && is_space_or_tab(line.as_bytes()[n]) {
        line.truncate(n);
        rtrim(line);
    }
}

/// Removes backslashes that escape ASCII punctuation.
pub fn unescape(s: &mut String) {
    let mut r = 0;
    let mut sz = s.len();
    while r < sz {
        if s.as_bytes()[r] == b'\\' && r + 1 < sz && ispunct(s.as_bytes()[r + 1]) {
            s.remove(r);
            sz -= 1;
        }
        if r >= sz {
            break;
        }
        r += 1;
    }
}

pub fn clean_url(url: &str) -> String {
    let url = trim_slice(url);
    if url.is_empty() {
        return String::new();
    }

    let mut b = if url.as_bytes()[0] == b'<' && url.as_bytes()[url.len() - 1] == b'>' {
        entity::unescape_html(&url[1..url.len() - 1])
    } else {
        entity::unescape_html(url)
    };

    unescape(&mut b);
    b
}

pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let first = title.as_bytes()[0];
    let last = title.as_bytes()[title.len() - 1];

    let mut b = if (first == b'\'' && last == b'\'')
        || (first == b'(' && last == b')')
        || (first == b'"' && last == b'"')
    {
        entity::unescape_html(&title[1..title.len() - 1])
    } else {
        entity::unescape_html(title)
    };

    unescape(&mut b);
    b
}

pub fn clean_autolink(url: &str, kind: AutolinkType) -> String {
    let url = trim_slice(url);
    if url.is_empty() {
        return String::new();
    }

    let mut buf = String::with_capacity(url.len() + 7);
    if kind == AutolinkType::Email {
        buf.push_str("mailto:");
    }
    buf.push_str(&entity::unescape_html(url));
    buf
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    /// Unicode case fold, for reference-label matching.
    Fold,
    Preserve,
}

/// Normalises a link or footnote label: trim, collapse internal whitespace,
/// and optionally case-fold.
pub fn normalize_label(label: &str, case: Case) -> String {
    let label = trim_slice(label);
    let mut v = String::with_capacity(label.len());
    let mut last_was_whitespace = false;
    for c in label.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                last_was_whitespace = true;
                v.push(' ');
            }
        } else {
            last_was_whitespace = false;
            match case {
                Case::Preserve => v.push(c),
                Case::Fold => v.extend(caseless::default_case_fold_str(&c.to_string()).chars()),
            }
        }
    }
    v
}

/// Normalises an inline code span: newlines fold to spaces, and one leading
/// plus one trailing space is stripped iff the content has both and isn't all
/// spaces.
pub fn normalize_code(s: &str) -> String {
    let mut code = String::with_capacity(s.len());
    let mut i = 0;
    let bytes = s.as_bytes();
    let mut contains_nonspace = false;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if i + 1 == bytes.len() || bytes[i + 1] != b'\n' {
                    code.push(' ');
                }
            }
            b'\n' => {
                code.push(' ');
            }
            c => {
                code.push(c as char);
                if c != b' ' {
                    contains_nonspace = true;
                }
            }
        }
        i += 1;
    }

    if contains_nonspace
        && !code.is_empty()
        && code.as_bytes()[0] == b' '
        && code.as_bytes()[code.len() - 1] == b' '
    {
        code.remove(0);
        code.pop();
    }

    code
}

/// Splits YAML front matter off the start of the document, returning
/// `(front_matter_including_delimiters, rest)`. The opening `---` must be
/// the very first line.
pub fn split_off_front_matter(s: &str) -> Option<(&str, &str)> {
    let stripped = s.strip_prefix("---")?;
    // The delimiter must make up the entire first line.
    let after_open = match stripped.find('\n') {
        Some(ix) if trim_slice(&stripped[..ix]).is_empty() || stripped[..ix].trim_end() == CARET => {
            ix + 1
        }
        _ => return None,
    };

    let pos = 3 + after_open;
    let body = &s[pos..];

    let mut line_start = 0;
    loop {
        let line_end = match body[line_start..].find('\n') {
            Some(ix) => line_start + ix + 1,
            None => return None,
        };
        let line = trim_slice(&body[line_start..line_end]);
        if line == "---" {
            return Some((&s[..pos + line_end], &s[pos + line_end..]));
        }
        line_start = line_end;
    }
}

/// Content of a front-matter block with the `---` delimiter lines removed.
pub fn front_matter_content(fm: &str) -> &str {
    let mut s = fm;
    if let Some(rest) = s.strip_prefix("---") {
        s = rest;
    }
    if let Some(ix) = s.find('\n') {
        s = &s[ix + 1..];
    }
    let trimmed = rtrim_slice(s);
    trimmed
        .strip_suffix("---")
        .map(rtrim_slice)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_normalisation_folds_and_collapses() {
        assert_eq!(normalize_label("  Foo \t Bar ", Case::Fold), "foo bar");
        assert_eq!(normalize_label("ẞ", Case::Fold), normalize_label("ss", Case::Fold));
    }

    #[test]
    fn code_normalisation() {
        assert_eq!(normalize_code(" a b "), "a b");
        assert_eq!(normalize_code("  "), "  ");
        assert_eq!(normalize_code("a\nb"), "a b");
    }

    #[test]
    fn front_matter_splitting() {
        let (fm, rest) = split_off_front_matter("---\ntitle: x\n---\nbody\n").unwrap();
        assert_eq!(fm, "---\ntitle: x\n---\n");
        assert_eq!(rest, "body\n");
        assert_eq!(front_matter_content(fm), "title: x");
        assert!(split_off_front_matter("--- not a fence\nx\n").is_none());
        assert!(split_off_front_matter("---\nunl closed\n").is_none());
    }

    #[test]
    fn hashtag_chopping() {
        let mut s = "heading ###".to_string();
        chop_trailing_hashtags(&mut s);
        assert_eq!(s, "heading");
        let mut s = "heading#".to_string();
        chop_trailing_hashtags(&mut s);
        assert_eq!(s, "heading#");
    }
}
