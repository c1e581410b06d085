//! GFM bare autolinks: `www.` prefixes and `http(s)`/`ftp` schemes are
//! caught during the inline scan; emails get a post-pass over finished Text
//! nodes because nothing marks their start.

use std::cell::RefCell;

use typed_arena::Arena;

use crate::arena::Node;
use crate::ctype::{isalnum, isalpha, isspace};
use crate::node_matches;
use crate::nodes::{Ast, AstNode, NodeLink, NodeValue};
use crate::parser::inlines::Subject;

fn make_inline<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> &'a AstNode<'a> {
    arena.alloc(Node::new(RefCell::new(Ast::inline(value))))
}

fn is_boundary_before(data: &[u8], pos: usize) -> bool {
    pos == 0 || {
        let b = data[pos - 1];
        isspace(b) || matches!(b, b'*' | b'_' | b'~' | b'(')
    }
}

/// A plausible hostname: dot-separated alphanumeric/`-`/`_` labels, with
/// underscores disallowed in the final two.
fn check_domain(data: &[u8]) -> Option<usize> {
    let mut np = 0;
    let mut uscore1 = 0;
    let mut uscore2 = 0;
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        if b == b'_' {
            uscore2 += 1;
        } else if b == b'.' {
            uscore1 = uscore2;
            uscore2 = 0;
            np += 1;
        } else if !isalnum(b) && b != b'-' {
            break;
        }
        i += 1;
    }

    if uscore1 > 0 || uscore2 > 0 {
        None
    } else if i > 0 && np > 0 {
        Some(i)
    } else {
        None
    }
}

/// Extends a link past the domain and trims the trailing characters GFM
/// excludes: sentence punctuation, an unmatched `)`, a `;` that terminates
/// an entity-looking tail.
fn autolink_end(data: &[u8], mut link_end: usize) -> usize {
    while link_end < data.len() && !isspace(data[link_end]) && data[link_end] != b'<' {
        link_end += 1;
    }

    loop {
        if link_end == 0 {
            break;
        }
        let b = data[link_end - 1];
        match b {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => link_end -= 1,
            b')' => {
                let mut open = 0;
                let mut close = 0;
                for &c in &data[..link_end] {
                    if c == b'(' {
                        open += 1;
                    } else if c == b')' {
                        close += 1;
                    }
                }
                if close > open {
                    link_end -= 1;
                } else {
                    break;
                }
            }
            b';' => {
                // An `&xyz;` tail is an entity reference, not link text.
                let mut ptr = link_end - 1;
                while ptr > 0 && isalpha(data[ptr - 1]) {
                    ptr -= 1;
                }
                if ptr > 0 && data[ptr - 1] == b'&' {
                    link_end = ptr - 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    link_end
}

/// Called with the cursor on the `w` of a candidate `www.` link. Returns
/// `(link node, bytes to rewind, bytes consumed from the trigger)`.
pub(crate) fn www_match<'a>(
    subj: &mut Subject<'a, '_, '_, '_>,
) -> Option<(&'a AstNode<'a>, usize, usize)> {
    let data = subj.input.as_bytes();
    let pos = subj.pos;

    if !is_boundary_before(data, pos) {
        return None;
    }
    if !data[pos..].starts_with(b"www.") {
        return None;
    }

    check_domain(&data[pos + 4..])?;
    let link_end = autolink_end(&data[pos..], 4);
    if link_end <= 4 {
        return None;
    }

    let text = &subj.input[pos..pos + link_end];
    let inl = make_inline(
        subj.arena,
        NodeValue::Link(NodeLink {
            url: format!("http://{}", text),
            title: String::new(),
        }),
    );
    inl.append(make_inline(subj.arena, NodeValue::Text(text.to_string())));

    Some((inl, 0, link_end))
}

/// Called with the cursor on the `:` of a candidate `scheme://` link.
pub(crate) fn url_match<'a>(
    subj: &mut Subject<'a, '_, '_, '_>,
) -> Option<(&'a AstNode<'a>, usize, usize)> {
    const SCHEMES: [&str; 3] = ["http", "https", "ftp"];

    let data = subj.input.as_bytes();
    let pos = subj.pos;

    if data.len() < pos + 3 || !data[pos..].starts_with(b"://") {
        return None;
    }

    let mut rewind = 0;
    while rewind < pos && isalpha(data[pos - rewind - 1]) {
        rewind += 1;
    }
    if rewind == 0 || !is_boundary_before(data, pos - rewind) {
        return None;
    }

    let scheme = &subj.input[pos - rewind..pos];
    if !SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
        return None;
    }

    let domain_len = check_domain(&data[pos + 3..])?;
    let link_end = autolink_end(&data[pos - rewind..], rewind + 3 + domain_len);

    let text = &subj.input[pos - rewind..pos - rewind + link_end];
    let inl = make_inline(
        subj.arena,
        NodeValue::Link(NodeLink {
            url: text.to_string(),
            title: String::new(),
        }),
    );
    inl.append(make_inline(subj.arena, NodeValue::Text(text.to_string())));

    Some((inl, rewind, link_end))
}

/// Post-pass turning bare emails in Text nodes into mailto links. Runs on
/// the finished tree so it can skip link interiors.
pub(crate) fn process_email_autolinks<'a>(
    arena: &'a Arena<AstNode<'a>>,
    node: &'a AstNode<'a>,
) {
    if node_matches!(node, NodeValue::Link(..) | NodeValue::Image(..)) {
        return;
    }

    let is_text = node_matches!(node, NodeValue::Text(..));
    if is_text {
        split_email_in_text(arena, node);
        return;
    }

    let mut ch = node.first_child();
    while let Some(n) = ch {
        ch = n.next_sibling();
        process_email_autolinks(arena, n);
    }
}

fn split_email_in_text<'a>(arena: &'a Arena<AstNode<'a>>, node: &'a AstNode<'a>) {
    let text = match node.data.borrow().value {
        NodeValue::Text(ref t) => t.clone(),
        _ => return,
    };

    if let Some((start, len)) = scan_email(text.as_bytes()) {
        let email = text[start..start + len].to_string();
        let link = make_inline(
            arena,
            NodeValue::Link(NodeLink {
                url: format!("mailto:{}", email),
                title: String::new(),
            }),
        );
        link.append(make_inline(arena, NodeValue::Text(email)));

        node.data.borrow_mut().value = NodeValue::Text(text[..start].to_string());
        node.insert_after(link);
        if start + len < text.len() {
            let rest = make_inline(arena, NodeValue::Text(text[start + len..].to_string()));
            link.insert_after(rest);
            // The remainder may hold another address.
            split_email_in_text(arena, rest);
        }
        if start == 0 {
            node.detach();
        }
    }
}

fn scan_email(data: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'@' && i > 0 {
            // local part
            let mut start = i;
            while start > 0 {
                let b = data[start - 1];
                if isalnum(b) || b".+-_".contains(&b) {
                    start -= 1;
                } else {
                    break;
                }
            }
            if start == i || !is_boundary_before(data, start) {
                i += 1;
                continue;
            }

            // domain: labels of alnum/-, at least one dot, not ending with
            // punctuation
            let mut end = i + 1;
            let mut np = 0;
            while end < data.len() {
                let b = data[end];
                if b == b'.' {
                    np += 1;
                    end += 1;
                } else if isalnum(b) || b == b'-' || b == b'_' {
                    end += 1;
                } else {
                    break;
                }
            }
            while end > i + 1 && matches!(data[end - 1], b'.' | b'-' | b'_') {
                end -= 1;
            }
            if np == 0 || end <= i + 1 {
                i += 1;
                continue;
            }

            return Some((start, end - start));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains() {
        assert_eq!(check_domain(b"example.com/x"), Some(11));
        assert_eq!(check_domain(b"nodots"), None);
        assert_eq!(check_domain(b"under_score.com"), None);
    }

    #[test]
    fn emails() {
        assert_eq!(scan_email(b"mail me at a.b@c.example now"), Some((11, 13)));
        assert_eq!(scan_email(b"not@nodomain"), None);
        assert_eq!(scan_email(b"@host.com"), None);
    }
}
