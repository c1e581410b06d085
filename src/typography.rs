//! Text post-passes for CJK-heavy documents: spacing at Han/Latin
//! boundaries, full-width punctuation after Han text, and canonical casing
//! for well-known technology names. All of them rewrite Text leaves only;
//! code, math and raw HTML carry their content in payloads and are never
//! touched.

use crate::nodes::{AstNode, NodeValue};
use crate::parser::Options;
use crate::strings::CARET;

pub(crate) fn process_document<'a>(root: &'a AstNode<'a>, options: &Options) {
    let ext = &options.extension;
    if !ext.auto_space && !ext.fix_term_typo && !ext.chinese_punct {
        return;
    }

    for node in root.descendants() {
        let mut ast = node.data.borrow_mut();
        if let NodeValue::Text(ref mut text) = ast.value {
            if ext.fix_term_typo {
                *text = fix_term_typo(text);
            }
            if ext.chinese_punct {
                *text = chinese_punct(text);
            }
            if ext.auto_space {
                *text = auto_space(text);
            }
        }
    }
}

fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}'
            | '\u{3400}'..='\u{4dbf}'
            | '\u{f900}'..='\u{faff}'
            | '\u{20000}'..='\u{2a6df}'
    )
}

fn caret_char() -> char {
    CARET.chars().next().unwrap()
}

/// Inserts a space between Han and Latin runs. The `ing` suffix straight
/// after a Han character stays attached, and nothing is inserted around the
/// editor caret.
pub fn auto_space(text: &str) -> String {
    let runes: Vec<char> = text.chars().collect();
    let mut ret = String::with_capacity(text.len() + text.len() / 8);
    let mut i = 0;

    while i < runes.len() {
        let r = runes[i];
        if i + 3 < runes.len()
            && runes[i + 1] == 'i'
            && runes[i + 2] == 'n'
            && runes[i + 3] == 'g'
            && is_han(r)
        {
            ret.push(r);
            ret.push_str("ing");
            i += 4;
            continue;
        }
        push_with_boundary_space(&mut ret, r);
        i += 1;
    }

    ret
}

fn push_with_boundary_space(prefix: &mut String, next_char: char) {
    let current_char = match prefix.chars().next_back() {
        Some(c) => c,
        None => {
            prefix.push(next_char);
            return;
        }
    };

    // A keycap emoji is digit + U+FE0F; no space inside it.
    if current_char.is_ascii_digit() && next_char == '\u{fe0f}' {
        prefix.push(next_char);
        return;
    }

    if allow_space(current_char, next_char) {
        prefix.push(' ');
    }
    prefix.push(next_char);
}

fn allow_space(current_char: char, next_char: char) -> bool {
    if current_char.is_whitespace()
        || next_char.is_whitespace()
        || current_char == caret_char()
        || next_char == caret_char()
        || current_char.is_control()
        || next_char.is_control()
    {
        return false;
    }

    let wide_punct =
        |c: char| c != '%' && (c.is_ascii_punctuation() || !c.is_ascii() && !is_han(c) && !c.is_alphanumeric());

    let current_is_han = is_han(current_char);
    let next_is_han = is_han(next_char);

    if current_is_han && wide_punct(next_char) {
        return false;
    }
    if next_is_han && wide_punct(current_char) {
        return false;
    }

    current_is_han != next_is_han
}

/// ASCII sentence punctuation directly after a Han character becomes its
/// full-width form.
pub fn chinese_punct(text: &str) -> String {
    let runes: Vec<char> = text.chars().collect();
    let mut ret = String::with_capacity(text.len());

    for (i, &r) in runes.iter().enumerate() {
        let prev_han = i > 0 && is_han(runes[i - 1]);
        // Leave periods that look like decimal points or file extensions.
        let next_ascii_alnum = runes.get(i + 1).map_or(false, |c| c.is_ascii_alphanumeric());

        let converted = if prev_han && !next_ascii_alnum {
            match r {
                ',' => Some('，'),
                '.' => Some('。'),
                '!' => Some('！'),
                '?' => Some('？'),
                ':' => Some('：'),
                ';' => Some('；'),
                _ => None,
            }
        } else {
            None
        };

        match converted {
            Some(c) => ret.push(c),
            None => ret.push(r),
        }
    }

    // Successive full-width stops collapse to one.
    let mut collapsed = String::with_capacity(ret.len());
    let mut prev = '\0';
    for c in ret.chars() {
        if c == '。' && prev == '。' {
            continue;
        }
        collapsed.push(c);
        prev = c;
    }

    collapsed
}

const TERMS: [(&str, &str); 18] = [
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("nodejs", "Node.js"),
    ("npm", "NPM"),
    ("mysql", "MySQL"),
    ("postgresql", "PostgreSQL"),
    ("sqlite", "SQLite"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("nginx", "NGINX"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("linux", "Linux"),
    ("macos", "macOS"),
    ("wifi", "Wi-Fi"),
    ("ios", "iOS"),
];

/// Rewrites well-known technology names to their canonical casing when they
/// stand alone as words.
pub fn fix_term_typo(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut ret = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphabetic() {
            // Skip over multi-byte sequences untouched.
            let ch_len = text[i..].chars().next().map_or(1, |c| c.len_utf8());
            ret.push_str(&text[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
            i += 1;
        }
        let word = &text[start..i];
        let lower = word.to_ascii_lowercase();
        match TERMS.iter().find(|(t, _)| *t == lower) {
            Some((_, canonical)) => ret.push_str(canonical),
            None => ret.push_str(word),
        }
    }

    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_at_han_latin_boundaries() {
        assert_eq!(auto_space("中文English混排"), "中文 English 混排");
        assert_eq!(auto_space("版本2.0发布"), "版本 2.0 发布");
    }

    #[test]
    fn ing_suffix_stays_attached() {
        assert_eq!(auto_space("打码ing"), "打码ing");
        assert_eq!(auto_space("打码ing中"), "打码ing 中");
    }

    #[test]
    fn no_space_next_to_caret() {
        let input = format!("中{}abc", CARET);
        assert_eq!(auto_space(&input), input);
    }

    #[test]
    fn punct_conversion() {
        assert_eq!(chinese_punct("你好,世界!"), "你好，世界！");
        assert_eq!(chinese_punct("版本3.14保持"), "版本3.14保持");
        assert_eq!(chinese_punct("结束。。"), "结束。");
    }

    #[test]
    fn term_fixing() {
        assert_eq!(fix_term_typo("host on github today"), "host on GitHub today");
        assert_eq!(fix_term_typo("mygithub"), "mygithub");
    }
}
