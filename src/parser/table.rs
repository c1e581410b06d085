//! GFM table recognition. A finalised paragraph whose second line is a
//! delimiter row matching the header's cell count is rebuilt in place as a
//! Table node with row and cell children; remaining paragraph lines become
//! body rows.

use std::cell::RefCell;

use typed_arena::Arena;

use crate::arena::Node;
use crate::nodes::{Ast, AstNode, NodeTable, NodeValue, TableAlignment};
use crate::strings;

pub(crate) fn try_convert_paragraph<'a>(
    arena: &'a Arena<AstNode<'a>>,
    node: &'a AstNode<'a>,
    ast: &mut Ast,
) -> bool {
    let (alignments, header, body_rows) = {
        let lines: Vec<&str> = ast.content.split('\n').collect();
        if lines.len() < 2 {
            return false;
        }

        if !contains_unescaped_pipe(lines[0]) {
            return false;
        }
        let header = split_cells(lines[0]);
        let alignments = match delimiter_row(lines[1]) {
            Some(a) => a,
            None => return false,
        };
        if header.len() != alignments.len() {
            return false;
        }

        let body_rows: Vec<Vec<String>> = lines[2..]
            .iter()
            .filter(|l| !strings::is_blank(l.as_bytes()))
            .map(|l| split_cells(l))
            .collect();

        (alignments, header, body_rows)
    };

    let columns = alignments.len();
    ast.value = NodeValue::Table(NodeTable { alignments });
    ast.content.clear();

    append_row(arena, node, true, header, columns);
    for cells in body_rows {
        append_row(arena, node, false, cells, columns);
    }

    true
}

fn append_row<'a>(
    arena: &'a Arena<AstNode<'a>>,
    table: &'a AstNode<'a>,
    header: bool,
    mut cells: Vec<String>,
    columns: usize,
) {
    cells.truncate(columns);
    while cells.len() < columns {
        cells.push(String::new());
    }

    let row = make_closed(arena, NodeValue::TableRow(header), String::new());
    for cell in cells {
        row.append(make_closed(arena, NodeValue::TableCell, cell));
    }
    table.append(row);
}

fn make_closed<'a>(
    arena: &'a Arena<AstNode<'a>>,
    value: NodeValue,
    content: String,
) -> &'a AstNode<'a> {
    let mut ast = Ast::new(value);
    ast.content = content;
    ast.open = false;
    arena.alloc(Node::new(RefCell::new(ast)))
}

fn contains_unescaped_pipe(line: &str) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => return true,
            _ => i += 1,
        }
    }
    false
}

/// Splits a row into trimmed cell texts. `\|` stays a literal pipe; a
/// leading pipe and a trailing unescaped pipe delimit rather than produce
/// empty cells.
fn split_cells(line: &str) -> Vec<String> {
    let line = strings::trim_slice(line);
    let mut cells = vec![];
    let mut cur = String::new();
    let mut chars = line.chars().peekable();
    let mut trailing_pipe = false;

    if let Some(&'|') = chars.peek() {
        chars.next();
    }

    while let Some(c) = chars.next() {
        trailing_pipe = false;
        match c {
            '\\' => match chars.peek() {
                Some(&'|') => {
                    cur.push('|');
                    chars.next();
                }
                _ => cur.push('\\'),
            },
            '|' => {
                cells.push(strings::trim_slice(&cur).to_string());
                cur.clear();
                trailing_pipe = true;
            }
            c => cur.push(c),
        }
    }
    if !trailing_pipe || !strings::trim_slice(&cur).is_empty() {
        cells.push(strings::trim_slice(&cur).to_string());
    }

    cells
}

fn delimiter_row(line: &str) -> Option<Vec<TableAlignment>> {
    if !contains_unescaped_pipe(line) {
        return None;
    }

    let mut alignments = vec![];
    for cell in split_cells(line) {
        let bytes = cell.as_bytes();
        if bytes.is_empty() {
            return None;
        }
        let left = bytes[0] == b':';
        let right = bytes[bytes.len() - 1] == b':';
        let dashes = &bytes[if left { 1 } else { 0 }..bytes.len() - if right { 1 } else { 0 }];
        if dashes.is_empty() || dashes.iter().any(|&b| b != b'-') {
            return None;
        }
        alignments.push(match (left, right) {
            (true, true) => TableAlignment::Center,
            (true, false) => TableAlignment::Left,
            (false, true) => TableAlignment::Right,
            (false, false) => TableAlignment::None,
        });
    }

    if alignments.is_empty() {
        None
    } else {
        Some(alignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_splitting() {
        assert_eq!(split_cells("|a|b|"), vec!["a", "b"]);
        assert_eq!(split_cells("a | b"), vec!["a", "b"]);
        assert_eq!(split_cells("a \\| b | c"), vec!["a | b", "c"]);
        assert_eq!(split_cells("|a||b|"), vec!["a", "", "b"]);
    }

    #[test]
    fn delimiter_rows() {
        assert_eq!(
            delimiter_row("|:-|-:|:-:|-|"),
            Some(vec![
                TableAlignment::Left,
                TableAlignment::Right,
                TableAlignment::Center,
                TableAlignment::None,
            ])
        );
        assert_eq!(delimiter_row("| a |"), None);
        assert_eq!(delimiter_row("---"), None);
    }
}
