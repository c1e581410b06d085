use ntest::timeout;

use crate::{markdown_to_html, Options};

// Worst-case inputs for the delimiter and bracket machinery; the
// openers-bottom bound and the backtick cache keep these linear-ish.

#[test]
#[timeout(4000)]
fn nested_emphasis_candidates() {
    let input = "*a **a ".repeat(2000);
    let output = markdown_to_html(&input, &Options::default());
    assert!(output.starts_with("<p>"));
}

#[test]
#[timeout(4000)]
fn many_open_brackets() {
    let input = "[".repeat(10_000);
    let output = markdown_to_html(&input, &Options::default());
    assert!(output.contains('['));
}

#[test]
#[timeout(4000)]
fn unclosed_backtick_runs() {
    let mut input = String::new();
    for i in 0..500 {
        input.push_str(&"`".repeat(i % 70 + 1));
        input.push_str("x ");
    }
    let output = markdown_to_html(&input, &Options::default());
    assert!(output.starts_with("<p>"));
}

#[test]
#[timeout(4000)]
fn deeply_nested_quotes() {
    let input = format!("{}a\n", "> ".repeat(500));
    let output = markdown_to_html(&input, &Options::default());
    assert!(output.contains("<blockquote>"));
}

#[test]
#[timeout(4000)]
fn long_table_rows() {
    let mut options = Options::default();
    options.extension.table = true;
    let input = format!(
        "|{}\n|{}\n",
        "a|".repeat(500),
        "-|".repeat(500)
    );
    let output = markdown_to_html(&input, &options);
    assert!(output.contains("<table>"));
}
