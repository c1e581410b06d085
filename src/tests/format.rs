use super::{roundtrip, roundtrip_opts};
use crate::{markdown_to_commonmark, Options};

#[test]
fn canonical_output_samples() {
    let options = Options::default();
    assert_eq!(markdown_to_commonmark("# Hi\n", &options), "# Hi\n");
    assert_eq!(markdown_to_commonmark("Title\n=====\n", &options), "# Title\n");
    assert_eq!(markdown_to_commonmark("*em*\n", &options), "*em*\n");
    assert_eq!(
        markdown_to_commonmark("hello  there\n", &options),
        "hello  there\n"
    );
    assert_eq!(markdown_to_commonmark("> q\n", &options), "> q\n");
    assert_eq!(markdown_to_commonmark("- a\n- b\n", &options), "- a\n- b\n");
}

#[test]
fn roundtrips_core() {
    roundtrip("plain text\n");
    roundtrip("*em* **strong** `code`\n");
    roundtrip("# Heading\n\nbody\n");
    roundtrip("> quoted\n>\n> more\n");
    roundtrip("- a\n- b\n\ntail\n");
    roundtrip("1. one\n2. two\n");
    roundtrip("a  \nhard break\n");
    roundtrip("```go\nfmt.Println(1)\n```\n");
    roundtrip("    indented code\n");
    roundtrip("---\n");
    roundtrip("[a](http://x \"t\") and ![i](/p.png)\n");
    roundtrip("<https://auto.example>\n");
    roundtrip("text with \\*escapes\\* and &amp; entity\n");
}

#[test]
fn roundtrips_extensions() {
    roundtrip_opts("| a | b |\n| --- | :-: |\n| 1 | 2 |\n", |o| {
        o.extension.table = true
    });
    roundtrip_opts("- [x] done\n- [ ] todo\n", |o| o.extension.tasklist = true);
    roundtrip_opts("~~gone~~\n", |o| o.extension.strikethrough = true);
    roundtrip_opts("==marked==\n", |o| o.extension.highlight = true);
    roundtrip_opts("$x+y$ and $$z$$\n", |o| {
        o.extension.inline_math = true;
        o.extension.math_block = true;
    });
    roundtrip_opts("$$\nx = 1\n$$\n", |o| o.extension.math_block = true);
    roundtrip_opts(":heart:\n", |o| o.extension.emoji = true);
    roundtrip_opts("Hi[^1].\n\n[^1]: World\n", |o| o.extension.footnotes = true);
    roundtrip_opts("---\ntitle: x\n---\n\nHi\n", |o| {
        o.extension.front_matter = true
    });
    roundtrip_opts("[toc]\n\n# A\n", |o| o.extension.toc = true);
}

#[test]
fn strikethrough_and_highlight_markers_survive() {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.highlight = true;
    assert_eq!(
        markdown_to_commonmark("a ~~b~~ ==c==\n", &options),
        "a ~~b~~ ==c==\n"
    );
}
