use crate::{
    fragment_to_markdown, markdown_to_html, markdown_to_instant_render, markdown_to_split_view,
    markdown_to_wysiwyg, Options, CARET,
};

/// Rendering to an editor DOM and converting back must preserve meaning:
/// the recovered Markdown renders the same HTML as the original.
#[track_caller]
fn dom_roundtrip<F>(md: &str, render: fn(&str, &Options) -> String, opts: F)
where
    F: Fn(&mut Options),
{
    let mut options = Options::default();
    opts(&mut options);
    let dom = render(md, &options);
    let back = fragment_to_markdown(&dom, &options).unwrap();
    pretty_assertions::assert_eq!(
        markdown_to_html(&back, &options),
        markdown_to_html(md, &options),
        "dom: {:?}\nrecovered: {:?}",
        dom,
        back
    );
}

#[test]
fn plain_fragments_convert() {
    let options = Options::default();
    assert_eq!(
        fragment_to_markdown("<h2>Hello</h2>", &options).unwrap(),
        "## Hello\n"
    );
    assert_eq!(
        fragment_to_markdown("<p>Some <em>em</em> text</p>", &options).unwrap(),
        "Some *em* text\n"
    );
    assert_eq!(
        fragment_to_markdown("<blockquote><p>q</p></blockquote>", &options).unwrap(),
        "> q\n"
    );
}

#[test]
fn wysiwyg_roundtrips() {
    let all = |o: &mut Options| *o = Options::editor();
    dom_roundtrip("# Title\n\nSome *em* and `code`.\n", markdown_to_wysiwyg, all);
    dom_roundtrip("> quoted\n", markdown_to_wysiwyg, all);
    dom_roundtrip("- a\n- b\n", markdown_to_wysiwyg, all);
    dom_roundtrip("- [x] done\n- [ ] todo\n", markdown_to_wysiwyg, all);
    dom_roundtrip("| a | b |\n| --- | --- |\n| 1 | 2 |\n", markdown_to_wysiwyg, all);
    dom_roundtrip("```go\nf()\n```\n", markdown_to_wysiwyg, all);
    dom_roundtrip("$$\nx+y\n$$\n", markdown_to_wysiwyg, all);
    dom_roundtrip("~~s~~ and ==m==\n", markdown_to_wysiwyg, all);
    dom_roundtrip("[a](http://x \"t\")\n", markdown_to_wysiwyg, all);
}

#[test]
fn instant_render_roundtrips() {
    let all = |o: &mut Options| *o = Options::editor();
    dom_roundtrip("# Hi\n", markdown_to_instant_render, all);
    dom_roundtrip("*a* and **b**\n", markdown_to_instant_render, all);
    dom_roundtrip("`code` span\n", markdown_to_instant_render, all);
    dom_roundtrip("$e=mc^2$\n", markdown_to_instant_render, all);
}

#[test]
fn split_view_roundtrips() {
    let all = |o: &mut Options| *o = Options::editor();
    dom_roundtrip("# Hi\n\npara *em*\n", markdown_to_split_view, all);
    dom_roundtrip("> quote\n", markdown_to_split_view, all);
    dom_roundtrip("- item one\n- item two\n", markdown_to_split_view, all);
    dom_roundtrip("```\ncode\n```\n", markdown_to_split_view, all);
}

#[test]
fn caret_position_survives_the_editor_loop() {
    let options = Options::editor();
    let md = format!("before {}after\n", CARET);
    let dom = markdown_to_split_view(&md, &options);
    assert!(dom.contains("<wbr>"));
    let back = fragment_to_markdown(&dom, &options).unwrap();
    assert_eq!(back, md);
}

#[test]
fn unknown_elements_unwrap_to_text() {
    let options = Options::default();
    assert_eq!(
        fragment_to_markdown("<custom-x>junk</custom-x>", &options).unwrap(),
        "junk\n"
    );
}
