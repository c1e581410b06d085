use crate::{markdown_to_commonmark, markdown_to_html, Options};

mod autolink;
mod code;
mod core;
mod dom;
mod editor;
mod emoji;
mod footnotes;
mod format;
mod front_matter;
mod math;
mod pathological;
mod table;
mod tasklist;
mod toc_attributes;
mod tree;
mod typography;

#[track_caller]
pub fn html(input: &str, expected: &str) {
    html_opts(input, expected, |_| ());
}

#[track_caller]
pub fn html_opts<F>(input: &str, expected: &str, opts: F)
where
    F: Fn(&mut Options),
{
    let mut options = Options::default();
    opts(&mut options);
    let output = markdown_to_html(input, &options);
    pretty_assertions::assert_eq!(output, expected, "input: {:?}", input);
}

/// Canonicalising Markdown and re-rendering must not change the HTML.
#[track_caller]
pub fn roundtrip_opts<F>(input: &str, opts: F)
where
    F: Fn(&mut Options),
{
    let mut options = Options::default();
    opts(&mut options);
    let canonical = markdown_to_commonmark(input, &options);
    pretty_assertions::assert_eq!(
        markdown_to_html(&canonical, &options),
        markdown_to_html(input, &options),
        "canonical form: {:?}",
        canonical
    );
}

#[track_caller]
pub fn roundtrip(input: &str) {
    roundtrip_opts(input, |_| ());
}
