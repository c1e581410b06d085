use super::html_opts;
use crate::nodes::NodeValue;
use crate::{parse_document, Arena, Options};

fn on(o: &mut crate::Options) {
    o.extension.front_matter = true;
}

#[test]
fn front_matter_is_invisible_in_html() {
    html_opts("---\ntitle: x\n---\n\nHi\n", "<p>Hi</p>\n", on);
}

#[test]
fn front_matter_node_keeps_the_delimiters() {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.front_matter = true;
    let root = parse_document(&arena, "---\ntitle: x\n---\nHi\n", &options);

    let first = root.first_child().unwrap();
    match first.data.borrow().value {
        NodeValue::FrontMatter(ref fm) => {
            assert_eq!(fm, "---\ntitle: x\n---\n");
            assert_eq!(crate::strings::front_matter_content(fm), "title: x");
        }
        ref other => panic!("expected front matter, got {:?}", other),
    };
}

#[test]
fn only_at_document_start() {
    html_opts(
        "Hi\n\n---\ntitle: x\n---\n",
        "<p>Hi</p>\n<hr />\n<h2>title: x</h2>\n",
        on,
    );
}

#[test]
fn unterminated_front_matter_is_plain_markdown() {
    html_opts("---\ntitle: x\n", "<hr />\n<p>title: x</p>\n", on);
}

#[test]
fn disabled_by_default() {
    super::html("---\nx\n---\n", "<hr />\n<h2>x</h2>\n");
}
