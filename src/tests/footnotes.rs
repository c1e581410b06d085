use super::html_opts;

fn on(o: &mut crate::Options) {
    o.extension.footnotes = true;
}

#[test]
fn basic_footnote() {
    html_opts(
        "Hi[^1].\n\n[^1]: World\n",
        "<p>Hi<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\" data-footnote-ref>1</a></sup>.</p>\n\
         <section class=\"footnotes\" data-footnotes>\n<ol>\n<li id=\"fn-1\">\n\
         <p>World <a href=\"#fnref-1\" class=\"footnote-backref\" data-footnote-backref>↩</a></p>\n\
         </li>\n</ol>\n</section>\n",
        on,
    );
}

#[test]
fn definitions_order_follows_first_reference() {
    html_opts(
        "b[^b] a[^a]\n\n[^a]: A\n\n[^b]: B\n",
        "<p>b<sup class=\"footnote-ref\"><a href=\"#fn-b\" id=\"fnref-b\" data-footnote-ref>1</a></sup> \
         a<sup class=\"footnote-ref\"><a href=\"#fn-a\" id=\"fnref-a\" data-footnote-ref>2</a></sup></p>\n\
         <section class=\"footnotes\" data-footnotes>\n<ol>\n<li id=\"fn-b\">\n\
         <p>B <a href=\"#fnref-b\" class=\"footnote-backref\" data-footnote-backref>↩</a></p>\n</li>\n\
         <li id=\"fn-a\">\n\
         <p>A <a href=\"#fnref-a\" class=\"footnote-backref\" data-footnote-backref>↩</a></p>\n</li>\n\
         </ol>\n</section>\n",
        on,
    );
}

#[test]
fn unreferenced_definition_disappears() {
    html_opts("text\n\n[^x]: unused\n", "<p>text</p>\n", on);
}

#[test]
fn unknown_reference_is_literal() {
    html_opts("see [^nope]\n", "<p>see [^nope]</p>\n", on);
}

#[test]
fn without_the_extension_the_label_is_an_ordinary_reference() {
    super::html(
        "Hi[^1].\n\n[^1]: World\n",
        "<p>Hi<a href=\"World\">^1</a>.</p>\n",
    );
}
