use super::{html, html_opts};

#[test]
fn empty_input() {
    html("", "");
    html("   \n", "");
}

#[test]
fn paragraphs() {
    html("a\n\nb\n", "<p>a</p>\n<p>b</p>\n");
    html("a\nb\n", "<p>a\nb</p>\n");
}

#[test]
fn emphasis_and_strong() {
    html("*em* and **strong**\n", "<p><em>em</em> and <strong>strong</strong></p>\n");
    html("_em_\n", "<p><em>em</em></p>\n");
    html("***foo***\n", "<p><em><strong>foo</strong></em></p>\n");
    html("*foo**bar**baz*\n", "<p><em>foo<strong>bar</strong>baz</em></p>\n");
}

#[test]
fn intraword_underscore_does_not_emphasise() {
    html("foo_bar_baz\n", "<p>foo_bar_baz</p>\n");
}

#[test]
fn unterminated_emphasis_is_literal() {
    html("*not closed\n", "<p>*not closed</p>\n");
}

#[test]
fn atx_headings() {
    html("# Hi\n", "<h1>Hi</h1>\n");
    html("## Hi ##\n", "<h2>Hi</h2>\n");
    html("####### no\n", "<p>####### no</p>\n");
}

#[test]
fn setext_headings() {
    html("Title\n===\n", "<h1>Title</h1>\n");
    html("Title\n---\n", "<h2>Title</h2>\n");
}

#[test]
fn thematic_breaks() {
    html("---\n", "<hr />\n");
    html("* * *\n", "<hr />\n");
    html("--\n", "<p>--</p>\n");
}

#[test]
fn block_quotes() {
    html("> quoted\n", "<blockquote>\n<p>quoted</p>\n</blockquote>\n");
    html(
        "> a\nb\n",
        "<blockquote>\n<p>a\nb</p>\n</blockquote>\n",
    );
}

#[test]
fn lists() {
    html("- a\n- b\n", "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
    html(
        "1. one\n2. two\n",
        "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n",
    );
    html(
        "3. three\n4. four\n",
        "<ol start=\"3\">\n<li>three</li>\n<li>four</li>\n</ol>\n",
    );
    html(
        "- a\n\n- b\n",
        "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
    );
}

#[test]
fn line_breaks() {
    html("a  \nb\n", "<p>a<br />\nb</p>\n");
    html("a\\\nb\n", "<p>a<br />\nb</p>\n");
    html("a\nb\n", "<p>a\nb</p>\n");
}

#[test]
fn backslash_escapes() {
    html("\\*lit\\*\n", "<p>*lit*</p>\n");
    html("\\a\n", "<p>\\a</p>\n");
}

#[test]
fn entities() {
    html("&amp;\n", "<p>&amp;</p>\n");
    html("&copy;\n", "<p>©</p>\n");
    html("&#35;\n", "<p>#</p>\n");
    html("&nosuchentity\n", "<p>&amp;nosuchentity</p>\n");
}

#[test]
fn raw_html_is_omitted_when_safe() {
    html("<div>\nx\n</div>\n", "<!-- raw HTML omitted -->\n");
    html("a <b>c</b>\n", "<p>a <!-- raw HTML omitted -->c<!-- raw HTML omitted --></p>\n");
}

#[test]
fn raw_html_unsafe() {
    html_opts("<div>\nx\n</div>\n", "<div>\nx\n</div>\n", |o| {
        o.render.unsafe_ = true
    });
    html_opts("a <b>c</b>\n", "<p>a <b>c</b></p>\n", |o| {
        o.render.unsafe_ = true
    });
}

#[test]
fn html_comments_pass_classification() {
    html_opts(
        "<!-- note -->\n",
        "<!-- note -->\n",
        |o| o.render.unsafe_ = true,
    );
}

#[test]
fn inline_links() {
    html(
        "[a](http://x \"t\")\n",
        "<p><a href=\"http://x\" title=\"t\">a</a></p>\n",
    );
    html("[a](http://x)\n", "<p><a href=\"http://x\">a</a></p>\n");
    html("[a](<http://x y>)\n", "<p><a href=\"http://x%20y\">a</a></p>\n");
}

#[test]
fn reference_links() {
    html(
        "[a][b]\n\n[b]: http://x\n",
        "<p><a href=\"http://x\">a</a></p>\n",
    );
    html(
        "[b][]\n\n[b]: http://x\n",
        "<p><a href=\"http://x\">b</a></p>\n",
    );
    html(
        "[b]\n\n[b]: http://x\n",
        "<p><a href=\"http://x\">b</a></p>\n",
    );
    html("[nope][missing]\n", "<p>[nope][missing]</p>\n");
}

#[test]
fn definition_only_paragraph_disappears() {
    html("[b]: http://x\n", "");
}

#[test]
fn images() {
    html(
        "![alt](/img.png)\n",
        "<p><img src=\"/img.png\" alt=\"alt\" /></p>\n",
    );
    html(
        "![*em* alt](/i.png)\n",
        "<p><img src=\"/i.png\" alt=\"em alt\" /></p>\n",
    );
}

#[test]
fn no_links_inside_links() {
    html(
        "[a [b](http://in) c](http://out)\n",
        "<p>[a <a href=\"http://in\">b</a> c](http://out)</p>\n",
    );
}

#[test]
fn pointy_autolinks() {
    html(
        "<https://e.com>\n",
        "<p><a href=\"https://e.com\">https://e.com</a></p>\n",
    );
    html(
        "<someone@e.com>\n",
        "<p><a href=\"mailto:someone@e.com\">someone@e.com</a></p>\n",
    );
}

#[test]
fn unmatched_close_bracket() {
    html("a ] b\n", "<p>a ] b</p>\n");
}

#[test]
fn dangerous_urls_are_dropped() {
    html("[x](javascript:alert(1))\n", "<p><a href=\"\">x</a></p>\n");
}

#[test]
fn lazy_continuation_in_list() {
    html(
        "- a\nb\n",
        "<ul>\n<li>a\nb</li>\n</ul>\n",
    );
}
