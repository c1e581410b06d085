use super::{html, html_opts};

#[test]
fn toc_expands_from_headings() {
    html_opts(
        "[toc]\n\n# One\n\n## Two\n",
        "<ul class=\"toc\">\n<li class=\"toc-h1\">One</li>\n<li class=\"toc-h2\">Two</li>\n</ul>\n\
         <h1>One</h1>\n<h2>Two</h2>\n",
        |o| o.extension.toc = true,
    );
}

#[test]
fn toc_links_to_anchors_when_enabled() {
    html_opts(
        "[toc]\n\n# One\n",
        "<ul class=\"toc\">\n<li class=\"toc-h1\"><a href=\"#one\">One</a></li>\n</ul>\n\
         <h1 id=\"one\">One</h1>\n",
        |o| {
            o.extension.toc = true;
            o.extension.heading_anchors = true;
        },
    );
}

#[test]
fn toc_without_extension_is_a_paragraph() {
    html("[toc]\n", "<p>[toc]</p>\n");
}

#[test]
fn heading_anchors_deduplicate() {
    html_opts(
        "# One\n\n# One\n",
        "<h1 id=\"one\">One</h1>\n<h1 id=\"one-1\">One</h1>\n",
        |o| o.extension.heading_anchors = true,
    );
}

#[test]
fn block_attributes_attach_to_previous_block() {
    html_opts(
        "para\n{: #intro .lead}\n",
        "<p id=\"intro\" class=\"lead\">para</p>\n",
        |o| o.extension.block_attributes = true,
    );
}

#[test]
fn block_attributes_with_values() {
    html_opts(
        "# H\n\n{: data-x=\"1 2\"}\n",
        "<h1 data-x=\"1 2\">H</h1>\n",
        |o| o.extension.block_attributes = true,
    );
}

#[test]
fn attribute_line_without_extension_is_text() {
    html("para\n{: #x}\n", "<p>para\n{: #x}</p>\n");
}

#[test]
fn link_prefix_and_base() {
    html_opts(
        "[a](/docs/x)\n",
        "<p><a href=\"https://cdn.example/docs/x\">a</a></p>\n",
        |o| o.extension.link_prefix = Some("https://cdn.example".to_string()),
    );
    html_opts(
        "![i](pic.png)\n",
        "<p><img src=\"https://img.example/pic.png\" alt=\"i\" /></p>\n",
        |o| o.extension.link_base = Some("https://img.example/".to_string()),
    );
    html_opts(
        "[abs](https://other.example/)\n",
        "<p><a href=\"https://other.example/\">abs</a></p>\n",
        |o| o.extension.link_base = Some("https://img.example/".to_string()),
    );
}
