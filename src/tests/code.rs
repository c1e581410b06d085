use super::html;

#[test]
fn inline_code() {
    html("`code`\n", "<p><code>code</code></p>\n");
    html("`` `literal` ``\n", "<p><code>`literal`</code></p>\n");
    html("`a  b`\n", "<p><code>a  b</code></p>\n");
    html("` `\n", "<p><code> </code></p>\n");
}

#[test]
fn unmatched_backticks_are_literal() {
    html("`no close\n", "<p>`no close</p>\n");
    html("``one`\n", "<p>``one`</p>\n");
}

#[test]
fn newlines_in_code_fold_to_spaces() {
    html("`a\nb`\n", "<p><code>a b</code></p>\n");
}

#[test]
fn fenced_code_blocks() {
    html(
        "```go\nfoo\n```\n",
        "<pre><code class=\"language-go\">foo\n</code></pre>\n",
    );
    html("```\nfoo\n```\n", "<pre><code>foo\n</code></pre>\n");
    html(
        "~~~\ntildes\n~~~\n",
        "<pre><code>tildes\n</code></pre>\n",
    );
}

#[test]
fn unclosed_fence_runs_to_end_of_input() {
    html("```\nabc\n", "<pre><code>abc\n</code></pre>\n");
}

#[test]
fn fence_length_must_match() {
    html(
        "````\n```\n````\n",
        "<pre><code>```\n</code></pre>\n",
    );
}

#[test]
fn indented_code_blocks() {
    html("    code\n", "<pre><code>code\n</code></pre>\n");
    html(
        "    a\n\n    b\n",
        "<pre><code>a\n\nb\n</code></pre>\n",
    );
}

#[test]
fn info_string_is_entity_resolved() {
    html(
        "```r&#117;st\nx\n```\n",
        "<pre><code class=\"language-rust\">x\n</code></pre>\n",
    );
}
