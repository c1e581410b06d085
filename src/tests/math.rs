use super::html_opts;

fn on(o: &mut crate::Options) {
    o.extension.inline_math = true;
    o.extension.math_block = true;
}

#[test]
fn inline_math() {
    html_opts(
        "Euler: $e^{i\\pi}+1=0$.\n",
        "<p>Euler: <span class=\"language-math\" data-math-style=\"inline\">e^{i\\pi}+1=0</span>.</p>\n",
        on,
    );
}

#[test]
fn display_math_inline() {
    html_opts(
        "$$x+y$$\n",
        "<p><span class=\"language-math\" data-math-style=\"display\">x+y</span></p>\n",
        on,
    );
}

#[test]
fn space_rules_for_single_dollar() {
    html_opts("$ x$\n", "<p>$ x$</p>\n", on);
    html_opts("$x $\n", "<p>$x $</p>\n", on);
    html_opts("$20 and $30\n", "<p>$20 and $30</p>\n", on);
}

#[test]
fn math_blocks() {
    html_opts(
        "$$\nx+y\n$$\n",
        "<div class=\"language-math\">x+y</div>\n",
        on,
    );
    html_opts(
        "$$\na\nb\n$$\n",
        "<div class=\"language-math\">a\nb</div>\n",
        on,
    );
}

#[test]
fn unclosed_math_block_runs_to_end() {
    html_opts(
        "$$\nx\n",
        "<div class=\"language-math\">x</div>\n",
        on,
    );
}

#[test]
fn dollars_are_plain_without_the_extension() {
    super::html("$x$\n", "<p>$x$</p>\n");
}
