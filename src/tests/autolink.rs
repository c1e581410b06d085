use super::html_opts;

fn on(o: &mut crate::Options) {
    o.extension.autolink = true;
}

#[test]
fn www_autolinks() {
    html_opts(
        "visit www.example.com now\n",
        "<p>visit <a href=\"http://www.example.com\">www.example.com</a> now</p>\n",
        on,
    );
}

#[test]
fn scheme_autolinks() {
    html_opts(
        "see https://example.com/x for more\n",
        "<p>see <a href=\"https://example.com/x\">https://example.com/x</a> for more</p>\n",
        on,
    );
}

#[test]
fn trailing_punctuation_is_excluded() {
    html_opts(
        "go to www.example.com.\n",
        "<p>go to <a href=\"http://www.example.com\">www.example.com</a>.</p>\n",
        on,
    );
    html_opts(
        "(see www.example.com/a_(b))\n",
        "<p>(see <a href=\"http://www.example.com/a_(b)\">www.example.com/a_(b)</a>)</p>\n",
        on,
    );
}

#[test]
fn email_autolinks() {
    html_opts(
        "mail a.b@c.example please\n",
        "<p>mail <a href=\"mailto:a.b@c.example\">a.b@c.example</a> please</p>\n",
        on,
    );
}

#[test]
fn intraword_is_not_linked() {
    html_opts("xwww.example.com\n", "<p>xwww.example.com</p>\n", on);
    html_opts("nodots\n", "<p>nodots</p>\n", on);
}

#[test]
fn disabled_by_default() {
    super::html(
        "visit www.example.com now\n",
        "<p>visit www.example.com now</p>\n",
    );
}
