use super::html_opts;

#[test]
fn auto_space_between_han_and_latin() {
    html_opts("中文English混排\n", "<p>中文 English 混排</p>\n", |o| {
        o.extension.auto_space = true
    });
}

#[test]
fn auto_space_skips_code_spans() {
    html_opts(
        "中`code`文\n",
        "<p>中<code>code</code>文</p>\n",
        |o| o.extension.auto_space = true,
    );
}

#[test]
fn chinese_punct_conversion() {
    html_opts("你好,世界!\n", "<p>你好，世界！</p>\n", |o| {
        o.extension.chinese_punct = true
    });
}

#[test]
fn term_typo_fixing() {
    html_opts("hosted on github\n", "<p>hosted on GitHub</p>\n", |o| {
        o.extension.fix_term_typo = true
    });
}

#[test]
fn passes_compose() {
    html_opts(
        "在github上\n",
        "<p>在 GitHub 上</p>\n",
        |o| {
            o.extension.auto_space = true;
            o.extension.fix_term_typo = true;
        },
    );
}
