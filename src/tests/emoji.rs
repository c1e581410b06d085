use super::html_opts;
use rustc_hash::FxHashMap;

fn on(o: &mut crate::Options) {
    o.extension.emoji = true;
}

#[test]
fn alias_expansion() {
    html_opts("a :heart: b\n", "<p>a \u{2764}\u{fe0f} b</p>\n", on);
}

#[test]
fn unknown_alias_stays_literal() {
    html_opts(
        "a :no_such_alias_zzz: b\n",
        "<p>a :no_such_alias_zzz: b</p>\n",
        on,
    );
}

#[test]
fn custom_aliases_override() {
    html_opts(
        ":octocat:\n",
        "<p><img alt=\":octocat:\" class=\"emoji\" src=\"img/octocat.png\" title=\":octocat:\" /></p>\n",
        |o| {
            o.extension.emoji = true;
            let mut map = FxHashMap::default();
            map.insert("octocat".to_string(), "img/octocat.png".to_string());
            o.extension.emoji_aliases = Some(map);
        },
    );
}

#[test]
fn disabled_by_default() {
    super::html("a :heart: b\n", "<p>a :heart: b</p>\n");
}
