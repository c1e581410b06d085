use crate::editor::sv::NEWLINE_SV;
use crate::{
    markdown_to_instant_render, markdown_to_split_view, markdown_to_wysiwyg, Options, CARET,
};

#[test]
fn split_view_wraps_every_token() {
    let out = markdown_to_split_view("a\n", &Options::default());
    assert_eq!(
        out,
        format!("<span data-type=\"text\">a</span>{nl}{nl}{nl}", nl = NEWLINE_SV)
    );
}

#[test]
fn split_view_heading_markers() {
    let out = markdown_to_split_view("# Hi\n", &Options::default());
    assert!(out.starts_with(
        "<span data-type=\"heading-marker\" class=\"sv__marker\"># </span>\
         <span data-type=\"text\">Hi</span>"
    ));
}

#[test]
fn split_view_emphasis_markers_carry_source() {
    let out = markdown_to_split_view("*a*\n", &Options::default());
    assert!(out.contains("<span class=\"sv__marker\">*</span>"));
    assert!(out.contains("<span data-type=\"text\">a</span>"));
}

#[test]
fn split_view_appends_reference_definitions() {
    let out = markdown_to_split_view("[a][b]\n\n[b]: http://x\n", &Options::default());
    assert!(out.contains("data-type=\"footnotes-link\""));
    assert!(out.contains("http://x"));
}

#[test]
fn instant_render_blocks_carry_node_ids() {
    let out = markdown_to_instant_render("# Hi\n", &Options::default());
    assert_eq!(
        out,
        "<h1 data-block=\"0\" data-node-id=\"n-1\" data-marker=\"#\">\
         <span class=\"ir__marker\" data-type=\"heading-marker\"># </span>Hi</h1>"
    );
}

#[test]
fn instant_render_ids_are_deterministic() {
    let options = Options::default();
    let a = markdown_to_instant_render("x\n\ny\n", &options);
    let b = markdown_to_instant_render("x\n\ny\n", &options);
    assert_eq!(a, b);
    assert!(a.contains("data-node-id=\"n-1\""));
    assert!(a.contains("data-node-id=\"n-2\""));
}

#[test]
fn instant_render_keeps_inline_markers() {
    let out = markdown_to_instant_render("*a* `c`\n", &Options::default());
    assert!(out.contains("<em data-type=\"em\"><span class=\"ir__marker\">*</span>a"));
    assert!(out.contains("data-type=\"code-inline\""));
}

#[test]
fn wysiwyg_renders_clean_markup() {
    let out = markdown_to_wysiwyg("*a*\n", &Options::default());
    assert_eq!(out, "<p data-block=\"0\" data-node-id=\"n-1\"><em>a</em></p>");
}

#[test]
fn wysiwyg_task_items_are_editable_checkboxes() {
    let mut options = Options::default();
    options.extension.tasklist = true;
    let out = markdown_to_wysiwyg("- [x] done\n", &options);
    assert!(out.contains("<input checked=\"checked\" type=\"checkbox\" />"));
    assert!(!out.contains("disabled"));
}

#[test]
fn caret_becomes_wbr_in_editor_doms() {
    let md = format!("ab{}cd\n", CARET);
    let options = Options::default();
    for out in [
        markdown_to_split_view(&md, &options),
        markdown_to_instant_render(&md, &options),
        markdown_to_wysiwyg(&md, &options),
    ] {
        assert!(out.contains("ab<wbr>cd"), "missing caret in {:?}", out);
        assert!(!out.contains(CARET));
    }
}

#[test]
fn caret_survives_plain_html() {
    let md = format!("ab{}cd\n", CARET);
    let out = crate::markdown_to_html(&md, &Options::default());
    assert_eq!(out, format!("<p>ab{}cd</p>\n", CARET));
}
