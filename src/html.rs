//! The standard HTML renderer, plus the escaping helpers every renderer
//! shares.
//!
//! Rendering is a pre/post-order walk over the tree driven by a work stack;
//! the per-node formatter returns a [`ChildRendering`] telling the walk
//! whether to descend, render children in "plain" mode (image alt text), or
//! skip them. [`format_document_with_formatter`] accepts a custom formatter
//! so callers can override individual node renderings and fall back to
//! [`format_node_default`] for the rest.

mod anchorizer;
mod context;

use std::fmt::{self, Write};

use crate::nodes::{
    AstNode, EmojiValue, ListType, NodeCode, NodeCodeBlock, NodeEmoji, NodeFootnoteDefinition,
    NodeFootnoteReference, NodeHeading, NodeHtmlBlock, NodeLink, NodeList, NodeMath,
    NodeMathBlock, NodeValue, TableAlignment,
};
use crate::parser::Options;
use crate::scanners;

pub use anchorizer::Anchorizer;
pub use context::Context;

/// Formats a document tree as HTML.
pub fn format_document<'a>(
    root: &'a AstNode<'a>,
    options: &Options,
    output: &mut dyn Write,
) -> fmt::Result {
    format_document_with_formatter(root, options, output, format_node_default)
}

/// What to do with a node's children after rendering its opening half.
#[derive(Debug, Clone, Copy)]
pub enum ChildRendering {
    /// Render children normally.
    HTML,
    /// Render children as bare text (used inside `alt` attributes).
    Plain,
    /// Don't render children at all.
    Skip,
}

/// Formats a document with a custom per-node formatter.
pub fn format_document_with_formatter<'a, 'o>(
    root: &'a AstNode<'a>,
    options: &'o Options,
    output: &'o mut dyn Write,
    formatter: fn(
        context: &mut Context,
        node: &'a AstNode<'a>,
        entering: bool,
    ) -> Result<ChildRendering, fmt::Error>,
) -> fmt::Result {
    let mut context = Context::new(output, options);

    enum Phase {
        Pre,
        Post,
    }
    let mut stack = vec![(root, ChildRendering::HTML, Phase::Pre)];

    while let Some((node, child_rendering, phase)) = stack.pop() {
        match phase {
            Phase::Pre => {
                let new_cr = match child_rendering {
                    ChildRendering::Plain => {
                        match node.data.borrow().value {
                            NodeValue::Text(ref literal)
                            | NodeValue::Code(NodeCode { ref literal, .. })
                            | NodeValue::Math(NodeMath { ref literal, .. }) => {
                                context.escape(literal)?;
                            }
                            NodeValue::HtmlEntity(ref ne) => {
                                context.escape(&ne.resolved)?;
                            }
                            NodeValue::LineBreak | NodeValue::SoftBreak => {
                                context.write_str(" ")?;
                            }
                            _ => (),
                        }
                        ChildRendering::Plain
                    }
                    ChildRendering::HTML => {
                        stack.push((node, ChildRendering::HTML, Phase::Post));
                        formatter(&mut context, node, true)?
                    }
                    ChildRendering::Skip => unreachable!(),
                };

                if !matches!(new_cr, ChildRendering::Skip) {
                    for ch in node.reverse_children() {
                        stack.push((ch, new_cr, Phase::Pre));
                    }
                }
            }
            Phase::Post => {
                formatter(&mut context, node, false)?;
            }
        }
    }

    context.finish()
}

/// The default node formatter.
pub fn format_node_default<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    match node.data.borrow().value {
        NodeValue::Document => Ok(ChildRendering::HTML),
        NodeValue::FrontMatter(_) => Ok(ChildRendering::HTML),
        NodeValue::BlockQuote => render_block_quote(context, node, entering),
        NodeValue::List(ref nl) => render_list(context, node, entering, nl),
        NodeValue::Item(_) => render_item(context, node, entering),
        NodeValue::TaskItem(symbol) => render_task_item(context, node, entering, symbol),
        NodeValue::Paragraph => render_paragraph(context, node, entering),
        NodeValue::Heading(ref nh) => render_heading(context, node, entering, nh),
        NodeValue::CodeBlock(ref ncb) => render_code_block(context, node, entering, ncb),
        NodeValue::HtmlBlock(ref nhb) => render_html_block(context, entering, nhb),
        NodeValue::ThematicBreak => render_thematic_break(context, node, entering),
        NodeValue::FootnoteDefinition(ref nfd) => {
            render_footnote_definition(context, node, entering, nfd)
        }
        NodeValue::Table(_) => render_table(context, node, entering),
        NodeValue::TableRow(header) => render_table_row(context, node, entering, header),
        NodeValue::TableCell => render_table_cell(context, node, entering),
        NodeValue::MathBlock(ref nmb) => render_math_block(context, entering, nmb),
        NodeValue::TableOfContents => render_toc(context, node, entering),
        NodeValue::BlockAttributes(_) => Ok(ChildRendering::Skip),

        NodeValue::Text(ref literal) => render_text(context, entering, literal),
        NodeValue::SoftBreak => render_soft_break(context, entering),
        NodeValue::LineBreak => render_line_break(context, entering),
        NodeValue::Code(ref nc) => render_code(context, entering, nc),
        NodeValue::HtmlInline(ref literal) => render_html_inline(context, entering, literal),
        NodeValue::HtmlEntity(ref ne) => {
            if entering {
                context.escape(&ne.resolved)?;
            }
            Ok(ChildRendering::HTML)
        }
        NodeValue::Emph => render_simple_tag(context, entering, "em"),
        NodeValue::Strong => render_simple_tag(context, entering, "strong"),
        NodeValue::Strikethrough => render_simple_tag(context, entering, "del"),
        NodeValue::Highlight => render_simple_tag(context, entering, "mark"),
        NodeValue::Marker(_) => Ok(ChildRendering::Skip),
        NodeValue::Escaped => Ok(ChildRendering::HTML),
        NodeValue::Link(ref nl) => render_link(context, entering, nl),
        NodeValue::Image(ref nl) => render_image(context, entering, nl),
        NodeValue::FootnoteReference(ref nfr) => {
            render_footnote_reference(context, entering, nfr)
        }
        NodeValue::Math(ref nm) => render_math(context, entering, nm),
        NodeValue::Emoji(ref ne) => render_emoji(context, entering, ne),
    }
}

/// Renders any attributes a kramdown attribute list attached to the block.
fn render_block_attrs<'a>(context: &mut Context, node: &'a AstNode<'a>) -> fmt::Result {
    let ast = node.data.borrow();
    for (key, value) in &ast.attributes {
        write!(context, " {}=\"", key)?;
        context.escape(value)?;
        context.write_str("\"")?;
    }
    Ok(())
}

fn render_block_quote<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<blockquote")?;
        render_block_attrs(context, node)?;
        context.write_str(">\n")?;
    } else {
        context.cr()?;
        context.write_str("</blockquote>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_list<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    nl: &NodeList,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        match nl.list_type {
            ListType::Bullet => {
                context.write_str("<ul")?;
                render_block_attrs(context, node)?;
                context.write_str(">\n")?;
            }
            ListType::Ordered => {
                context.write_str("<ol")?;
                render_block_attrs(context, node)?;
                if nl.start == 1 {
                    context.write_str(">\n")?;
                } else {
                    writeln!(context, " start=\"{}\">", nl.start)?;
                }
            }
        }
    } else if nl.list_type == ListType::Bullet {
        context.write_str("</ul>\n")?;
    } else {
        context.write_str("</ol>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_item<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<li")?;
        render_block_attrs(context, node)?;
        context.write_str(">")?;
    } else {
        context.write_str("</li>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_task_item<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    symbol: Option<char>,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<li")?;
        render_block_attrs(context, node)?;
        context.write_str(">")?;
        context.write_str("<input type=\"checkbox\"")?;
        if symbol.is_some() {
            context.write_str(" checked=\"\"")?;
        }
        context.write_str(" disabled=\"\" /> ")?;
    } else {
        context.write_str("</li>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_paragraph<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    let tight = node
        .parent()
        .and_then(|n| n.parent())
        .map_or(false, |n| match n.data.borrow().value {
            NodeValue::List(nl) => nl.tight,
            _ => false,
        });

    if !tight {
        if entering {
            context.cr()?;
            context.write_str("<p")?;
            render_block_attrs(context, node)?;
            context.write_str(">")?;
        } else {
            if let Some(parent) = node.parent() {
                if let NodeValue::FootnoteDefinition(ref nfd) = parent.data.borrow().value {
                    if node.next_sibling().is_none() {
                        context.write_str(" ")?;
                        put_footnote_backref(context, nfd)?;
                    }
                }
            }
            context.write_str("</p>\n")?;
        }
    }
    Ok(ChildRendering::HTML)
}

fn render_heading<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    nh: &NodeHeading,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        write!(context, "<h{}", nh.level)?;
        if context.options.extension.heading_anchors {
            if let Some(anchor) = context.heading_anchor(node) {
                write!(context, " id=\"")?;
                context.escape(&anchor)?;
                context.write_str("\"")?;
            }
        }
        render_block_attrs(context, node)?;
        context.write_str(">")?;
    } else {
        writeln!(context, "</h{}>", nh.level)?;
    }
    Ok(ChildRendering::HTML)
}

fn render_code_block<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    ncb: &NodeCodeBlock,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<pre")?;
        render_block_attrs(context, node)?;
        context.write_str("><code")?;

        if !ncb.info.is_empty() {
            let lang = ncb
                .info
                .split_whitespace()
                .next()
                .unwrap_or("");
            context.write_str(" class=\"language-")?;
            context.escape(lang)?;
            context.write_str("\"")?;
        }

        context.write_str(">")?;
        context.escape(&ncb.literal)?;
        context.write_str("</code></pre>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_html_block(
    context: &mut Context,
    entering: bool,
    nhb: &NodeHtmlBlock,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        if context.options.render.escape {
            context.escape(&nhb.literal)?;
        } else if !context.options.render.unsafe_ {
            context.write_str("<!-- raw HTML omitted -->")?;
        } else {
            context.write_str(&nhb.literal)?;
        }
        context.cr()?;
    }
    Ok(ChildRendering::HTML)
}

fn render_thematic_break<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<hr")?;
        render_block_attrs(context, node)?;
        context.write_str(" />\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_footnote_definition<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    nfd: &NodeFootnoteDefinition,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        if context.footnote_ix == 0 {
            context.write_str("<section class=\"footnotes\" data-footnotes>\n<ol>\n")?;
        }
        context.footnote_ix += 1;
        context.write_str("<li id=\"fn-")?;
        context.escape_href(&nfd.name)?;
        context.write_str("\">")?;
    } else {
        if put_footnote_backref(context, nfd)? {
            context.write_str("\n")?;
        }
        context.write_str("</li>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn put_footnote_backref(
    context: &mut Context,
    nfd: &NodeFootnoteDefinition,
) -> Result<bool, fmt::Error> {
    if context.written_footnote_ix >= context.footnote_ix {
        return Ok(false);
    }

    context.written_footnote_ix = context.footnote_ix;

    let mut ref_suffix = String::new();
    let mut superscript = String::new();

    for ref_num in 1..=nfd.total_references {
        if ref_num > 1 {
            ref_suffix = format!("-{}", ref_num);
            superscript = format!("<sup class=\"footnote-ref\">{}</sup>", ref_num);
            write!(context, " ")?;
        }

        context.write_str("<a href=\"#fnref-")?;
        context.escape_href(&nfd.name)?;
        write!(
            context,
            "{}\" class=\"footnote-backref\" data-footnote-backref>↩{}</a>",
            ref_suffix, superscript
        )?;
    }
    Ok(true)
}

fn render_table<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<table")?;
        render_block_attrs(context, node)?;
        context.write_str(">\n")?;
    } else {
        if node
            .last_child()
            .map_or(false, |n| !n.same_node(node.first_child().unwrap()))
        {
            context.cr()?;
            context.write_str("</tbody>\n")?;
        }
        context.cr()?;
        context.write_str("</table>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_table_row<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
    header: bool,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        if header {
            context.write_str("<thead>\n")?;
        } else if let Some(n) = node.previous_sibling() {
            if let NodeValue::TableRow(true) = n.data.borrow().value {
                context.write_str("<tbody>\n")?;
            }
        }
        context.write_str("<tr>")?;
    } else {
        context.cr()?;
        context.write_str("</tr>")?;
        if header {
            context.cr()?;
            context.write_str("</thead>")?;
        }
    }
    Ok(ChildRendering::HTML)
}

fn render_table_cell<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    let row_node = node.parent().unwrap();
    let in_header = match row_node.data.borrow().value {
        NodeValue::TableRow(header) => header,
        _ => false,
    };

    let table_node = row_node.parent().unwrap();
    let alignments = match table_node.data.borrow().value {
        NodeValue::Table(ref nt) => nt.alignments.clone(),
        _ => vec![],
    };

    if entering {
        context.cr()?;
        if in_header {
            context.write_str("<th")?;
        } else {
            context.write_str("<td")?;
        }

        let mut i = 0;
        let mut start = row_node.first_child().unwrap();
        while !start.same_node(node) {
            i += 1;
            start = start.next_sibling().unwrap();
        }

        match alignments.get(i) {
            Some(TableAlignment::Left) => context.write_str(" align=\"left\"")?,
            Some(TableAlignment::Right) => context.write_str(" align=\"right\"")?,
            Some(TableAlignment::Center) => context.write_str(" align=\"center\"")?,
            _ => (),
        }

        context.write_str(">")?;
    } else if in_header {
        context.write_str("</th>")?;
    } else {
        context.write_str("</td>")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_math_block(
    context: &mut Context,
    entering: bool,
    nmb: &NodeMathBlock,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.cr()?;
        context.write_str("<div class=\"language-math\">")?;
        context.escape(nmb.literal.trim_end_matches('\n'))?;
        context.write_str("</div>\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_toc<'a>(
    context: &mut Context,
    node: &'a AstNode<'a>,
    entering: bool,
) -> Result<ChildRendering, fmt::Error> {
    if !entering {
        return Ok(ChildRendering::HTML);
    }

    let root = node.ancestors().last().unwrap();
    context.cr()?;
    context.write_str("<ul class=\"toc\">\n")?;
    for heading in root.descendants() {
        let level = match heading.data.borrow().value {
            NodeValue::Heading(nh) => nh.level,
            _ => continue,
        };
        let text = collect_text(heading);
        let anchor = context.heading_anchor(heading);
        write!(context, "<li class=\"toc-h{}\">", level)?;
        match anchor {
            Some(anchor) => {
                context.write_str("<a href=\"#")?;
                context.escape_href(&anchor)?;
                context.write_str("\">")?;
                context.escape(&text)?;
                context.write_str("</a>")?;
            }
            None => context.escape(&text)?,
        }
        context.write_str("</li>\n")?;
    }
    context.write_str("</ul>\n")?;
    Ok(ChildRendering::HTML)
}

fn render_text(
    context: &mut Context,
    entering: bool,
    literal: &str,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.escape(literal)?;
    }
    Ok(ChildRendering::HTML)
}

fn render_soft_break(context: &mut Context, entering: bool) -> Result<ChildRendering, fmt::Error> {
    if entering {
        if context.options.render.hard_breaks {
            context.write_str("<br />\n")?;
        } else {
            context.write_str("\n")?;
        }
    }
    Ok(ChildRendering::HTML)
}

fn render_line_break(context: &mut Context, entering: bool) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.write_str("<br />\n")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_code(
    context: &mut Context,
    entering: bool,
    nc: &NodeCode,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.write_str("<code>")?;
        context.escape(&nc.literal)?;
        context.write_str("</code>")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_html_inline(
    context: &mut Context,
    entering: bool,
    literal: &str,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        if context.options.render.escape {
            context.escape(literal)?;
        } else if !context.options.render.unsafe_ {
            context.write_str("<!-- raw HTML omitted -->")?;
        } else {
            context.write_str(literal)?;
        }
    }
    Ok(ChildRendering::HTML)
}

fn render_simple_tag(
    context: &mut Context,
    entering: bool,
    tag: &str,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        write!(context, "<{}>", tag)?;
    } else {
        write!(context, "</{}>", tag)?;
    }
    Ok(ChildRendering::HTML)
}

fn render_link(
    context: &mut Context,
    entering: bool,
    nl: &NodeLink,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.write_str("<a href=\"")?;
        let url = rebase_url(context.options, &nl.url);
        if context.options.render.unsafe_ || !dangerous_url(&url) {
            context.escape_href(&url)?;
        }
        if !nl.title.is_empty() {
            context.write_str("\" title=\"")?;
            context.escape(&nl.title)?;
        }
        context.write_str("\">")?;
    } else {
        context.write_str("</a>")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_image(
    context: &mut Context,
    entering: bool,
    nl: &NodeLink,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        context.write_str("<img src=\"")?;
        let url = rebase_url(context.options, &nl.url);
        if context.options.render.unsafe_ || !dangerous_url(&url) {
            context.escape_href(&url)?;
        }
        context.write_str("\" alt=\"")?;
        Ok(ChildRendering::Plain)
    } else {
        if !nl.title.is_empty() {
            context.write_str("\" title=\"")?;
            context.escape(&nl.title)?;
        }
        context.write_str("\" />")?;
        Ok(ChildRendering::HTML)
    }
}

fn render_footnote_reference(
    context: &mut Context,
    entering: bool,
    nfr: &NodeFootnoteReference,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        let mut ref_id = format!("fnref-{}", nfr.name);
        if nfr.ref_num > 1 {
            ref_id = format!("{}-{}", ref_id, nfr.ref_num);
        }

        context.write_str("<sup class=\"footnote-ref\"><a href=\"#fn-")?;
        context.escape_href(&nfr.name)?;
        context.write_str("\" id=\"")?;
        context.escape_href(&ref_id)?;
        write!(context, "\" data-footnote-ref>{}</a></sup>", nfr.ix)?;
    }
    Ok(ChildRendering::HTML)
}

fn render_math(
    context: &mut Context,
    entering: bool,
    nm: &NodeMath,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        let style = if nm.display { "display" } else { "inline" };
        write!(context, "<span class=\"language-math\" data-math-style=\"{}\">", style)?;
        context.escape(&nm.literal)?;
        context.write_str("</span>")?;
    }
    Ok(ChildRendering::HTML)
}

fn render_emoji(
    context: &mut Context,
    entering: bool,
    ne: &NodeEmoji,
) -> Result<ChildRendering, fmt::Error> {
    if entering {
        match ne.resolved {
            Some(EmojiValue::Unicode(ref s)) => context.escape(s)?,
            Some(EmojiValue::Image(ref url)) => {
                context.write_str("<img alt=\":")?;
                context.escape(&ne.alias)?;
                context.write_str(":\" class=\"emoji\" src=\"")?;
                context.escape_href(url)?;
                context.write_str("\" title=\":")?;
                context.escape(&ne.alias)?;
                context.write_str(":\" />")?;
            }
            None => {
                write!(context, ":")?;
                context.escape(&ne.alias)?;
                write!(context, ":")?;
            }
        }
    }
    Ok(ChildRendering::HTML)
}

// Helpers

/// Concatenated literal text of a subtree; breaks count as one space.
pub fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::with_capacity(20);
    collect_text_append(node, &mut text);
    text
}

pub fn collect_text_append<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match node.data.borrow().value {
        NodeValue::Text(ref literal) | NodeValue::HtmlInline(ref literal) => {
            output.push_str(literal)
        }
        NodeValue::Code(NodeCode { ref literal, .. })
        | NodeValue::Math(NodeMath { ref literal, .. }) => output.push_str(literal),
        NodeValue::HtmlEntity(ref ne) => output.push_str(&ne.resolved),
        NodeValue::LineBreak | NodeValue::SoftBreak => output.push(' '),
        NodeValue::Marker(_) => (),
        _ => {
            for n in node.children() {
                collect_text_append(n, output);
            }
        }
    }
}

/// Applies `link_prefix` / `link_base` to a destination.
pub fn rebase_url(options: &Options, url: &str) -> String {
    let absolute = url.contains("://")
        || url.starts_with("mailto:")
        || url.starts_with("data:")
        || url.starts_with('#');

    let mut out = String::new();
    if let Some(ref prefix) = options.extension.link_prefix {
        out.push_str(prefix);
    }
    if !absolute {
        if let Some(ref base) = options.extension.link_base {
            out.push_str(base);
        }
    }
    out.push_str(url);
    out
}

/// Whether renderers should drop this destination in safe mode.
pub fn dangerous_url(url: &str) -> bool {
    scanners::dangerous_url(url.as_bytes())
}

/// Escapes `&`, `<`, `>` and `"` for text content.
pub fn escape(output: &mut dyn Write, buffer: &str) -> fmt::Result {
    let bytes = buffer.as_bytes();
    let matcher = jetscii::bytes!(b'"', b'&', b'<', b'>');

    let mut offset = 0;
    while let Some(i) = matcher.find(&bytes[offset..]) {
        let esc: &str = match bytes[offset + i] {
            b'"' => "&quot;",
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => unreachable!(),
        };
        output.write_str(&buffer[offset..offset + i])?;
        output.write_str(esc)?;
        offset += i + 1;
    }
    output.write_str(&buffer[offset..])?;
    Ok(())
}

/// Escapes a URL for an HTML attribute: alphanumerics and URL-safe
/// punctuation pass through, `&` and `'` become entities, everything else is
/// percent-encoded. Existing `%`-escapes are trusted as-is.
pub fn escape_href(output: &mut dyn Write, buffer: &str) -> fmt::Result {
    use crate::character_set::character_set;

    const HREF_SAFE: [bool; 256] = character_set!(
        b"-_.+!*(),%#@?=;:/,+$~",
        b"abcdefghijklmnopqrstuvwxyz",
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
    );

    let bytes = buffer.as_bytes();
    let size = buffer.len();
    let mut i = 0;

    while i < size {
        let org = i;
        while i < size && HREF_SAFE[bytes[i] as usize] {
            i += 1;
        }

        if i > org {
            output.write_str(&buffer[org..i])?;
        }

        if i >= size {
            break;
        }

        match bytes[i] {
            b'&' => {
                output.write_str("&amp;")?;
            }
            b'\'' => {
                output.write_str("&#x27;")?;
            }
            _ => write!(output, "%{:02X}", bytes[i])?,
        }

        i += 1;
    }

    Ok(())
}

/// Writes an opening tag with escaped attribute values.
pub fn write_opening_tag<K: AsRef<str>, V: AsRef<str>>(
    output: &mut dyn Write,
    tag: &str,
    attributes: impl IntoIterator<Item = (K, V)>,
) -> fmt::Result {
    write!(output, "<{}", tag)?;
    for (attr, val) in attributes {
        write!(output, " {}=\"", attr.as_ref())?;
        escape(output, val.as_ref())?;
        output.write_str("\"")?;
    }
    output.write_str(">")?;
    Ok(())
}
