//! A structured CommonMark + GFM engine built for split-view and
//! instant-render Markdown editors.
//!
//! The pipeline: bytes → [`lexer`] (items and logical lines) → block parser
//! (a tree of block nodes) → inline parser (delimiter and bracket stacks) →
//! post-processors → one of several renderers sharing the same tree walk.
//! The reverse path, [`dom`], converts an editor's HTML DOM back into the
//! same tree so edits can be re-rendered.
//!
//! ```
//! use splitmark::{markdown_to_html, Options};
//!
//! let mut options = Options::default();
//! options.extension.strikethrough = true;
//! assert_eq!(
//!     markdown_to_html("Hello ~~there~~ world.\n", &options),
//!     "<p>Hello <del>there</del> world.</p>\n"
//! );
//! ```
//!
//! For anything beyond string-in/string-out, allocate the tree yourself:
//!
//! ```
//! use splitmark::{parse_document, format_html, Arena, Options};
//!
//! let arena = Arena::new();
//! let options = Options::default();
//! let root = parse_document(&arena, "*Hello* world.\n", &options);
//! let mut html = String::new();
//! format_html(root, &options, &mut html).unwrap();
//! assert_eq!(html, "<p><em>Hello</em> world.</p>\n");
//! ```

mod arena;
mod character_set;
mod ctype;
pub mod dom;
pub mod editor;
mod emoji;
mod entity;
pub mod format;
pub mod html;
pub mod lexer;
pub mod nodes;
pub mod parser;
mod scanners;
mod strings;
pub mod typography;

#[cfg(test)]
mod tests;

pub use crate::arena::Node;
pub use crate::html::Anchorizer;
pub use crate::nodes::AstNode;
pub use crate::parser::{
    parse_document, parse_document_with_refmap, ExtensionOptions, Options, ParseOptions, RefMap,
    RenderOptions,
};
pub use crate::strings::CARET;

/// The arena document trees are allocated in.
pub type Arena<'a> = typed_arena::Arena<AstNode<'a>>;

pub use crate::format::format_document as format_commonmark;
pub use crate::html::format_document as format_html;

/// Renders Markdown to HTML.
pub fn markdown_to_html(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, md, options);
    let mut out = String::new();
    format_html(root, options, &mut out).unwrap();
    out
}

/// Round-trips Markdown through the tree back to canonical Markdown.
pub fn markdown_to_commonmark(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, md, options);
    let mut out = String::new();
    format_commonmark(root, options, &mut out).unwrap();
    out
}

/// Renders Markdown to the Split-View editor DOM.
pub fn markdown_to_split_view(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let (root, refmap) = parse_document_with_refmap(&arena, md, options);
    editor::sv::render_document_with_refs(root, options, &refmap)
}

/// Renders Markdown to the Instant-Render editor DOM.
pub fn markdown_to_instant_render(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, md, options);
    editor::ir::render_document(root, options)
}

/// Renders Markdown to the WYSIWYG editor DOM.
pub fn markdown_to_wysiwyg(md: &str, options: &Options) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, md, options);
    editor::wysiwyg::render_document(root, options)
}

/// Converts an editor DOM fragment back to canonical Markdown: the editing
/// round trip's other half.
pub fn fragment_to_markdown(fragment: &str, options: &Options) -> Result<String, dom::DomError> {
    let arena = Arena::new();
    let root = dom::fragment_to_tree(&arena, fragment, options)?;
    let mut out = String::new();
    format_commonmark(root, options, &mut out).unwrap();
    Ok(out)
}

/// Parses an editor DOM fragment and re-renders it as WYSIWYG DOM, as the
/// editor does after every structural edit.
pub fn spin_wysiwyg_dom(fragment: &str, options: &Options) -> Result<String, dom::DomError> {
    let arena = Arena::new();
    let root = dom::fragment_to_tree(&arena, fragment, options)?;
    let mut assigner = 0u32;
    for node in root.descendants() {
        let mut ast = node.data.borrow_mut();
        if ast.value.block() {
            assigner += 1;
            ast.node_id = assigner;
        }
    }
    Ok(editor::wysiwyg::render_document(root, options))
}
