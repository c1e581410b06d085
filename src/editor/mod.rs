//! The editor-facing renderers and their shared machinery.
//!
//! All three renderers emit HTML whose every syntactic token is wrapped in a
//! `<span data-type="…">`, so a browser-side editor can reconstruct the
//! Markdown source from the rendered form. They differ in how much rendered
//! comfort they add around the source tokens:
//!
//! * [`sv`] is the Split-View: a pure source view, line structure carried
//!   by newline spans.
//! * [`ir`] is Instant-Render: rendered blocks with marker spans kept
//!   alongside, block roots carrying `data-node-id`.
//! * [`wysiwyg`] is the rendered view, with only enough data attributes to
//!   map the DOM back onto the tree.

pub mod ir;
pub mod sv;
pub mod wysiwyg;

use std::fmt::Write;

use crate::html;
use crate::nodes::AstNode;
use crate::strings::CARET;

/// The caret sentinel's DOM form.
pub const CARET_DOM: &str = "<wbr>";

/// An output buffer that remembers its recent tail, so renderers can ask
/// "did I just write X" (newline spans, markers) without rescanning the
/// whole output.
pub(crate) struct EdWriter {
    buf: String,
    tail: Vec<u8>,
}

const TAIL_KEEP: usize = 1024;

impl EdWriter {
    pub fn new() -> EdWriter {
        EdWriter {
            buf: String::new(),
            tail: Vec::new(),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.buf.push_str(s);
        self.tail.extend_from_slice(s.as_bytes());
        if self.tail.len() > TAIL_KEEP {
            let excess = self.tail.len() - TAIL_KEEP / 2;
            self.tail.drain(..excess);
        }
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.tail.ends_with(suffix.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes `<name attrs…>`; `name` may be `/name` for a closing tag.
    pub fn tag(&mut self, name: &str, attrs: &[(&str, &str)], self_close: bool) {
        let mut t = String::with_capacity(16);
        t.push('<');
        t.push_str(name);
        for (k, v) in attrs {
            let mut escaped = String::new();
            let _ = html::escape(&mut escaped, v);
            let _ = write!(t, " {}=\"{}\"", k, escaped);
        }
        if self_close {
            t.push_str(" /");
        }
        t.push('>');
        self.push_str(&t);
    }

    pub fn escaped(&mut self, text: &str) {
        let mut out = String::with_capacity(text.len());
        let _ = html::escape(&mut out, text);
        self.push_str(&out);
    }

    pub fn into_inner(self) -> String {
        self.buf
    }
}

/// Swaps the caret sentinel for its DOM form; the last step of every editor
/// render.
pub fn caret_to_dom(output: String) -> String {
    if output.contains(CARET) {
        output.replace(CARET, CARET_DOM)
    } else {
        output
    }
}

/// Swaps the caret's DOM form back to the sentinel; the first step of DOM
/// conversion.
pub fn caret_from_dom(fragment: &str) -> String {
    fragment.replace(CARET_DOM, CARET)
}

/// The stable id attribute value for a block node.
pub(crate) fn node_id<'a>(node: &'a AstNode<'a>) -> String {
    format!("n-{}", node.data.borrow().node_id)
}
