use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::fmt::{self, Write};

use crate::html::{self, Anchorizer};
use crate::nodes::{AstNode, NodeValue};
use crate::parser::Options;

/// State threaded through one HTML render: the output sink, a
/// last-byte-was-newline flag backing [`Context::cr`], and the anchor ids
/// shared between headings and the table of contents.
pub struct Context<'o> {
    output: &'o mut dyn Write,
    last_was_lf: Cell<bool>,

    pub options: &'o Options,

    anchors: Option<FxHashMap<u32, String>>,

    pub(super) footnote_ix: u32,
    pub(super) written_footnote_ix: u32,
}

impl<'o> Context<'o> {
    pub(super) fn new(output: &'o mut dyn Write, options: &'o Options) -> Self {
        Context {
            output,
            last_was_lf: Cell::new(true),
            options,
            anchors: None,
            footnote_ix: 0,
            written_footnote_ix: 0,
        }
    }

    pub(super) fn finish(mut self) -> fmt::Result {
        if self.footnote_ix > 0 {
            self.write_str("</ol>\n</section>\n")?;
        }
        Ok(())
    }

    /// Writes a newline unless the last byte written already was one.
    pub fn cr(&mut self) -> fmt::Result {
        if !self.last_was_lf.get() {
            self.write_str("\n")?;
        }
        Ok(())
    }

    pub fn escape(&mut self, buffer: &str) -> fmt::Result {
        html::escape(self, buffer)
    }

    pub fn escape_href(&mut self, buffer: &str) -> fmt::Result {
        html::escape_href(self, buffer)
    }

    /// The anchor id for a heading node. All heading anchors for the
    /// document are derived once, in document order, so the table of
    /// contents and the headings agree on deduplicated ids.
    pub fn heading_anchor<'a>(&mut self, node: &'a AstNode<'a>) -> Option<String> {
        if self.anchors.is_none() {
            let root = node.ancestors().last().unwrap();
            let mut anchorizer = Anchorizer::new();
            let mut map = FxHashMap::default();
            for n in root.descendants() {
                if let NodeValue::Heading(..) = n.data.borrow().value {
                    let text = html::collect_text(n);
                    map.insert(n.data.borrow().node_id, anchorizer.anchorize(&text));
                }
            }
            self.anchors = Some(map);
        }

        self.anchors
            .as_ref()
            .unwrap()
            .get(&node.data.borrow().node_id)
            .cloned()
    }
}

impl<'o> Write for Context<'o> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let l = s.len();
        if l > 0 {
            self.last_was_lf.set(s.as_bytes()[l - 1] == b'\n');
        }
        self.output.write_str(s)
    }
}

impl<'o> fmt::Debug for Context<'o> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("<splitmark::html::Context>")
    }
}
