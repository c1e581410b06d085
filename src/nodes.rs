//! The document tree: node kinds, their payloads, and containment rules.

use crate::arena::Node;
use std::cell::RefCell;

/// A node in the document tree, by kind. Kinds marked **Block** participate
/// in the line-driven block parse; the rest are produced by the inline pass.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// The root. Contains blocks.
    Document,

    /// **Block**. YAML front matter; the literal includes the `---`
    /// delimiter lines. Only ever the first child of Document.
    FrontMatter(String),

    /// **Block**. A block quote. Contains blocks.
    BlockQuote,

    /// **Block**. A bullet or ordered list. Contains items.
    List(NodeList),

    /// **Block**. A list item. Contains blocks.
    Item(NodeList),

    /// **Block**. A task-list item; `Some(symbol)` when checked. Contains
    /// blocks.
    TaskItem(Option<char>),

    /// **Block**. An indented or fenced code block. Literal content, no
    /// children.
    CodeBlock(NodeCodeBlock),

    /// **Block**. One of the seven HTML block types. Literal content.
    HtmlBlock(NodeHtmlBlock),

    /// **Block**. A paragraph. Contains inlines.
    Paragraph,

    /// **Block**. An ATX or setext heading. Contains inlines.
    Heading(NodeHeading),

    /// **Block**. A thematic break. No children.
    ThematicBreak,

    /// **Block**. A footnote definition; contains blocks.
    FootnoteDefinition(NodeFootnoteDefinition),

    /// **Block**. A table. Contains rows.
    Table(NodeTable),

    /// **Block**. A table row; `true` for the header row. Contains cells.
    TableRow(bool),

    /// **Block**. A table cell. Contains inlines.
    TableCell,

    /// **Block**. A dollar-fenced display math block. Literal content.
    MathBlock(NodeMathBlock),

    /// **Block**. A `[toc]` directive, expanded at render time from the
    /// document's headings.
    TableOfContents,

    /// **Block**. A kramdown `{: …}` attribute-list line. The parsed
    /// attributes are also copied onto the preceding block's `Ast`.
    BlockAttributes(String),

    /// **Inline**. Literal text.
    Text(String),

    /// **Inline**. A soft line break.
    SoftBreak,

    /// **Inline**. A hard line break.
    LineBreak,

    /// **Inline**. A code span.
    Code(NodeCode),

    /// **Inline**. Raw inline HTML.
    HtmlInline(String),

    /// **Inline**. A resolved HTML entity; keeps the source spelling so
    /// editors can round-trip it.
    HtmlEntity(NodeHtmlEntity),

    /// **Inline**. Emphasis. First and last children are the framing
    /// [`NodeValue::Marker`]s.
    Emph,

    /// **Inline**. Strong emphasis; marker-framed like `Emph`.
    Strong,

    /// **Inline**. `~~`-delimited strikethrough; marker-framed.
    Strikethrough,

    /// **Inline**. `==`-delimited highlight; marker-framed.
    Highlight,

    /// **Inline**. The literal delimiter run framing an emphasis-family
    /// node. Never appears outside one.
    Marker(String),

    /// **Inline**. A backslash-escaped punctuation character; the single
    /// child holds the escaped character as text.
    Escaped,

    /// **Inline**. A link; children are the link text.
    Link(NodeLink),

    /// **Inline**. An image; children are the alt text.
    Image(NodeLink),

    /// **Inline**. A footnote reference.
    FootnoteReference(NodeFootnoteReference),

    /// **Inline**. Inline (`$…$`) or display (`$$…$$`) math. Literal
    /// content.
    Math(NodeMath),

    /// **Inline**. An `:alias:` emoji.
    Emoji(NodeEmoji),
}

/// How a table column aligns, from the delimiter row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableAlignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeTable {
    pub alignments: Vec<TableAlignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLink {
    /// Destination URL (cleaned: entity-expanded, unescaped, `<>` stripped).
    pub url: String,
    /// Optional title.
    pub title: String,
}

/// The type of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Bullet,
    Ordered,
}

impl Default for ListType {
    fn default() -> ListType {
        ListType::Bullet
    }
}

/// Delimiter after an ordered-list number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDelimType {
    Period,
    Paren,
}

impl Default for ListDelimType {
    fn default() -> ListDelimType {
        ListDelimType::Period
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NodeList {
    pub list_type: ListType,
    /// Spaces before the marker.
    pub marker_offset: usize,
    /// Marker width plus following spaces; item continuation lines must be
    /// indented this far.
    pub padding: usize,
    /// Ordinal of the first item, for ordered lists.
    pub start: usize,
    pub delimiter: ListDelimType,
    /// `-`, `+` or `*`, for bullet lists.
    pub bullet_char: u8,
    /// Whether rendered paragraphs are unwrapped.
    pub tight: bool,
    /// Whether any item is a task item.
    pub is_task_list: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeCodeBlock {
    pub fenced: bool,
    /// `` ` `` or `~` for fenced blocks.
    pub fence_char: u8,
    pub fence_length: usize,
    pub fence_offset: usize,
    /// Info string after the opening fence.
    pub info: String,
    pub literal: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NodeHeading {
    /// 1–6 for ATX, 1–2 for setext.
    pub level: u32,
    pub setext: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeHtmlBlock {
    /// CommonMark HTML block type, 1 through 7.
    pub block_type: u8,
    pub literal: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeCode {
    /// Length of the backtick run; needed to reconstruct source.
    pub num_backticks: usize,
    pub literal: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeHtmlEntity {
    /// The source spelling, e.g. `&amp;`.
    pub origin: String,
    /// The expansion, e.g. `&`.
    pub resolved: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeFootnoteDefinition {
    /// Label with original casing, whitespace-normalised.
    pub name: String,
    pub total_references: u32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeFootnoteReference {
    pub name: String,
    /// Which reference to the same definition this is, starting at 1.
    pub ref_num: u32,
    /// Definition ordinal used for numbering in output.
    pub ix: u32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeMath {
    /// `$$…$$` rather than `$…$`.
    pub display: bool,
    pub literal: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeMathBlock {
    pub fence_offset: usize,
    pub literal: String,
}

/// What an emoji alias resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum EmojiValue {
    /// A Unicode emoji sequence.
    Unicode(String),
    /// An image URL, for aliases without a Unicode rendering.
    Image(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeEmoji {
    pub alias: String,
    /// `None` when the alias is unknown; renderers fall back to the source
    /// text.
    pub resolved: Option<EmojiValue>,
}

impl NodeValue {
    pub fn block(&self) -> bool {
        matches!(
            *self,
            NodeValue::Document
                | NodeValue::FrontMatter(..)
                | NodeValue::BlockQuote
                | NodeValue::List(..)
                | NodeValue::Item(..)
                | NodeValue::TaskItem(..)
                | NodeValue::CodeBlock(..)
                | NodeValue::HtmlBlock(..)
                | NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::ThematicBreak
                | NodeValue::FootnoteDefinition(..)
                | NodeValue::Table(..)
                | NodeValue::TableRow(..)
                | NodeValue::TableCell
                | NodeValue::MathBlock(..)
                | NodeValue::TableOfContents
                | NodeValue::BlockAttributes(..)
        )
    }

    /// Whether raw line text accumulates on this block during the block
    /// parse.
    pub fn accepts_lines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::CodeBlock(..)
                | NodeValue::MathBlock(..)
        )
    }

    /// Whether the inline pass runs on this block's content.
    pub fn contains_inlines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::TableCell
        )
    }

    pub fn text(&self) -> Option<&String> {
        match *self {
            NodeValue::Text(ref t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match *self {
            NodeValue::Text(ref mut t) => Some(t),
            _ => None,
        }
    }
}

/// Per-node state. `content` holds unparsed leaf text between the block and
/// inline passes; after the inline pass a leaf has children XOR content.
#[derive(Debug, Clone)]
pub struct Ast {
    pub value: NodeValue,
    pub content: String,
    pub open: bool,
    pub last_line_blank: bool,
    /// Deterministic per-parse block id, rendered as `data-node-id`. Zero
    /// means unassigned (inline nodes, or ids disabled).
    pub node_id: u32,
    /// Attributes attached by a kramdown attribute list (and heading
    /// anchors), rendered onto the opening tag.
    pub attributes: Vec<(String, String)>,
}

impl Ast {
    pub fn new(value: NodeValue) -> Self {
        Ast {
            value,
            content: String::new(),
            open: true,
            last_line_blank: false,
            node_id: 0,
            attributes: Vec::new(),
        }
    }

    /// A closed node, as the inline pass creates them.
    pub fn inline(value: NodeValue) -> Self {
        Ast {
            open: false,
            ..Ast::new(value)
        }
    }
}

/// The tree node type; see [`crate::arena::Node`].
pub type AstNode<'a> = Node<'a, RefCell<Ast>>;

pub fn last_child_is_open<'a>(node: &'a AstNode<'a>) -> bool {
    node.last_child().map_or(false, |n| n.data.borrow().open)
}

/// Containment rules; [`crate::parser::Parser::add_child`] closes blocks
/// until these are satisfied.
pub fn can_contain_type<'a>(node: &'a AstNode<'a>, child: &NodeValue) -> bool {
    if let NodeValue::Document = *child {
        return false;
    }

    match node.data.borrow().value {
        NodeValue::Document
        | NodeValue::BlockQuote
        | NodeValue::FootnoteDefinition(..)
        | NodeValue::Item(..)
        | NodeValue::TaskItem(..) => {
            child.block() && !matches!(*child, NodeValue::Item(..) | NodeValue::TaskItem(..))
        }

        NodeValue::List(..) => matches!(*child, NodeValue::Item(..) | NodeValue::TaskItem(..)),

        NodeValue::Paragraph
        | NodeValue::Heading(..)
        | NodeValue::Emph
        | NodeValue::Strong
        | NodeValue::Strikethrough
        | NodeValue::Highlight
        | NodeValue::Escaped
        | NodeValue::Link(..)
        | NodeValue::Image(..)
        | NodeValue::TableCell => !child.block(),

        NodeValue::Table(..) => matches!(*child, NodeValue::TableRow(..)),

        NodeValue::TableRow(..) => matches!(*child, NodeValue::TableCell),

        _ => false,
    }
}

/// Whether this list/item subtree ends in a blank line, for tightness.
pub fn ends_with_blank_line<'a>(node: &'a AstNode<'a>) -> bool {
    let mut it = Some(node);
    while let Some(cur) = it {
        if cur.data.borrow().last_line_blank {
            return true;
        }
        match cur.data.borrow().value {
            NodeValue::List(..) | NodeValue::Item(..) | NodeValue::TaskItem(..) => {
                it = cur.last_child()
            }
            _ => it = None,
        };
    }
    false
}

#[macro_export]
macro_rules! node_matches {
    ($node:expr, $( $pat:pat )|+) => {{
        matches!(
            $node.data.borrow().value,
            $( $pat )|+
        )
    }};
}
