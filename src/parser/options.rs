//! Engine configuration, split the same way the pipeline is: extension
//! toggles, parse-time behaviour, render-time behaviour.

use rustc_hash::FxHashMap;

#[derive(Default, Debug, Clone)]
pub struct Options {
    pub extension: ExtensionOptions,
    pub parse: ParseOptions,
    pub render: RenderOptions,
}

impl Options {
    /// Everything a split-view editor wants switched on.
    pub fn editor() -> Options {
        Options {
            extension: ExtensionOptions {
                table: true,
                strikethrough: true,
                autolink: true,
                tasklist: true,
                footnotes: true,
                toc: true,
                front_matter: true,
                inline_math: true,
                math_block: true,
                emoji: true,
                highlight: true,
                block_attributes: true,
                heading_anchors: true,
                ..ExtensionOptions::default()
            },
            ..Options::default()
        }
    }
}

/// Feature toggles. Everything defaults to off; the engine is plain
/// CommonMark until asked otherwise.
#[derive(Default, Debug, Clone)]
pub struct ExtensionOptions {
    /// GFM tables.
    pub table: bool,

    /// GFM `~~strikethrough~~`.
    pub strikethrough: bool,

    /// GFM bare autolinks (`www.…`, `http(s)://…`, emails).
    pub autolink: bool,

    /// GFM task-list items (`- [x] done`).
    pub tasklist: bool,

    /// Footnote definitions and references.
    pub footnotes: bool,

    /// A `[toc]` paragraph expands to a table of contents.
    pub toc: bool,

    /// YAML front matter at the very start of the document.
    pub front_matter: bool,

    /// `$…$` inline math.
    pub inline_math: bool,

    /// `$$`-fenced math blocks and `$$…$$` inline display math.
    pub math_block: bool,

    /// `:alias:` emoji expansion.
    pub emoji: bool,

    /// Extra alias table consulted before the built-in one. Values starting
    /// with a scheme or path are treated as image URLs.
    pub emoji_aliases: Option<FxHashMap<String, String>>,

    /// `==mark==` highlights.
    pub highlight: bool,

    /// Kramdown `{: key="val"}` block attribute lists.
    pub block_attributes: bool,

    /// Derive a stable `id` for each heading from its text.
    pub heading_anchors: bool,

    /// Insert spaces at CJK / Latin boundaries in text.
    pub auto_space: bool,

    /// Canonicalise well-known technology names in text.
    pub fix_term_typo: bool,

    /// Convert ASCII punctuation following CJK text to full-width forms.
    pub chinese_punct: bool,

    /// Base joined onto relative link and image destinations at render time.
    pub link_base: Option<String>,

    /// Prefix prepended to every link and image destination at render time.
    pub link_prefix: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct ParseOptions {
    /// Info string applied to fenced code blocks that don't carry one.
    pub default_info_string: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct RenderOptions {
    /// Escape raw HTML instead of omitting it.
    pub escape: bool,

    /// Render soft breaks as `<br />`.
    pub hard_breaks: bool,

    /// Pass raw HTML and dangerous URLs through unchanged.
    pub unsafe_: bool,
}
