//! Block-level node types.

use super::{Alignment, Table};
use crate::subs::{Substitution, SubstitutionSet};
use serde::{Deserialize, Serialize};

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Display math block
    Math(MathBlock),

    /// Text-bearing block (paragraph, admonition, listing, ...)
    Prose(Prose),

    /// List of items
    List(List),

    /// Section with a title and nested blocks
    Section(Section),

    /// Table
    Table(Table),

    /// Delimited container (example, sidebar, open block, ...)
    Compound(CompoundBlock),

    /// Block image
    Image(ImageBlock),

    /// Raw output passed through untouched
    Passthrough(PassthroughBlock),
}

impl Block {
    /// Get the block identifier, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Block::Math(b) => b.id.as_deref(),
            Block::Prose(b) => b.id.as_deref(),
            Block::List(b) => b.id.as_deref(),
            Block::Section(b) => b.id.as_deref(),
            Block::Table(b) => b.id.as_deref(),
            Block::Compound(b) => b.id.as_deref(),
            Block::Image(b) => b.id.as_deref(),
            Block::Passthrough(b) => b.id.as_deref(),
        }
    }

    /// Short name of the block kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Math(_) => "math",
            Block::Prose(_) => "prose",
            Block::List(_) => "list",
            Block::Section(_) => "section",
            Block::Table(_) => "table",
            Block::Compound(_) => "compound",
            Block::Image(_) => "image",
            Block::Passthrough(_) => "passthrough",
        }
    }

    /// Child blocks of container blocks.
    ///
    /// List items and table cells are not blocks and are reached separately.
    pub fn children(&self) -> Option<&[Block]> {
        match self {
            Block::Section(s) => Some(&s.blocks),
            Block::Compound(c) => Some(&c.blocks),
            _ => None,
        }
    }

    /// Mutable child blocks of container blocks.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::Section(s) => Some(&mut s.blocks),
            Block::Compound(c) => Some(&mut c.blocks),
            _ => None,
        }
    }
}

/// A display-style math block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathBlock {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Block title
    #[serde(default)]
    pub title: Option<String>,

    /// Notation style: `latexmath`, `asciimath` or `stem`
    pub style: String,

    /// Raw expression source
    pub content: String,

    /// Explicit alt text
    #[serde(default)]
    pub alt: Option<String>,
}

impl MathBlock {
    /// Create a math block with the given style.
    pub fn new(style: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            style: style.into(),
            content: content.into(),
            alt: None,
        }
    }

    /// Create a LaTeX math block.
    pub fn latex(content: impl Into<String>) -> Self {
        Self::new("latexmath", content)
    }

    /// Create an AsciiMath math block.
    pub fn asciimath(content: impl Into<String>) -> Self {
        Self::new("asciimath", content)
    }

    /// Set the identifier and return self.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the title and return self.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the alt text and return self.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }
}

/// A text-bearing block whose content is a sequence of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prose {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Block title
    #[serde(default)]
    pub title: Option<String>,

    /// Block context (`paragraph`, `admonition`, `literal`, ...)
    pub context: String,

    /// Source lines
    pub lines: Vec<String>,

    /// Substitutions the converter applies to this block
    #[serde(default = "SubstitutionSet::normal")]
    pub subs: SubstitutionSet,
}

impl Prose {
    /// Create a block with explicit context and substitutions.
    pub fn new(context: impl Into<String>, text: &str, subs: SubstitutionSet) -> Self {
        Self {
            id: None,
            title: None,
            context: context.into(),
            lines: split_lines(text),
            subs,
        }
    }

    /// Create a paragraph with normal substitutions.
    pub fn paragraph(text: &str) -> Self {
        Self::new("paragraph", text, SubstitutionSet::normal())
    }

    /// Create a literal block (special characters only, no macros).
    pub fn literal(text: &str) -> Self {
        Self::new("literal", text, SubstitutionSet::verbatim())
    }

    /// Get the source text (lines joined with line feeds).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the source text.
    pub fn set_text(&mut self, text: &str) {
        self.lines = split_lines(text);
    }

    /// Whether inline macros are expanded in this block.
    pub fn expands_macros(&self) -> bool {
        self.subs.contains(Substitution::Macros)
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

/// A list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// List title
    #[serde(default)]
    pub title: Option<String>,

    /// List style
    pub style: ListStyle,

    /// Items in the list
    pub items: Vec<ListItem>,
}

impl List {
    /// Create a bulleted list.
    pub fn unordered(items: Vec<ListItem>) -> Self {
        Self {
            id: None,
            title: None,
            style: ListStyle::Unordered { marker: '*' },
            items,
        }
    }

    /// Create a numbered list.
    pub fn ordered(items: Vec<ListItem>) -> Self {
        Self {
            id: None,
            title: None,
            style: ListStyle::Ordered { start: 1 },
            items,
        }
    }
}

/// List style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListStyle {
    /// Ordered (numbered) list
    Ordered {
        /// Starting number
        start: u32,
    },
    /// Unordered (bulleted) list
    Unordered {
        /// Bullet character
        marker: char,
    },
}

/// A list item: a line of principal text plus attached blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Principal text
    pub text: String,

    /// Attached blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl ListItem {
    /// Create an item with text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    /// Attach a block and return self.
    pub fn with_block(mut self, block: impl Into<Block>) -> Self {
        self.blocks.push(block.into());
        self
    }
}

/// A section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Section level (0 = document title)
    pub level: u8,

    /// Raw title source
    title: String,

    /// Blocks in the section
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Converted title, computed on demand
    #[serde(skip)]
    substituted_title: Option<String>,
}

impl Section {
    /// Create a new section.
    pub fn new(title: impl Into<String>, level: u8) -> Self {
        Self {
            id: None,
            level,
            title: title.into(),
            blocks: Vec::new(),
            substituted_title: None,
        }
    }

    /// Add a block to the section.
    pub fn add_block(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Get the raw title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the raw title and drop the cached converted title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.substituted_title = None;
    }

    /// Whether a converted title is cached.
    pub fn has_substituted_title(&self) -> bool {
        self.substituted_title.is_some()
    }

    /// Get the converted title, computing and caching it on first use.
    pub fn substituted_title(&mut self) -> &str {
        let title = &self.title;
        self.substituted_title
            .get_or_insert_with(|| SubstitutionSet::verbatim().apply(title, None))
    }
}

/// A delimited container holding other blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundBlock {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Block title
    #[serde(default)]
    pub title: Option<String>,

    /// Block context (`example`, `sidebar`, `open`, ...)
    pub context: String,

    /// Nested blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl CompoundBlock {
    /// Create a container with nested blocks.
    pub fn new(context: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: None,
            title: None,
            context: context.into(),
            blocks,
        }
    }
}

/// A block image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Block title
    #[serde(default)]
    pub title: Option<String>,

    /// Image target, relative to the images directory
    pub target: String,

    /// Alt text
    pub alt: String,

    /// Horizontal alignment
    #[serde(default)]
    pub align: Option<Alignment>,

    /// Declared width
    #[serde(default)]
    pub width: Option<u32>,

    /// Declared height
    #[serde(default)]
    pub height: Option<u32>,
}

impl ImageBlock {
    /// Create an image block.
    pub fn new(target: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            target: target.into(),
            alt: alt.into(),
            align: None,
            width: None,
            height: None,
        }
    }
}

/// Raw markup inserted into the output as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassthroughBlock {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Block title
    #[serde(default)]
    pub title: Option<String>,

    /// Raw content
    pub content: String,
}

impl PassthroughBlock {
    /// Create a passthrough block.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            content: content.into(),
        }
    }
}

macro_rules! impl_into_block {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Block {
                fn from(value: $ty) -> Self {
                    Block::$variant(value)
                }
            }
        )*
    };
}

impl_into_block! {
    MathBlock => Math,
    Prose => Prose,
    List => List,
    Section => Section,
    Table => Table,
    CompoundBlock => Compound,
    ImageBlock => Image,
    PassthroughBlock => Passthrough,
}
