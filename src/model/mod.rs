//! Document tree types.
//!
//! The tree is built by an external parser and consumed by an external converter.
//! This crate only rewrites it in place: math blocks become image or passthrough
//! blocks, and text carrying inline math macros is rewritten.

mod block;
mod document;
mod node;
mod table;

pub use block::{
    Block, CompoundBlock, ImageBlock, List, ListItem, ListStyle, MathBlock, PassthroughBlock,
    Prose, Section,
};
pub use document::Document;
pub use node::{NodeMut, NodePath, NodeRef, PathStep};
pub use table::{CellStyle, Table, TableCell, TableRow};

use serde::{Deserialize, Serialize};

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
}
