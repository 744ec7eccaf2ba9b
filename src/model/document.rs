//! Document-level types.

use super::{Block, NodeMut, NodePath, NodeRef, PathStep};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a document tree.
///
/// Attributes are the document-wide configuration (`stem`, `mathematical-format`,
/// `imagesdir`, ...). Blocks are the top-level nodes in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Top-level blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute and return self.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add a block and return self.
    pub fn with_block(mut self, block: impl Into<Block>) -> Self {
        self.add_block(block);
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// Check whether an attribute is set (to any value).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Add a top-level block.
    pub fn add_block(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Check if the document has any blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the output backend produces HTML.
    ///
    /// Documents without a `backend` attribute are treated as `html5`.
    pub fn is_html_backend(&self) -> bool {
        let backend = self.attr("backend").unwrap_or("html5");
        backend.starts_with("html") || backend.starts_with("xhtml")
    }

    /// Resolve a path to a node.
    pub fn node(&self, path: &NodePath) -> Option<NodeRef<'_>> {
        let mut steps = path.steps().iter();
        let mut current = match steps.next()? {
            PathStep::Block(index) => NodeRef::Block(self.blocks.get(*index)?),
            _ => return None,
        };
        for step in steps {
            current = current.child(step)?;
        }
        Some(current)
    }

    /// Resolve a path to a mutable node.
    pub fn node_mut(&mut self, path: &NodePath) -> Option<NodeMut<'_>> {
        let mut steps = path.steps().iter();
        let mut current = match steps.next()? {
            PathStep::Block(index) => NodeMut::Block(self.blocks.get_mut(*index)?),
            _ => return None,
        };
        for step in steps {
            current = current.child(step)?;
        }
        Some(current)
    }

    /// Count blocks in the tree, including nested ones.
    pub fn total_blocks(&self) -> usize {
        fn count(blocks: &[Block]) -> usize {
            blocks
                .iter()
                .map(|block| {
                    let nested = match block {
                        Block::List(list) => list.items.iter().map(|i| count(&i.blocks)).sum(),
                        other => other.children().map(count).unwrap_or(0),
                    };
                    1 + nested
                })
                .sum()
        }
        count(&self.blocks)
    }
}
