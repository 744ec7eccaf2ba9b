//! Addressing nodes inside a document tree.

use super::{Block, ListItem, TableCell};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStep {
    /// Child block by index
    Block(usize),
    /// List item by index
    Item(usize),
    /// Table cell by row and column
    Cell {
        /// Row index
        row: usize,
        /// Column index
        column: usize,
    },
}

/// Location of a node, as a sequence of steps from the document root.
///
/// Paths stay valid while nodes are only replaced in place, never inserted or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePath {
    steps: Vec<PathStep>,
}

impl NodePath {
    /// Path to a top-level block.
    pub fn root(index: usize) -> Self {
        Self {
            steps: vec![PathStep::Block(index)],
        }
    }

    /// Extend with a child block step.
    pub fn block(self, index: usize) -> Self {
        self.push(PathStep::Block(index))
    }

    /// Extend with a list item step.
    pub fn item(self, index: usize) -> Self {
        self.push(PathStep::Item(index))
    }

    /// Extend with a table cell step.
    pub fn cell(self, row: usize, column: usize) -> Self {
        self.push(PathStep::Cell { row, column })
    }

    /// Append a step and return self.
    pub fn push(mut self, step: PathStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Steps from the root.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match step {
                PathStep::Block(index) => write!(f, "{}", index)?,
                PathStep::Item(index) => write!(f, "item[{}]", index)?,
                PathStep::Cell { row, column } => write!(f, "cell[{},{}]", row, column)?,
            }
        }
        Ok(())
    }
}

/// Shared reference to a node reached through a [`NodePath`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// A block
    Block(&'a Block),
    /// A list item
    Item(&'a ListItem),
    /// A table cell
    Cell(&'a TableCell),
}

impl<'a> NodeRef<'a> {
    pub(crate) fn child(self, step: &PathStep) -> Option<NodeRef<'a>> {
        match (self, step) {
            (NodeRef::Block(Block::List(list)), PathStep::Item(index)) => {
                list.items.get(*index).map(NodeRef::Item)
            }
            (NodeRef::Block(Block::Table(table)), PathStep::Cell { row, column }) => table
                .rows
                .get(*row)?
                .cells
                .get(*column)
                .map(NodeRef::Cell),
            (NodeRef::Block(block), PathStep::Block(index)) => {
                block.children()?.get(*index).map(NodeRef::Block)
            }
            (NodeRef::Item(item), PathStep::Block(index)) => {
                item.blocks.get(*index).map(NodeRef::Block)
            }
            _ => None,
        }
    }
}

/// Mutable reference to a node reached through a [`NodePath`].
#[derive(Debug)]
pub enum NodeMut<'a> {
    /// A block
    Block(&'a mut Block),
    /// A list item
    Item(&'a mut ListItem),
    /// A table cell
    Cell(&'a mut TableCell),
}

impl<'a> NodeMut<'a> {
    pub(crate) fn child(self, step: &PathStep) -> Option<NodeMut<'a>> {
        match (self, step) {
            (NodeMut::Block(Block::List(list)), PathStep::Item(index)) => {
                list.items.get_mut(*index).map(NodeMut::Item)
            }
            (NodeMut::Block(Block::Table(table)), PathStep::Cell { row, column }) => table
                .rows
                .get_mut(*row)?
                .cells
                .get_mut(*column)
                .map(NodeMut::Cell),
            (NodeMut::Block(block), PathStep::Block(index)) => {
                block.children_mut()?.get_mut(*index).map(NodeMut::Block)
            }
            (NodeMut::Item(item), PathStep::Block(index)) => {
                item.blocks.get_mut(*index).map(NodeMut::Block)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builder() {
        let path = NodePath::root(2).block(0).item(3).block(1);
        assert_eq!(path.depth(), 4);
        assert_eq!(path.steps()[2], PathStep::Item(3));
    }

    #[test]
    fn test_path_display() {
        let path = NodePath::root(1).cell(2, 0);
        assert_eq!(path.to_string(), "1/cell[2,0]");
    }
}
