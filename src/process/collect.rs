//! Traversal: find the nodes a pass has to look at.

use crate::model::{Block, CellStyle, Document, NodePath, NodeRef};

/// What a candidate node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Display math block, replaced as a whole
    MathBlock,
    /// Prose whose substitutions expand macros
    Prose,
    /// List item text
    ListItem,
    /// Table cell text
    TableCell,
    /// Section title
    SectionTitle,
    /// Table cell holding its own document
    NestedDocument,
}

impl CandidateKind {
    /// Whether the candidate carries inline text to scan.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            CandidateKind::Prose
                | CandidateKind::ListItem
                | CandidateKind::TableCell
                | CandidateKind::SectionTitle
        )
    }
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CandidateKind::MathBlock => "math block",
            CandidateKind::Prose => "prose",
            CandidateKind::ListItem => "list item",
            CandidateKind::TableCell => "table cell",
            CandidateKind::SectionTitle => "section title",
            CandidateKind::NestedDocument => "nested document",
        };
        f.write_str(name)
    }
}

/// A node found by traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Where the node is
    pub path: NodePath,
    /// What to do with it
    pub kind: CandidateKind,
}

/// Collect candidates in document order.
///
/// Literal table cells are skipped. AsciiDoc cells are reported as nested
/// documents; their content is not descended into.
pub fn collect(doc: &Document) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (index, block) in doc.blocks.iter().enumerate() {
        visit_block(block, NodePath::root(index), &mut out);
    }
    out
}

fn visit_block(block: &Block, path: NodePath, out: &mut Vec<Candidate>) {
    match block {
        Block::Math(_) => push(out, &path, CandidateKind::MathBlock),
        Block::Prose(prose) => {
            if prose.expands_macros() {
                push(out, &path, CandidateKind::Prose);
            }
        }
        Block::List(list) => {
            for (i, item) in list.items.iter().enumerate() {
                let item_path = path.clone().item(i);
                push(out, &item_path, CandidateKind::ListItem);
                for (j, child) in item.blocks.iter().enumerate() {
                    visit_block(child, item_path.clone().block(j), out);
                }
            }
        }
        Block::Section(section) => {
            push(out, &path, CandidateKind::SectionTitle);
            for (i, child) in section.blocks.iter().enumerate() {
                visit_block(child, path.clone().block(i), out);
            }
        }
        Block::Compound(compound) => {
            for (i, child) in compound.blocks.iter().enumerate() {
                visit_block(child, path.clone().block(i), out);
            }
        }
        Block::Table(table) => {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.cells.iter().enumerate() {
                    let kind = match cell.style {
                        CellStyle::Literal => continue,
                        CellStyle::AsciiDoc if cell.inner_document.is_some() => {
                            CandidateKind::NestedDocument
                        }
                        CellStyle::AsciiDoc => {
                            log::debug!(
                                "Skipping asciidoc cell {} without a document",
                                path.clone().cell(r, c)
                            );
                            continue;
                        }
                        _ => CandidateKind::TableCell,
                    };
                    push(out, &path.clone().cell(r, c), kind);
                }
            }
        }
        Block::Image(_) | Block::Passthrough(_) => {}
    }
}

fn push(out: &mut Vec<Candidate>, path: &NodePath, kind: CandidateKind) {
    out.push(Candidate {
        path: path.clone(),
        kind,
    });
}

/// Raw text of a text candidate.
pub fn text_of(doc: &Document, candidate: &Candidate) -> Option<String> {
    match (candidate.kind, doc.node(&candidate.path)?) {
        (CandidateKind::Prose, NodeRef::Block(Block::Prose(prose))) => Some(prose.text()),
        (CandidateKind::ListItem, NodeRef::Item(item)) => Some(item.text.clone()),
        (CandidateKind::TableCell, NodeRef::Cell(cell)) => Some(cell.text.clone()),
        (CandidateKind::SectionTitle, NodeRef::Block(Block::Section(section))) => {
            Some(section.title().to_string())
        }
        _ => None,
    }
}
