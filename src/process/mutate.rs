//! Writing rendered results back into the tree.

use super::collect::{Candidate, CandidateKind};
use crate::error::{Error, Result};
use crate::model::{Alignment, Block, Document, ImageBlock, MathBlock, NodeMut, PassthroughBlock};
use crate::render::RenderedArtifact;
use std::mem;

/// Replace the block at the candidate's path, returning the old block.
pub fn replace_block(doc: &mut Document, candidate: &Candidate, replacement: Block) -> Result<Block> {
    match doc.node_mut(&candidate.path) {
        Some(NodeMut::Block(block)) => Ok(mem::replace(block, replacement)),
        _ => Err(missing(candidate)),
    }
}

/// Overwrite the text of a text candidate.
///
/// Section titles drop their cached converted form.
pub fn set_text(doc: &mut Document, candidate: &Candidate, text: String) -> Result<()> {
    match (candidate.kind, doc.node_mut(&candidate.path)) {
        (CandidateKind::Prose, Some(NodeMut::Block(Block::Prose(prose)))) => prose.set_text(&text),
        (CandidateKind::ListItem, Some(NodeMut::Item(item))) => item.text = text,
        (CandidateKind::TableCell, Some(NodeMut::Cell(cell))) => cell.text = text,
        (CandidateKind::SectionTitle, Some(NodeMut::Block(Block::Section(section)))) => {
            section.set_title(text)
        }
        _ => return Err(missing(candidate)),
    }
    Ok(())
}

/// Image block referencing a rendered file, keeping the math block's id and title.
pub fn image_block(math: &MathBlock, artifact: &RenderedArtifact, alt: String) -> Block {
    let mut image = ImageBlock::new(artifact.target.clone().unwrap_or_default(), alt);
    image.id = math.id.clone();
    image.title = math.title.clone();
    image.align = Some(Alignment::Center);
    image.width = artifact.width;
    image.height = artifact.height;
    Block::Image(image)
}

/// Passthrough block embedding rendered markup, keeping the math block's id and title.
pub fn passthrough_block(math: &MathBlock, artifact: &RenderedArtifact) -> Block {
    let mut pass = PassthroughBlock::new(format!(
        "<div class=\"stemblock\"> {} </div>",
        artifact.markup()
    ));
    pass.id = math.id.clone();
    pass.title = math.title.clone();
    Block::Passthrough(pass)
}

fn missing(candidate: &Candidate) -> Error {
    Error::Other(format!(
        "no {} at {}",
        candidate.kind, candidate.path
    ))
}
