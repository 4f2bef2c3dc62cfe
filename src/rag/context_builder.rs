//! Numbered context block for the answer prompt.
//!
//! Numbering starts at 1 and is the citation key: marker `[n]` in an answer
//! refers to line `n.` of the block.

use super::document::Document;

pub fn assemble_context(docs: &[Document]) -> String {
    docs.iter()
        .enumerate()
        .map(|(index, doc)| format!("{}. {}", index + 1, doc.page_content))
        .collect::<Vec<_>>()
        .join("\n")
}
