pub mod citations;
pub mod context_builder;
pub mod document;
pub mod retriever;

pub use citations::{extract_citations, resolve_citations};
pub use context_builder::assemble_context;
pub use document::{Document, DocumentMetadata};
pub use retriever::DocumentRetriever;
