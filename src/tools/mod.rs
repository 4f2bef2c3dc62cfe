pub mod reranker;
pub mod search;
pub mod vector_math;

pub use reranker::{RerankOptions, Reranker};
pub use search::{build_search_provider, SearchHit, SearchOptions, SearchProvider, SearchResponse};
