pub mod generator;
pub mod instructions;
pub mod prompt;
pub mod rewriter;
pub mod web_search;

pub use generator::AnswerGenerator;
pub use rewriter::QueryRewriter;
pub use web_search::WebSearchAgent;
