pub mod agent;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod stream;
pub mod tools;

#[cfg(test)]
mod testing;
