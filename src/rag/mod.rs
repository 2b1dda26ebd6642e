//! Retrieval-augmented prompting over the regulation corpus.
//!
//! The index turns a question into a context blob, and the composer merges
//! that context with the question into the prompt sent for inference.

pub mod context;
mod index;
pub mod prompt;

pub use context::{Context, ContextChunk};
pub use index::{CorpusIndex, Retriever};
pub use prompt::compose;
