// Embeddings module
// Maps text to fixed-length vectors for the retrieval index

pub mod hashing;
pub mod minilm;

use anyhow::Result;

pub use hashing::HashEmbedder;
pub use minilm::MiniLmEmbedder;

/// Output width of all-MiniLM-L6-v2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Longest token sequence the embedding model accepts. Longer input is cut.
pub const MAX_SEQUENCE_TOKENS: usize = 512;

pub type Embedding = Vec<f32>;

/// Text to vector transform shared by the load path and the query path.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector.
pub trait Embedder: Send + Sync {
    /// Length of every vector returned by [`Embedder::embed`]
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Number of inputs cut to [`MAX_SEQUENCE_TOKENS`] so far
    fn truncated_inputs(&self) -> u64 {
        0
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }

    fn truncated_inputs(&self) -> u64 {
        (**self).truncated_inputs()
    }
}
