#[cfg(test)]
mod tests;

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::{EMBEDDING_DIMENSION, Embedder, Embedding, MAX_SEQUENCE_TOKENS};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Feature-hashing embedder: each lowercase word token bumps one bucket,
/// then the vector is L2-normalised.
///
/// Needs no model files, so it backs offline runs and tests.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
    max_tokens: usize,
    truncations: AtomicU64,
}

impl HashEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
            max_tokens: MAX_SEQUENCE_TOKENS,
            truncations: AtomicU64::new(0),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hash = FNV_OFFSET_BASIS;
        for byte in token.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        (hash % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Embedding> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() > self.max_tokens {
            self.truncations.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Truncating input from {} to {} tokens",
                tokens.len(),
                self.max_tokens
            );
        }

        let mut vector = vec![0.0_f32; self.dimension];
        for token in tokens.iter().take(self.max_tokens) {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }

    #[inline]
    fn truncated_inputs(&self) -> u64 {
        self.truncations.load(Ordering::Relaxed)
    }
}
