//! all-MiniLM-L6-v2 sentence embeddings on CPU
//!
//! Loads `model.safetensors` and `tokenizer.json` from a Hugging Face model
//! directory, runs the six-layer BERT encoder with candle and mean-pools the
//! last hidden state into one 384-wide vector. Pooled vectors are not
//! normalised, so index distances are raw squared L2.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow, bail};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Embedding as TokenEmbedding, LayerNorm, Linear, VarBuilder};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{EMBEDDING_DIMENSION, Embedder, Embedding, MAX_SEQUENCE_TOKENS};

pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

const INTERMEDIATE_SIZE: usize = 1536;
const NUM_HEADS: usize = 12;
const NUM_LAYERS: usize = 6;
const VOCAB_SIZE: usize = 30522;
const TYPE_VOCAB_SIZE: usize = 2;
const LAYER_NORM_EPS: f64 = 1e-12;

struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    norm: LayerNorm,
}

impl SelfAttention {
    fn load(vb: VarBuilder) -> candle_core::Result<Self> {
        let h = EMBEDDING_DIMENSION;
        let attention = vb.pp("attention");
        Ok(Self {
            query: candle_nn::linear(h, h, attention.pp("self").pp("query"))?,
            key: candle_nn::linear(h, h, attention.pp("self").pp("key"))?,
            value: candle_nn::linear(h, h, attention.pp("self").pp("value"))?,
            output: candle_nn::linear(h, h, attention.pp("output").pp("dense"))?,
            norm: candle_nn::layer_norm(h, LAYER_NORM_EPS, attention.pp("output").pp("LayerNorm"))?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, _) = hidden.dims3()?;
        let head_dim = EMBEDDING_DIMENSION / NUM_HEADS;
        let split_heads = |t: Tensor| -> candle_core::Result<Tensor> {
            t.reshape((batch, seq_len, NUM_HEADS, head_dim))?
                .transpose(1, 2)?
                .contiguous()
        };

        let q = split_heads(self.query.forward(hidden)?)?;
        let k = split_heads(self.key.forward(hidden)?)?;
        let v = split_heads(self.value.forward(hidden)?)?;

        let scores = (q.matmul(&k.t()?)? / (head_dim as f64).sqrt())?;
        let weights = candle_nn::ops::softmax_last_dim(&scores)?;
        let context = weights
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, EMBEDDING_DIMENSION))?;

        let projected = self.output.forward(&context)?;
        self.norm.forward(&(hidden + &projected)?)
    }
}

struct FeedForward {
    up: Linear,
    down: Linear,
    norm: LayerNorm,
}

impl FeedForward {
    fn load(vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            up: candle_nn::linear(
                EMBEDDING_DIMENSION,
                INTERMEDIATE_SIZE,
                vb.pp("intermediate").pp("dense"),
            )?,
            down: candle_nn::linear(
                INTERMEDIATE_SIZE,
                EMBEDDING_DIMENSION,
                vb.pp("output").pp("dense"),
            )?,
            norm: candle_nn::layer_norm(
                EMBEDDING_DIMENSION,
                LAYER_NORM_EPS,
                vb.pp("output").pp("LayerNorm"),
            )?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> candle_core::Result<Tensor> {
        let expanded = self.up.forward(hidden)?.gelu_erf()?;
        let projected = self.down.forward(&expanded)?;
        self.norm.forward(&(hidden + &projected)?)
    }
}

struct EncoderLayer {
    attention: SelfAttention,
    feed_forward: FeedForward,
}

impl EncoderLayer {
    fn load(vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            attention: SelfAttention::load(vb.clone())?,
            feed_forward: FeedForward::load(vb)?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> candle_core::Result<Tensor> {
        let attended = self.attention.forward(hidden)?;
        self.feed_forward.forward(&attended)
    }
}

struct BertEncoder {
    word_embeddings: TokenEmbedding,
    position_embeddings: TokenEmbedding,
    token_type_embeddings: TokenEmbedding,
    embedding_norm: LayerNorm,
    layers: Vec<EncoderLayer>,
    device: Device,
}

impl BertEncoder {
    fn load(weights: &Path, device: &Device) -> candle_core::Result<Self> {
        // SAFETY: the weights file is memory-mapped read-only and stays
        // untouched for the lifetime of the process.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? };

        let emb = vb.pp("embeddings");
        let word_embeddings =
            candle_nn::embedding(VOCAB_SIZE, EMBEDDING_DIMENSION, emb.pp("word_embeddings"))?;
        let position_embeddings = candle_nn::embedding(
            MAX_SEQUENCE_TOKENS,
            EMBEDDING_DIMENSION,
            emb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = candle_nn::embedding(
            TYPE_VOCAB_SIZE,
            EMBEDDING_DIMENSION,
            emb.pp("token_type_embeddings"),
        )?;
        let embedding_norm =
            candle_nn::layer_norm(EMBEDDING_DIMENSION, LAYER_NORM_EPS, emb.pp("LayerNorm"))?;

        let layers = (0..NUM_LAYERS)
            .map(|i| EncoderLayer::load(vb.pp("encoder").pp("layer").pp(i.to_string())))
            .collect::<candle_core::Result<Vec<_>>>()?;

        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            embedding_norm,
            layers,
            device: device.clone(),
        })
    }

    /// Encode one token sequence and mean-pool it to shape `[hidden]`
    fn forward(&self, token_ids: &[u32]) -> candle_core::Result<Tensor> {
        let seq_len = token_ids.len() as u32;
        let ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let positions = Tensor::arange(0u32, seq_len, &self.device)?.unsqueeze(0)?;
        let token_types = ids.zeros_like()?;

        let embedded = ((self.word_embeddings.forward(&ids)?
            + self.position_embeddings.forward(&positions)?)?
            + self.token_type_embeddings.forward(&token_types)?)?;

        let mut hidden = self.embedding_norm.forward(&embedded)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden)?;
        }

        hidden.mean(1)?.squeeze(0)
    }
}

/// Sentence embedder backed by a local copy of all-MiniLM-L6-v2.
pub struct MiniLmEmbedder {
    encoder: BertEncoder,
    tokenizer: Tokenizer,
    truncations: AtomicU64,
}

impl MiniLmEmbedder {
    /// Load weights and tokenizer from `model_dir`. Input longer than
    /// `max_tokens` (at most 512) is truncated.
    #[inline]
    pub fn load(model_dir: &Path, max_tokens: usize) -> Result<Self> {
        let weights = model_dir.join(WEIGHTS_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !weights.is_file() {
            bail!("Model weights not found: {}", weights.display());
        }
        if !tokenizer_path.is_file() {
            bail!("Tokenizer not found: {}", tokenizer_path.display());
        }

        debug!("Loading MiniLM encoder from {}", weights.display());
        let encoder = BertEncoder::load(&weights, &Device::Cpu)
            .with_context(|| format!("Failed to load model weights from {}", weights.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!(
                "Failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            )
        })?;

        // The published tokenizer.json pads and truncates at 128; we embed one
        // text at a time and allow the full model window.
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens.clamp(1, MAX_SEQUENCE_TOKENS),
                ..TruncationParams::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {e}"))?;

        info!("MiniLM embedder ready ({})", model_dir.display());
        Ok(Self {
            encoder,
            tokenizer,
            truncations: AtomicU64::new(0),
        })
    }
}

impl Embedder for MiniLmEmbedder {
    #[inline]
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Embedding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Failed to tokenize input: {e}"))?;

        if !encoding.get_overflowing().is_empty() {
            self.truncations.fetch_add(1, Ordering::Relaxed);
            debug!("Input truncated to {} tokens", encoding.len());
        }

        let pooled = self
            .encoder
            .forward(encoding.get_ids())
            .context("Encoder forward pass failed")?;

        pooled
            .to_vec1::<f32>()
            .context("Failed to read pooled embedding")
    }

    #[inline]
    fn truncated_inputs(&self) -> u64 {
        self.truncations.load(Ordering::Relaxed)
    }
}
