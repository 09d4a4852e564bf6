//! Knowledge store and vector index kept side by side
//!
//! Position `i` of the index is the embedding of `entries[i]`. Both are
//! filled once, in file order, when the retriever is built and are read-only
//! afterwards, so a shared `&Retriever` can serve concurrent queries.


use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::embeddings::{Embedder, Embedding};
use crate::index::FlatL2Index;
use crate::knowledge::{KnowledgeEntry, LoadedKnowledge};
use crate::{AssistantError, Result};

/// A stored entry returned for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub entry: &'a KnowledgeEntry,
    pub position: usize,
    pub distance: f32,
}

pub struct Retriever {
    entries: Vec<KnowledgeEntry>,
    index: FlatL2Index,
    embedder: Box<dyn Embedder>,
    skipped_entries: usize,
}

impl Retriever {
    /// Embed every loaded entry and index it. Any embedding failure aborts
    /// the build.
    #[inline]
    pub fn build(knowledge: LoadedKnowledge, embedder: Box<dyn Embedder>) -> Result<Self> {
        let LoadedKnowledge { entries, skipped } = knowledge;
        let mut index = FlatL2Index::with_capacity(embedder.dimension(), entries.len());

        let bar = progress_bar(entries.len() as u64);
        for entry in &entries {
            let vector = embed_with(embedder.as_ref(), &entry.combined_text)?;
            index.insert(&vector)?;
            bar.inc(1);
        }
        bar.finish_and_clear();

        info!(
            "Indexed {} knowledge entries ({} skipped, {} truncated)",
            index.len(),
            skipped,
            embedder.truncated_inputs()
        );

        Ok(Self {
            entries,
            index,
            embedder,
            skipped_entries: skipped,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    #[inline]
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn skipped_entries(&self) -> usize {
        self.skipped_entries
    }

    #[inline]
    pub fn truncated_inputs(&self) -> u64 {
        self.embedder.truncated_inputs()
    }

    #[inline]
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        embed_with(self.embedder.as_ref(), text)
    }

    /// Up to `k` entries nearest to `question`, nearest first. Positions
    /// outside the store are dropped.
    #[inline]
    pub fn search(&self, question: &str, k: usize) -> Result<Vec<Match<'_>>> {
        let query = self.embed(question)?;
        let neighbors = self.index.search(&query, k)?;

        let matches: Vec<Match<'_>> = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                self.entries.get(neighbor.position).map(|entry| Match {
                    entry,
                    position: neighbor.position,
                    distance: neighbor.distance,
                })
            })
            .collect();

        debug!(
            "Retrieved {} of {} requested entries",
            matches.len(),
            k
        );
        Ok(matches)
    }
}

fn embed_with(embedder: &dyn Embedder, text: &str) -> Result<Embedding> {
    embedder
        .embed(text)
        .map_err(|e| AssistantError::Embedding(format!("{e:#}")))
}

fn progress_bar(len: u64) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding knowledge base")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len).with_style(style)
}
