//! Knowledge base loading
//!
//! Reads the curated HR question/answer file (a JSON array of entries) and
//! turns it into immutable [`KnowledgeEntry`] records ready for embedding.


use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge base file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read knowledge base file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Knowledge base is not a JSON array of entries: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One entry as it appears in the source file. Every field is optional and
/// `null` is treated the same as absent.
#[derive(Debug, Deserialize)]
struct RawEntry {
    category: Option<String>,
    subcategory: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    paraphrases: Option<Vec<String>>,
}

/// A curated question/answer pair, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub category: String,
    pub subcategory: String,
    pub question: String,
    pub answer: String,
    pub paraphrases: Vec<String>,
    /// Question, answer and paraphrases joined by single spaces. Only used
    /// as embedding input.
    pub combined_text: String,
}

impl KnowledgeEntry {
    #[inline]
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        paraphrases: Vec<String>,
    ) -> Self {
        let question = question.into();
        let answer = answer.into();
        let combined_text = combine_text(&question, &answer, &paraphrases);

        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            question,
            answer,
            paraphrases,
            combined_text,
        }
    }

    /// "category - subcategory", as shown in the consulted sources list
    #[inline]
    pub fn source_label(&self) -> String {
        format!("{} - {}", self.category, self.subcategory)
    }

    fn has_content(&self) -> bool {
        !self.combined_text.trim().is_empty()
    }
}

impl From<RawEntry> for KnowledgeEntry {
    fn from(raw: RawEntry) -> Self {
        Self::new(
            raw.category.unwrap_or_default(),
            raw.subcategory.unwrap_or_default(),
            raw.question.unwrap_or_default(),
            raw.answer.unwrap_or_default(),
            raw.paraphrases.unwrap_or_default(),
        )
    }
}

/// Result of reading a knowledge base file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedKnowledge {
    /// Entries with non-empty combined text, in file order
    pub entries: Vec<KnowledgeEntry>,
    /// Entries dropped because their combined text was blank
    pub skipped: usize,
}

impl LoadedKnowledge {
    #[inline]
    pub fn total(&self) -> usize {
        self.entries.len() + self.skipped
    }
}

fn combine_text(question: &str, answer: &str, paraphrases: &[String]) -> String {
    format!("{} {} {}", question, answer, paraphrases.join(" "))
}

/// Load and normalise the knowledge base at `path`.
#[inline]
pub fn load_entries<P: AsRef<Path>>(path: P) -> Result<LoadedKnowledge, KnowledgeError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(KnowledgeError::NotFound {
            path: path.to_path_buf(),
        });
    }

    debug!("Reading knowledge base from {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| KnowledgeError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = parse_entries(&content)?;
    info!(
        "Loaded {} knowledge entries from {} ({} skipped as empty)",
        loaded.entries.len(),
        path.display(),
        loaded.skipped
    );
    Ok(loaded)
}

/// Parse knowledge base JSON already held in memory.
#[inline]
pub fn parse_entries(json: &str) -> Result<LoadedKnowledge, KnowledgeError> {
    let raw: Vec<RawEntry> = serde_json::from_str(json)?;

    let mut loaded = LoadedKnowledge {
        entries: Vec::with_capacity(raw.len()),
        skipped: 0,
    };

    for entry in raw.into_iter().map(KnowledgeEntry::from) {
        if entry.has_content() {
            loaded.entries.push(entry);
        } else {
            loaded.skipped += 1;
        }
    }

    if loaded.skipped > 0 {
        debug!("Skipped {} entries with empty text", loaded.skipped);
    }

    Ok(loaded)
}
