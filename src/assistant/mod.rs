//! Retrieval-augmented answering
//!
//! [`HrAssistant`] owns the retriever and the chat model. It is built once,
//! fully, before anything queries it, and is read-only afterwards.

pub mod prompt;

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, EmbeddingBackend, NoMatchLanguage};
use crate::embeddings::{Embedder, HashEmbedder, MiniLmEmbedder};
use crate::knowledge::{self, LoadedKnowledge};
use crate::language::Language;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, GroqClient};
use crate::retrieval::Retriever;
use crate::{AssistantError, Result};

/// Generation parameters fixed for the lifetime of an assistant
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_k: usize,
    pub no_match_language: NoMatchLanguage,
}

impl AnswerSettings {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            top_k: config.retrieval.top_k,
            no_match_language: config.retrieval.no_match_language,
        }
    }
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything decided before the chat model is called
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    /// Nothing retrieved; answer with the apology in `language`
    NoMatch { language: Language },
    Prompt(Prompt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub language: Language,
    pub context: String,
    pub request: ChatRequest,
    /// "category - subcategory" per matched entry, in match order
    pub sources: Vec<String>,
    pub positions: Vec<usize>,
}

/// Outcome of a query. `text()` is what the end user sees in every case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Generated {
        text: String,
        sources: Vec<String>,
        language: Language,
    },
    NoMatch {
        text: String,
    },
    /// The chat model call failed; `text` carries the error for display
    Failed {
        text: String,
        error: String,
    },
}

impl Answer {
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Self::Generated { text, .. } | Self::NoMatch { text } | Self::Failed { text, .. } => {
                text
            }
        }
    }

    #[inline]
    pub fn into_text(self) -> String {
        match self {
            Self::Generated { text, .. } | Self::NoMatch { text } | Self::Failed { text, .. } => {
                text
            }
        }
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

/// Load counters exposed on the status route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssistantStatus {
    pub entries: usize,
    pub skipped_entries: usize,
    pub truncated_inputs: u64,
}

pub struct HrAssistant {
    retriever: Retriever,
    chat: Box<dyn ChatModel>,
    settings: AnswerSettings,
}

impl HrAssistant {
    #[inline]
    pub fn new(retriever: Retriever, chat: Box<dyn ChatModel>, settings: AnswerSettings) -> Self {
        Self {
            retriever,
            chat,
            settings,
        }
    }

    /// Build the whole pipeline from configuration. The credential is
    /// checked first so a missing key fails before any model is loaded.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let chat = GroqClient::new(&config.llm, api_key)?;

        let knowledge = knowledge::load_entries(&config.knowledge.path)?;
        let embedder = build_embedder(config)?;

        Self::from_parts(knowledge, embedder, Box::new(chat), AnswerSettings::from_config(config))
    }

    /// Index `knowledge` with `embedder` and answer through `chat`.
    #[inline]
    pub fn from_parts(
        knowledge: LoadedKnowledge,
        embedder: Box<dyn Embedder>,
        chat: Box<dyn ChatModel>,
        settings: AnswerSettings,
    ) -> Result<Self> {
        let retriever = Retriever::build(knowledge, embedder)?;
        info!(
            "HR assistant ready with {} entries, model {}",
            retriever.len(),
            settings.model
        );
        Ok(Self::new(retriever, chat, settings))
    }

    #[inline]
    pub fn default_top_k(&self) -> usize {
        self.settings.top_k
    }

    #[inline]
    pub fn settings(&self) -> &AnswerSettings {
        &self.settings
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[inline]
    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            entries: self.retriever.len(),
            skipped_entries: self.retriever.skipped_entries(),
            truncated_inputs: self.retriever.truncated_inputs(),
        }
    }

    /// Retrieve context for `question` and build the chat request, without
    /// calling the model.
    #[inline]
    pub fn compose(&self, question: &str, k: usize) -> Result<Composition> {
        let matches = self.retriever.search(question, k)?;

        if matches.is_empty() {
            let language = match self.settings.no_match_language {
                NoMatchLanguage::French => Language::French,
                NoMatchLanguage::Detected => Language::detect(question),
            };
            debug!("No entries retrieved, answering with the {} apology", language);
            return Ok(Composition::NoMatch { language });
        }

        let context = prompt::build_context(matches.iter().map(|m| m.entry));
        let language = Language::detect(question);

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(prompt::persona(language)),
                ChatMessage::user(prompt::instruction(language, &context, question)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        Ok(Composition::Prompt(Prompt {
            language,
            context,
            request,
            sources: matches.iter().map(|m| m.entry.source_label()).collect(),
            positions: matches.iter().map(|m| m.position).collect(),
        }))
    }

    /// Answer `question` from the `k` nearest entries. Chat model failures
    /// come back as [`Answer::Failed`]; `Err` means the question itself could
    /// not be embedded or searched.
    #[inline]
    pub fn query(&self, question: &str, k: usize) -> Result<Answer> {
        let composed = match self.compose(question, k)? {
            Composition::NoMatch { language } => {
                return Ok(Answer::NoMatch {
                    text: prompt::no_match(language).to_string(),
                });
            }
            Composition::Prompt(composed) => composed,
        };

        match self.chat.complete(&composed.request) {
            Ok(mut text) => {
                text.push_str(&prompt::format_sources(&composed.sources));
                Ok(Answer::Generated {
                    text,
                    sources: composed.sources,
                    language: composed.language,
                })
            }
            Err(e) => {
                warn!("Answer generation failed: {:#}", e);
                Ok(Answer::Failed {
                    text: prompt::generation_error(&e),
                    error: format!("{e:#}"),
                })
            }
        }
    }
}

fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    let embedding = &config.embedding;
    match embedding.backend {
        EmbeddingBackend::MiniLm => {
            let embedder = MiniLmEmbedder::load(&embedding.model_dir, embedding.max_tokens)
                .map_err(|e| AssistantError::Embedding(format!("{e:#}")))?;
            Ok(Box::new(embedder))
        }
        EmbeddingBackend::Hashing => Ok(Box::new(
            HashEmbedder::default().with_max_tokens(embedding.max_tokens),
        )),
    }
}
