use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] knowledge::KnowledgeError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod assistant;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod knowledge;
pub mod language;
pub mod llm;
pub mod retrieval;
pub mod server;
