
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, EmbeddingBackend, LlmConfig, NoMatchLanguage};
use crate::knowledge;

#[inline]
pub fn run_interactive_config(path: Option<&Path>) -> Result<()> {
    eprintln!("{}", style("🔧 HR Assistant Configuration Setup").bold().cyan());
    eprintln!();

    let config_path = resolve_path(path)?;
    let mut config = load_existing_config(&config_path)?;

    eprintln!("{}", style("Knowledge Base").bold().yellow());
    configure_knowledge(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Language Model").bold().yellow());
    eprintln!("Any OpenAI-compatible chat-completion API. The key is read from GROQ_API_KEY.");
    configure_llm(&mut config.llm)?;

    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Checking knowledge base...").yellow());
    match knowledge_summary(&config.knowledge.path) {
        Ok(count) => eprintln!(
            "{}",
            style(format!("✓ Knowledge base readable ({count} entries)")).green()
        ),
        Err(e) => {
            eprintln!(
                "{}",
                style("⚠ Warning: knowledge base could not be read").yellow()
            );
            eprintln!("  {e}");
            eprintln!("The server will refuse to start until the file is fixed.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config
            .save_to(&config_path)
            .context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config, path: Option<&Path>) -> Result<()> {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Knowledge Base:").bold().yellow());
    eprintln!(
        "  Path: {}",
        style(config.knowledge.path.display()).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embeddings:").bold().yellow());
    eprintln!("  Backend: {}", style(format!("{:?}", config.embedding.backend)).cyan());
    eprintln!(
        "  Model Dir: {}",
        style(config.embedding.model_dir.display()).cyan()
    );
    eprintln!("  Max Tokens: {}", style(config.embedding.max_tokens).cyan());

    eprintln!();
    eprintln!("{}", style("Language Model:").bold().yellow());
    match config.llm.api_url() {
        Ok(url) => eprintln!("  API URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  API URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  Temperature: {}", style(config.llm.temperature).cyan());
    eprintln!("  Max Tokens: {}", style(config.llm.max_tokens).cyan());
    let key_status = if config.llm.api_key.is_some() {
        style("set").green()
    } else {
        style("not set").red()
    };
    eprintln!("  API Key: {}", key_status);

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  No-match reply: {}",
        style(format!("{:?}", config.retrieval.no_match_language)).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Server:").bold().yellow());
    eprintln!(
        "  Listen: {}",
        style(format!("{}:{}", config.server.host, config.server.port)).cyan()
    );

    let config_path = resolve_path(path)?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path().context("Failed to get config file path"),
    }
}

fn load_existing_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        return Ok(Config::default());
    }

    Config::from_file(path).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("Existing configuration is unreadable. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_knowledge(config: &mut Config) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("Knowledge base JSON file")
        .default(config.knowledge.path.display().to_string())
        .interact_text()?;
    config.knowledge.path = PathBuf::from(path);

    let backends = &["minilm", "hashing"];
    let default_index = match config.embedding.backend {
        EmbeddingBackend::MiniLm => 0,
        EmbeddingBackend::Hashing => 1,
    };
    let backend_index = Select::new()
        .with_prompt("Embedding backend")
        .default(default_index)
        .items(backends)
        .interact()?;
    config.embedding.backend = if backend_index == 0 {
        EmbeddingBackend::MiniLm
    } else {
        EmbeddingBackend::Hashing
    };

    if config.embedding.backend == EmbeddingBackend::MiniLm {
        let model_dir: String = Input::new()
            .with_prompt("all-MiniLM-L6-v2 model directory")
            .default(config.embedding.model_dir.display().to_string())
            .interact_text()?;
        config.embedding.model_dir = PathBuf::from(model_dir);
    }

    Ok(())
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    let api_url: String = Input::new()
        .with_prompt("API base URL")
        .default(llm.api_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let candidate = LlmConfig {
                api_url: input.clone(),
                ..LlmConfig::default()
            };
            candidate.api_url().map(|_| ())
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(llm.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(llm.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    llm.set_api_url(api_url)?;
    llm.set_model(model)?;
    llm.set_temperature(temperature)?;

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let top_k: usize = Input::new()
        .with_prompt("Entries retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=50).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 50")
            }
        })
        .interact_text()?;
    config.retrieval.top_k = top_k;

    let choices = &["always French", "question language"];
    let default_index = match config.retrieval.no_match_language {
        NoMatchLanguage::French => 0,
        NoMatchLanguage::Detected => 1,
    };
    let choice = Select::new()
        .with_prompt("Language of the reply when nothing matches")
        .default(default_index)
        .items(choices)
        .interact()?;
    config.retrieval.no_match_language = if choice == 0 {
        NoMatchLanguage::French
    } else {
        NoMatchLanguage::Detected
    };

    Ok(())
}

fn knowledge_summary(path: &Path) -> Result<usize> {
    let loaded = knowledge::load_entries(path)?;
    Ok(loaded.entries.len())
}
