use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use tracing::{error, info};

use crate::assistant::{Answer, HrAssistant};
use crate::config::{Config, EmbeddingBackend, RetrievalConfig};
use crate::knowledge;

/// Inputs that end an interactive chat session
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "quitter"];

/// Questions run by `demo`
pub const DEMO_QUESTIONS: [&str; 5] = [
    "Comment récupérer ma fiche de paie ?",
    "Quand est-ce que je suis payé ?",
    "Comment poser des congés ?",
    "Quel est le remboursement pour les lunettes ?",
    "How can I check my leave balance?",
];

/// Load the knowledge base, build the index and connect the chat model.
#[inline]
pub fn build_assistant(config: &Config) -> Result<HrAssistant> {
    println!("🚀 Initialisation de l'assistant RH...");
    let assistant =
        HrAssistant::from_config(config).context("Failed to initialise the HR assistant")?;
    println!(
        "✅ Assistant RH initialisé avec succès ({} entrées)",
        assistant.status().entries
    );
    Ok(assistant)
}

/// Start the web interface and JSON API
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    config.require_api_key()?;
    let addr = config.bind_address()?;

    info!("Starting HR assistant server on {}", addr);
    let assistant = tokio::task::spawn_blocking(move || build_assistant(&config))
        .await
        .context("Assistant initialisation task failed")??;

    println!("🌐 Interface web disponible sur: http://{addr}");
    println!("🔗 API disponible sur: http://{addr}/api/ask");
    println!("❌ Arrêt avec Ctrl+C");

    crate::server::serve(assistant, addr)
        .await
        .context("HTTP server failed")
}

/// Answer a single question and print it
#[inline]
pub fn ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let top_k = top_k
        .map(RetrievalConfig::check_top_k)
        .transpose()
        .context("Invalid --top-k")?;
    let assistant = build_assistant(config)?;
    let k = top_k.unwrap_or_else(|| assistant.default_top_k());

    let answer = assistant.query(question, k)?;
    print_answer(&answer);
    Ok(())
}

/// Interactive question loop on the terminal
#[inline]
pub fn chat(config: &Config) -> Result<()> {
    let assistant = build_assistant(config)?;
    let k = assistant.default_top_k();

    println!("🤖 Chatbot RH - Tapez 'quit' pour quitter");
    println!("{}", "=".repeat(50));

    loop {
        println!();
        let input: String = Input::new()
            .with_prompt("👤 Votre question RH")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question")?;

        let question = input.trim();
        if is_quit_command(question) {
            println!("👋 Au revoir ! N'hésitez pas à revenir si vous avez d'autres questions RH.");
            break;
        }
        if question.is_empty() {
            continue;
        }

        println!();
        println!("🤖 Réponse:");
        match assistant.query(question, k) {
            Ok(answer) => print_answer(&answer),
            Err(e) => {
                error!("Query failed: {}", e);
                println!("{}", style(format!("Erreur interne: {e}")).red());
            }
        }
        println!("{}", "-".repeat(50));
    }

    Ok(())
}

/// Run the sample questions and print every answer
#[inline]
pub fn demo(config: &Config) -> Result<()> {
    let assistant = build_assistant(config)?;
    let k = assistant.default_top_k();

    println!("🧪 Tests du chatbot RH:");
    println!("{}", "=".repeat(50));

    for question in DEMO_QUESTIONS {
        println!();
        println!("❓ Question: {question}");
        let answer = assistant.query(question, k)?;
        println!("🤖 Réponse:");
        print_answer(&answer);
        println!("{}", "-".repeat(50));
    }

    Ok(())
}

/// Check configuration, credential, knowledge base and model files without
/// building the index.
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    println!("📊 HR Assistant Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🔑 Credential:");
    match config.require_api_key() {
        Ok(_) => println!("   ✅ GROQ_API_KEY: set"),
        Err(e) => println!("   ❌ {e}"),
    }

    println!("📚 Knowledge Base:");
    println!("   Path: {}", config.knowledge.path.display());
    match knowledge::load_entries(&config.knowledge.path) {
        Ok(loaded) => {
            println!("   ✅ Readable: {} entries", loaded.entries.len());
            if loaded.skipped > 0 {
                println!("   ⚠️  Skipped as empty: {}", loaded.skipped);
            }
        }
        Err(e) => println!("   ❌ {e}"),
    }

    println!("🔢 Embeddings:");
    match config.embedding.backend {
        EmbeddingBackend::MiniLm => {
            let dir = &config.embedding.model_dir;
            println!("   Backend: all-MiniLM-L6-v2 ({})", dir.display());
            for file in ["model.safetensors", "tokenizer.json"] {
                if dir.join(file).is_file() {
                    println!("   ✅ {file}");
                } else {
                    println!("   ❌ {file} missing");
                }
            }
        }
        EmbeddingBackend::Hashing => println!("   Backend: feature hashing (no model files)"),
    }
    println!("   Token limit: {}", config.embedding.max_tokens);

    println!("🤖 Language Model:");
    println!("   API: {}", config.llm.api_url);
    println!("   Model: {}", config.llm.model);

    println!();
    println!("💡 Quick Help:");
    println!("   • Use 'hr-assistant ask \"<question>\"' for a single answer");
    println!("   • Use 'hr-assistant chat' for an interactive session");
    println!("   • Use 'hr-assistant serve' to start the web interface");

    Ok(())
}

fn print_answer(answer: &Answer) {
    match answer {
        Answer::Generated { text, .. } | Answer::NoMatch { text } => println!("{text}"),
        Answer::Failed { text, .. } => println!("{}", style(text).red()),
    }
}

/// Whether `input` ends a chat session, ignoring case.
#[inline]
pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim();
    QUIT_WORDS
        .iter()
        .any(|word| input.eq_ignore_ascii_case(word))
}
