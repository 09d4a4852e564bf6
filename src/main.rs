use clap::{Parser, Subcommand};
use hr_assistant::Result;
use hr_assistant::commands::{ask, chat, demo, serve, show_status};
use hr_assistant::config::{Config, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hr-assistant")]
#[command(about = "HR question answering over a curated knowledge base, with a web interface")]
#[command(version)]
struct Cli {
    /// Configuration file to use instead of ~/.hr-assistant/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the knowledge base, language model and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the web interface and JSON API
    Serve {
        /// Address to listen on
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer a single question
    Ask {
        /// The question, in French or English
        question: String,
        /// Number of knowledge entries to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Interactive question/answer session
    Chat,
    /// Run the built-in sample questions
    Demo,
    /// Check credential, knowledge base and model files
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(config_path)?, config_path)?;
            } else {
                run_interactive_config(config_path)?;
            }
        }
        Commands::Serve { host, port } => {
            let mut config = Config::load(config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config).await?;
        }
        Commands::Ask { question, top_k } => {
            let config = Config::load(config_path)?;
            tokio::task::block_in_place(|| ask(&config, &question, top_k))?;
        }
        Commands::Chat => {
            let config = Config::load(config_path)?;
            tokio::task::block_in_place(|| chat(&config))?;
        }
        Commands::Demo => {
            let config = Config::load(config_path)?;
            tokio::task::block_in_place(|| demo(&config))?;
        }
        Commands::Status => {
            show_status(&Config::load(config_path)?)?;
        }
    }

    Ok(())
}
