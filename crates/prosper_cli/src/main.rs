use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use prosper_core::{EntityStore, ProsperConfig};
use prosper_engagement::{EngagementClassifier, SuggestionGenerator};
use prosper_reasoning::{providers, CompletionParams, HolisticReporter};
use prosper_store::{MemoryStore, SqliteStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod seed;

#[derive(Parser, Debug)]
#[command(name = "prosper", author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file (defaults are used if it is missing)
    #[arg(short, long, env = "PROSPER_CONFIG", default_value = "prosper.toml")]
    config: PathBuf,

    /// SQLite database path (overrides store.db_path)
    #[arg(long)]
    db: Option<String>,

    /// Use a throwaway in-process store, pre-filled with demo data
    #[arg(long, conflicts_with = "db")]
    memory: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the engagement classifier once over all users
    Engagement,
    /// Generate proactive suggestions once over all users
    Suggestions,
    /// Produce a holistic progress report for one user
    Report {
        #[arg(long)]
        user: String,
    },
    /// Insert demo users and records
    Seed,
    /// Serve the HTTP endpoints
    #[cfg(feature = "gateway")]
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_store(cli: &Cli, config: &ProsperConfig) -> Result<Arc<dyn EntityStore>> {
    if cli.memory {
        let store = Arc::new(MemoryStore::new());
        seed::seed_demo(store.as_ref(), Utc::now()).await?;
        info!("Using in-memory store with demo data");
        return Ok(store);
    }
    let path = cli.db.clone().unwrap_or_else(|| config.store.db_path.clone());
    info!("Opening store at {}", path);
    let store = SqliteStore::new(&path)
        .await
        .with_context(|| format!("Failed to open store at {}", path))?;
    Ok(Arc::new(store))
}

fn build_reporter(store: Arc<dyn EntityStore>, config: &ProsperConfig) -> Result<HolisticReporter> {
    let llm = providers::from_config(&config.llm)?;
    Ok(HolisticReporter::with_config(
        store,
        llm,
        config.report.clone(),
        CompletionParams::from(&config.llm),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = ProsperConfig::load_or_default(&cli.config);
    let store = open_store(&cli, &config).await?;

    match &cli.command {
        Command::Engagement => {
            let classifier = EngagementClassifier::with_config(store, config.engagement.clone());
            print_json(&classifier.run().await?)?;
        }
        Command::Suggestions => {
            let generator = SuggestionGenerator::with_config(store, config.suggestions.clone());
            print_json(&generator.run().await?)?;
        }
        Command::Report { user } => {
            let reporter = build_reporter(store, &config)?;
            print_json(&reporter.generate(user, Utc::now()).await?)?;
        }
        Command::Seed => {
            print_json(&seed::seed_demo(store.as_ref(), Utc::now()).await?)?;
        }
        #[cfg(feature = "gateway")]
        Command::Serve { host, port } => {
            use prosper_gateway::{AppState, GatewayServer};

            let state = AppState {
                store: store.clone(),
                classifier: Arc::new(EngagementClassifier::with_config(
                    store.clone(),
                    config.engagement.clone(),
                )),
                generator: Arc::new(SuggestionGenerator::with_config(
                    store.clone(),
                    config.suggestions.clone(),
                )),
                reporter: Arc::new(build_reporter(store, &config)?),
            };
            let host = host.clone().unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            GatewayServer::new(state, &host, port).serve().await?;
        }
    }

    Ok(())
}
