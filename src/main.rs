use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use llm7_chat::catalog::{Modality, ModelCatalog};
use llm7_chat::chat::replies;
use llm7_chat::chat::{ChatHandler, Reply};
use llm7_chat::inference::{ClientSettings, CompletionBackend, InferenceClient};
use llm7_chat::repl::{self, ReplOptions};
use llm7_chat::session::{InMemorySessionStore, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use llm7_chat::smoke::{self, DEFAULT_SMOKE_MODELS};

#[derive(Parser)]
#[command(name = "llm7-chat")]
#[command(about = "Terminal chat for the LLM7.io OpenAI-compatible API", long_about = None)]
struct Cli {
    /// Model catalog file (default: $LLM7_CONFIG, then config/config.yaml upward from cwd)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (default: $LLM7_BASE_URL, then https://api.llm7.io/v1)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat(ChatArgs),
    /// Print the full model catalog
    Models {
        /// Only models from this provider
        #[arg(long)]
        provider: Option<String>,
        /// Only models accepting this modality (text or image)
        #[arg(long)]
        modality: Option<Modality>,
    },
    /// Check that the API answers
    SmokeTest {
        /// Models to try, in order (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,
        /// Stream the answer of the first model instead
        #[arg(long)]
        stream: bool,
    },
}

#[derive(Args, Default)]
struct ChatArgs {
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    #[arg(long)]
    max_tokens: Option<u32>,
    /// Print answers as they arrive
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = llm7_chat::init_tracing().context("failed to initialize logging")?;

    let cwd = std::env::current_dir().unwrap_or_default();
    let catalog = Arc::new(ModelCatalog::discover(cli.config.as_deref(), &cwd));
    let settings = ClientSettings::resolve(None, cli.base_url.clone());

    match cli.command.unwrap_or(Commands::Chat(ChatArgs::default())) {
        Commands::Chat(args) => chat(catalog, settings, args).await,
        Commands::Models { provider, modality } => {
            print_models(&catalog, provider.as_deref(), modality);
            Ok(())
        }
        Commands::SmokeTest { models, stream } => smoke_test(settings, models, stream, &log_path).await,
    }
}

async fn chat(catalog: Arc<ModelCatalog>, settings: ClientSettings, args: ChatArgs) -> Result<()> {
    let options = ReplOptions {
        model: args.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: args.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: args.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        stream: args.stream,
    };

    if catalog.find(&options.model).is_none() {
        tracing::warn!(model = %options.model, "starting model is not in the catalog");
    }

    let mut stdout = std::io::stdout();
    let handler = match InferenceClient::new(settings) {
        Ok(client) => {
            let backend: Arc<dyn CompletionBackend> = Arc::new(client);
            ChatHandler::new(catalog, backend)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize inference client");
            repl::render(&mut stdout, &Reply::error(replies::client_init_failed(&e.to_string())))?;
            ChatHandler::uninitialized(catalog)
        }
    };

    let store = Arc::new(InMemorySessionStore::new());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(&handler, store, &options, stdin, &mut stdout).await?;
    Ok(())
}

fn print_models(catalog: &ModelCatalog, provider: Option<&str>, modality: Option<Modality>) {
    let models: Vec<_> = match provider {
        Some(p) => catalog.filter_by_provider(p),
        None => catalog.models().iter().collect(),
    };

    println!("# Models ({})\n", catalog.source());
    let mut shown = 0;
    for model in models
        .into_iter()
        .filter(|m| modality.map_or(true, |wanted| m.supports(wanted)))
    {
        println!("{:<40} {:<14} {}", model.id, model.owned_by, model.modalities_label());
        shown += 1;
    }
    println!(
        "\n{shown} shown; providers: {}",
        catalog.distinct_providers().join(", ")
    );
}

async fn smoke_test(
    settings: ClientSettings,
    models: Vec<String>,
    stream: bool,
    log_path: &std::path::Path,
) -> Result<()> {
    let client = InferenceClient::new(settings).context("failed to build inference client")?;

    println!("Testing LLM7.io API...");
    println!("Base URL: {}", client.settings().base_url);
    println!(
        "API key: {}",
        if client.settings().is_anonymous() { "anonymous" } else { "set" }
    );

    match client.list_remote_models().await {
        Ok(remote) => println!("Endpoint lists {} models", remote.len()),
        Err(e) => println!("Model listing unavailable: {e}"),
    }

    let models = if models.is_empty() {
        DEFAULT_SMOKE_MODELS.iter().map(|m| m.to_string()).collect()
    } else {
        models
    };

    if stream {
        let model = &models[0];
        println!("\nStreaming from {model}:");
        let mut print_fragment = |fragment: &str| {
            print!("{fragment}");
            let _ = std::io::Write::flush(&mut std::io::stdout());
        };
        let result = smoke::stream_answer(&client, model, &mut print_fragment).await;
        println!();
        if let Err(e) = result {
            anyhow::bail!("streaming from {model} failed: {e} (details in {})", log_path.display());
        }
        return Ok(());
    }

    let report = smoke::run(&client, &models).await;
    println!("\n{}", report.render());
    if report.working_model().is_none() {
        anyhow::bail!("no model answered (details in {})", log_path.display());
    }
    Ok(())
}
