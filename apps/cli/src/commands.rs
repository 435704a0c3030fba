//! CLI command definitions, routing, and tracing setup.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use crawlqa_core::pipeline::{self, PipelineConfig};
use crawlqa_shared::{AppConfig, init_config, load_config, load_config_from};
use tracing::info;

use crate::progress::CliProgress;
use crate::prompt::{read_request, write_answer};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// crawlqa — scrape a few pages and ask a masked-language model about them.
#[derive(Parser)]
#[command(
    name = "crawlqa",
    version,
    about = "Scrape web pages and run their text through a BERT masked-language model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.crawlqa/crawlqa.toml.
    #[arg(long, env = "CRAWLQA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `ask` with interactive prompts.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask a question about a list of web pages.
    Ask(AskArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `ask`. Anything not given is prompted for or read from config.
#[derive(Args, Debug, Default)]
pub(crate) struct AskArgs {
    /// Question to answer (prompted for when omitted).
    #[arg(short, long)]
    pub question: Option<String>,

    /// Comma-separated URLs to scrape (prompted for when omitted).
    #[arg(short, long)]
    pub urls: Option<String>,

    /// Hugging Face model id.
    #[arg(long)]
    pub model: Option<String>,

    /// Model repository revision.
    #[arg(long)]
    pub revision: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Characters of scraped text passed to the model.
    #[arg(long)]
    pub context_chars: Option<usize>,

    /// Token budget for the encoder pass.
    #[arg(long)]
    pub max_tokens: Option<usize>,
}

impl AskArgs {
    /// Overlay flag values onto the loaded config.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.model_id = model.clone();
        }
        if let Some(revision) = &self.revision {
            config.model.revision = revision.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.scrape.timeout_secs = secs;
        }
        if let Some(chars) = self.context_chars {
            config.model.context_chars = chars;
        }
        if let Some(tokens) = self.max_tokens {
            config.model.max_input_tokens = tokens;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// only prompts and the answer.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "crawlqa=info",
        1 => "crawlqa=debug",
        _ => "crawlqa=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        None => cmd_ask(config_path, AskArgs::default()).await,
        Some(Command::Ask(args)) => cmd_ask(config_path, args).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(&p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(config_path: Option<PathBuf>, args: AskArgs) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    args.apply(&mut config);
    config.validate()?;

    let request = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout();
        read_request(&mut input, &mut out, args.question.clone(), args.urls.clone())?
    };

    if request.question.trim().is_empty() {
        return Err(eyre!("a question is required"));
    }

    info!(
        urls = request.urls.len(),
        model = %config.model.model_id,
        "answering question"
    );

    let pipeline_config = PipelineConfig::from(&config);
    let progress = Arc::new(CliProgress::new());
    let result = pipeline::run(
        &pipeline_config,
        &request.question,
        request.urls,
        progress,
    )
    .await?;

    write_answer(&mut io::stdout(), &result.state.answer)?;

    info!(
        run_id = %result.run_id,
        elapsed_secs = result.elapsed.as_secs_f64(),
        "done"
    );
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
