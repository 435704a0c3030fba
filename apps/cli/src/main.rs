//! crawlqa CLI — scrape a few pages and ask a masked-language model about them.
//!
//! Prompts for a question and a comma-separated URL list, scrapes the pages,
//! and prints the model's answer.

mod commands;
mod progress;
mod prompt;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
