//! CLI progress reporter using an indicatif spinner.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crawlqa_core::pipeline::{PipelineResult, ProgressReporter};
use crawlqa_crawler::ScrapeProgress;
use crawlqa_shared::CrawlQaError;

/// Spinner for long phases; per-URL lines are printed above it.
///
/// When the spinner is hidden (stderr is not a terminal) the lines go to
/// `fallback` instead, since indicatif drops `println` on a hidden bar.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
    fallback: Mutex<Box<dyn Write + Send>>,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self::with_spinner(spinner, Box::new(io::stderr()))
    }

    fn with_spinner(spinner: ProgressBar, fallback: Box<dyn Write + Send>) -> Self {
        Self {
            spinner,
            fallback: Mutex::new(fallback),
        }
    }

    fn line(&self, text: String) {
        if !self.spinner.is_hidden() {
            self.spinner.println(text);
        } else if let Ok(mut out) = self.fallback.lock() {
            let _ = writeln!(out, "{text}");
        }
    }
}

impl ScrapeProgress for CliProgress {
    fn scraping(&self, url: &str) {
        self.line(format!("[Scraping] {url}"));
    }

    fn failed(&self, url: &str, error: &CrawlQaError) {
        self.line(format!("Failed to scrape {url}: {error}"));
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &PipelineResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Error paths never reach `done`.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
