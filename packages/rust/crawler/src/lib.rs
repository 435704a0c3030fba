//! Sequential web scraper and paragraph-text extraction.
//!
//! This crate provides:
//! - [`extract`] — pulls the text of every `<p>` element out of an HTML page
//! - [`engine`] — fetches a list of URLs one by one, skipping failures

pub mod engine;
pub mod extract;

pub use engine::{ScrapeProgress, ScrapeResult, ScrapedPage, Scraper, SilentScrape};
pub use extract::extract_paragraph_text;
