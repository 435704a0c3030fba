//! Shared types, error model, and configuration for crawlqa.
//!
//! This crate is the foundation depended on by all other crawlqa crates.
//! It provides:
//! - [`CrawlQaError`] — the unified error type
//! - Domain types ([`AgentState`], [`RunId`], [`parse_url_list`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], [`ModelConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelConfig, ModelSection, ScrapeConfig, ScrapeSection, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CrawlQaError, Result};
pub use types::{AgentState, RunId, parse_url_list};
