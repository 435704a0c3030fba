//! Masked-language-model answer generation.
//!
//! This crate provides:
//! - [`AnswerModel`] — the seam the pipeline talks to
//! - [`BertMaskedLm`] — a pretrained BERT encoder with its masked-LM head
//! - [`hub`] — model file resolution through the Hugging Face Hub cache

pub mod bert;
pub mod head;
pub mod hub;

use crawlqa_shared::Result;

pub use bert::BertMaskedLm;
pub use head::{HeadConfig, MaskedLmHead};
pub use hub::{ModelFiles, fetch_model_files};

/// Anything that turns input text into an answer string.
pub trait AnswerModel: Send + Sync {
    /// Run the model over `text` and decode its output.
    fn predict(&self, text: &str) -> Result<String>;

    /// Human-readable model name for tracing.
    fn name(&self) -> &str;
}
