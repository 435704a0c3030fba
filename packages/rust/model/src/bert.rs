//! Pretrained BERT with its masked-LM head, used as a one-shot answer model.
//!
//! The whole input is encoded once, every position's vocabulary logits are
//! reduced with argmax, and the resulting token ids are decoded back to text.
//! There is no span selection and no iterative decoding.

use std::path::Path;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, instrument};

use crawlqa_shared::{CrawlQaError, ModelConfig, Result};

use crate::AnswerModel;
use crate::head::{HeadConfig, MaskedLmHead};
use crate::hub::{ModelFiles, fetch_model_files};

fn model_err(e: candle_core::Error) -> CrawlQaError {
    CrawlQaError::Model(e.to_string())
}

fn tokenizer_err(e: tokenizers::Error) -> CrawlQaError {
    CrawlQaError::Tokenizer(e.to_string())
}

/// BERT encoder + masked-LM head + tokenizer.
pub struct BertMaskedLm {
    name: String,
    encoder: BertModel,
    head: MaskedLmHead,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertMaskedLm {
    /// Assemble a model from already-built parts.
    ///
    /// Installs truncation on `tokenizer` so that no encoding exceeds
    /// `max_input_tokens`, special tokens included.
    pub fn new(
        name: impl Into<String>,
        encoder: BertModel,
        head: MaskedLmHead,
        mut tokenizer: Tokenizer,
        max_input_tokens: usize,
        device: Device,
    ) -> Result<Self> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_input_tokens,
                ..Default::default()
            }))
            .map_err(tokenizer_err)?;
        tokenizer.with_padding(None);

        Ok(Self {
            name: name.into(),
            encoder,
            head,
            tokenizer,
            device,
        })
    }

    /// Resolve the checkpoint through the Hub cache and load it on the CPU.
    #[instrument(skip_all, fields(model_id = %config.model_id))]
    pub async fn load(config: &ModelConfig) -> Result<Self> {
        let files = fetch_model_files(config).await?;
        Self::from_files(&config.model_id, &files, config.max_input_tokens)
    }

    /// Load from local `config.json`, `tokenizer.json` and `model.safetensors`.
    pub fn from_files(name: &str, files: &ModelFiles, max_input_tokens: usize) -> Result<Self> {
        let device = Device::Cpu;

        let config_json = read_to_string(&files.config)?;
        let bert_config: BertConfig = serde_json::from_str(&config_json)
            .map_err(|e| CrawlQaError::Model(format!("invalid model config: {e}")))?;
        let head_config = HeadConfig::from_json(&config_json)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(tokenizer_err)?;

        // SAFETY: the weights file is memory-mapped read-only and is not
        // modified while the model is alive.
        let raw: VarBuilder<'static> = unsafe {
            VarBuilder::from_mmaped_safetensors(
                std::slice::from_ref(&files.weights),
                DType::F32,
                &device,
            )
        }
        .map_err(model_err)?;
        let stored = raw.clone();
        let vb = raw.rename_f(move |name| checkpoint_name(&stored, name));

        let encoder = BertModel::load(vb.pp("bert"), &bert_config).map_err(model_err)?;
        let head = MaskedLmHead::load(vb, &head_config)?;

        info!(
            vocab_size = head_config.vocab_size,
            hidden_size = head_config.hidden_size,
            max_input_tokens,
            "masked-LM loaded"
        );

        Self::new(name, encoder, head, tokenizer, max_input_tokens, device)
    }

    /// Argmax token id at every position of `text`'s encoding.
    pub fn predict_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self.tokenizer.encode(text, true).map_err(tokenizer_err)?;
        let ids = encoding.get_ids();
        debug!(tokens = ids.len(), "encoded input");

        let input_ids = Tensor::new(ids, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(model_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(model_err)?;
        let attention_mask = input_ids.ones_like().map_err(model_err)?;

        let hidden = self
            .encoder
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(model_err)?;
        let logits = self.head.forward(&hidden).map_err(model_err)?;

        logits
            .argmax(D::Minus1)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<u32>())
            .map_err(model_err)
    }
}

impl AnswerModel for BertMaskedLm {
    #[instrument(skip_all, fields(model = %self.name, input_chars = text.chars().count()))]
    fn predict(&self, text: &str) -> Result<String> {
        let predicted = self.predict_ids(text)?;
        let answer = self
            .tokenizer
            .decode(&predicted, true)
            .map_err(tokenizer_err)?;
        debug!(answer_len = answer.len(), "decoded prediction");
        Ok(answer)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Older BERT checkpoints name layer-norm parameters `gamma`/`beta` instead
/// of `weight`/`bias`. Maps a requested name onto the one actually stored.
fn checkpoint_name(stored: &VarBuilder, name: &str) -> String {
    if !stored.contains_tensor(name) {
        let legacy = name
            .strip_suffix("LayerNorm.weight")
            .map(|prefix| format!("{prefix}LayerNorm.gamma"))
            .or_else(|| {
                name.strip_suffix("LayerNorm.bias")
                    .map(|prefix| format!("{prefix}LayerNorm.beta"))
            });
        if let Some(legacy) = legacy.filter(|n| stored.contains_tensor(n)) {
            return legacy;
        }
    }
    name.to_string()
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CrawlQaError::io(path, e))
}
