//! BERT masked-LM prediction head.
//!
//! `transform.dense -> activation -> transform.LayerNorm -> decoder`, where the
//! decoder projects back onto the word-embedding matrix and adds the
//! `cls.predictions.bias` vector.

use candle_core::{Module, Result as CandleResult, Tensor};
use candle_nn::{LayerNorm, Linear, VarBuilder};
use serde::Deserialize;

use crawlqa_shared::{CrawlQaError, Result};

/// The subset of `config.json` the head needs.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}
fn default_hidden_act() -> String {
    "gelu".into()
}

impl HeadConfig {
    /// Parse from the contents of a `config.json`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CrawlQaError::Model(format!("invalid model config: {e}")))
    }
}

/// Nonlinearity between the dense layer and the layer norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadActivation {
    /// Exact (erf) GELU, what BERT checkpoints call `gelu`.
    Gelu,
    /// Tanh-approximated GELU.
    GeluApprox,
    Relu,
}

impl HeadActivation {
    /// Map a Hugging Face `hidden_act` name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "gelu" => Ok(Self::Gelu),
            "gelu_new" | "gelu_pytorch_tanh" | "gelu_fast" => Ok(Self::GeluApprox),
            "relu" => Ok(Self::Relu),
            other => Err(CrawlQaError::Model(format!(
                "unsupported hidden_act '{other}'"
            ))),
        }
    }

    fn apply(self, xs: &Tensor) -> CandleResult<Tensor> {
        match self {
            Self::Gelu => xs.gelu_erf(),
            Self::GeluApprox => xs.gelu(),
            Self::Relu => xs.relu(),
        }
    }
}

/// Masked-LM head producing vocabulary logits for every position.
#[derive(Debug, Clone)]
pub struct MaskedLmHead {
    dense: Linear,
    activation: HeadActivation,
    layer_norm: LayerNorm,
    decoder: Linear,
}

impl MaskedLmHead {
    pub fn new(
        dense: Linear,
        activation: HeadActivation,
        layer_norm: LayerNorm,
        decoder: Linear,
    ) -> Self {
        Self {
            dense,
            activation,
            layer_norm,
            decoder,
        }
    }

    /// Load the head from a checkpoint rooted at `vb` (the level holding both
    /// `bert.*` and `cls.*`). The decoder weight is tied to the input word
    /// embeddings.
    pub fn load(vb: VarBuilder, config: &HeadConfig) -> Result<Self> {
        let activation = HeadActivation::from_name(&config.hidden_act)?;
        Self::load_weights(vb, config, activation)
            .map_err(|e| CrawlQaError::Model(format!("failed to load masked-LM head: {e}")))
    }

    fn load_weights(
        vb: VarBuilder,
        config: &HeadConfig,
        activation: HeadActivation,
    ) -> CandleResult<Self> {
        let hidden = config.hidden_size;
        let predictions = vb.pp("cls").pp("predictions");
        let transform = predictions.pp("transform");

        let dense = candle_nn::linear(hidden, hidden, transform.pp("dense"))?;
        let layer_norm =
            candle_nn::layer_norm(hidden, config.layer_norm_eps, transform.pp("LayerNorm"))?;

        let word_embeddings = vb
            .pp("bert")
            .pp("embeddings")
            .pp("word_embeddings")
            .get((config.vocab_size, hidden), "weight")?;
        let bias = predictions.get(config.vocab_size, "bias")?;
        let decoder = Linear::new(word_embeddings, Some(bias));

        Ok(Self::new(dense, activation, layer_norm, decoder))
    }

    /// `[batch, seq, hidden]` -> `[batch, seq, vocab]`
    pub fn forward(&self, hidden_states: &Tensor) -> CandleResult<Tensor> {
        let xs = self.dense.forward(hidden_states)?;
        let xs = self.activation.apply(&xs)?;
        let xs = self.layer_norm.forward(&xs)?;
        self.decoder.forward(&xs)
    }
}
