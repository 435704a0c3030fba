//! Model file resolution via the Hugging Face Hub.

use std::path::PathBuf;

use hf_hub::api::tokio::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::{debug, info, instrument};

use crawlqa_shared::{CrawlQaError, ModelConfig, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Local paths of the three files a BERT checkpoint needs.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// `config.json`
    pub config: PathBuf,
    /// `tokenizer.json`
    pub tokenizer: PathBuf,
    /// `model.safetensors`
    pub weights: PathBuf,
}

/// Download (or reuse from cache) the files for `config.model_id`.
#[instrument(skip_all, fields(model_id = %config.model_id, revision = %config.revision))]
pub async fn fetch_model_files(config: &ModelConfig) -> Result<ModelFiles> {
    let mut builder = ApiBuilder::new().with_progress(false);
    if let Some(dir) = &config.cache_dir {
        builder = builder.with_cache_dir(dir.clone());
    }
    let api = builder
        .build()
        .map_err(|e| CrawlQaError::Network(format!("failed to build hub client: {e}")))?;

    let repo = api.repo(Repo::with_revision(
        config.model_id.clone(),
        RepoType::Model,
        config.revision.clone(),
    ));

    info!("resolving model files");

    let files = ModelFiles {
        config: fetch_file(&repo, &config.model_id, CONFIG_FILE).await?,
        tokenizer: fetch_file(&repo, &config.model_id, TOKENIZER_FILE).await?,
        weights: fetch_file(&repo, &config.model_id, WEIGHTS_FILE).await?,
    };

    Ok(files)
}

async fn fetch_file(repo: &ApiRepo, model_id: &str, file: &str) -> Result<PathBuf> {
    let path = repo
        .get(file)
        .await
        .map_err(|e| CrawlQaError::Network(format!("{model_id}: failed to fetch {file}: {e}")))?;
    debug!(file, path = %path.display(), "model file ready");
    Ok(path)
}
