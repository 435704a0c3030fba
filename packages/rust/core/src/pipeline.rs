//! End-to-end crawl-and-answer pipeline.
//!
//! Wires `research -> draft -> END` and runs it once for a question and a
//! list of URLs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use crawlqa_crawler::{ScrapeProgress, Scraper};
use crawlqa_model::{AnswerModel, BertMaskedLm};
use crawlqa_shared::{
    AgentState, AppConfig, CrawlQaError, ModelConfig, Result, RunId, ScrapeConfig,
};

use crate::agents::{DraftAgent, ResearchAgent};
use crate::graph::{CompiledGraph, END, StateGraph};

/// Node name of the scraping stage.
pub const RESEARCH_NODE: &str = "research";
/// Node name of the answering stage.
pub const DRAFT_NODE: &str = "draft";

// ---------------------------------------------------------------------------
// Config / result
// ---------------------------------------------------------------------------

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// HTTP scraping settings.
    pub scrape: ScrapeConfig,
    /// Model settings.
    pub model: ModelConfig,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            scrape: ScrapeConfig::from(config),
            model: ModelConfig::from(config),
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Run identifier (also recorded on the tracing span).
    pub run_id: RunId,
    /// The final state, answer included.
    pub state: AgentState,
    /// Total elapsed time, model loading included.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: ScrapeProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &PipelineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScrapeProgress for SilentProgress {
    fn scraping(&self, _url: &str) {}
    fn failed(&self, _url: &str, _error: &CrawlQaError) {}
}

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &PipelineResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Build the two-node workflow around a scraper and an answer model.
pub fn build_graph(
    scraper: Scraper,
    model: Arc<dyn AnswerModel>,
    context_chars: usize,
    progress: Arc<dyn ProgressReporter>,
) -> Result<CompiledGraph> {
    let mut graph = StateGraph::new();
    graph
        .add_node(RESEARCH_NODE, ResearchAgent::new(scraper, progress.clone()))
        .add_node(DRAFT_NODE, DraftAgent::new(model, context_chars, progress))
        .set_entry_point(RESEARCH_NODE)
        .add_edge(RESEARCH_NODE, DRAFT_NODE)
        .add_edge(DRAFT_NODE, END);
    graph.compile()
}

/// Load the configured model, then run the pipeline.
pub async fn run(
    config: &PipelineConfig,
    question: &str,
    urls: Vec<String>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<PipelineResult> {
    check_question(question)?;
    progress.phase("Loading model");
    let model = BertMaskedLm::load(&config.model).await?;
    run_with_model(config, Arc::new(model), question, urls, progress).await
}

/// Run the pipeline with an already-loaded model.
#[instrument(skip_all, fields(run_id = tracing::field::Empty, urls = urls.len()))]
pub async fn run_with_model(
    config: &PipelineConfig,
    model: Arc<dyn AnswerModel>,
    question: &str,
    urls: Vec<String>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<PipelineResult> {
    let start = Instant::now();
    let run_id = RunId::new();
    tracing::Span::current().record("run_id", tracing::field::display(&run_id));

    check_question(question)?;

    info!(%run_id, "starting pipeline");

    let scraper = Scraper::new(&config.scrape)?;
    let graph = build_graph(
        scraper,
        model,
        config.model.context_chars,
        progress.clone(),
    )?;

    let state = graph.invoke(AgentState::new(question, urls)).await?;

    let result = PipelineResult {
        run_id,
        state,
        elapsed: start.elapsed(),
    };

    info!(
        sources = result.state.research_data.len(),
        answer_len = result.state.answer.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}

fn check_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(CrawlQaError::validation("question must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers with the first word after the question.
    struct FirstContextWord;

    impl AnswerModel for FirstContextWord {
        fn predict(&self, text: &str) -> Result<String> {
            Ok(text.split_whitespace().nth(1).unwrap_or("?").to_string())
        }

        fn name(&self) -> &str {
            "first-word"
        }
    }

    fn test_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.scrape.timeout = Duration::from_secs(2);
        config
    }

    #[test]
    fn graph_is_research_then_draft() {
        let scraper = Scraper::new(&ScrapeConfig::default()).unwrap();
        let graph = build_graph(
            scraper,
            Arc::new(FirstContextWord),
            512,
            Arc::new(SilentProgress),
        )
        .unwrap();
        assert_eq!(graph.node_order(), vec![RESEARCH_NODE, DRAFT_NODE]);
    }

    #[test]
    fn pipeline_config_uses_defaults() {
        let config = PipelineConfig::from(&AppConfig::default());
        assert_eq!(config.scrape.timeout, Duration::from_secs(5));
        assert_eq!(config.model.context_chars, 512);
        assert_eq!(config.model.model_id, "bert-base-uncased");
    }

    #[tokio::test]
    async fn end_to_end_with_mock_server() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><main>
                    <h1>Rust</h1>
                    <p>Ferris is the mascot.</p>
                    <p>Cargo builds code.</p>
                </main></body></html>"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>never</p>")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/broken", server.uri()),
            "::not-a-url::".to_string(),
            format!("{}/rust", server.uri()),
        ];

        let result = run_with_model(
            &test_config(),
            Arc::new(FirstContextWord),
            "mascot?",
            urls.clone(),
            Arc::new(SilentProgress),
        )
        .await
        .unwrap();

        assert_eq!(result.state.urls, urls);
        assert_eq!(
            result.state.research_data,
            vec!["Ferris is the mascot. Cargo builds code.".to_string()]
        );
        assert_eq!(result.state.answer, "Ferris");
    }

    #[tokio::test]
    async fn no_urls_still_answers() {
        let result = run_with_model(
            &test_config(),
            Arc::new(FirstContextWord),
            "hello",
            vec![],
            Arc::new(SilentProgress),
        )
        .await
        .unwrap();

        assert!(result.state.research_data.is_empty());
        assert_eq!(result.state.answer, "?");
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let err = run_with_model(
            &test_config(),
            Arc::new(FirstContextWord),
            "   ",
            vec![],
            Arc::new(SilentProgress),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CrawlQaError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_model_load() {
        let mut config = test_config();
        // Unresolvable without network; validation must fail first.
        config.model.model_id = "crawlqa-test/does-not-exist".into();
        config.model.cache_dir = Some(std::env::temp_dir().join("crawlqa-empty-cache"));

        let err = run(&config, "", vec![], Arc::new(SilentProgress))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CrawlQaError::Validation { .. }));
    }
}
