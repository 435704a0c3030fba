//! The two workflow nodes: `research` scrapes, `draft` answers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crawlqa_crawler::Scraper;
use crawlqa_model::AnswerModel;
use crawlqa_shared::{AgentState, Result};

use crate::graph::Node;
use crate::pipeline::ProgressReporter;

/// Scrapes every URL in the state and stores the text it got.
pub struct ResearchAgent {
    scraper: Scraper,
    progress: Arc<dyn ProgressReporter>,
}

impl ResearchAgent {
    pub fn new(scraper: Scraper, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { scraper, progress }
    }
}

#[async_trait]
impl Node for ResearchAgent {
    #[instrument(skip_all, fields(urls = state.urls.len()))]
    async fn run(&self, state: AgentState) -> Result<AgentState> {
        self.progress.phase("Scraping pages");
        let result = self.scraper.scrape_all(&state.urls, self.progress.as_ref()).await;
        Ok(state.with_research_data(result.texts()))
    }
}

/// Feeds the question plus truncated research text to the answer model.
pub struct DraftAgent {
    model: Arc<dyn AnswerModel>,
    context_chars: usize,
    progress: Arc<dyn ProgressReporter>,
}

impl DraftAgent {
    pub fn new(
        model: Arc<dyn AnswerModel>,
        context_chars: usize,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            model,
            context_chars,
            progress,
        }
    }
}

#[async_trait]
impl Node for DraftAgent {
    #[instrument(skip_all, fields(model = %self.model.name()))]
    async fn run(&self, state: AgentState) -> Result<AgentState> {
        self.progress.phase("Generating answer");

        let context = build_context(&state.research_data, self.context_chars);
        let input = format!("{} {}", state.question, context);
        info!(
            context_chars = context.chars().count(),
            sources = state.research_data.len(),
            "running model"
        );

        let answer = self.model.predict(&input)?;
        Ok(state.with_answer(answer))
    }
}

/// Join scraped texts with spaces and keep at most `max_chars` characters.
pub fn build_context(research_data: &[String], max_chars: usize) -> String {
    research_data.join(" ").chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::pipeline::SilentProgress;

    /// Records its inputs and echoes a fixed answer.
    #[derive(Default)]
    struct EchoModel {
        inputs: Mutex<Vec<String>>,
    }

    impl AnswerModel for EchoModel {
        fn predict(&self, text: &str) -> Result<String> {
            self.inputs.lock().unwrap().push(text.to_string());
            Ok(format!("echo:{}", text.len()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn context_joins_with_spaces() {
        let data = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(build_context(&data, 512), "alpha beta");
        assert_eq!(build_context(&[], 512), "");
    }

    #[test]
    fn context_truncates_by_characters() {
        let data = vec!["ééééé".to_string(), "ü".to_string()];
        // 5 + 1 + 1 chars, 13 bytes
        assert_eq!(build_context(&data, 6), "ééééé ");
        assert_eq!(build_context(&data, 3), "ééé");
        assert_eq!(build_context(&data, 0), "");
    }

    #[tokio::test]
    async fn draft_prepends_question() {
        let model = Arc::new(EchoModel::default());
        let agent = DraftAgent::new(model.clone(), 8, Arc::new(SilentProgress));

        let state = AgentState::new("why?", vec![])
            .with_research_data(vec!["because of reasons".to_string()]);
        let out = agent.run(state).await.unwrap();

        let inputs = model.inputs.lock().unwrap().clone();
        assert_eq!(inputs, vec!["why? because ".to_string()]);
        assert_eq!(out.answer, "echo:13");
        assert_eq!(out.research_data.len(), 1);
    }

    #[tokio::test]
    async fn draft_runs_on_empty_context() {
        let model = Arc::new(EchoModel::default());
        let agent = DraftAgent::new(model.clone(), 512, Arc::new(SilentProgress));

        let out = agent.run(AgentState::new("anyone?", vec![])).await.unwrap();
        assert_eq!(model.inputs.lock().unwrap()[0], "anyone? ");
        assert!(!out.answer.is_empty());
    }
}
