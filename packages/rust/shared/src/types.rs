//! Core domain types for the crawl-and-answer pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AgentState
// ---------------------------------------------------------------------------

/// The record passed between workflow stages.
///
/// Stages never mutate a state in place; they consume it and return a new
/// version with one more field populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// The question to answer.
    pub question: String,
    /// URLs to crawl, in input order.
    pub urls: Vec<String>,
    /// Scraped text, one entry per successfully fetched URL.
    #[serde(default)]
    pub research_data: Vec<String>,
    /// Final answer. Empty until the draft stage has run.
    #[serde(default)]
    pub answer: String,
}

impl AgentState {
    /// Create the initial state for a run.
    pub fn new(question: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            question: question.into(),
            urls,
            research_data: Vec::new(),
            answer: String::new(),
        }
    }

    /// Return a new state carrying `research_data`.
    #[must_use]
    pub fn with_research_data(self, research_data: Vec<String>) -> Self {
        Self {
            research_data,
            ..self
        }
    }

    /// Return a new state carrying `answer`.
    #[must_use]
    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..self
        }
    }
}

/// Split a comma-separated URL line into trimmed, non-empty entries.
pub fn parse_url_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn state_replacement_keeps_other_fields() {
        let state = AgentState::new("what is rust?", vec!["https://a.example".into()]);
        assert!(state.research_data.is_empty());
        assert!(state.answer.is_empty());

        let state = state.with_research_data(vec!["Rust is a language.".into()]);
        assert_eq!(state.question, "what is rust?");
        assert_eq!(state.urls.len(), 1);

        let state = state.with_answer("a language");
        assert_eq!(state.research_data, vec!["Rust is a language.".to_string()]);
        assert_eq!(state.answer, "a language");
    }

    #[test]
    fn state_deserializes_without_outputs() {
        let json = r#"{"question":"q","urls":["https://a.example"]}"#;
        let state: AgentState = serde_json::from_str(json).expect("deserialize");
        assert_eq!(state, AgentState::new("q", vec!["https://a.example".into()]));
    }

    #[test]
    fn url_list_trims_and_drops_empty() {
        let urls = parse_url_list(" https://a.example , ,https://b.example,, https://a.example ");
        assert_eq!(
            urls,
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                "https://a.example".to_string(),
            ]
        );
    }

    #[test]
    fn url_list_empty_input() {
        assert!(parse_url_list("").is_empty());
        assert!(parse_url_list(" , ,").is_empty());
    }
}
