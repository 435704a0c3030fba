//! Linear state graph: named nodes, single outgoing edges, a fixed entry
//! point and a terminal [`END`].
//!
//! Build with [`StateGraph`], validate with [`StateGraph::compile`], then run
//! with [`CompiledGraph::invoke`].

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::{Instrument, debug, info_span};

use crawlqa_shared::{AgentState, CrawlQaError, Result};

/// Name of the virtual terminal node.
pub const END: &str = "__end__";

/// A workflow step: consumes a state and returns its successor.
#[async_trait]
pub trait Node: Send + Sync {
    /// Run this step.
    async fn run(&self, state: AgentState) -> Result<AgentState>;
}

/// Mutable graph under construction.
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, Box<dyn Node>>,
    edges: HashMap<String, String>,
    entry: Option<String>,
    errors: Vec<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under `name`. Duplicate names are reported by `compile`.
    pub fn add_node(&mut self, name: impl Into<String>, node: impl Node + 'static) -> &mut Self {
        let name = name.into();
        if name == END {
            self.errors.push(format!("'{END}' is reserved"));
        } else if self.nodes.insert(name.clone(), Box::new(node)).is_some() {
            self.errors.push(format!("duplicate node '{name}'"));
        }
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Connect `from` to `to`. Each node may have at most one outgoing edge.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if let Some(existing) = self.edges.get(&from) {
            self.errors.push(format!(
                "node '{from}' already has an edge to '{existing}', cannot add '{to}'"
            ));
        } else {
            self.edges.insert(from, to);
        }
        self
    }

    /// Validate the graph and resolve its execution order.
    pub fn compile(self) -> Result<CompiledGraph> {
        if let Some(first) = self.errors.first() {
            return Err(CrawlQaError::graph(first.clone()));
        }

        let entry = self
            .entry
            .ok_or_else(|| CrawlQaError::graph("no entry point set"))?;
        if !self.nodes.contains_key(&entry) {
            return Err(CrawlQaError::graph(format!("entry point '{entry}' is not a node")));
        }

        for (from, to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(CrawlQaError::graph(format!("edge from unknown node '{from}'")));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CrawlQaError::graph(format!("edge to unknown node '{to}'")));
            }
        }

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut current = entry;
        while current != END {
            if !seen.insert(current.clone()) {
                return Err(CrawlQaError::graph(format!("cycle through node '{current}'")));
            }
            let next = self.edges.get(&current).cloned().ok_or_else(|| {
                CrawlQaError::graph(format!("node '{current}' has no outgoing edge"))
            })?;
            order.push(current);
            current = next;
        }

        let mut nodes = self.nodes;
        let steps = order
            .into_iter()
            .filter_map(|name| nodes.remove(&name).map(|node| (name, node)))
            .collect::<Vec<_>>();

        if let Some(unreachable) = nodes.keys().next() {
            return Err(CrawlQaError::graph(format!(
                "node '{unreachable}' is not reachable from the entry point"
            )));
        }

        Ok(CompiledGraph { steps })
    }
}

/// A validated graph, ready to run.
pub struct CompiledGraph {
    steps: Vec<(String, Box<dyn Node>)>,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("steps", &self.node_order())
            .finish()
    }
}

impl CompiledGraph {
    /// Node names in execution order.
    pub fn node_order(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run every node in order, threading the state through.
    pub async fn invoke(&self, state: AgentState) -> Result<AgentState> {
        let mut state = state;
        for (name, node) in &self.steps {
            debug!(node = %name, "entering node");
            state = node
                .run(state)
                .instrument(info_span!("node", name = %name))
                .await?;
        }
        Ok(state)
    }
}
