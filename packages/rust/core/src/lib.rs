//! Workflow orchestration for crawlqa.
//!
//! This crate ties the scraper and the answer model together as a two-node
//! state graph (`research -> draft`) and exposes the end-to-end [`pipeline`].

pub mod agents;
pub mod graph;
pub mod pipeline;
