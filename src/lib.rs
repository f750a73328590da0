//! Orchestrate - batch job orchestration for a news scraping and NER pipeline
//!
//! A run discovers work units under a directory taxonomy, builds one job
//! descriptor per unit, hands each to the cluster scheduler (or runs it
//! locally for the in-process family) and aggregates the outcomes.

pub mod aggregate;
pub mod builder;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod runner;
pub mod scheduler;
pub mod submit;

pub use error::{OrchestrateError, Result};
