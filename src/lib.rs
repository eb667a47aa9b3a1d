//! Library surface for the agent pipeline tracker: a crash-consistent
//! session store, an idempotent per-agent state machine, a multi-source
//! evidence reconciler, and a parallel-phase verifier for a fixed
//! seven-agent development pipeline.

pub mod agent;
pub mod app;
pub mod audit;
pub mod cli;
pub mod document;
pub mod error;
pub mod narrative;
pub mod project;
pub mod read_api;
pub mod reconciler;
pub mod store;
pub mod tracker;
pub mod validation;
pub mod verifier;

pub use error::{Result, TrackerError};
pub use tracker::{Tracker, TrackerConfig};
