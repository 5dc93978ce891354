//! Extraction strategies and the fallback orchestrator
//!
//! Three ways to recover a conversation from a share page, in decreasing
//! order of fidelity: the structured conversation-graph walk, the
//! positional heuristic over the flat heap, and manual recovery from
//! markup. `chain` runs them in priority order and records what happened.

pub mod chain;
pub mod heuristic;
pub mod manual;
pub mod structured;

pub use chain::{Extraction, FallbackChain, StrategyOutcome};
