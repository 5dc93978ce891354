//! Fallback orchestrator
//!
//! Runs extraction strategies in priority order until one produces
//! messages. Strategy errors are caught and recorded here; a failing
//! strategy never aborts the chain, and only the aggregate "every strategy
//! came up empty" condition is surfaced to the caller, as a
//! `StrategyOutcome` from which a `NoMessagesFound` error is built.

use crate::error::Result;
use crate::parser::types::ParsedMessage;
use std::collections::BTreeMap;
use tracing::debug;

/// What a single strategy recovered from the document. Strategies that
/// find nothing return `Extraction::empty()` rather than an error.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Title when the strategy could recover one from page data
    pub title: Option<String>,
    /// Ordered conversation turns
    pub messages: Vec<ParsedMessage>,
}

impl Extraction {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Diagnostic record of one chain run, produced regardless of success.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// Name of the strategy that produced messages, if any
    pub winner: Option<String>,
    /// Strategies tried, in order, up to and including the winner
    pub attempted: Vec<String>,
    /// Failure reason per strategy that did not win
    pub errors: BTreeMap<String, String>,
}

/// Orchestrator states. `Trying` carries the index of the strategy
/// currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    NotStarted,
    Trying(usize),
    Succeeded(usize),
    Failed,
}

type StrategyFn<'a> = Box<dyn Fn(&str) -> Result<Extraction> + Send + Sync + 'a>;

/// An ordered list of named strategies over a raw HTML document.
pub struct FallbackChain<'a> {
    strategies: Vec<(&'static str, StrategyFn<'a>)>,
}

impl<'a> FallbackChain<'a> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn with<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Fn(&str) -> Result<Extraction> + Send + Sync + 'a,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// Run the chain over `html`. Returns the winning extraction (if
    /// any) together with the diagnostic outcome.
    pub fn run(&self, html: &str) -> (Option<Extraction>, StrategyOutcome) {
        let mut state = ChainState::NotStarted;
        let mut attempted = Vec::new();
        let mut errors = BTreeMap::new();
        let mut extraction = None;

        loop {
            state = match state {
                ChainState::NotStarted => ChainState::Trying(0),
                ChainState::Trying(i) => {
                    let Some((name, strategy)) = self.strategies.get(i) else {
                        break;
                    };
                    attempted.push(name.to_string());
                    match strategy(html) {
                        Ok(result) if !result.messages.is_empty() => {
                            debug!(strategy = name, messages = result.messages.len(), "strategy succeeded");
                            extraction = Some(result);
                            ChainState::Succeeded(i)
                        }
                        Ok(_) => {
                            debug!(strategy = name, "strategy found no messages");
                            errors.insert(name.to_string(), "no messages extracted".to_string());
                            ChainState::Trying(i + 1)
                        }
                        Err(e) => {
                            debug!(strategy = name, error = %e, "strategy errored");
                            errors.insert(name.to_string(), e.to_string());
                            ChainState::Trying(i + 1)
                        }
                    }
                }
                ChainState::Succeeded(_) | ChainState::Failed => break,
            };
            if matches!(state, ChainState::Trying(i) if i >= self.strategies.len()) {
                state = ChainState::Failed;
            }
        }

        let winner = match state {
            ChainState::Succeeded(i) => Some(self.strategies[i].0.to_string()),
            _ => None,
        };

        (
            extraction,
            StrategyOutcome {
                winner,
                attempted,
                errors,
            },
        )
    }
}

impl Default for FallbackChain<'_> {
    fn default() -> Self {
        Self::new()
    }
}
