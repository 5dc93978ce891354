//! Platform parsers
//!
//! One parser per provider, each owning its URL patterns and its own
//! fallback chain over the shared extractors. The registry holds them in
//! priority order and dispatches a URL to the first parser that claims
//! it; unmatched URLs fail before any network I/O.

pub mod chatgpt;
pub mod claude;
pub mod types;

pub use chatgpt::ChatGptParser;
pub use claude::ClaudeParser;
pub use types::*;

use crate::config::Config;
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use tracing::info;
use url::Url;

/// Contract every provider parser implements.
#[async_trait]
pub trait PlatformParser: Send + Sync {
    /// Short platform name recorded in results and telemetry
    fn name(&self) -> &'static str;

    /// URL substrings this parser claims
    fn url_patterns(&self) -> &'static [&'static str];

    /// Whether this parser handles the given URL
    fn can_parse(&self, url: &str) -> bool {
        self.url_patterns().iter().any(|p| url.contains(p))
    }

    /// Run this parser's fallback chain over an already-fetched
    /// document. Synchronous and network-free.
    fn extract_from_document(&self, url: &str, html: &str) -> Result<ParseResult>;

    /// Fetch the share page and extract the conversation
    async fn parse(&self, url: &str) -> Result<ParseResult>;
}

/// Ordered list of platform parsers.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn PlatformParser>>,
}

impl ParserRegistry {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(ParserRegistry {
            parsers: vec![
                Box::new(ChatGptParser::new(&config.http)?),
                Box::new(ClaudeParser::new(&config.http)?),
            ],
        })
    }

    /// First parser whose patterns match the URL
    pub fn parser_for(&self, url: &str) -> Option<&dyn PlatformParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(url))
            .map(|p| p.as_ref())
    }

    /// Validate the URL, dispatch to the matching parser, and extract.
    /// Rejections happen before any fetch.
    pub async fn parse(&self, url: &str) -> Result<ParseResult> {
        let parsed = Url::parse(url).map_err(|_| ExtractError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl(url.to_string()));
        }

        let parser = self
            .parser_for(url)
            .ok_or_else(|| ExtractError::UnsupportedPlatform(url.to_string()))?;

        info!(platform = parser.name(), url = %url, "dispatching to platform parser");
        parser.parse(url).await
    }

    /// URL patterns across all registered parsers
    pub fn supported_patterns(&self) -> Vec<&'static str> {
        self.parsers
            .iter()
            .flat_map(|p| p.url_patterns().iter().copied())
            .collect()
    }
}
