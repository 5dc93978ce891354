//! Chatlift - extracts normalized conversations from AI chat share pages
//!
//! This crate turns the publicly rendered "share" page of a hosted chat
//! assistant into a structured conversation: a title plus an ordered list
//! of user/assistant turns. The embedded data formats are undocumented,
//! minified, and change over time, so extraction is layered:
//! - structured decoding of the provider's conversation-graph encoding
//! - positional heuristics over the flat streamed heap
//! - manual recovery from markup and loose embedded JSON
//!
//! Strategies run through a fallback chain per platform; when all of them
//! come up empty the caller gets a typed error carrying the attempted
//! strategies, because "the page format changed" is actionable in a way a
//! bare failure is not.
//!
//! # Usage
//!
//! ```ignore
//! use chatlift::{Config, ParserRegistry};
//!
//! let registry = ParserRegistry::new(&Config::default()).unwrap();
//! let result = registry.parse("https://chatgpt.com/share/...").await.unwrap();
//! for message in &result.messages {
//!     println!("{}: {}", message.role, message.content);
//! }
//! ```

pub mod classify;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod parser;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ExtractError, Result};
pub use parser::{
    CreateShareInput, ParseResult, ParsedMessage, ParserRegistry, PlatformParser, Role,
};
