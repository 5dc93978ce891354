//! ChatGPT share-page parser
//!
//! ChatGPT pages stream their conversation as a pointer-compacted heap,
//! so this parser gets the full chain: the conversation-graph walk, the
//! positional heuristic, and finally manual recovery from markup.

use crate::config::HttpConfig;
use crate::error::{ExtractError, Result};
use crate::extract::{heuristic, manual, structured, FallbackChain};
use crate::fetch::PageFetcher;
use crate::parser::types::ParseResult;
use crate::parser::PlatformParser;
use async_trait::async_trait;
use tracing::info;

const URL_PATTERNS: &[&str] = &["chatgpt.com/share/", "chat.openai.com/share/"];

/// Parser for ChatGPT share pages
pub struct ChatGptParser {
    fetcher: PageFetcher,
}

impl ChatGptParser {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(http)?,
        })
    }
}

#[async_trait]
impl PlatformParser for ChatGptParser {
    fn name(&self) -> &'static str {
        "chatgpt"
    }

    fn url_patterns(&self) -> &'static [&'static str] {
        URL_PATTERNS
    }

    fn extract_from_document(&self, url: &str, html: &str) -> Result<ParseResult> {
        let chain = FallbackChain::new()
            .with("structured", structured::extract)
            .with("heuristic", heuristic::extract)
            .with("manual", manual::extract);

        let (extraction, outcome) = chain.run(html);
        match extraction {
            Some(extraction) => {
                info!(
                    strategy = outcome.winner.as_deref().unwrap_or("unknown"),
                    messages = extraction.messages.len(),
                    "extraction succeeded"
                );
                Ok(ParseResult {
                    title: extraction
                        .title
                        .or_else(|| manual::page_title(html))
                        .unwrap_or_else(|| structured::DEFAULT_TITLE.to_string()),
                    source_url: url.to_string(),
                    platform: self.name().to_string(),
                    messages: extraction.messages,
                })
            }
            None => Err(ExtractError::NoMessagesFound {
                title: manual::page_title(html),
                attempted: outcome.attempted,
                errors: outcome.errors,
            }),
        }
    }

    async fn parse(&self, url: &str) -> Result<ParseResult> {
        let html = self.fetcher.fetch(url).await?;
        self.extract_from_document(url, &html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::Role;
    use serde_json::{json, Value};

    fn parser() -> ChatGptParser {
        ChatGptParser::new(&HttpConfig::default()).unwrap()
    }

    /// Embed a heap as one streamed enqueue fragment.
    fn fixture_html(heap: &Value) -> String {
        let inner = serde_json::to_string(heap).unwrap();
        let literal = serde_json::to_string(&inner).unwrap();
        format!(
            "<html><head><title>Demo - ChatGPT</title></head>\
             <body><script>window.__stream.enqueue({literal});</script></body></html>"
        )
    }

    /// A heap whose envelope carries a two-turn conversation graph.
    fn two_turn_heap() -> Value {
        json!([
            { "_1": 2 },
            "serverResponse",
            {
                "data": {
                    "title": "Demo chat",
                    "current_node": "a1",
                    "mapping": {
                        "root": { "children": ["u1"] },
                        "u1": {
                            "parent": "root",
                            "children": ["a1"],
                            "message": {
                                "author": { "role": "user" },
                                "content": {
                                    "content_type": "text",
                                    "parts": ["What is the capital of France?"]
                                }
                            }
                        },
                        "a1": {
                            "parent": "u1",
                            "children": [],
                            "message": {
                                "author": { "role": "assistant" },
                                "content": {
                                    "content_type": "text",
                                    "parts": ["The capital of France is Paris."]
                                }
                            }
                        }
                    }
                }
            }
        ])
    }

    #[test]
    fn test_can_parse_share_urls() {
        let p = parser();
        assert!(p.can_parse("https://chatgpt.com/share/0a1b2c3d"));
        assert!(p.can_parse("https://chat.openai.com/share/0a1b2c3d"));
        assert!(!p.can_parse("https://chatgpt.com/c/0a1b2c3d"));
        assert!(!p.can_parse("https://claude.ai/share/0a1b2c3d"));
    }

    #[test]
    fn test_end_to_end_structured_extraction() {
        let html = fixture_html(&two_turn_heap());
        let result = parser()
            .extract_from_document("https://chatgpt.com/share/abc", &html)
            .unwrap();

        assert_eq!(result.title, "Demo chat");
        assert_eq!(result.platform, "chatgpt");
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].role, Role::User);
        assert_eq!(result.messages[1].role, Role::Assistant);
        assert!(!result.messages[0].content.trim().is_empty());
        assert!(!result.messages[1].content.trim().is_empty());
    }

    #[test]
    fn test_corrupted_fragment_exhausts_all_strategies() {
        let html = "<html><head><title>Broken page</title></head>\
                    <body><script>window.__stream.enqueue(\"[1, 2,\");</script></body></html>";
        let err = parser()
            .extract_from_document("https://chatgpt.com/share/abc", html)
            .unwrap_err();

        match err {
            ExtractError::NoMessagesFound {
                title,
                attempted,
                errors,
            } => {
                assert_eq!(title.as_deref(), Some("Broken page"));
                assert_eq!(attempted.len(), 3);
                assert_eq!(attempted[0], "structured");
                assert_eq!(attempted[2], "manual");
                assert_eq!(errors.len(), 3);
            }
            other => panic!("expected NoMessagesFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_title_falls_back_to_default() {
        let mut heap = two_turn_heap();
        heap[2]["data"]
            .as_object_mut()
            .unwrap()
            .remove("title");
        let html = fixture_html(&heap);
        // Page <title> is ignored here: the structured strategy resolved
        // a (default) title itself.
        let result = parser()
            .extract_from_document("https://chatgpt.com/share/abc", &html)
            .unwrap();
        assert_eq!(result.title, structured::DEFAULT_TITLE);
    }

    #[test]
    fn test_dom_fallback_when_no_fragment() {
        let html = r#"
            <html><head><title>Rendered chat</title></head><body>
                <div data-message-author-role="user">Does the DOM fallback work?</div>
                <div data-message-author-role="assistant">It does, as the last resort.</div>
            </body></html>
        "#;
        let result = parser()
            .extract_from_document("https://chatgpt.com/share/abc", html)
            .unwrap();
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.title, "Rendered chat");
        assert!(!result.messages[0].html.is_empty());
    }
}
