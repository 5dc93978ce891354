//! Share-page fetching
//!
//! One HTTP GET per parse call. Some providers serve alternate markup or
//! a 403 to obvious bots, so the client presents a realistic browser
//! profile. Retries, backoff, and timeouts beyond the client timeout are
//! the caller's responsibility.

use crate::config::HttpConfig;
use crate::error::{ExtractError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client wrapper shared by the platform parsers.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|_| ExtractError::Config("invalid accept_language value".to_string()))?,
        );
        headers.insert(UPGRADE_INSECURE_REQUESTS, "1".parse().unwrap());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the share page body. 404 means the conversation is gone;
    /// any other non-2xx is a generic fetch failure.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url = %url, "fetching share page");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(url = %url, "share page returned 404");
            return Err(ExtractError::ConversationNotFound(url.to_string()));
        }
        if !status.is_success() {
            warn!(url = %url, status = %status, "share page fetch failed");
            return Err(ExtractError::FetchFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
