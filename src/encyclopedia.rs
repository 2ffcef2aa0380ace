//! Encyclopedia summaries for "who is" / "what is" queries
//!
//! Backed by the Wikipedia REST summary endpoint:
//! `GET {base}/{urlencoded subject}` returning JSON with an `extract` field.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

/// Outcome of a summary lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A non-empty summary
    Found(String),
    /// The service answered but had no summary
    NotFound,
}

/// Source of short encyclopedia summaries
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Look up a summary for `subject`
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or an unparseable response
    async fn summary(&self, subject: &str) -> Result<Lookup>;
}

/// Summary payload; only `extract` is used
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    extract: Option<String>,
}

/// Wikipedia REST summary client
pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    /// Create a client for the summary endpoint at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("karen-assistant/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn summary_url(&self, subject: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(subject))
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn summary(&self, subject: &str) -> Result<Lookup> {
        let url = self.summary_url(subject);
        tracing::debug!(subject, %url, "fetching summary");

        // Missing pages come back as JSON without an extract, so the status
        // code is not treated as an error
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: SummaryResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Encyclopedia(format!("unparseable summary response ({status}): {e}"))
        })?;

        match parsed.extract {
            Some(extract) if !extract.is_empty() => Ok(Lookup::Found(extract)),
            _ => {
                tracing::debug!(subject, %status, "no summary available");
                Ok(Lookup::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_url_encodes_subject() {
        let client = WikipediaClient::new("https://example.org/summary/", Duration::from_secs(1));
        assert_eq!(
            client.summary_url("albert einstein"),
            "https://example.org/summary/albert%20einstein"
        );
        assert_eq!(client.summary_url("c++"), "https://example.org/summary/c%2B%2B");
    }

    #[test]
    fn test_summary_response_extract_optional() {
        let parsed: SummaryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.extract.is_none());

        let parsed: SummaryResponse =
            serde_json::from_str(r#"{"title":"Gravity","extract":"Gravity is a force..."}"#)
                .unwrap();
        assert_eq!(parsed.extract.as_deref(), Some("Gravity is a force..."));
    }
}
