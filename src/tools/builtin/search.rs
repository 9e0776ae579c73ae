use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ToolError;
use crate::tools::ToolHandler;

pub const NAME: &str = "web_search";
pub const DESCRIPTION: &str = "Search the web for current information about people, events, or topics. \
Use this when you need up-to-date information that might not be in the guest database.";
pub const PARAMETER: &str = "query";

pub const DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";
const NO_RESULTS: &str = "No search results found for your query.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub href: String,
}

#[derive(Deserialize, Default)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
}

impl RelatedTopic {
    fn flatten_into(self, out: &mut Vec<SearchResult>) {
        match self {
            RelatedTopic::Group { topics } => {
                for t in topics {
                    t.flatten_into(out);
                }
            }
            RelatedTopic::Entry { text, first_url } => {
                if text.is_empty() {
                    return;
                }
                let title = text
                    .split_once(" - ")
                    .map(|(head, _)| head.to_string())
                    .unwrap_or_else(|| text.clone());
                out.push(SearchResult {
                    title,
                    body: text,
                    href: first_url,
                });
            }
        }
    }
}

impl InstantAnswer {
    fn into_results(self) -> Vec<SearchResult> {
        let mut out = Vec::new();
        if !self.abstract_text.is_empty() {
            out.push(SearchResult {
                title: self.heading,
                body: self.abstract_text,
                href: self.abstract_url,
            });
        }
        for topic in self.related_topics {
            topic.flatten_into(&mut out);
        }
        out
    }
}

/// Numbered result list, one block per hit.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   Source: {}", i + 1, r.title, r.body, r.href))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Web search over the DuckDuckGo Instant Answer API. No key required.
pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
    timeout: Duration,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DUCKDUCKGO_BASE_URL.into(),
            max_results: 3,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument("empty search query".into()));
        }

        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(ToolError::Failed(format!("search service returned {status}")));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        let answer: InstantAnswer = serde_json::from_str(&text)
            .map_err(|e| ToolError::Failed(format!("unreadable search response: {e}")))?;

        let mut results = answer.into_results();
        results.truncate(self.max_results);
        debug!(%query, hits = results.len(), "web search");
        Ok(results)
    }
}

#[async_trait]
impl ToolHandler for WebSearchTool {
    async fn call(&self, argument: &str) -> Result<String, ToolError> {
        let results = self.search(argument).await?;
        Ok(format_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_abstract_and_topics() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{
                "Heading": "Ada Lovelace",
                "AbstractText": "English mathematician and writer.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Ada_Lovelace",
                "RelatedTopics": [
                    {"Text": "Analytical Engine - A proposed mechanical computer.", "FirstURL": "https://duckduckgo.com/Analytical_Engine"},
                    {"Name": "People", "Topics": [
                        {"Text": "Charles Babbage - Polymath.", "FirstURL": "https://duckduckgo.com/Charles_Babbage"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let results = answer.into_results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Ada Lovelace");
        assert_eq!(results[1].title, "Analytical Engine");
        assert_eq!(results[1].body, "Analytical Engine - A proposed mechanical computer.");
        assert_eq!(results[2].href, "https://duckduckgo.com/Charles_Babbage");
    }

    #[test]
    fn formats_numbered_blocks() {
        let text = format_results(&[
            SearchResult {
                title: "One".into(),
                body: "first".into(),
                href: "https://a".into(),
            },
            SearchResult {
                title: "Two".into(),
                body: "second".into(),
                href: "https://b".into(),
            },
        ]);
        assert_eq!(
            text,
            "1. One\n   first\n   Source: https://a\n\n2. Two\n   second\n   Source: https://b"
        );
    }

    #[test]
    fn empty_results_message() {
        assert_eq!(format_results(&[]), NO_RESULTS);
    }

    #[tokio::test]
    async fn empty_query_rejected() {
        let err = WebSearchTool::new().search("   ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
