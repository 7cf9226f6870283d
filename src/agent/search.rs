//! Web search through a YaCy instance

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::AgentError;

const SNIPPET_LIMIT: usize = 160;

/// One search result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Something that can run a web search
pub trait SearchBackend: Send + Sync {
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, AgentError>> + Send;
}

#[derive(Debug, Default, Deserialize)]
struct YacyResponse {
    #[serde(default)]
    channels: Vec<YacyChannel>,
}

#[derive(Debug, Default, Deserialize)]
struct YacyChannel {
    #[serde(default)]
    items: Vec<YacyItem>,
}

#[derive(Debug, Default, Deserialize)]
struct YacyItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    about: Option<String>,
}

impl From<YacyItem> for SearchHit {
    fn from(item: YacyItem) -> Self {
        let snippet = item
            .description
            .filter(|d| !d.trim().is_empty())
            .or(item.about)
            .unwrap_or_default();

        Self {
            title: item.title.unwrap_or_else(|| "No title".to_string()).trim().to_string(),
            link: item.link.unwrap_or_default(),
            snippet: snippet.trim().to_string(),
        }
    }
}

/// Parse a YaCy JSON response into hits
pub fn parse_yacy(body: &str, max_results: usize) -> Result<Vec<SearchHit>, AgentError> {
    let response: YacyResponse =
        serde_json::from_str(body).map_err(|e| AgentError::MalformedResponse(e.to_string()))?;

    Ok(response
        .channels
        .into_iter()
        .next()
        .map(|channel| channel.items)
        .unwrap_or_default()
        .into_iter()
        .take(max_results)
        .map(SearchHit::from)
        .collect())
}

/// Collapse whitespace and cut long snippets
fn tidy_snippet(snippet: &str) -> String {
    let collapsed = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > SNIPPET_LIMIT {
        let cut: String = collapsed.chars().take(SNIPPET_LIMIT - 3).collect();
        format!("{}...", cut)
    } else {
        collapsed
    }
}

/// Render hits the way they are handed to the model
pub fn format_hits(hits: &[SearchHit], max_results: usize) -> String {
    let lines: Vec<String> = hits
        .iter()
        .take(max_results)
        .map(|hit| {
            let snippet = tidy_snippet(&hit.snippet);
            if snippet.is_empty() {
                format!("{} - {}", hit.title, hit.link)
            } else {
                format!("{} - {}\n  {}", hit.title, hit.link, snippet)
            }
        })
        .collect();

    if lines.is_empty() {
        "No web results found.".to_string()
    } else {
        lines.join("\n")
    }
}

/// YaCy JSON search client
#[derive(Debug, Clone)]
pub struct YacyClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl YacyClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SearchBackend for YacyClient {
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, AgentError>> + Send {
        async move {
            let rows = max_results.to_string();
            let body = self
                .http
                .get(&self.url)
                .query(&[("query", query), ("rows", rows.as_str())])
                .timeout(self.timeout)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            parse_yacy(&body, max_results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::chat::tests::serve_once;

    const SAMPLE: &str = r#"{
        "channels": [{
            "items": [
                {"title": " Rust Book ", "link": "https://doc.rust-lang.org/book/", "description": "The   Rust\n programming language"},
                {"title": "Crates", "link": "https://crates.io", "description": "", "about": "Package registry"},
                {"link": "https://example.com"}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_yacy() {
        let hits = parse_yacy(SAMPLE, 5).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust Book");
        assert_eq!(hits[1].snippet, "Package registry");
        assert_eq!(hits[2].title, "No title");

        assert_eq!(parse_yacy(SAMPLE, 1).unwrap().len(), 1);
        assert!(parse_yacy("{}", 5).unwrap().is_empty());
    }

    #[test]
    fn test_format_hits() {
        let hits = parse_yacy(SAMPLE, 5).unwrap();
        let text = format_hits(&hits, 5);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Rust Book - https://doc.rust-lang.org/book/");
        assert_eq!(lines[1], "  The Rust programming language");
        assert_eq!(lines[4], "No title - https://example.com");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_long_snippet_is_truncated() {
        let hit = SearchHit {
            title: "t".to_string(),
            link: "l".to_string(),
            snippet: "x".repeat(200),
        };
        let text = format_hits(&[hit], 5);
        let snippet = text.lines().nth(1).unwrap().trim();
        assert_eq!(snippet.len(), 160);
        assert!(snippet.ends_with("..."));
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_error_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "peer is busy") + "/yacysearch.json";
        let client = YacyClient::new(reqwest::Client::new(), url);

        let err = block_on(client.search("rust sort", 5)).unwrap_err();
        match err {
            AgentError::Http(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(503)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_search_over_http() {
        let url = serve_once("200 OK", SAMPLE) + "/yacysearch.json";
        let client = YacyClient::new(reqwest::Client::new(), url);

        let hits = block_on(client.search("rust", 2)).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].link, "https://doc.rust-lang.org/book/");
    }

    #[test]
    fn test_no_hits() {
        assert_eq!(format_hits(&[], 5), "No web results found.");
    }
}
