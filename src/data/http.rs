//! HTTP access for the registry sources
//!
//! Every request ends in a `FetchOutcome`: either a usable body or a failure
//! carrying a human-readable reason. Nothing here returns `Err`, so a flaky
//! registry can only ever shrink the result.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Result of a single GET against a registry endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with a non-empty body
    Body(String),
    /// Anything else: timeout, connection error, non-200 status, empty body
    Failed { reason: String },
}

impl FetchOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(body) => write!(f, "200 ({} bytes)", body.len()),
            Self::Failed { reason } => f.write_str(reason),
        }
    }
}

/// Thin wrapper around a reqwest client with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("country-cidr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Issues one GET and folds every failure mode into `FetchOutcome::Failed`
    pub async fn get(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchOutcome::failed("timed out"),
            Err(e) if e.is_connect() => {
                return FetchOutcome::failed(format!("connection failed: {}", e))
            }
            Err(e) => return FetchOutcome::failed(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchOutcome::failed(format!("HTTP {}", status.as_u16()));
        }

        match response.text().await {
            Ok(body) if body.trim().is_empty() => FetchOutcome::failed("200 with empty body"),
            Ok(body) => FetchOutcome::Body(body),
            Err(e) => FetchOutcome::failed(format!("failed to read body: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).expect("client should build")
    }

    #[tokio::test]
    async fn test_ok_body_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.0.0.0/24\n"))
            .mount(&server)
            .await;

        let outcome = fetcher().get(&format!("{}/list", server.uri())).await;
        assert_eq!(outcome, FetchOutcome::Body("1.0.0.0/24\n".to_string()));
    }

    #[tokio::test]
    async fn test_non_200_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = fetcher().get(&format!("{}/list", server.uri())).await;
        assert_eq!(
            outcome,
            FetchOutcome::Failed {
                reason: "HTTP 503".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .mount(&server)
            .await;

        let outcome = fetcher().get(&format!("{}/list", server.uri())).await;
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert!(outcome.to_string().contains("empty body"));
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("1.0.0.0/24")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(50)).unwrap();
        let outcome = fetcher.get(&format!("{}/slow", server.uri())).await;
        assert_eq!(
            outcome,
            FetchOutcome::Failed {
                reason: "timed out".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_failure() {
        // Port 9 on localhost is almost never listening.
        let outcome = fetcher().get("http://127.0.0.1:9/list").await;
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(FetchOutcome::Body("abc".to_string()).to_string(), "200 (3 bytes)");
        assert_eq!(FetchOutcome::failed("HTTP 404").to_string(), "HTTP 404");
    }
}
