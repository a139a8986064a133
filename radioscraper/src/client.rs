//! HTTP client for station sources
//!
//! # Example
//!
//! ```no_run
//! use radioscraper::HttpFetcher;
//! use std::time::Duration;
//!
//! # async fn example() -> radioscraper::Result<()> {
//! let http = HttpFetcher::builder()
//!     .timeout(Duration::from_secs(5))
//!     .user_agent("my-app/1.0")
//!     .build()?;
//! let body = http.get_text("https://example.org/now-playing.txt").await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Default timeout for a station fetch (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("radio2spotify/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP handle for station fetches
///
/// Cheap to clone: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return the body as text.
    ///
    /// Non-2xx answers are [`Error::Status`], an elapsed timeout is
    /// [`Error::Timeout`].
    pub async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!(url = %url, "Fetching station source");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(url.to_string())
    } else {
        Error::Http(err)
    }
}

/// Builder for [`HttpFetcher`]
#[derive(Debug, Default)]
pub struct FetcherBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    client: Option<Client>,
}

impl FetcherBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a preconfigured reqwest client (the user agent is then ignored)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<HttpFetcher> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(
                    self.user_agent
                        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                )
                .build()?,
        };

        Ok(HttpFetcher {
            client,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/np"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Muse - Uprising"))
            .mount(&server)
            .await;

        let http = HttpFetcher::new().unwrap();
        let body = http.get_text(&format!("{}/np", server.uri())).await.unwrap();
        assert_eq!(body, "Muse - Uprising");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let http = HttpFetcher::new().unwrap();
        let err = http.get_text(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let http = HttpFetcher::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = http.get_text(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
