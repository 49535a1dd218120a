//! HTTP fetcher backed by reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::KeyCase;
use super::PageEnvelope;
use super::PageFetcher;
use crate::error::FetchError;
use crate::query::ApiOptions;
use crate::typestate::Missing;
use crate::typestate::Set;

/// Placeholder replaced by the (percent-encoded) scope id.
pub const SCOPE_PLACEHOLDER: &str = "{scope}";

/// A [`PageFetcher`] that GETs a page-based REST list endpoint.
///
/// The endpoint is an URL template; `{scope}` is replaced by the scope id and
/// the API options are appended as query parameters.
///
/// This fetcher is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use tableview_lib::fetch::{HttpFetcher, KeyCase};
///
/// let fetcher = HttpFetcher::builder()
///     .url("https://lms.example.com/api/v1/enterprise/{scope}/enrollments/")
///     .key_case(KeyCase::Camel)
///     .timeout(Duration::from_secs(30))
///     .build();
/// ```
#[derive(Clone)]
pub struct HttpFetcher {
    inner: Arc<HttpFetcherInner>,
}

struct HttpFetcherInner {
    url_template: String,
    http_client: Client,
    timeout: Option<Duration>,
    key_case: KeyCase,
}

impl HttpFetcher {
    /// Creates a new builder.
    pub fn builder() -> HttpFetcherBuilder<Missing> {
        HttpFetcherBuilder::new()
    }

    /// Returns the URL template.
    pub fn url_template(&self) -> &str {
        &self.inner.url_template
    }

    /// Builds the request URL for a scope and a set of options.
    pub fn endpoint(&self, scope_id: &str, options: &ApiOptions) -> Result<Url, FetchError> {
        build_url(&self.inner.url_template, scope_id, options)
    }
}

/// Expands an URL template and appends the query pairs of `options`.
pub fn build_url(template: &str, scope_id: &str, options: &ApiOptions) -> Result<Url, FetchError> {
    let expanded = template.replace(SCOPE_PLACEHOLDER, &urlencoding::encode(scope_id));
    let mut url = Url::parse(&expanded).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", expanded, e)))?;
    url.query_pairs_mut().extend_pairs(options.query_pairs());
    Ok(url)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, scope_id: &str, options: &ApiOptions) -> Result<PageEnvelope, FetchError> {
        let url = self.endpoint(scope_id, options)?;
        log::debug!("GET {}", url);

        let mut request = self
            .inner
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::http(status.as_u16(), body));
        }

        let body: Value = response.json().await.map_err(|e| self.map_send_error(e))?;
        let mut envelope = PageEnvelope::from_json(body)?;
        let key_case = self.inner.key_case;
        envelope.results = envelope
            .results
            .into_iter()
            .map(|record| key_case.apply(record))
            .collect();
        Ok(envelope)
    }
}

impl HttpFetcher {
    fn map_send_error(&self, err: reqwest::Error) -> FetchError {
        match self.inner.timeout {
            Some(timeout) if err.is_timeout() => FetchError::Timeout(timeout),
            _ => FetchError::Network(err),
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Builder for [`HttpFetcher`].
///
/// The URL template is required and checked at compile time.
pub struct HttpFetcherBuilder<U> {
    url: U,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    key_case: KeyCase,
    http_client: Option<Client>,
}

impl HttpFetcherBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            timeout: None,
            connect_timeout: None,
            key_case: KeyCase::default(),
            http_client: None,
        }
    }

    /// Sets the endpoint URL template.
    ///
    /// `{scope}` in the template is replaced by the scope id of each request.
    pub fn url(self, url: impl Into<String>) -> HttpFetcherBuilder<Set<String>> {
        HttpFetcherBuilder {
            url: Set(url.into()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            key_case: self.key_case,
            http_client: self.http_client,
        }
    }
}

impl Default for HttpFetcherBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> HttpFetcherBuilder<U> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// Ignored when a custom HTTP client is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the casing applied to record keys.
    pub fn key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    /// Sets a custom HTTP client, e.g. one carrying default auth headers.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl HttpFetcherBuilder<Set<String>> {
    /// Builds the [`HttpFetcher`].
    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpFetcher {
            inner: Arc::new(HttpFetcherInner {
                url_template: self.url.0,
                http_client,
                timeout: self.timeout,
                key_case: self.key_case,
            }),
        })
    }
}
