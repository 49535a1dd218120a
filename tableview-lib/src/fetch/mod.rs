//! Fetch boundary: the seam between the controller and the remote endpoint.
//!
//! Anything that can produce a [`PageEnvelope`] for a scope id and a set of
//! [`ApiOptions`] can back a table. [`HttpFetcher`] talks to a REST endpoint;
//! [`fetch_fn`] adapts a closure returning raw JSON, which is handy for tests
//! and for wrapping existing API clients.

mod casing;
mod http;
mod schema;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use casing::KeyCase;
pub use casing::to_camel_case;
pub use casing::to_snake_case;
pub use http::HttpFetcher;
pub use http::HttpFetcherBuilder;
pub use http::SCOPE_PLACEHOLDER;
pub use http::build_url;
pub use schema::PageEnvelope;

use crate::error::FetchError;
use crate::query::ApiOptions;

/// Trait for page sources.
///
/// Implementations perform exactly one request per call; coalescing, ordering
/// and error normalization are the controller's job.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page for `scope_id` (e.g. the owning organization).
    async fn fetch_page(&self, scope_id: &str, options: &ApiOptions) -> Result<PageEnvelope, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch_page(&self, scope_id: &str, options: &ApiOptions) -> Result<PageEnvelope, FetchError> {
        (**self).fetch_page(scope_id, options).await
    }
}

/// A [`PageFetcher`] built from a closure. See [`fetch_fn`].
pub struct FnFetcher<F> {
    f: F,
}

/// Wraps a closure returning a raw JSON response body as a [`PageFetcher`].
///
/// The body goes through [`PageEnvelope::from_json`], so a non-conforming
/// closure surfaces as [`FetchError::Schema`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tableview_lib::fetch::fetch_fn;
///
/// let fetcher = fetch_fn(|_scope, options| async move {
///     Ok(json!({"data": {"count": 1, "numPages": 1, "results": [{"page": options.page}]}}))
/// });
/// ```
pub fn fetch_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(String, ApiOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, FetchError>> + Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> PageFetcher for FnFetcher<F>
where
    F: Fn(String, ApiOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    async fn fetch_page(&self, scope_id: &str, options: &ApiOptions) -> Result<PageEnvelope, FetchError> {
        let body = (self.f)(scope_id.to_string(), options.clone()).await?;
        PageEnvelope::from_json(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_fetch_fn_validates_body() {
        let fetcher = fetch_fn(|scope, options| async move {
            assert_eq!(scope, "acme");
            Ok(json!({"data": {"count": 45, "numPages": 3, "results": [{"page": options.page}]}}))
        });
        let options = ApiOptions {
            page: 2,
            page_size: 20,
            ordering: None,
            params: Default::default(),
        };
        let env = fetcher.fetch_page("acme", &options).await.unwrap();
        assert_eq!(env.count, 45);
        assert_eq!(env.results, vec![json!({"page": 2})]);

        let broken = fetch_fn(|_, _| async { Ok(json!({"rows": []})) });
        let err = broken.fetch_page("acme", &options).await.unwrap_err();
        assert!(matches!(err, FetchError::Schema { .. }));
    }
}
