//! Content fetch gateway.
//!
//! Every CMS read funnels through [`ContentService::fetch`], which applies
//! the TTL cache, selects the public or draft-capable client, and
//! normalizes every outcome into a [`ContentResult`]. The gateway never
//! propagates upstream failures: callers branch on `success` and fall back
//! to bundled content, so a page can always render something even with the
//! CMS fully unreachable.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::cache::TtlCache;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("cms transport error: {0}")]
    Transport(String),
    #[error("cms returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cms response could not be decoded: {0}")]
    Decode(String),
    #[error("no cms project configured")]
    Unconfigured,
}

/// Seam over the CMS query endpoint. One implementation per credential
/// level: the public client and, when a read token is configured, the
/// draft-capable one.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a query with named parameters and return the raw result value.
    async fn query(&self, query: &str, params: &[(&str, &str)]) -> Result<Value, CmsError>;
}

/// Uniform outcome of a content fetch, regardless of source.
///
/// Holds two invariants: `success == false` implies `data` is `None`, and
/// `cached == true` implies `success == true`.
#[derive(Debug, Clone, Serialize)]
pub struct ContentResult<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl<T> ContentResult<T> {
    fn fresh(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            cached: false,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    fn from_cache(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            cached: true,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            cached: false,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

pub struct ContentService {
    cache: Arc<TtlCache<Value>>,
    public: Arc<dyn ContentClient>,
    privileged: Option<Arc<dyn ContentClient>>,
}

impl ContentService {
    pub fn new(
        cache: Arc<TtlCache<Value>>,
        public: Arc<dyn ContentClient>,
        privileged: Option<Arc<dyn ContentClient>>,
    ) -> Self {
        Self {
            cache,
            public,
            privileged,
        }
    }

    /// Fetch content, cached under `cache_key` unless `preview` is set.
    ///
    /// Preview bypasses the cache on both read and write so draft edits are
    /// visible immediately. Any upstream error resolves to a failed result
    /// rather than an `Err`; empty and null results are valid successes.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
        cache_key: Option<&str>,
        ttl: Option<Duration>,
        preview: bool,
    ) -> ContentResult<T> {
        if !preview
            && let Some(key) = cache_key
            && let Some(value) = self.cache.get(key)
        {
            match decode(value) {
                Ok(data) => return ContentResult::from_cache(data),
                Err(err) => {
                    // A stored value that no longer decodes is useless;
                    // drop it and fetch live.
                    warn!(
                        target = "vetrina::content",
                        key,
                        error = %err,
                        "evicting undecodable cache entry"
                    );
                    self.cache.invalidate(key);
                }
            }
        }

        let client = self.select_client(preview);

        match client.query(query, params).await {
            Ok(value) => {
                if !preview && let Some(key) = cache_key {
                    self.cache.set(key, value.clone(), ttl);
                }
                match decode(value) {
                    Ok(data) => ContentResult::fresh(data),
                    Err(err) => {
                        counter!("vetrina_content_fetch_fail_total").increment(1);
                        ContentResult::failed(err.to_string())
                    }
                }
            }
            Err(err) => {
                counter!("vetrina_content_fetch_fail_total").increment(1);
                warn!(
                    target = "vetrina::content",
                    error = %err,
                    preview,
                    "content fetch failed, caller will serve fallback"
                );
                ContentResult::failed(err.to_string())
            }
        }
    }

    /// Preview requests use the draft-capable client when one is
    /// configured. When the read token is absent the request silently
    /// falls back to the public client: a misconfigured preview must
    /// never fail a page load, it just stops showing drafts.
    fn select_client(&self, preview: bool) -> Arc<dyn ContentClient> {
        if !preview {
            return self.public.clone();
        }
        match self.privileged.as_ref() {
            Some(client) => client.clone(),
            None => {
                warn!(
                    target = "vetrina::content",
                    "preview requested but no api token configured, serving published content"
                );
                self.public.clone()
            }
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<Option<T>, serde_json::Error> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::domain::content::BlogPost;

    struct StubClient {
        result: Value,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubClient {
        fn ok(result: Value) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                result: Value::Null,
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentClient for StubClient {
        async fn query(&self, _query: &str, _params: &[(&str, &str)]) -> Result<Value, CmsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CmsError::Transport("connection refused".to_string()));
            }
            Ok(self.result.clone())
        }
    }

    fn cache() -> Arc<TtlCache<Value>> {
        Arc::new(TtlCache::new("content-test", Duration::from_secs(60)))
    }

    fn posts_json() -> Value {
        json!([{ "id": "b1", "slug": "hello", "title": "Hello" }])
    }

    #[tokio::test]
    async fn fetch_populates_and_reuses_the_cache() {
        let client = Arc::new(StubClient::ok(posts_json()));
        let service = ContentService::new(cache(), client.clone(), None);

        let first: ContentResult<Vec<BlogPost>> = service
            .fetch("q", &[], Some("/blogs"), None, false)
            .await;
        assert!(first.success);
        assert!(!first.cached);

        let second: ContentResult<Vec<BlogPost>> = service
            .fetch("q", &[], Some("/blogs"), None, false)
            .await;
        assert!(second.success);
        assert!(second.cached);
        assert_eq!(second.data.expect("posts").len(), 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn preview_always_bypasses_the_cache() {
        let client = Arc::new(StubClient::ok(posts_json()));
        let service = ContentService::new(cache(), client.clone(), None);

        // Warm the cache through a published fetch first.
        let _: ContentResult<Vec<BlogPost>> = service
            .fetch("q", &[], Some("/blogs"), None, false)
            .await;

        for _ in 0..2 {
            let result: ContentResult<Vec<BlogPost>> = service
                .fetch("q", &[], Some("/blogs"), None, true)
                .await;
            assert!(result.success);
            assert!(!result.cached);
        }
        // One published fetch plus two preview fetches, no reuse.
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn preview_does_not_write_the_cache() {
        let client = Arc::new(StubClient::ok(posts_json()));
        let store = cache();
        let service = ContentService::new(store.clone(), client, None);

        let _: ContentResult<Vec<BlogPost>> = service
            .fetch("q", &[], Some("/blogs"), None, true)
            .await;
        assert!(store.get("/blogs").is_none());
    }

    #[tokio::test]
    async fn upstream_errors_are_contained() {
        let service = ContentService::new(cache(), Arc::new(StubClient::failing()), None);

        let result: ContentResult<Vec<BlogPost>> =
            service.fetch("q", &[], Some("/blogs"), None, false).await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.expect("error message").contains("transport"));
        assert!(!result.cached);
    }

    #[tokio::test]
    async fn null_results_are_successes() {
        let service = ContentService::new(cache(), Arc::new(StubClient::ok(Value::Null)), None);

        let result: ContentResult<BlogPost> = service.fetch("q", &[], None, None, false).await;
        assert!(result.success);
        assert!(result.data.is_none());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn empty_lists_are_successes() {
        let service = ContentService::new(cache(), Arc::new(StubClient::ok(json!([]))), None);

        let result: ContentResult<Vec<BlogPost>> =
            service.fetch("q", &[], None, None, false).await;
        assert!(result.success);
        assert_eq!(result.data.expect("empty list").len(), 0);
    }

    #[tokio::test]
    async fn preview_without_token_falls_back_to_public_client() {
        let public = Arc::new(StubClient::ok(posts_json()));
        let service = ContentService::new(cache(), public.clone(), None);

        let result: ContentResult<Vec<BlogPost>> =
            service.fetch("q", &[], None, None, true).await;
        assert!(result.success);
        assert_eq!(public.calls(), 1);
    }

    #[tokio::test]
    async fn preview_with_token_uses_the_privileged_client() {
        let public = Arc::new(StubClient::ok(posts_json()));
        let privileged = Arc::new(StubClient::ok(posts_json()));
        let service = ContentService::new(
            cache(),
            public.clone(),
            Some(privileged.clone() as Arc<dyn ContentClient>),
        );

        let _: ContentResult<Vec<BlogPost>> = service.fetch("q", &[], None, None, true).await;
        assert_eq!(public.calls(), 0);
        assert_eq!(privileged.calls(), 1);
    }
}
