//! Instagram feed proxy.
//!
//! One shared cache entry throttles all callers to one upstream call per
//! TTL window. Missing credentials and upstream failures both degrade to
//! an empty feed marked as fallback; this path never errors outward.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::{
    cache::TtlCache,
    domain::instagram::{InstagramFeed, InstagramPost},
};

const FEED_CACHE_KEY: &str = "feed";

#[derive(Debug, Error)]
pub enum InstagramError {
    #[error("instagram transport error: {0}")]
    Transport(String),
    #[error("instagram returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("instagram response could not be decoded: {0}")]
    Decode(String),
}

/// Seam over the Instagram media endpoint. Absent when credentials are
/// not configured.
#[async_trait]
pub trait InstagramApi: Send + Sync {
    async fn recent_media(&self) -> Result<Vec<InstagramPost>, InstagramError>;
}

pub struct InstagramService {
    api: Option<Arc<dyn InstagramApi>>,
    cache: Arc<TtlCache<Vec<InstagramPost>>>,
}

impl InstagramService {
    pub fn new(api: Option<Arc<dyn InstagramApi>>, cache: Arc<TtlCache<Vec<InstagramPost>>>) -> Self {
        Self { api, cache }
    }

    pub async fn latest(&self) -> InstagramFeed {
        if let Some(posts) = self.cache.get(FEED_CACHE_KEY) {
            return InstagramFeed::live(posts);
        }

        let Some(api) = self.api.as_ref() else {
            warn!(
                target = "vetrina::instagram",
                "instagram credentials not configured, serving fallback feed"
            );
            return InstagramFeed::degraded();
        };

        match api.recent_media().await {
            Ok(posts) => {
                self.cache.set(FEED_CACHE_KEY, posts.clone(), None);
                InstagramFeed::live(posts)
            }
            Err(err) => {
                warn!(
                    target = "vetrina::instagram",
                    error = %err,
                    "instagram fetch failed, serving fallback feed"
                );
                InstagramFeed::degraded()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    struct StubApi {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubApi {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl InstagramApi for StubApi {
        async fn recent_media(&self) -> Result<Vec<InstagramPost>, InstagramError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(InstagramError::Status {
                    status: 429,
                    body: "rate limited".to_string(),
                });
            }
            Ok(vec![InstagramPost {
                media_url: "https://cdn.example/1.jpg".to_string(),
                permalink: "https://instagram.com/p/1".to_string(),
                caption: "studio life".to_string(),
                timestamp: "2024-06-01T12:00:00+0000".to_string(),
            }])
        }
    }

    fn cache() -> Arc<TtlCache<Vec<InstagramPost>>> {
        Arc::new(TtlCache::new("instagram-test", Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn all_callers_share_one_cache_entry() {
        let api = Arc::new(StubApi::ok());
        let service = InstagramService::new(Some(api.clone() as Arc<dyn InstagramApi>), cache());

        for _ in 0..5 {
            let feed = service.latest().await;
            assert!(!feed.fallback);
            assert_eq!(feed.posts.len(), 1);
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_credentials_degrade_without_error() {
        let service = InstagramService::new(None, cache());
        let feed = service.latest().await;
        assert!(feed.fallback);
        assert!(feed.posts.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_degrades_without_error() {
        let service =
            InstagramService::new(Some(Arc::new(StubApi::failing()) as Arc<dyn InstagramApi>), cache());
        let feed = service.latest().await;
        assert!(feed.fallback);
        assert!(feed.posts.is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_poison_the_cache() {
        let store = cache();
        let failing =
            InstagramService::new(Some(Arc::new(StubApi::failing()) as Arc<dyn InstagramApi>), store.clone());
        let _ = failing.latest().await;

        let api = Arc::new(StubApi::ok());
        let healthy = InstagramService::new(Some(api.clone() as Arc<dyn InstagramApi>), store);
        let feed = healthy.latest().await;
        assert!(!feed.fallback);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }
}
