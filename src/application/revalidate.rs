//! Revalidation trigger: authenticated invalidation of the content cache
//! after CMS edits.
//!
//! One request touches at most two keys: the blog listing and, when a slug
//! is supplied, the matching detail entry. No wildcard invalidation.

use std::sync::Arc;

use serde_json::Value;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::info;

use crate::{
    cache::TtlCache,
    domain::content::{BLOG_LIST_CACHE_KEY, blog_detail_cache_key},
};

#[derive(Debug, Error)]
#[error("revalidation secret mismatch")]
pub struct RevalidateDenied;

#[derive(Debug, Clone)]
pub struct RevalidateOutcome {
    pub revalidated: bool,
    pub slug: Option<String>,
}

pub struct RevalidateService {
    secret: Option<String>,
    cache: Arc<TtlCache<Value>>,
}

impl RevalidateService {
    pub fn new(secret: Option<String>, cache: Arc<TtlCache<Value>>) -> Self {
        Self { secret, cache }
    }

    /// Fail closed: an unconfigured secret rejects every request.
    pub fn authorize(&self, candidate: Option<&str>) -> Result<(), RevalidateDenied> {
        let (Some(secret), Some(candidate)) = (self.secret.as_ref(), candidate) else {
            return Err(RevalidateDenied);
        };
        if secret.as_bytes().ct_eq(candidate.as_bytes()).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(RevalidateDenied)
        }
    }

    pub fn invalidate(&self, slug: Option<&str>) -> RevalidateOutcome {
        self.cache.invalidate(BLOG_LIST_CACHE_KEY);
        if let Some(slug) = slug {
            self.cache.invalidate(&blog_detail_cache_key(slug));
        }

        info!(
            target = "vetrina::revalidate",
            slug = slug.unwrap_or(""),
            "content cache invalidated"
        );

        RevalidateOutcome {
            revalidated: true,
            slug: slug.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn cache() -> Arc<TtlCache<Value>> {
        Arc::new(TtlCache::new("revalidate-test", Duration::from_secs(60)))
    }

    fn service(cache: Arc<TtlCache<Value>>) -> RevalidateService {
        RevalidateService::new(Some("deploy-hook".to_string()), cache)
    }

    #[test]
    fn unconfigured_secret_fails_closed() {
        let service = RevalidateService::new(None, cache());
        assert!(service.authorize(Some("anything")).is_err());
        assert!(service.authorize(None).is_err());
    }

    #[test]
    fn secret_equality_gates_access() {
        let service = service(cache());
        assert!(service.authorize(Some("deploy-hook")).is_ok());
        assert!(service.authorize(Some("WRONG")).is_err());
        assert!(service.authorize(None).is_err());
    }

    #[test]
    fn invalidates_listing_and_detail_only() {
        let store = cache();
        store.set(BLOG_LIST_CACHE_KEY, json!([]), None);
        store.set("/blogs/my-post", json!({}), None);
        store.set("/blogs/other", json!({}), None);

        let outcome = service(store.clone()).invalidate(Some("my-post"));

        assert!(outcome.revalidated);
        assert_eq!(outcome.slug.as_deref(), Some("my-post"));
        assert!(store.get(BLOG_LIST_CACHE_KEY).is_none());
        assert!(store.get("/blogs/my-post").is_none());
        assert!(store.get("/blogs/other").is_some());
    }

    #[test]
    fn missing_slug_touches_only_the_listing() {
        let store = cache();
        store.set(BLOG_LIST_CACHE_KEY, json!([]), None);
        store.set("/blogs/my-post", json!({}), None);

        let outcome = service(store.clone()).invalidate(None);

        assert!(outcome.revalidated);
        assert!(outcome.slug.is_none());
        assert!(store.get(BLOG_LIST_CACHE_KEY).is_none());
        assert!(store.get("/blogs/my-post").is_some());
    }
}
