//! Instagram feed entries served by the proxy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    pub media_url: String,
    pub permalink: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Proxy output: posts plus whether this is degraded data (missing
/// credentials or upstream failure) rather than a live feed.
#[derive(Debug, Clone)]
pub struct InstagramFeed {
    pub posts: Vec<InstagramPost>,
    pub fallback: bool,
}

impl InstagramFeed {
    pub fn degraded() -> Self {
        Self {
            posts: Vec::new(),
            fallback: true,
        }
    }

    pub fn live(posts: Vec<InstagramPost>) -> Self {
        Self {
            posts,
            fallback: false,
        }
    }
}
