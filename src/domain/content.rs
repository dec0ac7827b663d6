//! CMS content records and query text.
//!
//! The CMS query API returns documents shaped by GROQ projections; the
//! projections below alias CMS internals (`_id`, `slug.current`) onto the
//! flat field names these records use.

use serde::{Deserialize, Serialize};

/// Cache keys mirror the site paths they back, so the revalidation
/// trigger can name them by path.
pub const BLOG_LIST_CACHE_KEY: &str = "/blogs";

pub fn blog_detail_cache_key(slug: &str) -> String {
    format!("/blogs/{slug}")
}

pub const BLOG_LIST_QUERY: &str = r#"*[_type == "blog"] | order(publishedAt desc) {
  "id": _id, "slug": slug.current, title, excerpt, publishedAt, "author": author->name
}"#;

pub const BLOG_DETAIL_QUERY: &str = r#"*[_type == "blog" && slug.current == $slug][0] {
  "id": _id, "slug": slug.current, title, excerpt, body, publishedAt, "author": author->name
}"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Bundled fallback for the blog listing when the CMS is unreachable.
/// The page renders its static copy around an empty list; what matters is
/// that the read path degrades instead of erroring.
pub fn fallback_blog_list() -> Vec<BlogPost> {
    Vec::new()
}
