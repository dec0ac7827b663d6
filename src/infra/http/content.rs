//! Public blog read surface over the content fetch gateway.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;

use crate::{
    application::{content::ContentResult, error::AppError, preview::PreviewGate},
    domain::content::{
        BLOG_DETAIL_QUERY, BLOG_LIST_CACHE_KEY, BLOG_LIST_QUERY, BlogPost, blog_detail_cache_key,
        fallback_blog_list,
    },
};

use super::HttpState;

/// Marks responses that were served from bundled fallback content
/// because the CMS fetch did not succeed.
const FALLBACK_HEADER: &str = "x-content-fallback";

pub async fn list_blogs(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let preview = PreviewGate::is_preview(&jar);
    let result: ContentResult<Vec<BlogPost>> = state
        .content
        .fetch(BLOG_LIST_QUERY, &[], Some(BLOG_LIST_CACHE_KEY), None, preview)
        .await;

    if result.success {
        return Json(result).into_response();
    }

    // The listing degrades to the bundled fallback rather than erroring.
    let fallback = ContentResult {
        success: true,
        data: Some(fallback_blog_list()),
        error: None,
        cached: false,
        timestamp: OffsetDateTime::now_utc(),
    };
    let mut response = Json(fallback).into_response();
    response
        .headers_mut()
        .insert(FALLBACK_HEADER, HeaderValue::from_static("1"));
    response
}

pub async fn blog_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Response {
    let preview = PreviewGate::is_preview(&jar);
    let cache_key = blog_detail_cache_key(&slug);
    let result: ContentResult<BlogPost> = state
        .content
        .fetch(
            BLOG_DETAIL_QUERY,
            &[("slug", slug.as_str())],
            Some(&cache_key),
            None,
            preview,
        )
        .await;

    if !result.success {
        // Upstream diagnostics stay in server logs; the client only
        // learns that the content is temporarily unavailable.
        let degraded: ContentResult<BlogPost> = ContentResult {
            success: false,
            data: None,
            error: Some("content temporarily unavailable".to_string()),
            cached: false,
            timestamp: OffsetDateTime::now_utc(),
        };
        let mut response = Json(degraded).into_response();
        response
            .headers_mut()
            .insert(FALLBACK_HEADER, HeaderValue::from_static("1"));
        return response;
    }

    if result.data.is_none() {
        return AppError::NotFound.into_response();
    }

    Json(result).into_response()
}
