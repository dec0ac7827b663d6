//! Instagram feed endpoint.

use axum::{
    Json,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::HttpState;

/// Set when the feed was served degraded instead of from the live API.
const FALLBACK_HEADER: &str = "x-ig-fallback";

pub async fn feed(State(state): State<HttpState>) -> Response {
    let feed = state.instagram.latest().await;

    let mut response = Json(json!({ "posts": feed.posts })).into_response();
    if feed.fallback {
        response
            .headers_mut()
            .insert(FALLBACK_HEADER, HeaderValue::from_static("1"));
    }
    response
}
