//! Cache revalidation endpoint for CMS webhooks and deploy hooks.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::application::error::ErrorReport;

use super::HttpState;

const SECRET_HEADER: &str = "x-revalidate-secret";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevalidateParams {
    secret: Option<String>,
    slug: Option<String>,
}

/// The secret comes from the query string or the `x-revalidate-secret`
/// header; the slug from the query string or a JSON body. A malformed
/// body means "no slug", not a rejection.
pub async fn trigger(
    State(state): State<HttpState>,
    Query(query): Query<RevalidateParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let secret = query.secret.or_else(|| {
        headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    if let Err(denied) = state.revalidate.authorize(secret.as_deref()) {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "unauthorized" })),
        )
            .into_response();
        ErrorReport::from_error(
            "infra::http::revalidate",
            StatusCode::UNAUTHORIZED,
            &denied,
        )
        .attach(&mut response);
        return response;
    }

    let body: RevalidateParams = serde_json::from_slice(&body).unwrap_or_default();
    let slug = query.slug.or(body.slug);

    let outcome = state.revalidate.invalidate(slug.as_deref());
    Json(json!({
        "ok": true,
        "revalidated": outcome.revalidated,
        "slug": outcome.slug,
    }))
    .into_response()
}
