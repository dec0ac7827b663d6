//! Preview session endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::application::{
    error::AppError,
    preview::{PreviewError, PreviewGate},
};

use super::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewParams {
    secret: Option<String>,
    slug: Option<String>,
}

/// Enter preview mode. The secret and slug can arrive in the query
/// string or a JSON body; a malformed body is treated as empty rather
/// than rejected.
pub async fn enter(
    State(state): State<HttpState>,
    Query(query): Query<PreviewParams>,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, AppError> {
    let body: PreviewParams = serde_json::from_slice(&body).unwrap_or_default();
    let secret = query.secret.or(body.secret);
    let slug = query.slug.or(body.slug);

    let candidate = secret.ok_or(AppError::Unauthorized)?;
    state
        .preview
        .authorize(&candidate)
        .map_err(|err| match err {
            PreviewError::Unconfigured => {
                AppError::configuration("preview secret is not configured")
            }
            PreviewError::BadSecret => AppError::Unauthorized,
        })?;

    let jar = jar.add(state.preview.grant_cookie());

    let response = match slug.as_deref().filter(|slug| slug.starts_with('/')) {
        Some(slug) => (jar, Redirect::to(slug)).into_response(),
        None => (jar, Json(json!({ "success": true, "preview": true }))).into_response(),
    };
    Ok(response)
}

/// Report whether the request carries the preview capability. No auth:
/// the answer leaks nothing beyond what the caller's own cookie says.
pub async fn status(jar: CookieJar) -> Json<serde_json::Value> {
    let preview = PreviewGate::is_preview(&jar);
    let message = if preview {
        "Preview mode is enabled"
    } else {
        "Preview mode is disabled"
    };
    Json(json!({ "preview": preview, "message": message }))
}

/// Leave preview mode. Clearing the cookie needs no secret.
pub async fn exit(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let jar = jar.add(state.preview.revoke_cookie());
    (jar, Json(json!({ "success": true, "preview": false }))).into_response()
}
