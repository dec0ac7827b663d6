//! Testimonial endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{application::error::AppError, domain::feedback::NewFeedback};

use super::HttpState;

pub async fn list(State(state): State<HttpState>) -> Result<Json<serde_json::Value>, AppError> {
    let testimonials = state.feedback.list_public().await?;
    Ok(Json(json!({ "testimonials": testimonials })))
}

pub async fn submit(
    State(state): State<HttpState>,
    Json(payload): Json<NewFeedback>,
) -> Result<Response, AppError> {
    let record = state.feedback.submit(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "feedback": record })),
    )
        .into_response())
}
