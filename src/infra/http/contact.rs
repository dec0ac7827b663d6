//! Contact form endpoint.

use axum::{Json, extract::State};
use serde_json::json;

use crate::{application::error::AppError, domain::contact::ContactSubmission};

use super::HttpState;

pub async fn submit(
    State(state): State<HttpState>,
    Json(payload): Json<ContactSubmission>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.contact.relay(payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Thank you for your enquiry. We will be in touch shortly.",
    })))
}
