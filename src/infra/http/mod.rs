mod contact;
mod content;
mod feedback;
mod instagram;
mod middleware;
mod preview;
mod revalidate;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{
    contact::ContactService, content::ContentService, feedback::FeedbackService,
    instagram::InstagramService, preview::PreviewGate, revalidate::RevalidateService,
};

pub use middleware::{RequestContext, log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub content: Arc<ContentService>,
    pub preview: Arc<PreviewGate>,
    pub revalidate: Arc<RevalidateService>,
    pub feedback: Arc<FeedbackService>,
    pub contact: Arc<ContactService>,
    pub instagram: Arc<InstagramService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/content/blogs", get(content::list_blogs))
        .route("/content/blogs/{slug}", get(content::blog_detail))
        .route(
            "/preview",
            post(preview::enter)
                .get(preview::status)
                .delete(preview::exit),
        )
        .route("/revalidate", post(revalidate::trigger))
        .route("/feedback", get(feedback::list).post(feedback::submit))
        .route("/contact", post(contact::submit))
        .route("/instagram", get(instagram::feed))
        .route("/_health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
