//! Testimonial service over a pluggable store.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    application::error::AppError,
    domain::feedback::{FeedbackRecord, NewFeedback},
};

/// Public read surface never returns more than this many testimonials.
pub const PUBLIC_LIMIT: usize = 6;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("feedback store io failure: {0}")]
    Io(String),
    #[error("feedback store holds invalid data: {0}")]
    Corrupt(String),
}

/// Persistence seam for testimonials. `load` returns the full collection;
/// `append` adds one record. Implementations own seeding and layout.
#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn load(&self) -> Result<Vec<FeedbackRecord>, StoreError>;
    async fn append(&self, record: FeedbackRecord) -> Result<(), StoreError>;
}

pub struct FeedbackService {
    repo: Arc<dyn FeedbackRepo>,
}

impl FeedbackService {
    pub fn new(repo: Arc<dyn FeedbackRepo>) -> Self {
        Self { repo }
    }

    /// Approved records only, newest first, capped at [`PUBLIC_LIMIT`].
    pub async fn list_public(&self) -> Result<Vec<FeedbackRecord>, AppError> {
        let mut records = self
            .repo
            .load()
            .await
            .map_err(|err| AppError::unexpected(err.to_string()))?;

        records.retain(|record| record.approved);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(PUBLIC_LIMIT);
        Ok(records)
    }

    /// Validate and persist a submission, returning the stored record so
    /// the client can update optimistically.
    pub async fn submit(&self, submission: NewFeedback) -> Result<FeedbackRecord, AppError> {
        let record = submission.into_record()?;
        self.repo
            .append(record.clone())
            .await
            .map_err(|err| AppError::unexpected(err.to_string()))?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryRepo {
        records: Mutex<Vec<FeedbackRecord>>,
    }

    #[async_trait]
    impl FeedbackRepo for MemoryRepo {
        async fn load(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
            Ok(self.records.lock().await.clone())
        }

        async fn append(&self, record: FeedbackRecord) -> Result<(), StoreError> {
            self.records.lock().await.push(record);
            Ok(())
        }
    }

    fn record(name: &str, approved: bool, age_secs: i64) -> FeedbackRecord {
        FeedbackRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: "CTO".to_string(),
            company: "Acme".to_string(),
            rating: 5,
            message: "Solid partner throughout the project.".to_string(),
            approved,
            created_at: OffsetDateTime::now_utc() - time::Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn public_list_filters_sorts_and_caps() {
        let repo = Arc::new(MemoryRepo::default());
        for i in 0..8 {
            repo.append(record(&format!("ok-{i}"), true, i * 60)).await.unwrap();
        }
        repo.append(record("hidden", false, 0)).await.unwrap();

        let service = FeedbackService::new(repo);
        let listed = service.list_public().await.expect("list");

        assert_eq!(listed.len(), PUBLIC_LIMIT);
        assert!(listed.iter().all(|r| r.approved));
        // Newest first: smallest age at the front.
        assert_eq!(listed[0].name, "ok-0");
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn submit_round_trip_appears_in_public_list() {
        let repo = Arc::new(MemoryRepo::default());
        let service = FeedbackService::new(repo);

        let created = service
            .submit(NewFeedback {
                name: "A".to_string(),
                role: "B".to_string(),
                company: "C".to_string(),
                rating: Some(5),
                message: "Great service, highly recommend!".to_string(),
            })
            .await
            .expect("created");

        assert!(created.approved);

        let listed = service.list_public().await.expect("list");
        assert!(listed.iter().any(|r| r.id == created.id));
    }

    #[tokio::test]
    async fn invalid_rating_is_a_validation_error() {
        let service = FeedbackService::new(Arc::new(MemoryRepo::default()));
        let err = service
            .submit(NewFeedback {
                name: "A".to_string(),
                role: "B".to_string(),
                company: "C".to_string(),
                rating: Some(6),
                message: "Great service, highly recommend!".to_string(),
            })
            .await
            .expect_err("rating out of range");
        assert!(err.to_string().contains("rating"));
    }
}
