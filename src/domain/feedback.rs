//! Testimonial records submitted through the site feedback form.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Persisted testimonial. Records are append-only: once written they are
/// never mutated server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub company: String,
    pub rating: u8,
    pub message: String,
    pub approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Incoming form payload, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub message: String,
}

impl NewFeedback {
    /// Validate and promote to a stored record. Submissions are approved
    /// unconditionally; there is no moderation step.
    pub fn into_record(self) -> Result<FeedbackRecord, DomainError> {
        let name = required(&self.name, "name")?;
        let role = required(&self.role, "role")?;
        let company = required(&self.company, "company")?;
        let message = required(&self.message, "message")?;

        let rating = self
            .rating
            .ok_or_else(|| DomainError::validation("rating is required"))?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(DomainError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        Ok(FeedbackRecord {
            id: Uuid::new_v4().to_string(),
            name,
            role,
            company,
            rating,
            message,
            approved: true,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(rating: Option<u8>) -> NewFeedback {
        NewFeedback {
            name: "A".to_string(),
            role: "B".to_string(),
            company: "C".to_string(),
            rating,
            message: "Great service, highly recommend!".to_string(),
        }
    }

    #[test]
    fn valid_submission_is_auto_approved() {
        let record = submission(Some(5)).into_record().expect("valid record");
        assert!(record.approved);
        assert_eq!(record.rating, 5);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn ids_are_unique_across_submissions() {
        let a = submission(Some(4)).into_record().expect("record");
        let b = submission(Some(4)).into_record().expect("record");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn rating_bounds_are_enforced() {
        assert!(submission(Some(0)).into_record().is_err());
        assert!(submission(Some(6)).into_record().is_err());
        for rating in MIN_RATING..=MAX_RATING {
            assert!(submission(Some(rating)).into_record().is_ok());
        }
    }

    #[test]
    fn missing_rating_is_rejected() {
        assert!(submission(None).into_record().is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut s = submission(Some(3));
        s.company = "   ".to_string();
        let err = s.into_record().expect_err("blank company");
        assert!(err.to_string().contains("company"));
    }
}
