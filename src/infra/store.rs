//! JSON-file persistence for testimonials.
//!
//! The whole collection lives in one pretty-printed JSON array. Writes go
//! through a temp file plus rename so a crash mid-write never leaves a
//! truncated store, and an async mutex serializes concurrent appends
//! within the process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use time::macros::datetime;
use tokio::{fs, sync::Mutex};
use tracing::info;

use crate::{
    application::feedback::{FeedbackRepo, StoreError},
    config::FeedbackSettings,
    domain::feedback::FeedbackRecord,
};

pub struct FileFeedbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileFeedbackStore {
    pub fn new(settings: &FeedbackSettings) -> Self {
        Self {
            path: settings.path.clone(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create the store file with seed testimonials when it is absent.
    async fn ensure_store(&self) -> Result<(), StoreError> {
        if fs::try_exists(&self.path)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?
        {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Io(err.to_string()))?;
        }

        write_records(&self.path, &seed_records()).await?;
        info!(
            target = "vetrina::store",
            path = %self.path.display(),
            "seeded feedback store"
        );
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.ensure_store().await?;
        let raw = fs::read_to_string(&self.path)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt(err.to_string()))
    }
}

async fn write_records(path: &Path, records: &[FeedbackRecord]) -> Result<(), StoreError> {
    let body =
        serde_json::to_string_pretty(records).map_err(|err| StoreError::Corrupt(err.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body.as_bytes())
        .await
        .map_err(|err| StoreError::Io(err.to_string()))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|err| StoreError::Io(err.to_string()))
}

#[async_trait]
impl FeedbackRepo for FileFeedbackStore {
    async fn load(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.read_all().await
    }

    async fn append(&self, record: FeedbackRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record);
        write_records(&self.path, &records).await
    }
}

fn seed_records() -> Vec<FeedbackRecord> {
    vec![
        FeedbackRecord {
            id: "c2d8a3f0-5b1e-4f7a-9c6d-0e2b4a8f1d3c".to_string(),
            name: "Marta Greco".to_string(),
            role: "Head of Marketing".to_string(),
            company: "Lumen Retail".to_string(),
            rating: 5,
            message: "They rebuilt our storefront in six weeks and conversions went up \
                      immediately. Communication was clear at every step."
                .to_string(),
            approved: true,
            created_at: datetime!(2024-03-18 09:30:00 UTC),
        },
        FeedbackRecord {
            id: "7f4e9b21-8c6a-4d35-b1e0-52a9c7d3f8e4".to_string(),
            name: "Davide Ferri".to_string(),
            role: "CTO".to_string(),
            company: "Nodo Logistics".to_string(),
            rating: 5,
            message: "Rare to find a team that handles both infrastructure and design this \
                      well. Our platform has been rock solid since launch."
                .to_string(),
            approved: true,
            created_at: datetime!(2024-05-02 14:10:00 UTC),
        },
        FeedbackRecord {
            id: "3a1d6c85-e9f2-47b0-8d4c-b6e1f0a92735".to_string(),
            name: "Elena Bianchi".to_string(),
            role: "Founder".to_string(),
            company: "Studio Trame".to_string(),
            rating: 4,
            message: "Professional, responsive, and honest about trade-offs. We extended the \
                      contract for a second project."
                .to_string(),
            approved: true,
            created_at: datetime!(2024-06-21 11:45:00 UTC),
        },
    ]
}
