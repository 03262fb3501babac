use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::Job;

/// A user-scoped bookmark. Survives independently of any result set, so it
/// carries a denormalized snapshot of the job as it looked when saved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedJob {
    pub id: Uuid,
    pub user_email: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub job_data: Value,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new bookmark.
#[derive(Debug, Clone, Serialize)]
pub struct NewSavedJob {
    pub user_email: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub job_data: Value,
}

impl NewSavedJob {
    pub fn snapshot(user_email: &str, job: &Job) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user_email: user_email.to_string(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            job_data: serde_json::to_value(job)?,
        })
    }
}
