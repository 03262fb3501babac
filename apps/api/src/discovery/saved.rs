//! Saved jobs: the persistence seam and the per-session saved-id set.
//!
//! The local set only changes after the store confirms the write. A failed
//! toggle leaves it exactly as it was and surfaces `SaveError`.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::job::Job;
use crate::models::saved_job::{NewSavedJob, SavedJob};
use crate::models::user::{CurrentUser, User};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("saved job store failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("could not snapshot job: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Where bookmarks live. Records are keyed by user email and job id.
#[async_trait]
pub trait SavedJobStore: Send + Sync {
    /// All bookmarks for `user_email`, or only those for `job_id` when given.
    async fn find(&self, user_email: &str, job_id: Option<&str>) -> Result<Vec<SavedJob>, SaveError>;

    async fn create(&self, new: NewSavedJob) -> Result<SavedJob, SaveError>;

    async fn delete(&self, id: Uuid) -> Result<(), SaveError>;
}

pub struct PgSavedJobStore {
    db: PgPool,
}

impl PgSavedJobStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SavedJobStore for PgSavedJobStore {
    async fn find(&self, user_email: &str, job_id: Option<&str>) -> Result<Vec<SavedJob>, SaveError> {
        let rows: Vec<SavedJob> = sqlx::query_as(
            r#"
            SELECT * FROM saved_jobs
            WHERE user_email = $1 AND ($2::text IS NULL OR job_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_email)
        .bind(job_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, new: NewSavedJob) -> Result<SavedJob, SaveError> {
        let row: SavedJob = sqlx::query_as(
            r#"
            INSERT INTO saved_jobs (user_email, job_id, job_title, company, job_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.user_email)
        .bind(&new.job_id)
        .bind(&new.job_title)
        .bind(&new.company)
        .bind(&new.job_data)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SaveError> {
        sqlx::query("DELETE FROM saved_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Process-local store used when no database is configured. Bookmarks are
/// lost on restart.
#[derive(Default)]
pub struct InMemorySavedJobStore {
    rows: Mutex<Vec<SavedJob>>,
}

#[async_trait]
impl SavedJobStore for InMemorySavedJobStore {
    async fn find(&self, user_email: &str, job_id: Option<&str>) -> Result<Vec<SavedJob>, SaveError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|r| r.user_email == user_email)
            .filter(|r| job_id.map_or(true, |id| r.job_id == id))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewSavedJob) -> Result<SavedJob, SaveError> {
        let row = SavedJob {
            id: Uuid::new_v4(),
            user_email: new.user_email,
            job_id: new.job_id,
            job_title: new.job_title,
            company: new.company,
            job_data: new.job_data,
            created_at: chrono::Utc::now(),
        };
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SaveError> {
        self.rows.lock().await.retain(|r| r.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Saved,
    Unsaved,
    /// No identity; nothing was written and the caller should send the user
    /// to sign up.
    RedirectToSignup,
}

#[derive(Default)]
struct SavedSet {
    owner: Option<String>,
    ids: HashSet<String>,
}

/// Saved job ids for whoever is using this session.
#[derive(Default)]
pub struct SaveState {
    inner: Mutex<SavedSet>,
}

impl SaveState {
    /// Replaces the local set with the user's stored bookmarks.
    pub async fn load(&self, user: &User, store: &dyn SavedJobStore) -> Result<Vec<String>, SaveError> {
        let mut set = self.inner.lock().await;
        reload(&mut set, user, store).await?;
        let mut ids: Vec<String> = set.ids.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub async fn is_saved(&self, job_id: &str) -> bool {
        self.inner.lock().await.ids.contains(job_id)
    }

    /// Saves `job` if it is not saved, otherwise deletes its first stored
    /// bookmark.
    /// Toggles for one session are serialized.
    pub async fn toggle_saved(
        &self,
        current: &CurrentUser,
        job: &Job,
        store: &dyn SavedJobStore,
    ) -> Result<ToggleOutcome, SaveError> {
        let Some(user) = current.user() else {
            return Ok(ToggleOutcome::RedirectToSignup);
        };

        let mut set = self.inner.lock().await;
        if set.owner.as_deref() != Some(user.email.as_str()) {
            reload(&mut set, user, store).await?;
        }

        if set.ids.contains(&job.id) {
            let existing = store.find(&user.email, Some(&job.id)).await?;
            if let Some(record) = existing.first() {
                store.delete(record.id).await?;
            }
            set.ids.remove(&job.id);
            info!(job_id = %job.id, "Job unsaved");
            Ok(ToggleOutcome::Unsaved)
        } else {
            let new = NewSavedJob::snapshot(&user.email, job)?;
            store.create(new).await?;
            set.ids.insert(job.id.clone());
            info!(job_id = %job.id, "Job saved");
            Ok(ToggleOutcome::Saved)
        }
    }
}

/// The user's stored bookmark ids, sorted, without touching any session.
pub async fn stored_job_ids(user: &User, store: &dyn SavedJobStore) -> Result<Vec<String>, SaveError> {
    let rows = store.find(&user.email, None).await.map_err(|e| {
        warn!(error = %e, "Failed to load saved jobs");
        e
    })?;
    let mut ids: Vec<String> = rows.into_iter().map(|r| r.job_id).collect();
    ids.sort();
    ids.dedup();
    Ok(ids)
}

async fn reload(set: &mut SavedSet, user: &User, store: &dyn SavedJobStore) -> Result<(), SaveError> {
    set.ids = stored_job_ids(user, store).await?.into_iter().collect();
    set.owner = Some(user.email.clone());
    Ok(())
}
