use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discovery::board::{
    JobBoard, SearchOutcome, SelectOutcome, Selection, ViewMode,
};
use crate::discovery::filters::FacetFilter;
use crate::discovery::providers::ProviderQuery;
use crate::discovery::saved::{stored_job_ids, ToggleOutcome};
use crate::discovery::sorting::SortStrategy;
use crate::errors::AppError;
use crate::models::job::Job;
use crate::models::user::CurrentUser;
use crate::state::AppState;

/// Header set by the hosted auth layer in front of this service.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(CurrentUser::from_email(email))
    }
}

async fn existing_board(state: &AppState, session_id: Uuid) -> Result<Arc<JobBoard>, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} has no search yet")))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub search: Option<String>,
    /// Country code; defaults to `us`.
    pub location: Option<String>,
    pub page: Option<u32>,
    pub sort: Option<SortStrategy>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub generation: u64,
    pub total_count: usize,
    pub jobs: Vec<Job>,
    pub no_jobs_found: bool,
    pub message: Option<&'static str>,
    pub selection: Selection,
}

/// POST /api/v1/sessions/:session_id/search
pub async fn handle_search(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if req.page == Some(0) {
        return Err(AppError::Validation("page starts at 1".to_string()));
    }

    let board = state.sessions.get_or_create(session_id).await;
    let query = ProviderQuery::new(req.search.as_deref(), req.location.as_deref(), req.page);
    let outcome = board
        .search(&state.pipeline, &query, req.sort.unwrap_or_default(), Utc::now())
        .await;

    let (generation, jobs, message) = match outcome {
        SearchOutcome::Results { generation, jobs } => (generation, jobs, None),
        SearchOutcome::NoJobsFound { generation, message } => (generation, Vec::new(), Some(message)),
        SearchOutcome::Superseded => {
            return Err(AppError::Conflict(
                "A newer search replaced this one".to_string(),
            ))
        }
    };

    Ok(Json(SearchResponse {
        generation,
        total_count: jobs.len(),
        no_jobs_found: jobs.is_empty(),
        message,
        jobs,
        selection: board.selection().await,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewRequest {
    pub sort: Option<SortStrategy>,
    #[serde(flatten)]
    pub facets: FacetFilter,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub generation: u64,
    pub total_count: usize,
    pub jobs: Vec<Job>,
}

/// POST /api/v1/sessions/:session_id/view
pub async fn handle_view(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    body: Option<Json<ViewRequest>>,
) -> Result<Json<ViewResponse>, AppError> {
    let board = existing_board(&state, session_id).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let (generation, jobs) = board
        .view(&req.facets, req.sort.unwrap_or_default())
        .await;
    Ok(Json(ViewResponse {
        generation,
        total_count: jobs.len(),
        jobs,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub view_mode: ViewMode,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    #[serde(flatten)]
    pub outcome: SelectOutcome,
    pub selection: Selection,
    pub saved: bool,
}

/// POST /api/v1/sessions/:session_id/jobs/:job_id/select
pub async fn handle_select_job(
    State(state): State<AppState>,
    Path((session_id, job_id)): Path<(Uuid, String)>,
    body: Option<Json<SelectRequest>>,
) -> Result<Json<SelectResponse>, AppError> {
    let board = existing_board(&state, session_id).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let outcome = board.select_job(&job_id, req.view_mode).await?;
    Ok(Json(SelectResponse {
        saved: board.saves.is_saved(&outcome.job.id).await,
        selection: board.selection().await,
        outcome,
    }))
}

/// POST /api/v1/sessions/:session_id/detail/close
pub async fn handle_close_detail(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Selection>, AppError> {
    let board = existing_board(&state, session_id).await?;
    Ok(Json(board.close_detail().await))
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub job_id: String,
    pub outcome: ToggleOutcome,
    pub saved: bool,
}

/// POST /api/v1/sessions/:session_id/jobs/:job_id/save
/// Unauthenticated callers are redirected to sign up and nothing is written.
pub async fn handle_toggle_save(
    State(state): State<AppState>,
    Path((session_id, job_id)): Path<(Uuid, String)>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    if user.user().is_none() {
        return Ok(Redirect::to(&state.config.signup_url).into_response());
    }

    let board = existing_board(&state, session_id).await?;
    let job = board
        .job(&job_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} is not in the current results")))?;

    let outcome = board
        .saves
        .toggle_saved(&user, &job, state.saved_store.as_ref())
        .await?;

    if outcome == ToggleOutcome::RedirectToSignup {
        return Ok(Redirect::to(&state.config.signup_url).into_response());
    }

    Ok(Json(SaveResponse {
        job_id,
        outcome,
        saved: outcome == ToggleOutcome::Saved,
    })
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub saved_job_ids: Vec<String>,
}

/// GET /api/v1/sessions/:session_id/saved
/// Reads the store directly when the session has no board yet.
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<SavedResponse>, AppError> {
    let user = user.user().ok_or(AppError::Unauthorized)?;
    let saved_job_ids = match state.sessions.get(session_id).await {
        Some(board) => board.saves.load(user, state.saved_store.as_ref()).await?,
        None => stored_job_ids(user, state.saved_store.as_ref()).await?,
    };
    Ok(Json(SavedResponse { saved_job_ids }))
}
