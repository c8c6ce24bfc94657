use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{parse_datetime, present, require_all};
use super::{ApiError, ApiResponse, AppState};
use crate::db::{Candidate, Election, ElectionInput, ElectionRemoval};
use crate::services::election_service::{
    AdminDashboard, CandidateForm, ElectionResults, ElectionSummary, StudentSummary,
};

#[derive(Deserialize)]
pub struct ElectionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Only read on update; new elections always start active.
    #[serde(default)]
    pub is_active: bool,
}

impl ElectionRequest {
    fn into_input(self) -> Result<ElectionInput, ApiError> {
        require_all(
            &[
                self.title.as_deref(),
                self.description.as_deref(),
                self.start_date.as_deref(),
                self.end_date.as_deref(),
            ],
            "All fields are required.",
        )?;

        let start_date = parse_datetime(self.start_date.as_deref().unwrap_or_default())?;
        let end_date = parse_datetime(self.end_date.as_deref().unwrap_or_default())?;

        Ok(ElectionInput {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default().trim().to_string(),
            start_date,
            end_date,
            is_active: self.is_active,
        })
    }
}

#[derive(Deserialize)]
pub struct CandidateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<String>,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct StudentQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct CandidateList {
    pub election: Election,
    pub candidates: Vec<Candidate>,
    pub candidates_count: usize,
}

#[derive(Serialize)]
pub struct StudentList {
    pub query: String,
    pub students: Vec<StudentSummary>,
}

#[derive(Serialize)]
pub struct StudentRemoval {
    pub removed_votes: u64,
}

/// GET /api/voting/admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AdminDashboard>>, ApiError> {
    let dashboard = state.election_service().dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// GET /api/voting/admin/elections
pub async fn list_elections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ElectionSummary>>>, ApiError> {
    let elections = state.election_service().list_elections().await?;
    Ok(Json(ApiResponse::success(elections)))
}

/// POST /api/voting/admin/elections
pub async fn create_election(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(payload): Json<ElectionRequest>,
) -> Result<Json<ApiResponse<Election>>, ApiError> {
    let input = payload.into_input()?;
    let election = state
        .election_service()
        .create_election(input, &admin.email)
        .await?;

    let message = format!("Election \"{}\" created successfully!", election.title);
    Ok(Json(ApiResponse::with_message(election, message)))
}

/// GET /api/voting/admin/elections/{id}
pub async fn get_election(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Election>>, ApiError> {
    let election = state.election_service().get_election(&id).await?;
    Ok(Json(ApiResponse::success(election)))
}

/// PUT /api/voting/admin/elections/{id}
pub async fn update_election(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ElectionRequest>,
) -> Result<Json<ApiResponse<Election>>, ApiError> {
    let input = payload.into_input()?;
    let election = state.election_service().update_election(&id, input).await?;
    Ok(Json(ApiResponse::with_message(
        election,
        "Election updated successfully!",
    )))
}

/// DELETE /api/voting/admin/elections/{id}
pub async fn delete_election(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ElectionRemoval>>, ApiError> {
    let removed = state.election_service().delete_election(&id).await?;
    Ok(Json(ApiResponse::with_message(
        removed,
        "Election deleted successfully!",
    )))
}

/// GET /api/voting/admin/elections/{id}/candidates
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CandidateList>>, ApiError> {
    let (election, candidates) = state.election_service().list_candidates(&id).await?;
    Ok(Json(ApiResponse::success(CandidateList {
        election,
        candidates_count: candidates.len(),
        candidates,
    })))
}

/// POST /api/voting/admin/elections/{id}/candidates
pub async fn add_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<CandidateRequest>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    let candidate = state
        .election_service()
        .add_candidate(
            &id,
            CandidateForm {
                name: payload.name.unwrap_or_default(),
                description: payload.description.unwrap_or_default(),
                position: payload.position.unwrap_or_default(),
                image: payload.image.unwrap_or_default(),
            },
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        candidate,
        "Candidate added successfully!",
    )))
}

/// DELETE /api/voting/admin/candidates/{id}
pub async fn delete_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    let candidate = state.election_service().delete_candidate(&id).await?;
    Ok(Json(ApiResponse::with_message(
        candidate,
        "Candidate deleted successfully!",
    )))
}

/// GET /api/voting/admin/elections/{id}/results
pub async fn results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ElectionResults>>, ApiError> {
    let results = state.election_service().results(&id).await?;
    Ok(Json(ApiResponse::success(results)))
}

/// GET /api/voting/admin/students?q=
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<ApiResponse<StudentList>>, ApiError> {
    let q = present(query.q.as_deref());
    let students = state.election_service().list_students(q).await?;
    Ok(Json(ApiResponse::success(StudentList {
        query: q.unwrap_or_default().to_string(),
        students,
    })))
}

/// DELETE /api/voting/admin/students/{id}
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StudentRemoval>>, ApiError> {
    let removed_votes = state.election_service().delete_student(&id).await?;
    Ok(Json(ApiResponse::with_message(
        StudentRemoval { removed_votes },
        "Student and their votes deleted successfully.",
    )))
}
