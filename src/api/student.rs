use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::observability::ClientIp;
use super::{ApiError, ApiResponse, AppState, Coordinate, coordinate};
use crate::services::voting_service::{
    Ballot, BallotSubmission, StudentElection, VoteConfirmation, Voter,
};

#[derive(Deserialize)]
pub struct SubmitVoteRequest {
    pub candidate_id: Option<String>,
    pub voter_image: Option<String>,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

fn voter(user: &CurrentUser) -> Voter {
    Voter {
        user_id: user.0.id.clone(),
        email: user.0.email.clone(),
    }
}

/// GET /api/voting/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<StudentElection>>>, ApiError> {
    let elections = state.voting_service().dashboard(&voter(&user)).await?;
    Ok(Json(ApiResponse::success(elections)))
}

/// GET /api/voting/vote/{election_id}
pub async fn vote_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(election_id): Path<String>,
) -> Result<Json<ApiResponse<Ballot>>, ApiError> {
    let ballot = state
        .voting_service()
        .ballot(&voter(&user), &election_id)
        .await?;
    Ok(Json(ApiResponse::success(ballot)))
}

/// POST /api/voting/vote/{election_id}/submit
pub async fn submit_vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ClientIp(ip_address): ClientIp,
    Path(election_id): Path<String>,
    Json(payload): Json<SubmitVoteRequest>,
) -> Result<Json<ApiResponse<VoteConfirmation>>, ApiError> {
    let submission = BallotSubmission {
        latitude: coordinate(payload.latitude.as_ref()),
        longitude: coordinate(payload.longitude.as_ref()),
        candidate_id: payload.candidate_id,
        voter_image: payload.voter_image,
        city: payload.city,
        country: payload.country,
        ip_address,
    };

    let confirmation = state
        .voting_service()
        .submit(&voter(&user), &election_id, submission)
        .await?;

    Ok(Json(ApiResponse::with_message(
        confirmation,
        "Your vote has been recorded successfully!",
    )))
}

/// GET /api/voting/vote/{election_id}/confirmation
pub async fn vote_confirmation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(election_id): Path<String>,
) -> Result<Json<ApiResponse<VoteConfirmation>>, ApiError> {
    let confirmation = state
        .voting_service()
        .confirmation(&voter(&user), &election_id)
        .await?;
    Ok(Json(ApiResponse::success(confirmation)))
}
