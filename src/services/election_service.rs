//! Domain service for the admin side: elections, candidates, results and
//! student records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::{Candidate, Election, ElectionInput, ElectionRemoval, User};
use crate::domain::ElectionStatus;
use crate::services::media::MediaError;

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("Election not found (ID: {0})")]
    NotFound(String),

    #[error("Candidate not found (ID: {0})")]
    CandidateNotFound(String),

    #[error("Student not found (ID: {0})")]
    StudentNotFound(String),

    #[error("Cannot delete admin accounts from here.")]
    AdminProtected,

    #[error("{0}")]
    Validation(String),

    #[error("Error processing image: {0}")]
    Image(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ElectionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Election row with its derived status and ballot count.
#[derive(Debug, Clone, Serialize)]
pub struct ElectionSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_ongoing: bool,
    pub status: ElectionStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub vote_count: u64,
}

impl ElectionSummary {
    #[must_use]
    pub fn new(election: Election, vote_count: u64, now: DateTime<Utc>) -> Self {
        let status = ElectionStatus::at(election.start_date, election.end_date, now);
        Self {
            is_ongoing: election.is_active && status == ElectionStatus::Active,
            status,
            id: election.id,
            title: election.title,
            description: election.description,
            start_date: election.start_date,
            end_date: election.end_date,
            is_active: election.is_active,
            created_by: election.created_by,
            created_at: election.created_at,
            vote_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_elections: u64,
    pub active_elections: u64,
    pub total_students: u64,
    pub total_votes: u64,
    pub recent_elections: Vec<ElectionSummary>,
    pub chart_labels: Vec<String>,
    pub chart_data: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
    pub candidate: Candidate,
    pub votes: u64,
    pub percentage: f64,
}

/// One ballot in the results audit log.
#[derive(Debug, Clone, Serialize)]
pub struct VoteAuditEntry {
    pub vote_id: String,
    pub voter_email: String,
    pub voter_name: String,
    pub student_id: String,
    pub profile_image_base64: Option<String>,
    pub candidate_id: String,
    pub candidate_name: String,
    pub voter_image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub ip_address: String,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElectionResults {
    pub election: ElectionSummary,
    pub total_votes: u64,
    pub results: Vec<CandidateResult>,
    pub chart_labels: Vec<String>,
    pub chart_data: Vec<u64>,
    pub votes: Vec<VoteAuditEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub is_active: bool,
    pub city: Option<String>,
    pub country: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for StudentSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            student_id: user.student_id,
            is_active: user.is_active,
            city: user.city,
            country: user.country,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

/// Candidate form; `image` is a data URL.
#[derive(Debug, Clone)]
pub struct CandidateForm {
    pub name: String,
    pub description: String,
    pub position: String,
    pub image: String,
}

#[async_trait::async_trait]
pub trait ElectionService: Send + Sync {
    async fn dashboard(&self) -> Result<AdminDashboard, ElectionError>;

    /// Newest first.
    async fn list_elections(&self) -> Result<Vec<ElectionSummary>, ElectionError>;

    /// Safe fetch by a possibly wrapped identifier.
    async fn get_election(&self, raw_id: &str) -> Result<Election, ElectionError>;

    async fn create_election(
        &self,
        input: ElectionInput,
        created_by: &str,
    ) -> Result<Election, ElectionError>;

    async fn update_election(
        &self,
        raw_id: &str,
        input: ElectionInput,
    ) -> Result<Election, ElectionError>;

    /// Removes the election together with its candidates and votes.
    async fn delete_election(&self, raw_id: &str) -> Result<ElectionRemoval, ElectionError>;

    async fn list_candidates(
        &self,
        raw_election_id: &str,
    ) -> Result<(Election, Vec<Candidate>), ElectionError>;

    async fn add_candidate(
        &self,
        raw_election_id: &str,
        form: CandidateForm,
    ) -> Result<Candidate, ElectionError>;

    async fn delete_candidate(&self, raw_id: &str) -> Result<Candidate, ElectionError>;

    async fn results(&self, raw_election_id: &str) -> Result<ElectionResults, ElectionError>;

    /// Non-admin users filtered by a case-insensitive query over name,
    /// email and student id.
    async fn list_students(&self, query: Option<&str>)
    -> Result<Vec<StudentSummary>, ElectionError>;

    /// Returns the number of ballots removed with the student.
    async fn delete_student(&self, user_id: &str) -> Result<u64, ElectionError>;
}

