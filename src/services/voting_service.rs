//! Domain service for the student voting flow.

use serde::Serialize;
use thiserror::Error;

use crate::db::{Candidate, Election, Vote};
use crate::domain::ElectionStatus;
use crate::services::media::MediaError;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("Election not found (ID: {0})")]
    ElectionNotFound(String),

    #[error("This election is not currently active.")]
    NotActive,

    #[error("You have already voted in this election.")]
    AlreadyVoted,

    #[error("Missing required data. Please ensure camera and location permissions are granted.")]
    MissingData,

    #[error("Invalid candidate selected.")]
    InvalidCandidate,

    #[error("Error processing image.")]
    Image(#[from] MediaError),

    #[error("Vote not found.")]
    VoteNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for VotingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Dashboard row for one election the student can see.
#[derive(Debug, Clone, Serialize)]
pub struct StudentElection {
    pub election: Election,
    pub election_id: String,
    pub status: ElectionStatus,
    pub has_voted: bool,
    pub can_vote: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ballot {
    pub election: Election,
    pub candidates: Vec<Candidate>,
}

/// Submitted ballot. Coordinates are already parsed; a `None` means the
/// browser did not share them.
#[derive(Debug, Clone, Default)]
pub struct BallotSubmission {
    pub candidate_id: Option<String>,
    pub voter_image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: String,
    pub country: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteConfirmation {
    pub election: Election,
    pub candidate: Candidate,
    pub vote: Vote,
}

/// The voter as seen by the voting flow.
#[derive(Debug, Clone)]
pub struct Voter {
    pub user_id: String,
    pub email: String,
}

#[async_trait::async_trait]
pub trait VotingService: Send + Sync {
    /// Elections with the active flag set, newest first.
    async fn dashboard(&self, voter: &Voter) -> Result<Vec<StudentElection>, VotingError>;

    /// Election and candidates, if the voter may still vote in it.
    async fn ballot(&self, voter: &Voter, raw_election_id: &str) -> Result<Ballot, VotingError>;

    async fn submit(
        &self,
        voter: &Voter,
        raw_election_id: &str,
        submission: BallotSubmission,
    ) -> Result<VoteConfirmation, VotingError>;

    async fn confirmation(
        &self,
        voter: &Voter,
        raw_election_id: &str,
    ) -> Result<VoteConfirmation, VotingError>;
}
