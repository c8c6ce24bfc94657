//! `SeaORM` implementation of the `VotingService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{Election, LocationUpdate, NewVote, Store, VoteInsert};
use crate::domain::{DocumentId, ElectionStatus, is_ongoing};
use crate::services::media::{MediaKind, MediaService};
use crate::services::voting_service::{
    Ballot, BallotSubmission, StudentElection, VoteConfirmation, Voter, VotingError,
    VotingService,
};

/// Unique per submission: two requests for the same voter and election never
/// share a file.
fn ballot_image_stem(email: &str, election_id: &str) -> String {
    format!("{email}_{election_id}_{}", DocumentId::generate())
}

pub struct SeaOrmVotingService {
    store: Store,
    media: Arc<MediaService>,
}

impl SeaOrmVotingService {
    #[must_use]
    pub const fn new(store: Store, media: Arc<MediaService>) -> Self {
        Self { store, media }
    }

    async fn open_election(
        &self,
        voter: &Voter,
        raw_election_id: &str,
    ) -> Result<Election, VotingError> {
        let election = self
            .store
            .find_election(raw_election_id)
            .await?
            .ok_or_else(|| VotingError::ElectionNotFound(raw_election_id.to_string()))?;

        if !is_ongoing(
            election.is_active,
            election.start_date,
            election.end_date,
            Utc::now(),
        ) {
            return Err(VotingError::NotActive);
        }

        if self.store.has_voted(&election.id, &voter.email).await? {
            return Err(VotingError::AlreadyVoted);
        }

        Ok(election)
    }
}

#[async_trait]
impl VotingService for SeaOrmVotingService {
    async fn dashboard(&self, voter: &Voter) -> Result<Vec<StudentElection>, VotingError> {
        let now = Utc::now();
        let voted: HashSet<String> = self
            .store
            .voted_election_ids(&voter.email)
            .await?
            .into_iter()
            .collect();

        Ok(self
            .store
            .list_elections()
            .await?
            .into_iter()
            .filter(|e| e.is_active)
            .map(|election| {
                let status = ElectionStatus::at(election.start_date, election.end_date, now);
                let has_voted = voted.contains(&election.id);
                StudentElection {
                    election_id: election.id.clone(),
                    can_vote: status == ElectionStatus::Active && !has_voted,
                    election,
                    status,
                    has_voted,
                }
            })
            .collect())
    }

    async fn ballot(&self, voter: &Voter, raw_election_id: &str) -> Result<Ballot, VotingError> {
        let election = self.open_election(voter, raw_election_id).await?;
        let candidates = self.store.list_candidates(&election.id).await?;
        Ok(Ballot {
            election,
            candidates,
        })
    }

    async fn submit(
        &self,
        voter: &Voter,
        raw_election_id: &str,
        submission: BallotSubmission,
    ) -> Result<VoteConfirmation, VotingError> {
        let election = self.open_election(voter, raw_election_id).await?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (Some(candidate_id), Some(image_data), Some(latitude), Some(longitude)) = (
            non_empty(submission.candidate_id),
            non_empty(submission.voter_image),
            submission.latitude,
            submission.longitude,
        ) else {
            return Err(VotingError::MissingData);
        };

        let candidate = self
            .store
            .get_candidate_in_election(&candidate_id, &election.id)
            .await?
            .ok_or(VotingError::InvalidCandidate)?;

        let voter_image = self
            .media
            .store(
                MediaKind::VoterImage,
                &ballot_image_stem(&voter.email, &election.id),
                &image_data,
            )
            .await?;

        let inserted = self
            .store
            .insert_vote(NewVote {
                election_id: election.id.clone(),
                candidate_id: candidate.id.clone(),
                voter_email: voter.email.clone(),
                voter_image: voter_image.clone(),
                latitude,
                longitude,
                city: submission.city.clone(),
                country: submission.country.clone(),
                ip_address: submission.ip_address,
            })
            .await;

        let vote = match inserted {
            Ok(VoteInsert::Recorded(vote)) => vote,
            Ok(VoteInsert::Duplicate) => {
                self.media.remove(&voter_image).await;
                return Err(VotingError::AlreadyVoted);
            }
            Err(e) => {
                self.media.remove(&voter_image).await;
                return Err(e.into());
            }
        };

        metrics::counter!("votes_cast_total").increment(1);

        let location = LocationUpdate {
            latitude,
            longitude,
            city: submission.city,
            country: submission.country,
        };
        if let Err(e) = self
            .store
            .update_user_location(&voter.user_id, &location)
            .await
        {
            warn!(error = %e, "Error updating user location after vote");
        }

        info!(election_id = %election.id, candidate_id = %candidate.id, "Ballot accepted");
        Ok(VoteConfirmation {
            election,
            candidate,
            vote,
        })
    }

    async fn confirmation(
        &self,
        voter: &Voter,
        raw_election_id: &str,
    ) -> Result<VoteConfirmation, VotingError> {
        let election = self
            .store
            .find_election(raw_election_id)
            .await?
            .ok_or_else(|| VotingError::ElectionNotFound(raw_election_id.to_string()))?;

        let vote = self
            .store
            .get_vote(&election.id, &voter.email)
            .await?
            .ok_or(VotingError::VoteNotFound)?;

        let candidate = self
            .store
            .get_candidate(&vote.candidate_id)
            .await?
            .ok_or(VotingError::VoteNotFound)?;

        Ok(VoteConfirmation {
            election,
            candidate,
            vote,
        })
    }
}
