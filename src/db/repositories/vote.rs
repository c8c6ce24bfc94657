use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::{info, warn};

use crate::domain::DocumentId;
use crate::entities::{prelude::*, votes};

pub type Vote = votes::Model;

#[derive(Debug, Clone)]
pub struct NewVote {
    pub election_id: String,
    pub candidate_id: String,
    pub voter_email: String,
    pub voter_image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub ip_address: String,
}

#[derive(Debug)]
pub enum VoteInsert {
    Recorded(Vote),
    /// The `(election_id, voter_email)` index already holds a ballot.
    Duplicate,
}

pub struct VoteRepository {
    conn: DatabaseConnection,
}

impl VoteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, vote: NewVote) -> Result<VoteInsert> {
        let active = votes::ActiveModel {
            id: Set(DocumentId::generate().into_inner()),
            election_id: Set(vote.election_id),
            candidate_id: Set(vote.candidate_id),
            voter_email: Set(vote.voter_email),
            voter_image: Set(vote.voter_image),
            latitude: Set(vote.latitude),
            longitude: Set(vote.longitude),
            city: Set(vote.city),
            country: Set(vote.country),
            ip_address: Set(vote.ip_address),
            voted_at: Set(Utc::now()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => {
                info!(
                    election_id = %model.election_id,
                    voter = %model.voter_email,
                    "Vote recorded"
                );
                Ok(VoteInsert::Recorded(model))
            }
            Err(err) if is_unique_violation(&err) => {
                warn!("Rejected duplicate ballot at the unique index");
                Ok(VoteInsert::Duplicate)
            }
            Err(err) => Err(err).context("Failed to record vote"),
        }
    }

    pub async fn exists(&self, election_id: &str, voter_email: &str) -> Result<bool> {
        Ok(self.get_for_voter(election_id, voter_email).await?.is_some())
    }

    pub async fn get_for_voter(&self, election_id: &str, voter_email: &str) -> Result<Option<Vote>> {
        Votes::find()
            .filter(votes::Column::ElectionId.eq(election_id))
            .filter(votes::Column::VoterEmail.eq(voter_email))
            .one(&self.conn)
            .await
            .context("Failed to query vote")
    }

    /// Election ids the voter has a ballot in.
    pub async fn election_ids_for_voter(&self, voter_email: &str) -> Result<Vec<String>> {
        Votes::find()
            .select_only()
            .column(votes::Column::ElectionId)
            .filter(votes::Column::VoterEmail.eq(voter_email))
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list voted elections")
    }

    /// Newest first.
    pub async fn list_for_election(&self, election_id: &str) -> Result<Vec<Vote>> {
        Votes::find()
            .filter(votes::Column::ElectionId.eq(election_id))
            .order_by_desc(votes::Column::VotedAt)
            .all(&self.conn)
            .await
            .context("Failed to list votes")
    }

    pub async fn count_for_election(&self, election_id: &str) -> Result<u64> {
        Votes::find()
            .filter(votes::Column::ElectionId.eq(election_id))
            .count(&self.conn)
            .await
            .context("Failed to count votes")
    }

    pub async fn count_all(&self) -> Result<u64> {
        Votes::find()
            .count(&self.conn)
            .await
            .context("Failed to count votes")
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
