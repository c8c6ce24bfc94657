use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::domain::{DocumentId, lookup_ids};
use crate::entities::{candidates, prelude::*};

pub type Candidate = candidates::Model;

#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub name: String,
    pub description: String,
    pub position: String,
    pub image: Option<String>,
}

pub struct CandidateRepository {
    conn: DatabaseConnection,
}

impl CandidateRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, election_id: &str, input: CandidateInput) -> Result<Candidate> {
        let active = candidates::ActiveModel {
            id: Set(DocumentId::generate().into_inner()),
            election_id: Set(election_id.to_string()),
            name: Set(input.name),
            description: Set(input.description),
            position: Set(input.position),
            image: Set(input.image),
            created_at: Set(Utc::now()),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create candidate")?;

        info!(candidate_id = %model.id, election_id = %election_id, "Added candidate");
        Ok(model)
    }

    pub async fn get(&self, raw_id: &str) -> Result<Option<Candidate>> {
        for id in lookup_ids(raw_id) {
            if let Some(found) = Candidates::find_by_id(id)
                .one(&self.conn)
                .await
                .context("Failed to query candidate")?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Candidate lookup scoped to one election, so ballots cannot name a
    /// candidate standing elsewhere.
    pub async fn get_in_election(
        &self,
        raw_id: &str,
        election_id: &str,
    ) -> Result<Option<Candidate>> {
        for id in lookup_ids(raw_id) {
            if let Some(found) = Candidates::find_by_id(id)
                .filter(candidates::Column::ElectionId.eq(election_id))
                .one(&self.conn)
                .await
                .context("Failed to query candidate for election")?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    pub async fn list_for_election(&self, election_id: &str) -> Result<Vec<Candidate>> {
        Candidates::find()
            .filter(candidates::Column::ElectionId.eq(election_id))
            .order_by_asc(candidates::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list candidates")
    }

    pub async fn delete(&self, raw_id: &str) -> Result<Option<Candidate>> {
        let Some(candidate) = self.get(raw_id).await? else {
            return Ok(None);
        };

        Candidates::delete_by_id(candidate.id.clone())
            .exec(&self.conn)
            .await?;

        info!(candidate_id = %candidate.id, "Deleted candidate");
        Ok(Some(candidate))
    }
}
