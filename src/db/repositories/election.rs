use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::domain::{DocumentId, lookup_ids};
use crate::entities::{candidates, elections, prelude::*, votes};

pub type Election = elections::Model;

#[derive(Debug, Clone)]
pub struct ElectionInput {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Rows removed by a cascading election delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElectionRemoval {
    pub candidates: u64,
    pub votes: u64,
    /// Stored image references (voter selfies and candidate photos) that
    /// belonged to the removed rows.
    #[serde(skip)]
    pub media: Vec<String>,
}

pub struct ElectionRepository {
    conn: DatabaseConnection,
}

impl ElectionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: ElectionInput, created_by: &str) -> Result<Election> {
        let active = elections::ActiveModel {
            id: Set(DocumentId::generate().into_inner()),
            title: Set(input.title),
            description: Set(input.description),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(input.is_active),
            created_by: Set(created_by.to_string()),
            created_at: Set(Utc::now()),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create election")?;

        info!(election_id = %model.id, title = %model.title, "Created election");
        Ok(model)
    }

    /// Tries the identifier as given, then its normalised document form.
    pub async fn find(&self, raw_id: &str) -> Result<Option<Election>> {
        for id in lookup_ids(raw_id) {
            if let Some(found) = Elections::find_by_id(id)
                .one(&self.conn)
                .await
                .context("Failed to query election by ID")?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Election>> {
        Elections::find()
            .order_by_desc(elections::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list elections")
    }

    pub async fn list_recent(&self, limit: u64) -> Result<Vec<Election>> {
        Elections::find()
            .order_by_desc(elections::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list recent elections")
    }

    pub async fn update(&self, id: &str, input: ElectionInput) -> Result<Option<Election>> {
        let Some(existing) = Elections::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: elections::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.is_active = Set(input.is_active);

        let model = active.update(&self.conn).await?;
        info!(election_id = %model.id, "Updated election");
        Ok(Some(model))
    }

    /// Candidates and votes reference elections by string only, so they are
    /// removed here in the same transaction as the election row.
    pub async fn delete_cascade(&self, id: &str) -> Result<Option<ElectionRemoval>> {
        let txn = self.conn.begin().await?;

        let mut media: Vec<String> = Votes::find()
            .filter(votes::Column::ElectionId.eq(id))
            .select_only()
            .column(votes::Column::VoterImage)
            .into_tuple::<String>()
            .all(&txn)
            .await?;
        media.extend(
            Candidates::find()
                .filter(candidates::Column::ElectionId.eq(id))
                .select_only()
                .column(candidates::Column::Image)
                .into_tuple::<Option<String>>()
                .all(&txn)
                .await?
                .into_iter()
                .flatten(),
        );

        let removed_candidates = Candidates::delete_many()
            .filter(candidates::Column::ElectionId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        let removed_votes = Votes::delete_many()
            .filter(votes::Column::ElectionId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        let result = Elections::delete_by_id(id.to_string()).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        txn.commit().await?;

        info!(
            election_id = %id,
            removed_candidates, removed_votes, "Deleted election"
        );
        Ok(Some(ElectionRemoval {
            candidates: removed_candidates,
            votes: removed_votes,
            media,
        }))
    }
}
