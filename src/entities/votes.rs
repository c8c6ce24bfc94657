use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One ballot. `(election_id, voter_email)` carries a unique index created by
/// the initial migration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub election_id: String,
    pub candidate_id: String,
    pub voter_email: String,
    /// Media-relative path, or an inline data URL
    #[sea_orm(column_type = "Text")]
    pub voter_image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub ip_address: String,
    pub voted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
