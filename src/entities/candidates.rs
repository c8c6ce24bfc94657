use sea_orm::entity::prelude::*;
use serde::Serialize;

/// `election_id` is a plain string reference; integrity is kept by the
/// repositories, not by a foreign key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "candidates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub election_id: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub position: String,
    /// Media-relative path, or an inline data URL
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
