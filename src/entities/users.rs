use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// 24-char hex document identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub full_name: String,

    #[sea_orm(unique)]
    pub student_id: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub is_admin: bool,

    pub is_active: bool,

    /// Profile selfie kept as a data URL
    #[sea_orm(column_type = "Text", nullable)]
    pub profile_image_base64: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub last_location_update: Option<DateTimeUtc>,

    pub date_joined: DateTimeUtc,

    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
