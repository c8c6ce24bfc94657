use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{DocumentId, lookup_ids};
use crate::entities::{prelude::*, users, votes};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub profile_image_base64: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            student_id: model.student_id,
            is_admin: model.is_admin,
            is_active: model.is_active,
            profile_image_base64: model.profile_image_base64,
            latitude: model.latitude,
            longitude: model.longitude,
            city: model.city,
            country: model.country,
            last_location_update: model.last_location_update,
            date_joined: model.date_joined,
            last_login: model.last_login,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub password: String,
    pub is_admin: bool,
    pub profile_image_base64: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
}

/// Outcome of removing a user together with their ballots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRemoval {
    pub votes: u64,
    pub media: Vec<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.find_model_by_email(email).await?.map(User::from))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Like `get_by_id`, for identifiers typed or pasted by an admin.
    pub async fn find(&self, raw_id: &str) -> Result<Option<User>> {
        for id in lookup_ids(raw_id) {
            if let Some(user) = self.get_by_id(&id).await? {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    pub async fn get_by_emails(&self, emails: &[String]) -> Result<Vec<User>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Email.is_in(emails.iter().cloned()))
            .all(&self.conn)
            .await
            .context("Failed to query users by email")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_model_by_email(email).await?.is_some())
    }

    pub async fn student_id_exists(&self, student_id: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::StudentId.eq(student_id))
            .one(&self.conn)
            .await
            .context("Failed to query user by student ID")?;

        Ok(user.is_some())
    }

    /// Hashes the password off the async runtime and inserts the row.
    pub async fn create(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new_user.password.clone();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let active = users::ActiveModel {
            id: Set(DocumentId::generate().into_inner()),
            email: Set(new_user.email.clone()),
            full_name: Set(new_user.full_name),
            student_id: Set(new_user.student_id),
            password_hash: Set(password_hash),
            is_admin: Set(new_user.is_admin),
            is_active: Set(true),
            profile_image_base64: Set(new_user.profile_image_base64),
            latitude: Set(None),
            longitude: Set(None),
            city: Set(None),
            country: Set(None),
            last_location_update: Set(None),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
        };

        let model = active
            .insert(&self.conn)
            .await
            .with_context(|| format!("Failed to create user {}", new_user.email))?;

        info!(email = %model.email, is_admin = model.is_admin, "Created user");
        Ok(User::from(model))
    }

    /// Returns the user only when the password matches.
    /// Argon2 verification runs in `spawn_blocking`; it is CPU bound.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_model_by_email(email).await? else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = self
            .find_model_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {email}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        info!(email = %email, "Password updated");
        Ok(())
    }

    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<bool> {
        let Some(user) = self.find_model_by_email(email).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_admin = Set(is_admin);
        active.update(&self.conn).await?;

        info!(email = %email, is_admin, "Updated admin flag");
        Ok(true)
    }

    pub async fn touch_last_login(&self, id: &str) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::LastLogin,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn update_location(&self, id: &str, location: &LocationUpdate) -> Result<bool> {
        let Some(user) = Users::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.latitude = Set(Some(location.latitude));
        active.longitude = Set(Some(location.longitude));
        active.city = Set(Some(location.city.clone()));
        active.country = Set(Some(location.country.clone()));
        active.last_location_update = Set(Some(Utc::now()));
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Non-admin users, newest first.
    pub async fn list_students(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .filter(users::Column::IsAdmin.eq(false))
            .order_by_desc(users::Column::DateJoined)
            .all(&self.conn)
            .await
            .context("Failed to list students")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn count_students(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        Users::find()
            .filter(users::Column::IsAdmin.eq(false))
            .count(&self.conn)
            .await
            .context("Failed to count students")
    }

    /// Removes the user and every ballot cast with their email.
    /// Returns the number of votes removed, or `None` if the user is unknown.
    pub async fn delete_with_votes(&self, id: &str) -> Result<Option<UserRemoval>> {
        let txn = self.conn.begin().await?;

        let Some(user) = Users::find_by_id(id.to_string()).one(&txn).await? else {
            return Ok(None);
        };

        let media = Votes::find()
            .filter(votes::Column::VoterEmail.eq(user.email.as_str()))
            .select_only()
            .column(votes::Column::VoterImage)
            .into_tuple::<String>()
            .all(&txn)
            .await?;

        let removed_votes = Votes::delete_many()
            .filter(votes::Column::VoterEmail.eq(user.email.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        Users::delete_by_id(user.id.clone()).exec(&txn).await?;

        txn.commit().await?;

        info!(email = %user.email, removed_votes, "Deleted user");
        Ok(Some(UserRemoval {
            votes: removed_votes,
            media,
        }))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
