use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::candidate::{Candidate, CandidateInput};
pub use repositories::election::{Election, ElectionInput, ElectionRemoval};
pub use repositories::user::{LocationUpdate, NewUser, User, UserRemoval};
pub use repositories::vote::{NewVote, Vote, VoteInsert};

use crate::config::SecurityConfig;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Pool shared with the database-backed session store.
    #[must_use]
    pub fn sqlite_pool(&self) -> tower_sessions_sqlx_store::sqlx::SqlitePool {
        self.conn.get_sqlite_connection_pool().clone()
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn election_repo(&self) -> repositories::election::ElectionRepository {
        repositories::election::ElectionRepository::new(self.conn.clone())
    }

    fn candidate_repo(&self) -> repositories::candidate::CandidateRepository {
        repositories::candidate::CandidateRepository::new(self.conn.clone())
    }

    fn vote_repo(&self) -> repositories::vote::VoteRepository {
        repositories::vote::VoteRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    /// Safe fetch for user identifiers, same rules as `find_election`.
    pub async fn find_user(&self, raw_id: &str) -> Result<Option<User>> {
        self.user_repo().find(raw_id).await
    }

    pub async fn get_users_by_emails(&self, emails: &[String]) -> Result<Vec<User>> {
        self.user_repo().get_by_emails(emails).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn student_id_exists(&self, student_id: &str) -> Result<bool> {
        self.user_repo().student_id_exists(student_id).await
    }

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_password(
        &self,
        email: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(email, new_password, security)
            .await
    }

    pub async fn set_user_admin(&self, email: &str, is_admin: bool) -> Result<bool> {
        self.user_repo().set_admin(email, is_admin).await
    }

    pub async fn touch_last_login(&self, user_id: &str) -> Result<()> {
        self.user_repo().touch_last_login(user_id).await
    }

    pub async fn update_user_location(
        &self,
        user_id: &str,
        location: &LocationUpdate,
    ) -> Result<bool> {
        self.user_repo().update_location(user_id, location).await
    }

    pub async fn list_students(&self) -> Result<Vec<User>> {
        self.user_repo().list_students().await
    }

    pub async fn count_students(&self) -> Result<u64> {
        self.user_repo().count_students().await
    }

    pub async fn delete_user_with_votes(&self, user_id: &str) -> Result<Option<UserRemoval>> {
        self.user_repo().delete_with_votes(user_id).await
    }

    // Elections

    pub async fn create_election(&self, input: ElectionInput, created_by: &str) -> Result<Election> {
        self.election_repo().create(input, created_by).await
    }

    /// Safe fetch: accepts wrapped, quoted or upper-case identifiers.
    pub async fn find_election(&self, raw_id: &str) -> Result<Option<Election>> {
        self.election_repo().find(raw_id).await
    }

    pub async fn list_elections(&self) -> Result<Vec<Election>> {
        self.election_repo().list().await
    }

    pub async fn recent_elections(&self, limit: u64) -> Result<Vec<Election>> {
        self.election_repo().list_recent(limit).await
    }

    pub async fn update_election(&self, id: &str, input: ElectionInput) -> Result<Option<Election>> {
        self.election_repo().update(id, input).await
    }

    pub async fn delete_election_cascade(&self, id: &str) -> Result<Option<ElectionRemoval>> {
        self.election_repo().delete_cascade(id).await
    }

    // Candidates

    pub async fn add_candidate(&self, election_id: &str, input: CandidateInput) -> Result<Candidate> {
        self.candidate_repo().create(election_id, input).await
    }

    pub async fn get_candidate(&self, raw_id: &str) -> Result<Option<Candidate>> {
        self.candidate_repo().get(raw_id).await
    }

    pub async fn get_candidate_in_election(
        &self,
        raw_id: &str,
        election_id: &str,
    ) -> Result<Option<Candidate>> {
        self.candidate_repo()
            .get_in_election(raw_id, election_id)
            .await
    }

    pub async fn list_candidates(&self, election_id: &str) -> Result<Vec<Candidate>> {
        self.candidate_repo().list_for_election(election_id).await
    }

    pub async fn delete_candidate(&self, raw_id: &str) -> Result<Option<Candidate>> {
        self.candidate_repo().delete(raw_id).await
    }

    // Votes

    pub async fn insert_vote(&self, vote: NewVote) -> Result<VoteInsert> {
        self.vote_repo().insert(vote).await
    }

    pub async fn has_voted(&self, election_id: &str, voter_email: &str) -> Result<bool> {
        self.vote_repo().exists(election_id, voter_email).await
    }

    pub async fn get_vote(&self, election_id: &str, voter_email: &str) -> Result<Option<Vote>> {
        self.vote_repo()
            .get_for_voter(election_id, voter_email)
            .await
    }

    pub async fn voted_election_ids(&self, voter_email: &str) -> Result<Vec<String>> {
        self.vote_repo().election_ids_for_voter(voter_email).await
    }

    pub async fn list_votes(&self, election_id: &str) -> Result<Vec<Vote>> {
        self.vote_repo().list_for_election(election_id).await
    }

    pub async fn count_votes(&self, election_id: &str) -> Result<u64> {
        self.vote_repo().count_for_election(election_id).await
    }

    pub async fn count_all_votes(&self) -> Result<u64> {
        self.vote_repo().count_all().await
    }
}
