use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::mailer::{self, EmailSender, OtpMailer};
use crate::services::{
    AccountService, ElectionService, MediaService, SeaOrmAccountService, SeaOrmElectionService,
    SeaOrmVotingService, VotingService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<OtpMailer>,

    pub media: Arc<MediaService>,

    pub account_service: Arc<dyn AccountService>,

    pub election_service: Arc<dyn ElectionService>,

    pub voting_service: Arc<dyn VotingService>,
}

impl SharedState {
    /// Builds the email transport from `email.backend`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let sender = mailer::build_sender(&config.email)?;
        Self::with_email_sender(config, sender).await
    }

    /// Uses the given transport; tests pass a `MemoryEmailSender` to read codes.
    pub async fn with_email_sender(
        config: Config,
        sender: Arc<dyn EmailSender>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer = Arc::new(OtpMailer::new(
            sender,
            &config.email,
            config.otp.expiry_seconds,
        ));
        let media = Arc::new(MediaService::new(&config.media));

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            mailer.clone(),
            config.registration.clone(),
            config.otp.clone(),
            config.security.clone(),
        )) as Arc<dyn AccountService + Send + Sync + 'static>;

        let election_service = Arc::new(SeaOrmElectionService::new(store.clone(), media.clone()))
            as Arc<dyn ElectionService + Send + Sync + 'static>;

        let voting_service = Arc::new(SeaOrmVotingService::new(store.clone(), media.clone()))
            as Arc<dyn VotingService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            media,
            account_service,
            election_service,
            voting_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
