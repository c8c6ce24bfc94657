use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, ExpiredDeletion, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::{Config, ServerConfig, SessionStoreKind};
use crate::constants::limits;
use crate::services::mailer::EmailSender;
use crate::state::SharedState;

mod accounts;
mod admin;
pub mod auth;
mod error;
mod observability;
mod public;
mod student;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AccountService, ElectionService, VotingService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn account_service(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }

    #[must_use]
    pub fn election_service(&self) -> &Arc<dyn ElectionService> {
        &self.shared.election_service
    }

    #[must_use]
    pub fn voting_service(&self) -> &Arc<dyn VotingService> {
        &self.shared.voting_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Same as [`create_app_state_from_config`] but with an explicit mail
/// transport, so callers can inspect outgoing codes.
pub async fn create_app_state_with_sender(
    config: Config,
    sender: Arc<dyn EmailSender>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_email_sender(config, sender).await?);
    Ok(create_app_state(shared, None))
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let (server, media_path) = {
        let config = state.config().read().await;
        (config.server.clone(), config.media.media_path.clone())
    };

    let app = match server.session_store {
        SessionStoreKind::Memory => {
            build_router(state, MemoryStore::default(), &server, &media_path)
        }
        SessionStoreKind::Database => {
            let session_store = SqliteStore::new(state.store().sqlite_pool());
            session_store
                .migrate()
                .await
                .context("Failed to migrate session table")?;

            let deletion = session_store.clone();
            tokio::spawn(async move {
                if let Err(e) = deletion
                    .continuously_delete_expired(tokio::time::Duration::from_secs(60))
                    .await
                {
                    tracing::error!("Session cleanup stopped: {}", e);
                }
            });

            build_router(state, session_store, &server, &media_path)
        }
    };

    Ok(app)
}

fn build_router<S>(
    state: Arc<AppState>,
    session_store: S,
    server: &ServerConfig,
    media_path: &str,
) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_idle_minutes,
        )));

    let api_router = Router::new()
        .nest("/accounts", create_accounts_router(state.clone()))
        .nest("/voting", create_voting_router(state.clone()))
        .route(
            "/metrics",
            get(observability::get_metrics).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        .route("/health", get(public::health));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    let debug_errors = server.debug_errors;

    Router::new()
        .nest("/api", api_router)
        .route("/", get(accounts::landing))
        .route("/robots.txt", get(public::robots_txt))
        .route("/sitemap.xml", get(public::sitemap_xml))
        .nest_service("/media", tower_http::services::ServeDir::new(media_path))
        .layer(session_layer)
        .with_state(state)
        .layer(DefaultBodyLimit::max(limits::MAX_BODY_BYTES))
        .layer(cors_layer.allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ]).allow_headers([axum::http::header::CONTENT_TYPE]))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn std::any::Any + Send + 'static>| {
            observability::panic_response(panic.as_ref(), debug_errors)
        }))
}

fn create_accounts_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/update-location", post(accounts::update_location))
        .route_layer(middleware::from_fn_with_state(state, auth::require_user));

    Router::new()
        .route("/register", post(accounts::register))
        .route("/verify-otp", post(accounts::verify_otp))
        .route("/set-password", post(accounts::set_password))
        .route("/forgot-password", post(accounts::forgot_password))
        .route("/verify-reset-otp", post(accounts::verify_reset_otp))
        .route("/reset-password", post(accounts::reset_password))
        .route("/resend-otp", post(accounts::resend_otp))
        .route("/student/login", post(auth::student_login))
        .route("/admin/login", post(auth::admin_login))
        .route("/logout", post(auth::logout))
        .merge(protected)
}

fn create_voting_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let student_routes = Router::new()
        .route("/dashboard", get(student::dashboard))
        .route("/vote/{election_id}", get(student::vote_page))
        .route("/vote/{election_id}/submit", post(student::submit_vote))
        .route(
            "/vote/{election_id}/confirmation",
            get(student::vote_confirmation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_student,
        ));

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/elections",
            get(admin::list_elections).post(admin::create_election),
        )
        .route(
            "/elections/{id}",
            get(admin::get_election)
                .put(admin::update_election)
                .delete(admin::delete_election),
        )
        .route(
            "/elections/{id}/candidates",
            get(admin::list_candidates).post(admin::add_candidate),
        )
        .route(
            "/elections/{id}/results",
            get(admin::results),
        )
        .route("/candidates/{id}", delete(admin::delete_candidate))
        .route("/students", get(admin::list_students))
        .route("/students/{id}", delete(admin::delete_student))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin));

    Router::new()
        .merge(student_routes)
        .nest("/admin", admin_routes)
}
