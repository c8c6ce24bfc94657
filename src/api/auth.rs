use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::constants::session;
use crate::db::User;
use crate::services::Portal;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// The logged-in user, placed in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Loads the session user, if any. Stale sessions pointing at deleted or
/// disabled accounts are flushed.
pub async fn session_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(user_id) = session
        .get::<String>(session::USER_ID)
        .await
        .map_err(|e| ApiError::session(&e))?
    else {
        return Ok(None);
    };

    match state.store().get_user(&user_id).await? {
        Some(user) if user.is_active => Ok(Some(user)),
        _ => {
            let _ = session.flush().await;
            Ok(None)
        }
    }
}

async fn authenticate(
    state: &AppState,
    session: &Session,
    request: &mut Request,
) -> Result<User, ApiError> {
    let user = session_user(state, session)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Please log in to continue.".to_string()))?;

    tracing::Span::current().record("user_id", user.id.as_str());
    request.extensions_mut().insert(CurrentUser(user.clone()));
    Ok(user)
}

/// Any logged-in account.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, &session, &mut request).await?;
    Ok(next.run(request).await)
}

/// Student pages; admins are pointed at their own dashboard.
pub async fn require_student(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &session, &mut request).await?;
    if user.is_admin {
        return Err(ApiError::Forbidden(
            "Admins must use the admin dashboard at /api/voting/admin/dashboard.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &session, &mut request).await?;
    if !user.is_admin {
        return Err(ApiError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

async fn login(
    state: &AppState,
    session: &Session,
    payload: LoginRequest,
    portal: Portal,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .account_service()
        .login(&payload.email, &payload.password, portal)
        .await?;

    session.cycle_id().await.map_err(|e| ApiError::session(&e))?;
    session
        .insert(session::USER_ID, &user.id)
        .await
        .map_err(|e| ApiError::session(&e))?;

    Ok(Json(ApiResponse::with_message(
        UserDto::from(user),
        "Logged in successfully.",
    )))
}

/// POST /api/accounts/student/login
pub async fn student_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    login(&state, &session, payload, Portal::Student).await
}

/// POST /api/accounts/admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    login(&state, &session, payload, Portal::Admin).await
}

/// POST /api/accounts/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<()>>, ApiError> {
    session.flush().await.map_err(|e| ApiError::session(&e))?;
    Ok(Json(ApiResponse::with_message(
        (),
        "You have been logged out successfully.",
    )))
}

/// GET /api/accounts/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(user)))
}
