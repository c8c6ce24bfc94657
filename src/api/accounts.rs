use axum::{
    Extension, Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{CurrentUser, session_user};
use super::{ApiError, ApiResponse, AppState, Coordinate, NextStep, coordinate};
use crate::constants::messages::{REGISTRATION_EXPIRED, RESET_EXPIRED};
use crate::constants::session;
use crate::db::LocationUpdate;
use crate::domain::otp::{RegistrationState, ResetState};
use crate::services::account_service::RegistrationRequest;
use crate::services::{AccountError, NewPassword, PendingOtp, Portal};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub otp: String,
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub voter_image: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Serialize)]
pub struct ResetComplete {
    pub next: &'static str,
    pub portal: Portal,
}

#[derive(Serialize)]
pub struct Landing {
    pub next: &'static str,
}

async fn load<T: serde::de::DeserializeOwned>(
    session: &Session,
    key: &str,
) -> Result<Option<T>, ApiError> {
    session.get::<T>(key).await.map_err(|e| ApiError::session(&e))
}

async fn store<T: Serialize + Send + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), ApiError> {
    session
        .insert(key, value)
        .await
        .map_err(|e| ApiError::session(&e))
}

fn expired(message: &str) -> ApiError {
    AccountError::SessionExpired(message.to_string()).into()
}

/// GET /
pub async fn landing(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Landing>>, ApiError> {
    let next = match session_user(&state, &session).await? {
        Some(user) if user.is_admin => "admin_dashboard",
        Some(_) => "student_dashboard",
        None => "login",
    };
    Ok(Json(ApiResponse::success(Landing { next })))
}

/// POST /api/accounts/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let registration = state
        .account_service()
        .start_registration(RegistrationRequest {
            email: payload.email.unwrap_or_default(),
            full_name: payload.full_name.unwrap_or_default(),
            student_id: payload.student_id.unwrap_or_default(),
        })
        .await?;

    let message = format!("An OTP has been sent to {}.", registration.email);
    store(&session, session::REGISTRATION, &registration).await?;

    Ok(Json(ApiResponse::with_message(
        NextStep::to("verify_otp"),
        message,
    )))
}

/// POST /api/accounts/verify-otp
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<OtpRequest>,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let mut registration: RegistrationState = load(&session, session::REGISTRATION)
        .await?
        .ok_or_else(|| expired(REGISTRATION_EXPIRED))?;

    state
        .account_service()
        .verify_registration_otp(&mut registration, &payload.otp)?;
    store(&session, session::REGISTRATION, &registration).await?;

    Ok(Json(ApiResponse::with_message(
        NextStep::to("set_password"),
        "OTP verified! Please set your password.",
    )))
}

/// POST /api/accounts/set-password
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let registration: RegistrationState = load(&session, session::REGISTRATION)
        .await?
        .ok_or_else(|| expired(REGISTRATION_EXPIRED))?;

    state
        .account_service()
        .complete_registration(
            &registration,
            NewPassword {
                password: payload.password,
                confirm_password: payload.confirm_password,
            },
            payload.voter_image.as_deref().unwrap_or_default(),
        )
        .await?;

    session
        .remove::<RegistrationState>(session::REGISTRATION)
        .await
        .map_err(|e| ApiError::session(&e))?;

    Ok(Json(ApiResponse::with_message(
        NextStep::to("login"),
        "Registration successful! You can now login.",
    )))
}

/// POST /api/accounts/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let reset = state.account_service().start_reset(&payload.email).await?;

    let message = format!("A reset code has been sent to {}.", reset.email);
    store(&session, session::RESET, &reset).await?;

    Ok(Json(ApiResponse::with_message(
        NextStep::to("verify_reset_otp"),
        message,
    )))
}

/// POST /api/accounts/verify-reset-otp
pub async fn verify_reset_otp(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<OtpRequest>,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let mut reset: ResetState = load(&session, session::RESET)
        .await?
        .ok_or_else(|| expired(RESET_EXPIRED))?;

    state
        .account_service()
        .verify_reset_otp(&mut reset, &payload.otp)?;
    store(&session, session::RESET, &reset).await?;

    Ok(Json(ApiResponse::with_message(
        NextStep::to("reset_password"),
        "OTP verified! Set your new password.",
    )))
}

/// POST /api/accounts/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<ResetComplete>>, ApiError> {
    let reset: ResetState = load(&session, session::RESET)
        .await?
        .ok_or_else(|| expired(RESET_EXPIRED))?;

    let portal = state
        .account_service()
        .complete_reset(
            &reset,
            NewPassword {
                password: payload.password,
                confirm_password: payload.confirm_password,
            },
        )
        .await?;

    session
        .remove::<ResetState>(session::RESET)
        .await
        .map_err(|e| ApiError::session(&e))?;

    let next = match portal {
        Portal::Admin => "admin_login",
        Portal::Student => "login",
    };
    Ok(Json(ApiResponse::with_message(
        ResetComplete { next, portal },
        "Password reset successful! You can now login.",
    )))
}

/// POST /api/accounts/resend-otp
pub async fn resend_otp(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<NextStep>>, ApiError> {
    let mut pending = if let Some(registration) = load(&session, session::REGISTRATION).await? {
        PendingOtp::Registration(registration)
    } else if let Some(reset) = load(&session, session::RESET).await? {
        PendingOtp::Reset(reset)
    } else {
        return Err(expired("Session expired. Please try again."));
    };

    state.account_service().resend_otp(&mut pending).await?;

    let message = format!("A new OTP has been sent to {}.", pending.email());
    let next = match &pending {
        PendingOtp::Registration(registration) => {
            store(&session, session::REGISTRATION, registration).await?;
            "verify_otp"
        }
        PendingOtp::Reset(reset) => {
            store(&session, session::RESET, reset).await?;
            "verify_reset_otp"
        }
    };

    Ok(Json(ApiResponse::with_message(NextStep::to(next), message)))
}

/// POST /api/accounts/update-location
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let (Some(latitude), Some(longitude)) = (
        coordinate(payload.latitude.as_ref()),
        coordinate(payload.longitude.as_ref()),
    ) else {
        return Err(ApiError::validation("Missing location data"));
    };

    state
        .account_service()
        .update_location(
            &user.id,
            &LocationUpdate {
                latitude,
                longitude,
                city: payload.city,
                country: payload.country,
            },
        )
        .await?;

    Ok(Json(ApiResponse::with_message((), "Location updated.")))
}
