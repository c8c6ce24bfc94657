//! Domain service for registration, password reset and login.
//!
//! The OTP wizards keep their state in the caller's session; this service
//! receives and returns that state but never touches the session itself.

use serde::Serialize;
use thiserror::Error;

use crate::db::{LocationUpdate, User};
use crate::domain::otp::{OtpPurpose, RegistrationState, ResetState};
use crate::services::mailer::MailError;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    /// Password policy failures, one message per violated rule.
    #[error("{}", .0.join(" "))]
    WeakPassword(Vec<String>),

    #[error("{0}")]
    SessionExpired(String),

    #[error("{0}")]
    InvalidOtp(String),

    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,

    #[error("Please wait {0} seconds before resending.")]
    ResendTooSoon(i64),

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("{0}")]
    WrongPortal(String),

    #[error("This account has been disabled.")]
    Inactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Error sending email: {0}")]
    Mail(#[from] MailError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Which login form the credentials were posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    Student,
    Admin,
}

impl Portal {
    #[must_use]
    pub const fn for_user(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Student }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: String,
    pub full_name: String,
    pub student_id: String,
}

#[derive(Debug, Clone)]
pub struct NewPassword {
    pub password: String,
    pub confirm_password: String,
}

/// A wizard that can have its code re-sent.
#[derive(Debug, Clone)]
pub enum PendingOtp {
    Registration(RegistrationState),
    Reset(ResetState),
}

impl PendingOtp {
    #[must_use]
    pub const fn purpose(&self) -> OtpPurpose {
        match self {
            Self::Registration(_) => OtpPurpose::Registration,
            Self::Reset(_) => OtpPurpose::PasswordReset,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Registration(s) => &s.email,
            Self::Reset(s) => &s.email,
        }
    }
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Checks the registration form, issues a code and emails it.
    async fn start_registration(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationState, AccountError>;

    /// Marks the registration challenge verified on success.
    fn verify_registration_otp(
        &self,
        state: &mut RegistrationState,
        otp: &str,
    ) -> Result<(), AccountError>;

    /// Creates the student account from a verified registration.
    async fn complete_registration(
        &self,
        state: &RegistrationState,
        password: NewPassword,
        profile_image: &str,
    ) -> Result<User, AccountError>;

    async fn start_reset(&self, email: &str) -> Result<ResetState, AccountError>;

    fn verify_reset_otp(&self, state: &mut ResetState, otp: &str) -> Result<(), AccountError>;

    /// Returns the portal the user should log in through afterwards.
    async fn complete_reset(
        &self,
        state: &ResetState,
        password: NewPassword,
    ) -> Result<Portal, AccountError>;

    /// Re-issues the code once the cooldown has passed.
    async fn resend_otp(&self, pending: &mut PendingOtp) -> Result<(), AccountError>;

    async fn login(&self, email: &str, password: &str, portal: Portal)
    -> Result<User, AccountError>;

    async fn get_user(&self, user_id: &str) -> Result<User, AccountError>;

    async fn update_location(
        &self,
        user_id: &str,
        location: &LocationUpdate,
    ) -> Result<(), AccountError>;
}
