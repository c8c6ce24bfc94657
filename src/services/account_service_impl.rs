//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::config::{OtpConfig, RegistrationConfig, SecurityConfig};
use crate::constants::messages::{REGISTRATION_EXPIRED, RESET_EXPIRED};
use crate::db::{LocationUpdate, NewUser, Store, User};
use crate::domain::otp::{
    OtpChallenge, OtpPurpose, OtpRejection, RegistrationState, ResetState,
};
use crate::domain::password::{UserAttributes, check_password};
use crate::services::account_service::{
    AccountError, AccountService, NewPassword, PendingOtp, Portal, RegistrationRequest,
};
use crate::services::mailer::OtpMailer;

pub struct SeaOrmAccountService {
    store: Store,
    mailer: Arc<OtpMailer>,
    registration: RegistrationConfig,
    otp: OtpConfig,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(
        store: Store,
        mailer: Arc<OtpMailer>,
        registration: RegistrationConfig,
        otp: OtpConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            registration,
            otp,
            security,
        }
    }

    const fn expiry(&self) -> Option<i64> {
        if self.otp.enforce_expiry {
            Some(self.otp.expiry_seconds)
        } else {
            None
        }
    }

    fn check_new_password(
        &self,
        password: &NewPassword,
        attrs: &UserAttributes<'_>,
    ) -> Result<(), AccountError> {
        if password.password != password.confirm_password {
            return Err(AccountError::Validation(
                "Passwords do not match.".to_string(),
            ));
        }

        let problems = check_password(
            &password.password,
            self.security.min_password_length,
            attrs,
        );
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AccountError::WeakPassword(problems))
        }
    }
}

fn verify_challenge(
    challenge: &mut OtpChallenge,
    otp: &str,
    expiry: Option<i64>,
    mismatch: &str,
) -> Result<(), AccountError> {
    challenge
        .verify(otp, Utc::now(), expiry)
        .map_err(|rejection| match rejection {
            OtpRejection::Mismatch => AccountError::InvalidOtp(mismatch.to_string()),
            OtpRejection::Expired => AccountError::OtpExpired,
        })
}

/// Institutional domain check; exempt addresses skip it.
pub fn is_allowed_email(email: &str, config: &RegistrationConfig) -> bool {
    let email = email.to_ascii_lowercase();
    if config
        .exempt_emails
        .iter()
        .any(|exempt| exempt.eq_ignore_ascii_case(&email))
    {
        return true;
    }
    email.ends_with(&config.allowed_email_domain.to_ascii_lowercase())
}

/// UUCMS numbers: ASCII alphanumeric within the configured length bounds.
pub fn is_valid_student_id(student_id: &str, config: &RegistrationConfig) -> bool {
    (config.student_id_min_len..=config.student_id_max_len).contains(&student_id.len())
        && student_id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn start_registration(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationState, AccountError> {
        let email = request.email.trim().to_ascii_lowercase();
        let full_name = request.full_name.trim().to_string();
        let student_id = request.student_id.trim().to_string();

        if email.is_empty() || full_name.is_empty() || student_id.is_empty() {
            return Err(AccountError::Validation(
                "All fields are required.".to_string(),
            ));
        }

        if !is_allowed_email(&email, &self.registration) {
            return Err(AccountError::Validation(format!(
                "Please enter a valid college ID ({})",
                self.registration.allowed_email_domain
            )));
        }

        if !is_valid_student_id(&student_id, &self.registration) {
            return Err(AccountError::Validation(format!(
                "Student ID must be a {}-{} character alphanumeric UUCMS number.",
                self.registration.student_id_min_len, self.registration.student_id_max_len
            )));
        }

        if self.store.email_exists(&email).await? {
            return Err(AccountError::Validation(
                "This email is already registered.".to_string(),
            ));
        }

        if self.store.student_id_exists(&student_id).await? {
            return Err(AccountError::Validation(
                "This student ID is already registered.".to_string(),
            ));
        }

        let challenge = OtpChallenge::issue(Utc::now());
        self.mailer
            .send_otp(&email, &challenge.code, OtpPurpose::Registration)
            .await?;

        info!(email = %email, "Registration OTP issued");
        Ok(RegistrationState {
            email,
            full_name,
            student_id,
            challenge,
        })
    }

    fn verify_registration_otp(
        &self,
        state: &mut RegistrationState,
        otp: &str,
    ) -> Result<(), AccountError> {
        verify_challenge(
            &mut state.challenge,
            otp,
            self.expiry(),
            "Invalid OTP. Please try again.",
        )
    }

    async fn complete_registration(
        &self,
        state: &RegistrationState,
        password: NewPassword,
        profile_image: &str,
    ) -> Result<User, AccountError> {
        if !state.challenge.verified {
            return Err(AccountError::SessionExpired(
                REGISTRATION_EXPIRED.to_string(),
            ));
        }

        if profile_image.trim().is_empty() {
            return Err(AccountError::Validation(
                "Please capture your profile photo.".to_string(),
            ));
        }

        self.check_new_password(
            &password,
            &UserAttributes {
                email: &state.email,
                full_name: &state.full_name,
                student_id: &state.student_id,
            },
        )?;

        if self.store.email_exists(&state.email).await? {
            return Err(AccountError::Validation(
                "This email is already registered.".to_string(),
            ));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    email: state.email.clone(),
                    full_name: state.full_name.clone(),
                    student_id: state.student_id.clone(),
                    password: password.password,
                    is_admin: false,
                    profile_image_base64: Some(profile_image.trim().to_string()),
                },
                &self.security,
            )
            .await?;

        metrics::counter!("registrations_total").increment(1);
        Ok(user)
    }

    async fn start_reset(&self, email: &str) -> Result<ResetState, AccountError> {
        let email = email.trim().to_ascii_lowercase();

        if self.store.get_user_by_email(&email).await?.is_none() {
            return Err(AccountError::Validation(
                "No account found with this email.".to_string(),
            ));
        }

        let challenge = OtpChallenge::issue(Utc::now());
        self.mailer
            .send_otp(&email, &challenge.code, OtpPurpose::PasswordReset)
            .await?;

        info!(email = %email, "Password reset OTP issued");
        Ok(ResetState { email, challenge })
    }

    fn verify_reset_otp(&self, state: &mut ResetState, otp: &str) -> Result<(), AccountError> {
        verify_challenge(&mut state.challenge, otp, self.expiry(), "Invalid OTP.")
    }

    async fn complete_reset(
        &self,
        state: &ResetState,
        password: NewPassword,
    ) -> Result<Portal, AccountError> {
        if !state.challenge.verified {
            return Err(AccountError::SessionExpired(RESET_EXPIRED.to_string()));
        }

        let user = self
            .store
            .get_user_by_email(&state.email)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        self.check_new_password(
            &password,
            &UserAttributes {
                email: &user.email,
                full_name: &user.full_name,
                student_id: &user.student_id,
            },
        )?;

        self.store
            .update_user_password(&user.email, &password.password, &self.security)
            .await?;

        Ok(Portal::for_user(user.is_admin))
    }

    async fn resend_otp(&self, pending: &mut PendingOtp) -> Result<(), AccountError> {
        let now = Utc::now();
        let purpose = pending.purpose();
        let email = pending.email().to_string();

        let challenge = match pending {
            PendingOtp::Registration(state) => &mut state.challenge,
            PendingOtp::Reset(state) => &mut state.challenge,
        };

        if let Some(wait) = challenge.resend_wait(now, self.otp.resend_cooldown_seconds) {
            return Err(AccountError::ResendTooSoon(wait));
        }

        challenge.reissue(now);
        self.mailer
            .send_otp(&email, &challenge.code, purpose)
            .await?;

        info!(email = %email, ?purpose, "OTP re-sent");
        Ok(())
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        portal: Portal,
    ) -> Result<User, AccountError> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::InvalidCredentials);
        }

        let user = self
            .store
            .verify_user_password(&email, password)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AccountError::Inactive);
        }

        match (portal, user.is_admin) {
            (Portal::Student, true) => {
                return Err(AccountError::WrongPortal(
                    "Admins must use the dedicated Admin Portal.".to_string(),
                ));
            }
            (Portal::Admin, false) => {
                return Err(AccountError::WrongPortal(
                    "Access Denied: Student accounts must use the Student Login.".to_string(),
                ));
            }
            _ => {}
        }

        self.store.touch_last_login(&user.id).await?;
        metrics::counter!("logins_total", "portal" => if user.is_admin { "admin" } else { "student" })
            .increment(1);
        info!(email = %user.email, ?portal, "User logged in");
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<User, AccountError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    async fn update_location(
        &self,
        user_id: &str,
        location: &LocationUpdate,
    ) -> Result<(), AccountError> {
        if self.store.update_user_location(user_id, location).await? {
            Ok(())
        } else {
            Err(AccountError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_email_domain() {
        let config = RegistrationConfig::default();
        assert!(is_allowed_email("student@sfscollege.in", &config));
        assert!(is_allowed_email("Student@SFSCollege.in", &config));
        assert!(!is_allowed_email("student@gmail.com", &config));
        assert!(!is_allowed_email("sfscollege.in@gmail.com", &config));
    }

    #[test]
    fn test_exempt_email_bypasses_domain() {
        let config = RegistrationConfig {
            exempt_emails: vec!["Guest@Example.org".to_string()],
            ..RegistrationConfig::default()
        };
        assert!(is_allowed_email("guest@example.org", &config));
        assert!(!is_allowed_email("other@example.org", &config));
    }

    #[test]
    fn test_student_id_bounds() {
        let config = RegistrationConfig::default();
        assert!(is_valid_student_id("U18AB22S0001", &config));
        assert!(is_valid_student_id("U18AB22S000123", &config));
        assert!(!is_valid_student_id("U18AB22S001", &config));
        assert!(!is_valid_student_id("U18AB22S0001234", &config));
        assert!(!is_valid_student_id("U18AB22-S0001", &config));
    }

    #[test]
    fn test_resend_error_message() {
        assert_eq!(
            AccountError::ResendTooSoon(42).to_string(),
            "Please wait 42 seconds before resending."
        );
    }
}
