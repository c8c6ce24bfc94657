//! One-time passcodes for registration and password reset.
//!
//! The challenge lives in the server-side session between the request, verify
//! and set-password steps.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const OTP_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    /// Phrase used in the email body ("You requested to ...").
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Registration => "complete your registration",
            Self::PasswordReset => "reset your password",
        }
    }

    #[must_use]
    pub fn subject(&self, otp: &str) -> String {
        match self {
            Self::Registration => format!("Email Verification Code: {otp}"),
            Self::PasswordReset => format!("Password Reset Code: {otp}"),
        }
    }
}

/// Uniform 6-digit code in `100000..=999999`.
#[must_use]
pub fn generate_otp() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpRejection {
    Mismatch,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    /// Unix milliseconds of the last send
    pub issued_at_ms: i64,
    pub verified: bool,
}

impl OtpChallenge {
    #[must_use]
    pub fn issue(now: DateTime<Utc>) -> Self {
        Self {
            code: generate_otp(),
            issued_at_ms: now.timestamp_millis(),
            verified: false,
        }
    }

    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now.timestamp_millis() - self.issued_at_ms) / 1000
    }

    /// Seconds left before another code may be sent, if any.
    #[must_use]
    pub fn resend_wait(&self, now: DateTime<Utc>, cooldown_secs: i64) -> Option<i64> {
        let wait = cooldown_secs - self.elapsed_secs(now);
        if wait > 0 { Some(wait) } else { None }
    }

    /// Replaces the code and restarts both the cooldown and expiry clocks.
    pub fn reissue(&mut self, now: DateTime<Utc>) {
        self.code = generate_otp();
        self.issued_at_ms = now.timestamp_millis();
        self.verified = false;
    }

    /// `expiry_secs = None` disables the expiry check.
    pub fn verify(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
        expiry_secs: Option<i64>,
    ) -> Result<(), OtpRejection> {
        if let Some(expiry) = expiry_secs
            && self.elapsed_secs(now) >= expiry
        {
            return Err(OtpRejection::Expired);
        }

        if input.trim() != self.code {
            return Err(OtpRejection::Mismatch);
        }

        self.verified = true;
        Ok(())
    }
}

/// Session payload for the registration wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationState {
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub challenge: OtpChallenge,
}

/// Session payload for the password reset wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetState {
    pub email: String,
    pub challenge: OtpChallenge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_DIGITS);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert!(!otp.starts_with('0'));
        }
    }

    #[test]
    fn test_resend_wait_counts_down() {
        let now = Utc::now();
        let challenge = OtpChallenge::issue(now);

        assert_eq!(challenge.resend_wait(now, 60), Some(60));
        assert_eq!(challenge.resend_wait(now + Duration::seconds(15), 60), Some(45));
        assert_eq!(challenge.resend_wait(now + Duration::seconds(60), 60), None);
        assert_eq!(challenge.resend_wait(now, 0), None);
    }

    #[test]
    fn test_reissue_resets_timestamp() {
        let now = Utc::now();
        let mut challenge = OtpChallenge::issue(now);
        let later = now + Duration::seconds(61);
        challenge.reissue(later);

        assert_eq!(challenge.issued_at_ms, later.timestamp_millis());
        assert_eq!(challenge.resend_wait(later, 60), Some(60));
    }

    #[test]
    fn test_verify_mismatch_and_success() {
        let now = Utc::now();
        let mut challenge = OtpChallenge::issue(now);
        let code = challenge.code.clone();

        assert_eq!(
            challenge.verify("000000", now, Some(600)),
            Err(OtpRejection::Mismatch)
        );
        assert!(!challenge.verified);

        assert_eq!(challenge.verify(&format!(" {code} "), now, Some(600)), Ok(()));
        assert!(challenge.verified);
    }

    #[test]
    fn test_verify_expiry() {
        let now = Utc::now();
        let mut challenge = OtpChallenge::issue(now);
        let code = challenge.code.clone();
        let late = now + Duration::minutes(10);

        assert_eq!(
            challenge.verify(&code, late, Some(600)),
            Err(OtpRejection::Expired)
        );
        assert_eq!(challenge.verify(&code, late, None), Ok(()));
    }

    #[test]
    fn test_subject_by_purpose() {
        assert_eq!(
            OtpPurpose::Registration.subject("123456"),
            "Email Verification Code: 123456"
        );
        assert_eq!(
            OtpPurpose::PasswordReset.subject("123456"),
            "Password Reset Code: 123456"
        );
    }
}
