//! Outbound OTP email.
//!
//! [`OtpMailer`] renders the message and retries delivery; the transport is
//! an [`EmailSender`] chosen by `email.backend`.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{EmailBackend, EmailConfig};
use crate::domain::otp::OtpPurpose;

#[derive(Debug, Error)]
pub enum MailError {
    #[error(
        "Email authentication failed. The SMTP server rejected the username or password. \
         For Gmail, use a 16-character App Password instead of the account password."
    )]
    BadCredentials,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(
        "Failed to send email after {attempts} attempts. \
         Please check your email address and try again. Error: {last}"
    )]
    Exhausted { attempts: u32, last: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// STARTTLS submission through `lettre`.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from_address.clone()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| MailError::Transport(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| classify_smtp_error(&e))
    }
}

fn classify_smtp_error(err: &lettre::transport::smtp::Error) -> MailError {
    let text = err.to_string();
    if text.contains("535") || text.contains("Username and Password not accepted") {
        MailError::BadCredentials
    } else {
        MailError::Transport(text)
    }
}

/// Development backend: writes the message to the log instead of sending it.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text_body,
            "Email (log backend)"
        );
        Ok(())
    }
}

/// Keeps every message in memory.
#[derive(Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl MemoryEmailSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent message addressed to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }

    /// Six-digit code from the latest subject line sent to `to`.
    #[must_use]
    pub fn last_otp_for(&self, to: &str) -> Option<String> {
        self.last_to(to)
            .and_then(|m| m.subject.rsplit(' ').next().map(str::to_string))
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

pub fn build_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, MailError> {
    Ok(match config.backend {
        EmailBackend::Smtp => Arc::new(SmtpEmailSender::new(config)?),
        EmailBackend::Log => Arc::new(LogEmailSender),
        EmailBackend::Memory => Arc::new(MemoryEmailSender::new()),
    })
}

pub struct OtpMailer {
    sender: Arc<dyn EmailSender>,
    max_retries: u32,
    base_delay: Duration,
    expiry_minutes: i64,
}

impl OtpMailer {
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>, config: &EmailConfig, expiry_seconds: i64) -> Self {
        Self {
            sender,
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            expiry_minutes: (expiry_seconds / 60).max(1),
        }
    }

    #[must_use]
    pub fn compose(&self, to: &str, otp: &str, purpose: OtpPurpose) -> OutgoingEmail {
        let html_body = render_html(otp, purpose.action(), self.expiry_minutes);
        let text_body = html2text::from_read(html_body.as_bytes(), 80)
            .unwrap_or_else(|_| format!("Your verification code is: {otp}"));

        OutgoingEmail {
            to: to.to_string(),
            subject: purpose.subject(otp),
            html_body,
            text_body,
        }
    }

    /// Sends the code, doubling the delay between failed attempts.
    /// Bad credentials are not retried.
    pub async fn send_otp(&self, to: &str, otp: &str, purpose: OtpPurpose) -> Result<(), MailError> {
        let email = self.compose(to, otp, purpose);
        let mut delay = self.base_delay;

        for attempt in 1..=self.max_retries {
            info!(to = %to, attempt, max = self.max_retries, "Sending OTP email");

            match self.sender.send(&email).await {
                Ok(()) => {
                    metrics::counter!("otp_emails_sent_total").increment(1);
                    info!(to = %to, "OTP email sent");
                    return Ok(());
                }
                Err(MailError::BadCredentials) => {
                    error!("SMTP authentication rejected");
                    return Err(MailError::BadCredentials);
                }
                Err(e) if attempt == self.max_retries => {
                    metrics::counter!("otp_emails_failed_total").increment(1);
                    error!(to = %to, error = %e, "All OTP email attempts failed");
                    return Err(MailError::Exhausted {
                        attempts: self.max_retries,
                        last: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(to = %to, attempt, error = %e, "OTP email attempt failed");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        Err(MailError::Exhausted {
            attempts: self.max_retries,
            last: "no attempt made".to_string(),
        })
    }
}

fn render_html(otp: &str, action: &str, expiry_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style>
body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
.container {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); border-radius: 10px; padding: 30px; color: white; }}
.otp-box {{ background: rgba(255, 255, 255, 0.95); color: #333; padding: 20px; border-radius: 8px; text-align: center; margin: 20px 0; }}
.otp-code {{ font-size: 32px; font-weight: bold; letter-spacing: 8px; color: #667eea; }}
</style>
</head>
<body>
<div class="container">
<h2>VoteHub</h2>
<p>Hello,</p>
<p>You requested to {action}. Please use the verification code below:</p>
<div class="otp-box">
<p>Your Verification Code</p>
<div class="otp-code">{otp}</div>
<p>Valid for {expiry_minutes} minutes</p>
</div>
<p>Enter this code on the verification page to continue.</p>
<p><strong>Security Notice:</strong><br>
If you did not request this code, please ignore this email. Do not share this code with anyone.</p>
<p>This is an automated message from VoteHub.<br>
Please do not reply to this email.</p>
</div>
</body>
</html>"#
    )
}
