//! SMTP connectivity check

use crate::config::Config;
use crate::domain::otp::{OtpPurpose, generate_otp};
use crate::services::mailer::{OtpMailer, build_sender};

pub async fn cmd_check_email(config: &Config, to: &str) -> anyhow::Result<()> {
    println!(
        "Sending test code to {to} via {:?} ({}:{})",
        config.email.backend, config.email.smtp_host, config.email.smtp_port
    );

    let sender = build_sender(&config.email)?;
    let mailer = OtpMailer::new(sender, &config.email, config.otp.expiry_seconds);

    let otp = generate_otp();
    mailer
        .send_otp(to, &otp, OtpPurpose::Registration)
        .await?;

    println!("Email sent successfully (code {otp}).");
    Ok(())
}
