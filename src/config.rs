use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub registration: RegistrationConfig,

    pub otp: OtpConfig,

    pub email: EmailConfig,

    pub media: MediaConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,

    pub indexnow: IndexNowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/votehub.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    Memory,
    Database,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    pub session_store: SessionStoreKind,

    pub session_idle_minutes: i64,

    /// Render panics as a 200 page with the panic message instead of a 500.
    /// Hosting platforms that replace 5xx bodies hide the message otherwise.
    pub debug_errors: bool,

    /// Public base URL used for robots.txt and sitemap.xml.
    pub site_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:8000".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
            secure_cookies: true,
            session_store: SessionStoreKind::Database,
            session_idle_minutes: 60,
            debug_errors: false,
            site_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Institutional suffix every student email must end with.
    pub allowed_email_domain: String,

    /// Addresses allowed to register regardless of domain.
    pub exempt_emails: Vec<String>,

    pub student_id_min_len: usize,

    pub student_id_max_len: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            allowed_email_domain: "@sfscollege.in".to_string(),
            exempt_emails: Vec::new(),
            student_id_min_len: 12,
            student_id_max_len: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub resend_cooldown_seconds: i64,

    /// Lifetime promised in the OTP email.
    pub expiry_seconds: i64,

    pub enforce_expiry: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_seconds: 60,
            expiry_seconds: 10 * 60,
            enforce_expiry: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    Smtp,
    Log,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub backend: EmailBackend,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: String,

    #[serde(skip_serializing)]
    pub smtp_password: String,

    pub from_address: String,

    pub max_retries: u32,

    /// First retry delay; doubled after every failed attempt.
    pub retry_base_delay_ms: u64,

    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: EmailBackend::Log,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "VoteHub <noreply@votehub.local>".to_string(),
            max_retries: 3,
            retry_base_delay_ms: 1000,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub media_path: String,

    /// Keep uploaded images as data URLs in the database instead of files.
    /// Needed on hosts with a read-only filesystem.
    pub inline_images: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_path: "media".to_string(),
            inline_images: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexNowConfig {
    pub endpoint: String,

    pub host: String,

    pub key: String,

    pub key_location: String,

    pub urls: Vec<String>,
}

impl Default for IndexNowConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.indexnow.org/indexnow".to_string(),
            host: String::new(),
            key: String::new(),
            key_location: String::new(),
            urls: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            registration: RegistrationConfig::default(),
            otp: OtpConfig::default(),
            email: EmailConfig::default(),
            media: MediaConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
            indexnow: IndexNowConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets are kept out of config.toml; the environment wins.
    fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("VOTEHUB_SMTP_PASSWORD") {
            self.email.smtp_password = password;
        }
        if let Ok(url) = std::env::var("VOTEHUB_DATABASE_URL") {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("votehub").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".votehub").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.registration.allowed_email_domain.trim().is_empty() {
            anyhow::bail!("registration.allowed_email_domain cannot be empty");
        }

        if self.registration.student_id_min_len > self.registration.student_id_max_len {
            anyhow::bail!(
                "registration.student_id_min_len ({}) exceeds student_id_max_len ({})",
                self.registration.student_id_min_len,
                self.registration.student_id_max_len
            );
        }

        if self.email.backend == EmailBackend::Smtp && self.email.smtp_host.is_empty() {
            anyhow::bail!("SMTP host cannot be empty when the smtp email backend is selected");
        }

        if self.email.max_retries == 0 {
            anyhow::bail!("email.max_retries must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.registration.allowed_email_domain, "@sfscollege.in");
        assert_eq!(config.otp.resend_cooldown_seconds, 60);
        assert_eq!(config.otp.expiry_seconds, 600);
        assert_eq!(config.email.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[registration]"));
        assert!(toml_str.contains("[otp]"));
        assert!(!toml_str.contains("smtp_password"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [email]
            backend = "smtp"
            smtp_host = "mail.example.org"

            [server]
            session_store = "memory"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.email.backend, EmailBackend::Smtp);
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.server.session_store, SessionStoreKind::Memory);
        assert_eq!(config.registration.student_id_max_len, 14);
    }

    #[test]
    fn test_validate_rejects_inverted_student_id_bounds() {
        let mut config = Config::default();
        config.registration.student_id_min_len = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_smtp_host() {
        let mut config = Config::default();
        config.email.backend = EmailBackend::Smtp;
        config.email.smtp_host = String::new();
        assert!(config.validate().is_err());
    }
}
