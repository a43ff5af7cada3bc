use anyhow::Context;
use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub links: LinkConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Prefix of every short link handed back to clients, without a trailing slash
    pub base_url: String,
    /// Validity applied when a create request omits it
    pub default_validity_minutes: i64,
    /// Length of generated short codes
    pub short_code_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Remote collector URL. When unset, audit events only go to tracing
    #[serde(default)]
    pub endpoint: Option<String>,
    pub stack: String,
    pub buffer_size: usize,
    pub timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: LinkConfig::DEFAULT_BASE_URL.to_string(),
            default_validity_minutes: LinkConfig::DEFAULT_VALIDITY_MINUTES,
            short_code_length: LinkConfig::DEFAULT_CODE_LENGTH,
        }
    }
}

impl LinkConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000";
    pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;
    pub const DEFAULT_CODE_LENGTH: usize = 6;
    const MAX_CODE_LENGTH: usize = 64;
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            stack: "backend".to_string(),
            buffer_size: 1024,
            timeout_ms: 2000,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// The default must be positive and small enough that `now + default` is representable
fn check_default_validity(minutes: i64) -> anyhow::Result<()> {
    if minutes <= 0 {
        anyhow::bail!("DEFAULT_VALIDITY_MINUTES must be positive");
    }

    let fits = TimeDelta::try_minutes(minutes)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .is_some();
    if !fits {
        anyhow::bail!("DEFAULT_VALIDITY_MINUTES is too large: {minutes}");
    }
    Ok(())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env("PORT", 3000u16)?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| LinkConfig::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let default_validity_minutes =
            parse_env("DEFAULT_VALIDITY_MINUTES", LinkConfig::DEFAULT_VALIDITY_MINUTES)?;
        check_default_validity(default_validity_minutes)?;

        let short_code_length = parse_env("SHORT_CODE_LENGTH", LinkConfig::DEFAULT_CODE_LENGTH)?;
        if short_code_length == 0 || short_code_length > LinkConfig::MAX_CODE_LENGTH {
            anyhow::bail!(
                "SHORT_CODE_LENGTH must be between 1 and {}",
                LinkConfig::MAX_CODE_LENGTH
            );
        }

        let audit_defaults = AuditConfig::default();
        let endpoint = std::env::var("AUDIT_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let stack = std::env::var("AUDIT_STACK").unwrap_or(audit_defaults.stack);
        let buffer_size = parse_env("AUDIT_BUFFER_SIZE", audit_defaults.buffer_size)?;
        if buffer_size == 0 {
            anyhow::bail!("AUDIT_BUFFER_SIZE must be at least 1");
        }
        let timeout_ms = parse_env("AUDIT_TIMEOUT_MS", audit_defaults.timeout_ms)?;

        Ok(Config {
            server: ServerConfig { host, port },
            links: LinkConfig {
                base_url,
                default_validity_minutes,
                short_code_length,
            },
            audit: AuditConfig {
                endpoint,
                stack,
                buffer_size,
                timeout_ms,
            },
        })
    }
}
