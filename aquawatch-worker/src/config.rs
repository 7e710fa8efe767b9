//! Worker configuration
//!
//! Everything comes from environment variables (a `.env` file is
//! honored in development). Channel credentials are optional: a
//! channel with no credentials stays configured-off and every dispatch
//! through it reports a `NotConfigured` failure rather than aborting
//! the worker.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_COOLDOWN_MIN: i64 = 10;
const DEFAULT_CONFIG_TABLE: &str = "config_sistema";

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
pub const DEFAULT_WPP_API_VERSION: &str = "v21.0";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub poll_interval: Duration,
    pub cooldown_minutes: i64,
    /// Table holding the global config singleton; deployments vary.
    pub config_table: String,
    /// Register a cooldown entry even when every channel failed.
    pub register_on_failure: bool,
    pub email: EmailConfig,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub token: Option<String>,
    pub phone_number_id: Option<String>,
    pub api_version: String,
    /// When set the channel sends a structured template; free text
    /// otherwise.
    pub template_name: Option<String>,
    pub template_lang: String,
    pub recipients: Vec<String>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in the environment")?;

        let poll_interval_secs = env_parse("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        anyhow::ensure!(
            poll_interval_secs > 0,
            "POLL_INTERVAL_SECS must be positive, got {}",
            poll_interval_secs
        );

        let cooldown_minutes = env_parse("ALERT_COOLDOWN_MIN", DEFAULT_COOLDOWN_MIN)?;
        anyhow::ensure!(
            cooldown_minutes > 0,
            "ALERT_COOLDOWN_MIN must be positive, got {}",
            cooldown_minutes
        );

        let config_table =
            env::var("ALARM_CONFIG_TABLE").unwrap_or_else(|_| DEFAULT_CONFIG_TABLE.to_string());

        let register_on_failure = env_flag("ALERT_REGISTER_ON_FAILURE", true)?;

        let email = EmailConfig {
            api_url: env::var("BREVO_API_URL").unwrap_or_else(|_| DEFAULT_EMAIL_API_URL.to_string()),
            api_key: env_opt("BREVO_API_KEY"),
            sender_email: env::var("ALERT_SENDER_EMAIL")
                .unwrap_or_else(|_| "no-reply@aquawatch.local".to_string()),
            sender_name: env::var("ALERT_SENDER_NAME")
                .unwrap_or_else(|_| "AquaWatch Alarms".to_string()),
            recipients: parse_recipients(&env::var("ALERT_EMAIL_RECIPIENTS").unwrap_or_default()),
        };

        let whatsapp = WhatsAppConfig {
            token: env_opt("WPP_TOKEN"),
            phone_number_id: env_opt("WPP_PHONE_NUMBER_ID"),
            api_version: env::var("WPP_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_WPP_API_VERSION.to_string()),
            template_name: env_opt("WPP_TEMPLATE_NAME"),
            template_lang: env::var("WPP_TEMPLATE_LANG").unwrap_or_else(|_| "pt_BR".to_string()),
            recipients: parse_recipients(&env::var("WPP_RECIPIENTS").unwrap_or_default()),
        };

        Ok(Self {
            database_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            cooldown_minutes,
            config_table,
            register_on_failure,
            email,
            whatsapp,
        })
    }
}

/// Split a comma- or semicolon-separated recipient list, trimming
/// whitespace and dropping empty entries.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.replace(';', ",")
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("invalid value for {}: {:?}", name, other),
        },
        Err(_) => Ok(default),
    }
}
