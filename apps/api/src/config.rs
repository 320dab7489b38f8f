use anyhow::{Context, Result};

use crate::screening::shortlist::ShortlistPolicy;

const DEFAULT_VOICE_API_URL: &str = "https://api.vapi.ai";
const DEFAULT_AUTO_TRIGGER_WINDOW_HOURS: i64 = 72;
const DEFAULT_VOICE_MAX_CALL_MINUTES: u64 = 30;

/// Application configuration loaded from environment variables.
///
/// Every external integration is optional. A group whose variables are missing
/// resolves to `None` and the matching capability stays switched off for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub mail: Option<MailConfig>,
    pub voice: Option<VoiceConfig>,
    pub archive: Option<ArchiveConfig>,
    /// Shared secret for scheduling-provider webhook signatures.
    pub webhook_secret: Option<String>,
    /// Bearer token guarding the interview runner endpoint.
    pub internal_api_key: Option<String>,
    /// Externally reachable base URL of this service, used to self-invoke the runner.
    pub public_base_url: Option<String>,
    /// Booking link sent to shortlisted candidates.
    pub scheduling_url: Option<String>,
    pub shortlist_policy: ShortlistPolicy,
    pub auto_trigger_window_hours: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    /// Internal recipient for interview reports.
    pub hr_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub api_key: String,
    pub api_url: String,
    pub webhook_secret: Option<String>,
    pub max_call_minutes: u64,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mail = match (
            optional_env("SMTP_HOST"),
            optional_env("SMTP_USERNAME"),
            optional_env("SMTP_PASSWORD"),
            optional_env("MAIL_FROM"),
        ) {
            (Some(smtp_host), Some(smtp_username), Some(smtp_password), Some(from_address)) => {
                Some(MailConfig {
                    smtp_host,
                    smtp_username,
                    smtp_password,
                    from_address,
                    hr_address: optional_env("HR_EMAIL"),
                })
            }
            _ => None,
        };

        let voice = match optional_env("VOICE_API_KEY") {
            Some(api_key) => Some(VoiceConfig {
                api_key,
                api_url: optional_env("VOICE_API_URL")
                    .unwrap_or_else(|| DEFAULT_VOICE_API_URL.to_string()),
                webhook_secret: optional_env("VOICE_WEBHOOK_SECRET"),
                max_call_minutes: parse_env("VOICE_MAX_CALL_MINUTES")?
                    .unwrap_or(DEFAULT_VOICE_MAX_CALL_MINUTES),
            }),
            None => None,
        };

        let archive = match (
            optional_env("S3_BUCKET"),
            optional_env("S3_ENDPOINT"),
            optional_env("AWS_ACCESS_KEY_ID"),
            optional_env("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(bucket), Some(endpoint), Some(access_key_id), Some(secret_access_key)) => {
                Some(ArchiveConfig {
                    bucket,
                    endpoint,
                    access_key_id,
                    secret_access_key,
                })
            }
            _ => None,
        };

        let shortlist_policy = ShortlistPolicy::from_settings(
            optional_env("SHORTLIST_POLICY").as_deref(),
            parse_env("SHORTLIST_THRESHOLD")?,
        )?;

        Ok(Config {
            port: parse_env("PORT")?.unwrap_or(8080),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            mail,
            voice,
            archive,
            webhook_secret: optional_env("WEBHOOK_SECRET"),
            internal_api_key: optional_env("INTERNAL_API_KEY"),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            scheduling_url: optional_env("SCHEDULING_URL"),
            shortlist_policy,
            auto_trigger_window_hours: parse_env("AUTO_TRIGGER_WINDOW_HOURS")?
                .unwrap_or(DEFAULT_AUTO_TRIGGER_WINDOW_HOURS),
        })
    }

    /// A config with every integration switched off.
    #[cfg(test)]
    pub fn bare() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            database_url: None,
            anthropic_api_key: None,
            mail: None,
            voice: None,
            archive: None,
            webhook_secret: None,
            internal_api_key: None,
            public_base_url: None,
            scheduling_url: None,
            shortlist_policy: ShortlistPolicy::default(),
            auto_trigger_window_hours: DEFAULT_AUTO_TRIGGER_WINDOW_HOURS,
        }
    }
}

/// Returns the variable's value, treating unset and blank as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("Environment variable '{key}' has an invalid value"))
        })
        .transpose()
}
