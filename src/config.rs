use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid URL for {key}: {reason}")]
    InvalidUrl { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub api_key: String,
    pub sign_in_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub share_base_url: String,
    /// Where the user lands after an unrecoverable auth failure.
    pub landing_path: String,
    pub login_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    pub fallback_delay_ms: u64,
    pub intent_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub app: AppSettings,
    pub payment: PaymentSettings,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PaymentSettings {
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn intent_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.intent_ttl_secs)
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            fallback_delay_ms: 1000,
            intent_ttl_secs: 15 * 60,
        }
    }
}

impl Settings {
    /// Loads `.env`, then layers defaults, an optional `shagun.toml` and
    /// `SHAGUN__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self, SettingsError> {
        dotenv::dotenv().ok();

        let settings: Settings = Self::builder()?
            .add_source(File::with_name("shagun").required(false))
            .add_source(
                Environment::with_prefix("SHAGUN")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        info!("Loaded settings for backend {}", settings.api.base_url);
        Ok(settings)
    }

    /// Built-in defaults only, without touching the environment.
    pub fn defaults() -> Result<Self, SettingsError> {
        let settings: Settings = Self::builder()?.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, SettingsError> {
        let defaults = PaymentSettings::default();
        Ok(Config::builder()
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.timeout_secs", 15)?
            .set_default("auth.api_key", "")?
            .set_default(
                "auth.sign_in_url",
                "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword",
            )?
            .set_default("auth.token_url", "https://securetoken.googleapis.com/v1/token")?
            .set_default("app.share_base_url", "https://shagun.app")?
            .set_default("app.landing_path", "/")?
            .set_default("app.login_path", "/login")?
            .set_default("payment.fallback_delay_ms", defaults.fallback_delay_ms)?
            .set_default("payment.intent_ttl_secs", defaults.intent_ttl_secs)?)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (key, value) in [
            ("api.base_url", &self.api.base_url),
            ("auth.sign_in_url", &self.auth.sign_in_url),
            ("auth.token_url", &self.auth.token_url),
            ("app.share_base_url", &self.app.share_base_url),
        ] {
            Url::parse(value).map_err(|e| SettingsError::InvalidUrl {
                key,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
