//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file means "run with defaults".
//! Secrets (the marketplace API key) are referenced by env-var name in the
//! config and resolved at runtime.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::analysis::scorer::ScoringConfig;
use crate::types::FlipError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub api: ApiConfig,
    pub scoring: ScoringConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotConfig {
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Upper bound on listing pages fetched per cycle.
    pub max_pages: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            max_pages: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub page_size: u32,
    pub min_price_cents: u64,
    pub max_price_cents: u64,
    pub listing_type: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://csfloat.com/api/v1".to_string(),
            api_key_env: "CSFLOAT_API_KEY".to_string(),
            page_size: 50,
            min_price_cents: 36,
            max_price_cents: 7278,
            listing_type: "buy_now".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: crate::storage::DEFAULT_DEALS_FILE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for the log file. Empty disables file logging.
    pub dir: String,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "flipscout=info".to_string(),
            dir: ".".to_string(),
            file: "bot.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values that would make the bot spin or never accept anything.
    pub fn validate(&self) -> Result<(), FlipError> {
        if self.bot.poll_interval_secs == 0 {
            return Err(FlipError::Config("bot.poll_interval_secs must be > 0".into()));
        }
        if self.bot.max_pages == 0 {
            return Err(FlipError::Config("bot.max_pages must be > 0".into()));
        }
        if self.api.page_size == 0 {
            return Err(FlipError::Config("api.page_size must be > 0".into()));
        }
        if self.api.min_price_cents > self.api.max_price_cents {
            return Err(FlipError::Config(
                "api.min_price_cents must not exceed api.max_price_cents".into(),
            ));
        }
        let s = &self.scoring;
        if s.history_days == 0 {
            return Err(FlipError::Config("scoring.history_days must be > 0".into()));
        }
        let non_negative = [
            ("scoring.min_profit", s.min_profit),
            ("scoring.max_listing_price", s.max_listing_price),
            ("scoring.max_volatility", s.max_volatility),
            ("scoring.min_sales_per_day", s.min_sales_per_day),
            ("scoring.marketplace_fee", s.marketplace_fee),
            ("scoring.tax_buffer", s.tax_buffer),
            ("scoring.instant_sell_ratio", s.instant_sell_ratio),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(FlipError::Config(format!("{name} must not be negative")));
            }
        }
        Ok(())
    }

    /// Resolve the API key from the configured env var. An unset or empty
    /// variable means "run unauthenticated".
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.api.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::new)
    }
}
