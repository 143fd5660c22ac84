//! Configuration loading and representation.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `config/lendr.{toml,yaml,json}` file, then `LENDR_*` environment variables
//! (`LENDR_TRANSACTION__MAX_ATTEMPTS=8`, `LENDR_LOGGING__FORMAT=pretty`).

use chrono::Duration;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use lendr_lending::FinePolicy;
use lendr_observability::LogFormat;

use crate::document_store::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::service::LendingSettings;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionConfig {
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LendingConfig {
    pub default_loan_days: i64,
    /// Smallest currency unit.
    pub overdue_fine: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Sender of welcome mails.
    pub from: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LendrConfig {
    pub transaction: TransactionConfig,
    pub lending: LendingConfig,
    pub logging: LoggingConfig,
    pub notifications: NotificationsConfig,
}

impl LendrConfig {
    /// Load from `config/lendr` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::with_name("config/lendr").required(false)))
    }

    /// Load from an inline TOML document and the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder
            .add_source(
                Environment::with_prefix("LENDR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction.max_attempts == 0 {
            return Err(ConfigError::Message(
                "transaction.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0..=LendingSettings::MAX_LOAN_DAYS).contains(&self.lending.default_loan_days) {
            return Err(ConfigError::Message(format!(
                "lending.default_loan_days must be between 0 and {}",
                LendingSettings::MAX_LOAN_DAYS
            )));
        }
        Ok(())
    }

    pub fn lending_settings(&self) -> LendingSettings {
        LendingSettings {
            retry: RetryPolicy::new(self.transaction.max_attempts),
            default_loan_period: Duration::days(self.lending.default_loan_days),
            fine_policy: FinePolicy::new(self.lending.overdue_fine),
        }
    }

    /// Install the process-wide tracing subscriber described by `logging`.
    pub fn init_logging(&self) {
        lendr_observability::init_with(&self.logging.level, self.logging.format);
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            default_loan_days: LendingSettings::DEFAULT_LOAN_DAYS,
            overdue_fine: FinePolicy::DEFAULT_OVERDUE_FINE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            from: "IoT Club <admin@iotclub.com>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = LendrConfig::from_toml_str("").unwrap();
        assert_eq!(config.transaction.max_attempts, 5);
        assert_eq!(config.lending.default_loan_days, 14);
        assert_eq!(config.lending.overdue_fine, 200);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.lending_settings(), LendingSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = LendrConfig::from_toml_str(
            r#"
            [transaction]
            max_attempts = 9

            [lending]
            overdue_fine = 500

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.transaction.max_attempts, 9);
        assert_eq!(config.lending.default_loan_days, 14);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.lending_settings().fine_policy.overdue_fine, 500);
    }

    #[test]
    fn loan_period_out_of_range_is_rejected() {
        for days in ["-1", "36501", "9223372036854775807"] {
            let err = LendrConfig::from_toml_str(&format!("[lending]\ndefault_loan_days = {days}"))
                .unwrap_err();
            assert!(err.to_string().contains("default_loan_days"), "{days}: {err}");
        }

        let config = LendrConfig::from_toml_str("[lending]\ndefault_loan_days = 36500").unwrap();
        assert_eq!(config.lending_settings().default_loan_period, Duration::days(36_500));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = LendrConfig::from_toml_str("[transaction]\nmax_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }
}
