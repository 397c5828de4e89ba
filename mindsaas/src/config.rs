//! Application configuration.
//!
//! Configuration is loaded from a YAML file merged with `MINDSAAS_`-prefixed
//! environment variables, `__` separating nested keys:
//!
//! ```bash
//! MINDSAAS_DATABASE__URL="sqlite://mindsaas.db?mode=rwc"
//! MINDSAAS_RUNNER__SECRET="..."
//! MINDSAAS_CRON__RUNNER_URL="http://127.0.0.1:8080/internal/jobs/builder"
//! ```
//!
//! Every field has a default, so an empty file is a valid (if locked-down)
//! configuration: endpoints whose secret is unset reject or skip their check
//! as documented per field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MINDSAAS_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Secret key verifying bearer JWTs on the user-facing endpoints
    pub secret_key: Option<String>,
    /// Shared token expected on the payment webhook's query string.
    /// Unset means the webhook rejects everything.
    pub webhook_token: Option<String>,
    /// Shared secret for the privileged state-update endpoint. Like the
    /// webhook token, unset disables the endpoint rather than opening it.
    pub job_update_secret: Option<String>,
    /// Job runner settings
    pub runner: RunnerConfig,
    /// Cron trigger settings
    pub cron: CronConfig,
    /// Payment gateway settings; payment-intent creation is disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSettings>,
    /// CORS allowed origins ("*" for any)
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: DatabaseConfig::default(),
            secret_key: None,
            webhook_token: None,
            job_update_secret: None,
            runner: RunnerConfig::default(),
            cron: CronConfig::default(),
            payment: None,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection URL; the file is created when missing
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://mindsaas.db?mode=rwc".to_string(),
        }
    }
}

/// Job runner settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Shared secret checked against `x-mindsaas-secret`. When unset the
    /// runner accepts unauthenticated calls (development mode).
    pub secret: Option<String>,
    /// Batch size when the request does not specify one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<i64>,
    /// Base URL stamped into delivered_url as `{base}?prd={id}`
    pub delivered_url_base: Option<String>,
}

impl RunnerConfig {
    pub const DEFAULT_LIMIT: i64 = 3;

    pub fn default_limit(&self) -> i64 {
        self.default_limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// Cron trigger settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CronConfig {
    /// Bearer secret the scheduler presents; unset skips the check
    pub secret: Option<String>,
    /// URL of the job-runner endpoint the trigger relays to
    pub runner_url: Option<Url>,
    /// Batch size forwarded to the runner
    pub limit: i64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: None,
            runner_url: None,
            limit: 10,
        }
    }
}

/// Payment settings: how much to charge and which gateway to charge through.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentSettings {
    /// Charge amount in cents
    #[serde(default = "PaymentSettings::default_amount_cents")]
    pub amount_cents: i64,
    /// Provider selection and credentials
    pub gateway: GatewayConfig,
}

impl PaymentSettings {
    fn default_amount_cents() -> i64 {
        100
    }
}

/// Payment gateway configuration (SyncPay, or the dummy provider for
/// development and tests).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum GatewayConfig {
    Syncpay(SyncpayConfig),
    Dummy(DummyGatewayConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncpayConfig {
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DummyGatewayConfig {}

impl Config {
    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("MINDSAAS_").split("__"))
    }

    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(settings) = &self.payment {
            if settings.amount_cents <= 0 {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: payment.amount_cents must be positive (got {})",
                        settings.amount_cents
                    ),
                });
            }

            if let GatewayConfig::Syncpay(syncpay) = &settings.gateway
                && (syncpay.client_id.is_empty() || syncpay.client_secret.is_empty())
            {
                return Err(Error::Internal {
                    operation: "Config validation: syncpay gateway requires client_id and client_secret".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_a_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runner.default_limit(), RunnerConfig::DEFAULT_LIMIT);
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "port: 9000\n")?;
            jail.set_env("MINDSAAS_RUNNER__SECRET", "from-env");
            jail.set_env("MINDSAAS_CRON__LIMIT", "5");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.port, 9000);
            assert_eq!(config.runner.secret.as_deref(), Some("from-env"));
            assert_eq!(config.cron.limit, 5);
            Ok(())
        });
    }

    #[test]
    fn syncpay_without_credentials_is_rejected() {
        let mut config = Config::default();
        config.payment = Some(PaymentSettings {
            amount_cents: 100,
            gateway: GatewayConfig::Syncpay(SyncpayConfig {
                base_url: "https://api.syncpay.test".parse().unwrap(),
                client_id: String::new(),
                client_secret: String::new(),
            }),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut config = Config::default();
        config.payment = Some(PaymentSettings {
            amount_cents: 0,
            gateway: GatewayConfig::Dummy(DummyGatewayConfig::default()),
        });
        assert!(config.validate().is_err());
    }
}
