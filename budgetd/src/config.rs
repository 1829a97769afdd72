//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `BUDGETD_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `BUDGETD_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `BUDGETD_RATES__MAX_AGE=6h` sets the `rates.max_age` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.url`, `database.max_connections` - SQLite connection settings
//! - **Security**: `secret_key`, `auth.security.cors` - Session signing and CORS settings
//! - **Authentication**: `auth.native` - Email/password login, registration and session cookies
//! - **Rates**: `rates.source`, `rates.max_age` - Where the KRW/USD rate comes from and how long it
//!   stays fresh
//! - **Ledger**: `ledger.default_categories` - Expense categories every user starts with
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! BUDGETD_PORT=8080
//!
//! # Point at a different database file
//! DATABASE_URL="sqlite:///var/lib/budgetd/ledger.db"
//!
//! # Override nested values
//! BUDGETD_AUTH__NATIVE__ALLOW_REGISTRATION=false
//! BUDGETD_RATES__DEFAULT_KRW_PER_USD=1380
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "BUDGETD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; folded into `database.url` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// SQLite database settings
    pub database: DatabaseConfig,
    /// Secret key for signing session tokens (required when native auth is enabled)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Exchange rate lookup and caching
    pub rates: RatesConfig,
    /// Ledger defaults
    pub ledger: LedgerConfig,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://budgetd.db`. The file is created if missing.
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Maximum time to wait for a connection
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://budgetd.db".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Native email/password authentication
    pub native: NativeAuthConfig,
    /// Security settings (JWT, CORS)
    pub security: SecurityConfig,
}

/// Native email/password authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    /// Enable native authentication (login/registration)
    pub enabled: bool,
    /// Allow new users to self-register
    pub allow_registration: bool,
    /// Password validation rules
    pub password: PasswordConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration (cookie Max-Age)
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
}

/// Security configuration for JWT and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://budget.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Exchange rate configuration.
///
/// The rate is cached in the database and refreshed from `source` once it is older than `max_age`.
/// If no rate has ever been fetched successfully, `default_krw_per_usd` is used.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesConfig {
    /// How long a fetched rate stays fresh
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// KRW per 1 USD, used until the first successful fetch
    pub default_krw_per_usd: f64,
    /// Where fresh rates come from
    pub source: RateSourceConfig,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(12 * 60 * 60), // 12 hours
            default_krw_per_usd: 1350.0,
            source: RateSourceConfig::default(),
        }
    }
}

/// Exchange rate source.
///
/// ```yaml
/// rates:
///   source:
///     http:
///       url: https://open.er-api.com/v6/latest/KRW
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceConfig {
    /// Look the rate up over HTTP. The service must answer with USD per KRW.
    Http(HttpRateSourceConfig),
    /// Never call out; always report the configured rate. Useful offline and in tests.
    Fixed(FixedRateSourceConfig),
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        RateSourceConfig::Http(HttpRateSourceConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpRateSourceConfig {
    /// Endpoint returning `{ "rates": { "USD": <usd per krw> } }`
    pub url: Url,
    /// Key to read from the `rates` object
    pub currency: String,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpRateSourceConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("https://open.er-api.com/v6/latest/KRW").unwrap(),
            currency: "USD".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixedRateSourceConfig {
    /// USD per 1 KRW, in the same orientation the HTTP source reports
    pub usd_per_krw: f64,
}

impl Default for FixedRateSourceConfig {
    fn default() -> Self {
        Self { usd_per_krw: 1.0 / 1350.0 }
    }
}

/// Ledger defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Categories offered to every user, merged with whatever they have used or added
    pub default_categories: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_categories: [
                "Food & Drinks",
                "Transport",
                "Housing",
                "Utilities",
                "Shopping",
                "Health",
                "Entertainment",
                "Other",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            rates: RatesConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60), // 24 hours
            cookie_name: "budgetd_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60), // 24 hours
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Development frontend (Vite)
            allowed_origins: Url::parse("http://localhost:5173").map(CorsOrigin::Url).into_iter().collect(),
            allow_credentials: true,
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.native.enabled {
            if self.secret_key.is_none() {
                return Err(Error::Internal {
                    operation: "Config validation: Native authentication is enabled but secret_key is not configured. \
                     Please set BUDGETD_SECRET_KEY environment variable or add secret_key to config file."
                        .to_string(),
                });
            }

            if self.auth.native.password.min_length > self.auth.native.password.max_length {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                        self.auth.native.password.min_length, self.auth.native.password.max_length
                    ),
                });
            }

            if self.auth.native.password.min_length < 1 {
                return Err(Error::Internal {
                    operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
                });
            }
        }

        if self.auth.security.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.auth.security.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self
            .auth
            .security
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.auth.security.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: database.max_connections must be at least 1".to_string(),
            });
        }

        if !(self.rates.default_krw_per_usd.is_finite() && self.rates.default_krw_per_usd > 0.0) {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: rates.default_krw_per_usd must be a positive number (got {})",
                    self.rates.default_krw_per_usd
                ),
            });
        }

        if self.rates.max_age.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: rates.max_age must be greater than zero".to_string(),
            });
        }

        match &self.rates.source {
            RateSourceConfig::Http(http) if http.timeout.is_zero() => {
                return Err(Error::Internal {
                    operation: "Config validation: rates.source.http.timeout must be greater than zero".to_string(),
                });
            }
            RateSourceConfig::Fixed(fixed) if !(fixed.usd_per_krw.is_finite() && fixed.usd_per_krw > 0.0) => {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: rates.source.fixed.usd_per_krw must be a positive number (got {})",
                        fixed.usd_per_krw
                    ),
                });
            }
            _ => {}
        }

        if self.ledger.default_categories.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::Internal {
                operation: "Config validation: ledger.default_categories must contain at least one category".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("BUDGETD_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
