//! Configuration management for the CoffeeStudio calculator service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with COFFEESTUDIO__ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{default_usd_to_eur, FxRates, ScoringConfig};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Exchange rate fallback and ECB feed
    #[serde(default)]
    pub fx: FxConfig,

    /// Cooperative scoring calibration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Price benchmark fallback for cooperatives without a regional figure
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying HS256 tokens
    pub secret: String,

    /// Expected `iss` claim, if any
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    pub audience: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FxConfig {
    /// USD->EUR rate used when no market observation exists
    #[serde(default = "default_usd_to_eur")]
    pub default_usd_to_eur: Decimal,

    /// ECB daily reference rate feed
    #[serde(default = "default_ecb_url")]
    pub ecb_url: String,
}

fn default_ecb_url() -> String {
    "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml".to_string()
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            default_usd_to_eur: default_usd_to_eur(),
            ecb_url: default_ecb_url(),
        }
    }
}

impl FxConfig {
    pub fn rates(&self) -> FxRates {
        FxRates::new(self.default_usd_to_eur)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BenchmarkConfig {
    /// Peru FOB average, USD per kg green
    #[serde(default = "default_peru_fob_usd_per_kg")]
    pub default_fob_usd_per_kg: Decimal,
}

fn default_peru_fob_usd_per_kg() -> Decimal {
    Decimal::new(510, 2)
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            default_fob_usd_per_kg: default_peru_fob_usd_per_kg(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("COFFEESTUDIO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (COFFEESTUDIO__ prefix)
            .add_source(
                Environment::with_prefix("COFFEESTUDIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the calculators cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fx.default_usd_to_eur <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "fx.default_usd_to_eur must be greater than zero".to_string(),
            ));
        }
        if self.benchmark.default_fob_usd_per_kg <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "benchmark.default_fob_usd_per_kg must be greater than zero".to_string(),
            ));
        }
        self.scoring
            .validate()
            .map_err(|e| ConfigError::Message(format!("scoring: {}", e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for router tests; never connects anywhere
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/coffeestudio_test".to_string(),
                max_connections: 1,
                min_connections: 0,
            },
            jwt: JwtConfig {
                secret: jwt_secret.to_string(),
                issuer: None,
                audience: None,
            },
            fx: FxConfig::default(),
            scoring: ScoringConfig::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}
