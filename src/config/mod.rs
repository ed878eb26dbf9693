use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod validator;

use crate::cli::Cli;

pub const DEFAULT_PROVIDERS: [&str; 2] = ["viacep", "brasilapi"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub address: AddressSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Postal-code provider chain
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressSettings {
    /// Per-provider attempt timeout
    pub timeout_seconds: u64,
    /// Provider names in fallback order
    pub providers: Vec<String>,
    pub viacep_url: String,
    pub brasilapi_url: String,
}

impl Default for AddressSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            providers: DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            viacep_url: "https://viacep.com.br".to_string(),
            brasilapi_url: "https://brasilapi.com.br".to_string(),
        }
    }
}

/// Back-office resource API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, then CLI/env overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let s = Self::builder()?
            .add_source(File::from(cli.config.clone()).required(false))
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = Path::new(root).join("estate-console");
        let s = Self::builder()?
            .add_source(File::from(config_path).required(false))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, anyhow::Error> {
        let address = AddressSettings::default();
        let api = ApiSettings::default();
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("address.timeout_seconds", address.timeout_seconds)?
            .set_default("address.providers", address.providers)?
            .set_default("address.viacep_url", address.viacep_url)?
            .set_default("address.brasilapi_url", address.brasilapi_url)?
            .set_default("api.base_url", api.base_url)?
            .set_default("api.timeout_seconds", api.timeout_seconds)?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(timeout) = cli.address_timeout {
            self.address.timeout_seconds = timeout;
        }
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}
