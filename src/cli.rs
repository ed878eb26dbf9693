use clap::Parser;
use std::path::PathBuf;

/// Estate Console - headless back-office core and postal-code lookup service
#[derive(Parser, Debug, Clone)]
#[command(name = "estate-console", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "ESTATE_CONFIG", default_value = "estate-console.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "ESTATE_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "ESTATE_PORT")]
    pub port: Option<u16>,

    /// Per-provider address lookup timeout in seconds
    #[arg(long, env = "ESTATE_ADDRESS_TIMEOUT")]
    pub address_timeout: Option<u64>,

    /// Base URL of the back-office resource API
    #[arg(long, env = "ESTATE_API_URL")]
    pub api_url: Option<String>,
}
