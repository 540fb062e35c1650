//! Configuration system for the Cadenza server.
//!
//! Sources, lowest priority first:
//! - Defaults
//! - TOML config file (`cadenza.toml`)
//! - Environment variables (`CADENZA_*`)
//! - CLI arguments
//!
//! Environment and CLI are both read by clap; a flag on the command line
//! beats the matching variable.

use anyhow::{bail, Context, Result};
use cadenza_api::ApiConfig;
use cadenza_controller::{CachePolicy, ControllerConfig, DEFAULT_MAX_CONCURRENT_GENERATIONS};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Command-line arguments for the Cadenza server.
///
/// Every setting is optional here so that an absent flag falls through to
/// the config file and then to the defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cadenza-server")]
#[command(about = "Cadenza - MIDI generation server routing requests to installed models")]
#[command(version)]
pub struct CliArgs {
    /// Address to bind the HTTP API to
    #[arg(long, env = "CADENZA_HOST")]
    pub host: Option<IpAddr>,

    /// HTTP port for the API server
    #[arg(long, short = 'p', env = "CADENZA_PORT")]
    pub port: Option<u16>,

    /// Configuration file path
    #[arg(long, short = 'c', default_value = "cadenza.toml", env = "CADENZA_CONFIG")]
    pub config: PathBuf,

    /// Directory holding one sub-folder per installed model
    #[arg(long, env = "CADENZA_MODELS_ROOT")]
    pub models_root: Option<PathBuf>,

    /// Root for per-request save directories
    #[arg(long, env = "CADENZA_SAVE_ROOT")]
    pub save_root: Option<PathBuf>,

    /// Generations allowed to run at once
    #[arg(long, env = "CADENZA_MAX_CONCURRENT_GENERATIONS")]
    pub max_concurrent_generations: Option<usize>,

    /// Loaded pipelines kept between requests (0 loads per request)
    #[arg(long, env = "CADENZA_CACHE_CAPACITY")]
    pub cache_capacity: Option<usize>,

    /// Upload size limit in MiB
    #[arg(long, env = "CADENZA_MAX_UPLOAD_MB")]
    pub max_upload_mb: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CADENZA_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Full server configuration (merged from all sources).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub models_root: PathBuf,
    pub save_root: PathBuf,
    pub max_concurrent_generations: usize,
    /// `0` means every request loads its own pipeline
    pub cache_capacity: usize,
    pub max_upload_mb: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            models_root: PathBuf::from("data/models"),
            save_root: PathBuf::from("data/saves"),
            max_concurrent_generations: DEFAULT_MAX_CONCURRENT_GENERATIONS,
            cache_capacity: 0,
            max_upload_mb: 20,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from CLI args and the optional config file.
    ///
    /// A missing config file is not an error; an unreadable or malformed one is.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let mut config = if args.config.exists() {
            Self::from_file(&args.config)?
        } else {
            Self::default()
        };

        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    fn apply_args(&mut self, args: &CliArgs) {
        if let Some(host) = args.host {
            self.host = host;
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(ref models_root) = args.models_root {
            self.models_root = models_root.clone();
        }
        if let Some(ref save_root) = args.save_root {
            self.save_root = save_root.clone();
        }
        if let Some(workers) = args.max_concurrent_generations {
            self.max_concurrent_generations = workers;
        }
        if let Some(capacity) = args.cache_capacity {
            self.cache_capacity = capacity;
        }
        if let Some(mb) = args.max_upload_mb {
            self.max_upload_mb = mb;
        }
        if let Some(ref level) = args.log_level {
            self.log_level = level.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent_generations == 0 {
            bail!("max_concurrent_generations must be at least 1");
        }
        if self.max_upload_mb == 0 {
            bail!("max_upload_mb must be at least 1");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            bind: self.bind_addr(),
            save_root: self.save_root.clone(),
            max_upload_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            max_concurrent_generations: self.max_concurrent_generations,
            cache_policy: CachePolicy::from_capacity(self.cache_capacity),
        }
    }
}
