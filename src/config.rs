// Command-line flags, optional TOML file, validation

use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for the process CPU sampling window.
pub const MAX_CPU_SAMPLE_MS: u64 = 10_000;

#[derive(Parser, Debug, Clone)]
#[command(name = "sysprobe", version, about)]
pub struct Cli {
    /// Optional TOML config file; flags given on the command line take precedence.
    #[arg(long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
    /// Listen address, `[host]:port` (default `:8080`).
    #[arg(long)]
    pub bind: Option<String>,
    /// Route serving the snapshot (default `/`).
    #[arg(long)]
    pub path: Option<String>,
    /// Shared secret expected verbatim in the `Authorization` header.
    #[arg(long, env = "SYSPROBE_APIKEY", hide_env_values = true)]
    pub apikey: Option<String>,
    /// Print a new random UUID and exit.
    #[arg(long)]
    pub uuidgen: bool,
    /// Debug logging and per-request tracing.
    #[arg(long)]
    pub debug: bool,
    /// Include pseudo/virtual filesystems in `storage`.
    #[arg(long)]
    pub all_partitions: bool,
    /// Window between the two process CPU samples, in milliseconds (0 disables CPU sampling).
    #[arg(long)]
    pub cpu_sample_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub collection: CollectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub path: String,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: ":8080".into(),
            path: "/".into(),
            debug: false,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub apikey: String,
}

// Never print the secret.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("apikey", &if self.apikey.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub all_partitions: bool,
    pub cpu_sample_ms: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            all_partitions: false,
            cpu_sample_ms: 200,
        }
    }
}

impl CollectionConfig {
    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("apikey was not set")]
    MissingApiKey,
    #[error("server.path must be a literal route starting with '/', got {0:?}")]
    InvalidPath(String),
    #[error("server.bind must be [host]:port, got {0:?}")]
    InvalidBind(String),
    #[error("collection.cpu_sample_ms must be at most {max}, got {got}")]
    InvalidSampleWindow { got: u64, max: u64 },
}

impl AppConfig {
    /// Builds the effective config: defaults, then the TOML file (if any), then explicit flags.
    /// The result is not validated; call [`AppConfig::validate`] before serving.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };
        if let Some(bind) = &cli.bind {
            config.server.bind = bind.clone();
        }
        if let Some(path) = &cli.path {
            config.server.path = path.clone();
        }
        if let Some(apikey) = &cli.apikey {
            config.auth.apikey = apikey.clone();
        }
        if cli.debug {
            config.server.debug = true;
        }
        if cli.all_partitions {
            config.collection.all_partitions = true;
        }
        if let Some(ms) = cli.cpu_sample_ms {
            config.collection.cpu_sample_ms = ms;
        }
        Ok(config)
    }

    pub fn load_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::from_toml_str(&s)
    }

    /// Parse without validating (file values may still be overridden by flags).
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config = Self::from_toml_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.apikey.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !is_literal_route(&self.server.path) {
            return Err(ConfigError::InvalidPath(self.server.path.clone()));
        }
        listen_addr(&self.server.bind)?;
        if self.collection.cpu_sample_ms > MAX_CPU_SAMPLE_MS {
            return Err(ConfigError::InvalidSampleWindow {
                got: self.collection.cpu_sample_ms,
                max: MAX_CPU_SAMPLE_MS,
            });
        }
        Ok(())
    }

    /// Address handed to the TCP listener.
    pub fn listen_addr(&self) -> Result<String, ConfigError> {
        listen_addr(&self.server.bind)
    }
}

/// `:8080` -> `0.0.0.0:8080`; `host:port` and `[v6]:port` pass through.
pub fn listen_addr(bind: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidBind(bind.to_string());
    let (host, port) = bind.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{}:{}", host, port))
}

// The path is registered as-is on the router, so capture syntax must not sneak in.
fn is_literal_route(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|seg| seg.starts_with(':') || seg.starts_with('*'))
}
