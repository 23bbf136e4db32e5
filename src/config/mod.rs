//! Environment-backed configuration.
//!
//! Two independent sources are resolved here:
//!
//! - [`ServiceSettings`]: what the scorer loads (checkpoint, device, mode, batch size).
//!   Resolution is permissive; malformed values fall back to defaults and never fail.
//! - [`ServerConfig`]: where the HTTP server binds. Malformed values are errors.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_DEVICE, DEFAULT_EVAL_MODE, DEFAULT_MODEL_PATH, DEFAULT_PORT,
};

/// Immutable scorer settings, created once at process start.
///
/// Use [`ServiceSettings::from_env`] to read `ALIGNSCORE_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Checkpoint file. Home-expanded; existence is checked by the runner, not here.
    pub model_path: PathBuf,

    /// Lower-cased device preference (`auto`, `cpu`, `mps`, `cuda`, ...).
    pub device: String,

    /// Opaque evaluation mode tag. Default: `nli_sp`.
    pub evaluation_mode: String,

    /// Always positive. Default: `8`.
    pub batch_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            device: DEFAULT_DEVICE.to_string(),
            evaluation_mode: DEFAULT_EVAL_MODE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ServiceSettings {
    const ENV_MODEL_PATH: &'static str = "ALIGNSCORE_MODEL_PATH";
    const ENV_DEVICE: &'static str = "ALIGNSCORE_DEVICE";
    const ENV_EVAL_MODE: &'static str = "ALIGNSCORE_EVAL_MODE";
    const ENV_BATCH_SIZE: &'static str = "ALIGNSCORE_BATCH_SIZE";

    /// Loads settings from the environment. Never fails.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_path = env::var(Self::ENV_MODEL_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let model_path = expand_home(&model_path);

        let device = env::var(Self::ENV_DEVICE)
            .unwrap_or(defaults.device)
            .to_lowercase();

        let evaluation_mode = env::var(Self::ENV_EVAL_MODE).unwrap_or(defaults.evaluation_mode);

        let batch_size = parse_batch_size(env::var(Self::ENV_BATCH_SIZE).ok().as_deref());

        Self {
            model_path,
            device,
            evaluation_mode,
            batch_size,
        }
    }

    pub fn with_model_path<P: Into<PathBuf>>(mut self, model_path: P) -> Self {
        self.model_path = model_path.into();
        self
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.to_lowercase();
        self
    }

    pub fn with_evaluation_mode(mut self, evaluation_mode: impl Into<String>) -> Self {
        self.evaluation_mode = evaluation_mode.into();
        self
    }

    /// Sets the batch size; non-positive values keep the default.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        self
    }
}

/// Parses a configured batch size, falling back to the default on anything but a positive integer.
pub(crate) fn parse_batch_size(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_BATCH_SIZE;
    };

    match raw.parse::<i64>() {
        Ok(value) if value > 0 => usize::try_from(value).unwrap_or(DEFAULT_BATCH_SIZE),
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_BATCH_SIZE,
                "Invalid ALIGNSCORE_BATCH_SIZE, using default"
            );
            DEFAULT_BATCH_SIZE
        }
    }
}

/// Expands a leading `~` against `HOME`. Other paths are returned unchanged.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// HTTP bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server port. Default: `9000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
        }
    }
}

impl ServerConfig {
    pub(crate) const ENV_PORT: &'static str = "ALIGNSCORE_PORT";
    const ENV_BIND_ADDR: &'static str = "ALIGNSCORE_BIND_ADDR";

    /// Loads the bind configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;

        Ok(Self { port, bind_addr })
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }
}
