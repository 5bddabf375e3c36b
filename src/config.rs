use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Development/production switch, read once at process start.
///
/// Selects logging verbosity and environment-specific defaults. Mirrors the
/// `DEV` environment convention: `ZAP_DEV=1` (or legacy `DEV=1`) selects the
/// development environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    pub fn from_env() -> Self {
        let flagged = |name: &str| {
            std::env::var(name)
                .map(|v| !v.is_empty() && v != "0")
                .unwrap_or(false)
        };
        if flagged("ZAP_DEV") || flagged("DEV") {
            RunMode::Development
        } else {
            RunMode::Production
        }
    }

    /// Default log level for this mode.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            RunMode::Development => "debug",
            RunMode::Production => "info",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZapConfig {
    pub system: SystemConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Directory holding per-user runtime state (instance lock, IPC socket,
    /// log file, version stamp)
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Log file name inside the state directory
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Default HTTP port when none is given on the command line
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_state_dir() -> String {
    let base = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    base.join(".zap").to_string_lossy().into_owned()
}

fn default_log_file() -> String {
    "zap.log".to_string()
}

fn default_http_port() -> u16 {
    9070
}

impl ZapConfig {
    /// Load configuration from an optional TOML file with environment
    /// variable overrides (`ZAP_` prefix, `__` separating nested keys, e.g.
    /// `ZAP_SERVER__HTTP_PORT`).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Logging may not be initialized yet when this runs; keep any
        // pre-subscriber chatter at debug.
        let path_str = path.as_ref().to_string_lossy().to_string();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("system.state_dir", default_state_dir())?
            .set_default("system.log_file", default_log_file())?
            .set_default("server.http_port", default_http_port() as i64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with ZAP_ prefix; double underscore
            // separates nesting so keys like http_port stay addressable
            .add_source(
                Environment::with_prefix("ZAP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ZapConfig = settings.try_deserialize()?;

        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system.state_dir.is_empty() {
            return Err(ConfigError::Message(
                "State directory must not be empty".to_string(),
            ));
        }

        if self.system.log_file.is_empty() {
            return Err(ConfigError::Message(
                "Log file name must not be empty".to_string(),
            ));
        }

        if self.server.http_port == 0 {
            return Err(ConfigError::Message(
                "HTTP port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        PathBuf::from(&self.system.state_dir)
    }

    /// Path of the single-instance lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join("zap.lock")
    }

    /// Path of the second-instance notification socket.
    pub fn socket_path(&self) -> PathBuf {
        self.state_dir().join("zap.sock")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir().join(&self.system.log_file)
    }

    /// Render this configuration as TOML, e.g. for `--dumpConfig`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig {
                state_dir: default_state_dir(),
                log_file: default_log_file(),
            },
            server: ServerConfig {
                http_port: default_http_port(),
            },
        }
    }
}
