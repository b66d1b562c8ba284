use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::hiring::ReviewPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
    pub scheduler: SchedulerConfig,
    pub directory: DirectoryConfig,
}

const MAX_CONFIGURABLE_ROUNDS: u8 = 20;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_rounds = env::var("APP_MAX_REVIEW_ROUNDS")
            .unwrap_or_else(|_| "5".to_string())
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|rounds| (1..=MAX_CONFIGURABLE_ROUNDS).contains(rounds))
            .ok_or(ConfigError::InvalidRoundLimit)?;

        let write_attempts = env::var("APP_WRITE_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|attempts| *attempts >= 1)
            .ok_or(ConfigError::InvalidWriteAttempts)?;

        let endpoint = env::var("APP_SCHEDULER_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(url) = &endpoint {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidSchedulerUrl { value: url.clone() });
            }
        }

        let timeout_secs = env::var("APP_SCHEDULER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs >= 1)
            .ok_or(ConfigError::InvalidSchedulerTimeout)?;

        let roster_path = env::var("APP_DIRECTORY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowConfig {
                max_rounds,
                write_attempts,
            },
            scheduler: SchedulerConfig {
                endpoint,
                timeout: Duration::from_secs(timeout_secs),
            },
            directory: DirectoryConfig { roster_path },
        })
    }

    /// Pipeline policy derived from the workflow and scheduler settings.
    pub fn review_policy(&self) -> ReviewPolicy {
        ReviewPolicy {
            max_rounds: self.workflow.max_rounds,
            write_attempts: self.workflow.write_attempts,
            scheduler_timeout: self.scheduler.timeout,
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Review round ceiling and write-retry budget.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub max_rounds: u8,
    pub write_attempts: u8,
}

/// Location of the external meeting scheduler. `None` disables scheduling.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub roster_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRoundLimit,
    InvalidWriteAttempts,
    InvalidSchedulerUrl { value: String },
    InvalidSchedulerTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRoundLimit => write!(
                f,
                "APP_MAX_REVIEW_ROUNDS must be between 1 and {MAX_CONFIGURABLE_ROUNDS}"
            ),
            ConfigError::InvalidWriteAttempts => {
                write!(f, "APP_WRITE_ATTEMPTS must be a positive integer")
            }
            ConfigError::InvalidSchedulerUrl { value } => {
                write!(f, "APP_SCHEDULER_URL must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidSchedulerTimeout => {
                write!(f, "APP_SCHEDULER_TIMEOUT_SECS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
