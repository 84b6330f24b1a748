use chrono::{Datelike, Local, NaiveDate};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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

pub const DEFAULT_SOLVER_BASE_URL: &str = "http://localhost:8080/api/festivi/assegna";

/// Largest accepted input workbook upload, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub solver: SolverConfig,
    pub defaults: ReviewDefaults,
}

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

        let max_upload_bytes = match env::var("REVIEW_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidUploadLimit)?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("SOLVER_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_SOLVER_BASE_URL.to_string());
        if base_url.is_empty() {
            return Err(ConfigError::InvalidSolverUrl);
        }
        let timeout_secs = env::var("SOLVER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let year = Local::now().year();
        let start_date = default_date("REVIEW_START_DATE", year, 1, 1)?;
        let end_date = default_date("REVIEW_END_DATE", year, 12, 31)?;
        let min_proximity_days = env::var("REVIEW_MIN_PROXIMITY_DAYS")
            .unwrap_or_else(|_| "2".to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMinProximity)?;

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                max_upload_bytes,
            },
            telemetry: TelemetryConfig { log_level },
            solver: SolverConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            defaults: ReviewDefaults {
                start_date,
                end_date,
                min_proximity_days,
            },
        })
    }
}

fn default_date(var: &'static str, year: i32, month: u32, day: u32) -> Result<NaiveDate, ConfigError> {
    match env::var(var) {
        Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| ConfigError::InvalidDate { var }),
        Err(_) => NaiveDate::from_ymd_opt(year, month, day).ok_or(ConfigError::InvalidDate { var }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location and limits of the remote assignment solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Initial values for the compute form.
#[derive(Debug, Clone)]
pub struct ReviewDefaults {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_proximity_days: u32,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSolverUrl,
    InvalidTimeout,
    InvalidDate { var: &'static str },
    InvalidMinProximity,
    InvalidUploadLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSolverUrl => write!(f, "SOLVER_BASE_URL must not be empty"),
            ConfigError::InvalidTimeout => {
                write!(f, "SOLVER_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidDate { var } => write!(f, "{var} must be a YYYY-MM-DD date"),
            ConfigError::InvalidMinProximity => {
                write!(f, "REVIEW_MIN_PROXIMITY_DAYS must be an integer >= 0")
            }
            ConfigError::InvalidUploadLimit => {
                write!(f, "REVIEW_MAX_UPLOAD_BYTES must be a positive number of bytes")
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
