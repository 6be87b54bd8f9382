mod profile;

pub use profile::ProfileFileError;

use crate::screening::{ScreeningSettings, SopProfile, UnknownProfile};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

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

/// Top-level configuration for the screener binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub screening: ScreeningProfileConfig,
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

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let profile = env::var("SOP_PROFILE")
            .unwrap_or_else(|_| SopProfile::Standard.label().to_string())
            .parse::<SopProfile>()
            .map_err(ConfigError::UnknownProfile)?;
        let profile_path = env::var("SOP_PROFILE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening: ScreeningProfileConfig {
                profile,
                profile_path,
            },
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which SOP preset to screen with and an optional TOML file layered over it.
#[derive(Debug, Clone)]
pub struct ScreeningProfileConfig {
    pub profile: SopProfile,
    pub profile_path: Option<PathBuf>,
}

impl ScreeningProfileConfig {
    pub fn settings(&self) -> Result<ScreeningSettings, ConfigError> {
        load_screening_settings(self.profile, self.profile_path.as_deref())
    }
}

/// Builds engine settings from a profile, applying a profile file when given.
pub fn load_screening_settings(
    profile: SopProfile,
    path: Option<&Path>,
) -> Result<ScreeningSettings, ConfigError> {
    match path {
        Some(path) => {
            profile::load_profile_file(profile, path).map_err(|source| ConfigError::ProfileFile {
                path: path.to_path_buf(),
                source,
            })
        }
        None => Ok(ScreeningSettings::for_profile(profile)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownProfile(UnknownProfile),
    ProfileFile { path: PathBuf, source: ProfileFileError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownProfile(err) => write!(f, "SOP_PROFILE is invalid: {err}"),
            ConfigError::ProfileFile { path, source } => {
                write!(f, "failed to load {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::UnknownProfile(err) => Some(err),
            ConfigError::ProfileFile { source, .. } => Some(source),
        }
    }
}
