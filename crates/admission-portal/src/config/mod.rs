use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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

/// Top-level configuration for the server and the wizard client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the wizard client sends drafts and submissions, and where it keeps its local backup.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    /// `None` keeps the HTTP client's own defaults.
    pub api_timeout: Option<Duration>,
    pub backup_dir: PathBuf,
    pub backup_key: String,
}

impl PortalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url =
            env::var("ADMISSION_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let api_timeout = match env::var("ADMISSION_API_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidTimeout)?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let api_token = env::var("ADMISSION_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            api_url,
            api_token,
            api_timeout,
            backup_dir: env::var("ADMISSION_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".admission-backup")),
            backup_key: env::var("ADMISSION_BACKUP_KEY")
                .unwrap_or_else(|_| "admissionFormBackup".to_string()),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApiUrl(String),
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiUrl(url) => {
                write!(f, "ADMISSION_API_URL must be an http(s) URL, got '{url}'")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "ADMISSION_API_TIMEOUT_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApiUrl(_)
            | ConfigError::InvalidTimeout => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ADMISSION_API_URL",
            "ADMISSION_API_TOKEN",
            "ADMISSION_API_TIMEOUT_SECS",
            "ADMISSION_BACKUP_DIR",
            "ADMISSION_BACKUP_KEY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.portal.api_url, "http://127.0.0.1:3000");
        assert_eq!(config.portal.backup_key, "admissionFormBackup");
        assert_eq!(config.portal.backup_dir, PathBuf::from(".admission-backup"));
        assert!(config.portal.api_token.is_none());
        assert!(config.portal.api_timeout.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn portal_settings_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_API_URL", "https://admissions.example.edu");
        env::set_var("ADMISSION_API_TOKEN", "applicant-token");
        env::set_var("ADMISSION_API_TIMEOUT_SECS", "15");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.portal.api_url, "https://admissions.example.edu");
        assert_eq!(config.portal.api_token.as_deref(), Some("applicant-token"));
        assert_eq!(config.portal.api_timeout, Some(Duration::from_secs(15)));
        reset_env();
    }

    #[test]
    fn rejects_bad_timeout_and_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_API_TIMEOUT_SECS", "soon");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidTimeout)));

        reset_env();
        env::set_var("ADMISSION_API_URL", "ftp://admissions");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidApiUrl(_))
        ));
        reset_env();
    }
}
