use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;
use zeroize::Zeroizing;

const PLACEHOLDER_PREFIX: &str = "your_";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_auth_provider_url")]
    pub auth_provider_url: String,

    #[serde(default = "default_auth_provider_timeout")]
    pub auth_provider_timeout_secs: u64,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_days: i64,

    #[serde(default)]
    pub removebg_api_key: Option<String>,

    #[serde(default = "default_removebg_url")]
    pub removebg_api_url: String,

    #[serde(default = "default_removebg_timeout")]
    pub removebg_timeout_secs: u64,

    #[serde(default)]
    pub cloudinary_cloud_name: Option<String>,

    #[serde(default)]
    pub cloudinary_api_key: Option<String>,

    #[serde(default)]
    pub cloudinary_api_secret: Option<String>,

    #[serde(default = "default_cloudinary_base")]
    pub cloudinary_api_base: String,

    #[serde(default = "default_asset_folder")]
    pub asset_folder_root: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "FlipCut-API".to_string()
}
fn default_port() -> u16 {
    8001
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_connections() -> u32 {
    20
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_auth_provider_url() -> String {
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data".to_string()
}
fn default_auth_provider_timeout() -> u64 {
    30
}
fn default_session_ttl() -> i64 {
    7
}
fn default_removebg_url() -> String {
    "https://api.remove.bg/v1.0/removebg".to_string()
}
fn default_removebg_timeout() -> u64 {
    60
}
fn default_cloudinary_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}
fn default_asset_folder() -> String {
    "flipcut".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Unprefixed names used by existing deployments
        config.database_url = fill_or_env(config.database_url, &["APP_DATABASE_URL", "DATABASE_URL"])?;
        config.removebg_api_key = config.removebg_api_key.or_else(|| first_env(&["REMOVEBG_API_KEY"]));
        config.cloudinary_cloud_name = config.cloudinary_cloud_name.or_else(|| first_env(&["CLOUDINARY_CLOUD_NAME"]));
        config.cloudinary_api_key = config.cloudinary_api_key.or_else(|| first_env(&["CLOUDINARY_API_KEY"]));
        config.cloudinary_api_secret = config.cloudinary_api_secret.or_else(|| first_env(&["CLOUDINARY_API_SECRET"]));

        if env::var("APP_CORS_ALLOWED_ORIGINS").is_err() {
            if let Some(origins) = first_env(&["CORS_ORIGINS"]) {
                config.cors_allowed_origins = vec![origins];
            }
        }

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty".to_string());
        }
        if self.session_ttl_days <= 0 {
            errors.push("SESSION_TTL_DAYS must be positive".to_string());
        }
        if self.removebg_timeout_secs == 0 {
            errors.push("REMOVEBG_TIMEOUT_SECS must be positive".to_string());
        }
        if self.asset_folder_root.trim().is_empty() {
            errors.push("ASSET_FOLDER_ROOT cannot be empty".to_string());
        }
        for (name, value) in [
            ("AUTH_PROVIDER_URL", &self.auth_provider_url),
            ("REMOVEBG_API_URL", &self.removebg_api_url),
            ("CLOUDINARY_API_BASE", &self.cloudinary_api_base),
        ] {
            if !is_http_url(value) {
                errors.push(format!("{name} must be an http(s) URL"));
            }
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    pub fn removebg_timeout(&self) -> Duration {
        Duration::from_secs(self.removebg_timeout_secs)
    }

    pub fn auth_provider_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_provider_timeout_secs)
    }

    /// Returns `None` while any credential is missing or still a placeholder.
    pub fn cloudinary_credentials(&self) -> Option<CloudinaryCredentials> {
        let cloud_name = configured(&self.cloudinary_cloud_name)?;
        let api_key = configured(&self.cloudinary_api_key)?;
        let api_secret = configured(&self.cloudinary_api_secret)?;

        Some(CloudinaryCredentials {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: Zeroizing::new(api_secret.to_string()),
        })
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with(PLACEHOLDER_PREFIX))
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn fill_or_env(current: String, env_keys: &[&str]) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        first_env(env_keys).ok_or_else(|| ConfigError::Message(format!("{} must be set", env_keys.join(" or "))))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.trim().is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        self.as_deref().unwrap_or_default().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("database_max_connections", &self.database_max_connections)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("auth_provider_url", &self.auth_provider_url)
            .field("session_ttl_days", &self.session_ttl_days)
            .field("removebg_api_key", &self.removebg_api_key.redact())
            .field("removebg_api_url", &self.removebg_api_url)
            .field("removebg_timeout_secs", &self.removebg_timeout_secs)
            .field("cloudinary_cloud_name", &self.cloudinary_cloud_name)
            .field("cloudinary_api_key", &self.cloudinary_api_key.redact())
            .field("cloudinary_api_secret", &self.cloudinary_api_secret.redact())
            .field("asset_folder_root", &self.asset_folder_root)
            .finish()
    }
}

#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
}

impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}
