use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::prelude::deserialize_vec_from_string_or_vec;

/// Application configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with SW_ prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security_headers: SecurityHeadersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP server bind address.
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (debug, info, warn, error) or a full `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Response hardening policy.
///
/// Every field has a safe default; an empty config section yields the
/// strict policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityHeadersConfig {
    /// Install the response hardening hook (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// X-Frame-Options value: "DENY" or "SAMEORIGIN" (default: "DENY").
    #[serde(default = "default_frame_options")]
    pub frame_options: String,

    /// Content-Security-Policy header value (default: "default-src 'self'").
    #[serde(default = "default_csp")]
    pub content_security_policy: String,

    /// Permissions-Policy header value (default denies all powerful features).
    #[serde(default = "default_permissions_policy")]
    pub permissions_policy: String,

    /// Referrer-Policy header value (default: "strict-origin-when-cross-origin").
    #[serde(default = "default_referrer_policy")]
    pub referrer_policy: String,

    /// X-XSS-Protection header value (legacy browsers).
    #[serde(default = "default_xss_protection")]
    pub xss_protection: String,

    /// HSTS max-age in seconds (default: 31536000 = 1 year).
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,

    /// Include subdomains in HSTS (default: true).
    #[serde(default = "default_true")]
    pub hsts_include_subdomains: bool,

    /// Add the `preload` directive to HSTS (default: true).
    #[serde(default = "default_true")]
    pub hsts_preload: bool,

    /// Prefix of the versioned API namespace; a single version digit follows it.
    #[serde(default = "default_api_version_prefix")]
    pub api_version_prefix: String,

    /// Administrative/introspection prefixes that are never cached.
    /// Accepts either an array or comma-separated string.
    #[serde(
        default = "default_internal_prefixes",
        deserialize_with = "deserialize_string_list"
    )]
    pub internal_prefixes: Vec<String>,

    /// Extra response headers to strip, on top of the built-in disclosure list.
    /// Accepts either an array or comma-separated string.
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub strip_headers: Vec<String>,
}

/// Deserialize a list from comma-separated string or array, trimming and filtering empty values.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<String> = deserialize_vec_from_string_or_vec(deserializer)?;
    Ok(values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

// These functions cannot be const because serde uses function pointers for defaults
#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_hsts_max_age() -> u64 {
    31_536_000 // 1 year
}

fn default_frame_options() -> String {
    "DENY".to_string()
}

fn default_csp() -> String {
    "default-src 'self'".to_string()
}

fn default_permissions_policy() -> String {
    "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), \
     gyroscope=(), speaker=()"
        .to_string()
}

fn default_referrer_policy() -> String {
    "strict-origin-when-cross-origin".to_string()
}

fn default_xss_protection() -> String {
    "1; mode=block".to_string()
}

fn default_api_version_prefix() -> String {
    "/api/v".to_string()
}

fn default_internal_prefixes() -> Vec<String> {
    vec!["/q/".to_string()]
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            frame_options: default_frame_options(),
            content_security_policy: default_csp(),
            permissions_policy: default_permissions_policy(),
            referrer_policy: default_referrer_policy(),
            xss_protection: default_xss_protection(),
            hsts_max_age: default_hsts_max_age(),
            hsts_include_subdomains: default_true(),
            hsts_preload: default_true(),
            api_version_prefix: default_api_version_prefix(),
            internal_prefixes: default_internal_prefixes(),
            strip_headers: Vec::new(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are merged in priority order:
    /// 1. Struct defaults (lowest)
    /// 2. config.yaml file (if exists)
    /// 3. Environment variables with SW_ prefix (highest)
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("SW_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Port must be non-zero
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".into()));
        }

        let security = &self.security_headers;

        // X-Frame-Options must be DENY or SAMEORIGIN
        let frame_opts = security.frame_options.to_uppercase();
        if frame_opts != "DENY" && frame_opts != "SAMEORIGIN" {
            return Err(ConfigError::Validation(format!(
                "security_headers.frame_options must be 'DENY' or 'SAMEORIGIN', got: '{}'",
                security.frame_options
            )));
        }

        // Headers sent on every response; only xss_protection may be blank
        let required = [
            ("content_security_policy", &security.content_security_policy),
            ("permissions_policy", &security.permissions_policy),
            ("referrer_policy", &security.referrer_policy),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "security_headers.{field} cannot be empty"
                )));
            }
        }

        if security.api_version_prefix.len() < 2 || !security.api_version_prefix.starts_with('/')
        {
            return Err(ConfigError::Validation(format!(
                "security_headers.api_version_prefix must start with '/' and name a namespace, got: '{}'",
                security.api_version_prefix
            )));
        }

        for prefix in &security.internal_prefixes {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "security_headers.internal_prefixes contains invalid prefix '{prefix}'. Must start with '/'"
                )));
            }
        }

        Ok(())
    }
}
