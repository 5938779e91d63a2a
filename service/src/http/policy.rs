//! Immutable response hardening policy.
//!
//! The policy is compiled once from [`SecurityHeadersConfig`] at start-up and
//! shared read-only by every in-flight request. All header values are
//! validated here so the per-response path never has to handle encoding
//! failures.

use axum::http::{
    header::{
        HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue, CONTENT_SECURITY_POLICY,
        REFERRER_POLICY, SERVER, STRICT_TRANSPORT_SECURITY, VIA, X_CONTENT_TYPE_OPTIONS,
        X_FRAME_OPTIONS, X_XSS_PROTECTION,
    },
    HeaderMap,
};

use crate::config::SecurityHeadersConfig;

pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
pub const X_ASPNET_VERSION: HeaderName = HeaderName::from_static("x-aspnet-version");
pub const X_ASPNETMVC_VERSION: HeaderName = HeaderName::from_static("x-aspnetmvc-version");

/// Headers that reveal server or framework identity. Always stripped.
pub const DISCLOSURE_HEADERS: [HeaderName; 5] = [
    SERVER,
    X_POWERED_BY,
    VIA,
    X_ASPNET_VERSION,
    X_ASPNETMVC_VERSION,
];

/// Errors raised while compiling a [`SecurityPolicy`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid value for header '{name}': {source}")]
    InvalidHeaderValue {
        name: HeaderName,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("invalid header name '{name}' in strip_headers: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },

    #[error("header '{0}' is always sent and cannot be configured blank")]
    BlankHeaderValue(HeaderName),

    #[error("path prefix '{0}' must start with '/'")]
    InvalidPrefix(String),
}

/// Read-only hardening tables shared by all requests.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    static_headers: HeaderMap,
    strip_headers: Vec<HeaderName>,
    hsts: HeaderValue,
    api_version_prefix: String,
    internal_prefixes: Vec<String>,
}

impl SecurityPolicy {
    /// Compile the policy from configuration.
    ///
    /// # Errors
    /// Returns an error if a mandatory header is configured blank, if a
    /// configured header value or name cannot be encoded, or if a path prefix
    /// is not absolute.
    pub fn from_config(config: &SecurityHeadersConfig) -> Result<Self, PolicyError> {
        let mut static_headers = HeaderMap::new();

        // X-Content-Type-Options: nosniff (always)
        static_headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

        let required = [
            (X_FRAME_OPTIONS, config.frame_options.to_uppercase()),
            (CONTENT_SECURITY_POLICY, config.content_security_policy.clone()),
            (PERMISSIONS_POLICY, config.permissions_policy.clone()),
            (REFERRER_POLICY, config.referrer_policy.clone()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PolicyError::BlankHeaderValue(name));
            }
            let value = encode(&name, &value)?;
            static_headers.insert(name, value);
        }

        // X-XSS-Protection is the only optional header; blank omits it
        if !config.xss_protection.trim().is_empty() {
            let value = encode(&X_XSS_PROTECTION, &config.xss_protection)?;
            static_headers.insert(X_XSS_PROTECTION, value);
        }

        let mut strip_headers = DISCLOSURE_HEADERS.to_vec();
        for raw in &config.strip_headers {
            let name = HeaderName::from_bytes(raw.trim().as_bytes()).map_err(|source| {
                PolicyError::InvalidHeaderName {
                    name: raw.clone(),
                    source,
                }
            })?;
            if !strip_headers.contains(&name) {
                strip_headers.push(name);
            }
        }

        let mut hsts = format!("max-age={}", config.hsts_max_age);
        if config.hsts_include_subdomains {
            hsts.push_str("; includeSubDomains");
        }
        if config.hsts_preload {
            hsts.push_str("; preload");
        }
        let hsts = encode(&STRICT_TRANSPORT_SECURITY, &hsts)?;

        let api_version_prefix = absolute_prefix(&config.api_version_prefix)?;
        let internal_prefixes = config
            .internal_prefixes
            .iter()
            .map(|prefix| absolute_prefix(prefix))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            static_headers,
            strip_headers,
            hsts,
            api_version_prefix,
            internal_prefixes,
        })
    }

    /// Overwrite the static hardening headers and strip disclosure headers.
    ///
    /// Uses insert semantics so repeated application never duplicates a value.
    pub fn apply_static_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.static_headers {
            headers.insert(name.clone(), value.clone());
        }
        for name in &self.strip_headers {
            headers.remove(name);
        }
    }

    #[must_use]
    pub const fn hsts_value(&self) -> &HeaderValue {
        &self.hsts
    }

    #[must_use]
    pub fn api_version_prefix(&self) -> &str {
        &self.api_version_prefix
    }

    #[must_use]
    pub fn internal_prefixes(&self) -> &[String] {
        &self.internal_prefixes
    }

    #[must_use]
    pub const fn static_headers(&self) -> &HeaderMap {
        &self.static_headers
    }

    #[must_use]
    pub fn strip_headers(&self) -> &[HeaderName] {
        &self.strip_headers
    }
}

fn encode(name: &HeaderName, value: &str) -> Result<HeaderValue, PolicyError> {
    HeaderValue::from_str(value).map_err(|source| PolicyError::InvalidHeaderValue {
        name: name.clone(),
        source,
    })
}

fn absolute_prefix(prefix: &str) -> Result<String, PolicyError> {
    if prefix.starts_with('/') {
        Ok(prefix.to_string())
    } else {
        Err(PolicyError::InvalidPrefix(prefix.to_string()))
    }
}
