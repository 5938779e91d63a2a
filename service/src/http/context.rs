//! Request snapshot taken before the request is handed downstream.

use axum::http::{HeaderMap, HeaderValue, Uri};

use super::scheme::TRUSTED_FORWARDING_HEADERS;

/// The parts of a request the hardening hook needs once the response exists.
///
/// Only the trusted forwarding headers are copied; everything else on the
/// request is irrelevant to response hardening.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    path: String,
    scheme: Option<String>,
    forwarding: HeaderMap,
}

impl RequestContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Capture path, scheme and trusted forwarding headers from an incoming request.
    #[must_use]
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let mut forwarding = HeaderMap::new();
        for trusted in &TRUSTED_FORWARDING_HEADERS {
            for value in headers.get_all(&trusted.name) {
                forwarding.append(trusted.name.clone(), value.clone());
            }
        }

        Self {
            path: uri.path().to_string(),
            scheme: uri.scheme_str().map(str::to_string),
            forwarding,
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Attach a forwarding header. Names outside the trusted set are ignored.
    #[must_use]
    pub fn with_forwarded(mut self, name: &str, value: &str) -> Self {
        let trusted = TRUSTED_FORWARDING_HEADERS
            .iter()
            .find(|trusted| trusted.name.as_str().eq_ignore_ascii_case(name));
        if let (Some(trusted), Ok(value)) = (trusted, HeaderValue::from_str(value)) {
            self.forwarding.append(trusted.name.clone(), value);
        }
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// First value of a captured forwarding header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.forwarding.get(name).and_then(|v| v.to_str().ok())
    }
}
