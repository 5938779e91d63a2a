//! Cache policy classification by request path.
//!
//! Matching is done by direct byte indexing so the cost is bounded by the
//! path length regardless of input shape.

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    HeaderMap, HeaderValue,
};

use super::policy::SecurityPolicy;

const NO_STORE: &str = "no-store, no-cache, must-revalidate, private";
const PUBLIC_REVALIDATE: &str = "public, max-age=3600, must-revalidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Versioned API or internal namespace; never stored by caches.
    VersionedApi,
    /// Everything else; cacheable for an hour with revalidation.
    Other,
}

impl PathClass {
    /// Classify a path against the policy's API and internal prefixes.
    #[must_use]
    pub fn classify(policy: &SecurityPolicy, path: &str) -> Self {
        if is_versioned_api_path(policy.api_version_prefix(), path)
            || is_internal_path(policy.internal_prefixes(), path)
        {
            Self::VersionedApi
        } else {
            Self::Other
        }
    }

    /// Replace the Cache-Control family on `headers` for this class.
    pub fn apply(self, headers: &mut HeaderMap) {
        match self {
            Self::VersionedApi => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
                headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
                headers.insert(EXPIRES, HeaderValue::from_static("0"));
            }
            Self::Other => {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static(PUBLIC_REVALIDATE));
            }
        }
    }
}

/// `prefix` exactly, or `prefix` + one ASCII digit + (`/` or end of path).
///
/// `/api/v1`, `/api/v1/` and `/api/v1/users` match; `/api/v12`, `/api/v1abc`,
/// `/api/version` and `/api-docs` do not.
#[must_use]
pub fn is_versioned_api_path(prefix: &str, path: &str) -> bool {
    let rest = if path.starts_with('/') {
        path.strip_prefix(prefix)
    } else {
        // Paths without a leading slash are compared as if they had one
        prefix
            .strip_prefix('/')
            .and_then(|prefix| path.strip_prefix(prefix))
    };
    let Some(rest) = rest else {
        return false;
    };

    let bytes = rest.as_bytes();
    match bytes.first() {
        None => true,
        Some(digit) if digit.is_ascii_digit() => matches!(bytes.get(1), None | Some(b'/')),
        Some(_) => false,
    }
}

/// Literal prefix match against the internal/introspection namespaces.
#[must_use]
pub fn is_internal_path(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| {
        if path.starts_with('/') {
            path.starts_with(prefix.as_str())
        } else {
            prefix
                .strip_prefix('/')
                .is_some_and(|prefix| path.starts_with(prefix))
        }
    })
}
