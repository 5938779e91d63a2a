//! Test app builder that mirrors `app::build_app` wiring with stub upstream routes.
//!
//! This module provides a [`TestAppBuilder`] that constructs an Axum router with
//! the same layer ordering as production, plus handlers that behave like a
//! careless upstream producer: they leak server identity headers, set cookies
//! with weak SameSite values and pick their own cache headers.
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::app_builder::TestAppBuilder;
//!
//! #[tokio::test]
//! async fn test_with_full_app() {
//!     let app = TestAppBuilder::new()
//!         .with_upstream()
//!         .with_security_headers_default()
//!         .build();
//!
//!     // Use app.oneshot(...) to send requests
//! }
//! ```
//!
//! # Preset Builders
//!
//! - [`TestAppBuilder::minimal()`] - Health check only, no hardening
//! - [`TestAppBuilder::hardened()`] - Health plus stub upstream, default hardening

use std::sync::Arc;

use axum::{
    http::{
        header::{CACHE_CONTROL, SERVER, SET_COOKIE, VIA},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use shieldwall_api::{
    app::with_security_headers, build_info::BuildInfoProvider, config::SecurityHeadersConfig,
    http::SecurityPolicy,
};

/// Health check handler (mirrors app.rs)
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn leaky_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SERVER, HeaderValue::from_static("Quarkus/3.8 Java/21"));
    headers.insert("x-powered-by", HeaderValue::from_static("Express"));
    headers.insert(VIA, HeaderValue::from_static("1.1 openshift-router"));
    headers.insert("x-aspnet-version", HeaderValue::from_static("4.0.30319"));
    headers
}

/// Sets one cookie with `SameSite=None` and leaks server identity.
async fn session() -> impl IntoResponse {
    let mut headers = leaky_headers();
    headers.append(
        SET_COOKIE,
        HeaderValue::from_static("sessionId=abc123; SameSite=None; Secure; HttpOnly; Path=/"),
    );
    (headers, "session")
}

/// Sets several cookies in a known order.
async fn multi_cookie() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
    headers.append(SET_COOKIE, HeaderValue::from_static("b=2; SameSite=Lax; Path=/"));
    headers.append(SET_COOKIE, HeaderValue::from_static("c=3; SameSite=Strict; Secure"));
    headers.append(SET_COOKIE, HeaderValue::from_static("d=4; Secure; HttpOnly; Path=/"));
    (headers, "cookies")
}

/// Picks a long-lived cache policy the hook must override.
async fn cached_asset() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    (headers, "console.log('app');")
}

/// Fails with a server error while still leaking identity headers.
async fn failing() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        leaky_headers(),
        "upstream exploded",
    )
}

async fn create_item() -> impl IntoResponse {
    (StatusCode::CREATED, "created")
}

/// Builder for test applications that mirrors `app::build_app` wiring.
pub struct TestAppBuilder {
    /// Whether to include health check route
    include_health: bool,
    /// Whether to include stub upstream routes
    include_upstream: bool,
    /// Custom build info provider (None uses from_env())
    build_info: Option<BuildInfoProvider>,
    /// Security headers config (None means disabled)
    security_headers: Option<SecurityHeadersConfig>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_health: false,
            include_upstream: false,
            build_info: None,
            security_headers: None,
        }
    }

    // =========================================================================
    // Preset Builders
    // =========================================================================

    /// Create a minimal app with only the health check endpoint.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new().with_health()
    }

    /// Create an app with health, stub upstream routes and default hardening.
    #[must_use]
    pub fn hardened() -> Self {
        Self::new()
            .with_health()
            .with_upstream()
            .with_security_headers_default()
    }

    // =========================================================================
    // Component Configuration
    // =========================================================================

    /// Include health check route (/health).
    #[must_use]
    pub fn with_health(mut self) -> Self {
        self.include_health = true;
        self
    }

    /// Include stub upstream routes:
    /// `/api/v1/session`, `/api/v1/cookies`, `/api/v1/items` (POST),
    /// `/api/v1/fail`, `/static/app.js`, `/q/health`, `/api-docs`.
    #[must_use]
    pub fn with_upstream(mut self) -> Self {
        self.include_upstream = true;
        self
    }

    /// Enable security headers with default configuration.
    #[must_use]
    pub fn with_security_headers_default(mut self) -> Self {
        self.security_headers = Some(SecurityHeadersConfig::default());
        self
    }

    /// Enable security headers with custom configuration.
    #[must_use]
    pub fn with_security_headers(mut self, config: SecurityHeadersConfig) -> Self {
        self.security_headers = Some(config);
        self
    }

    /// Use a custom build info provider.
    #[must_use]
    pub fn with_build_info(mut self, provider: BuildInfoProvider) -> Self {
        self.build_info = Some(provider);
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Build the Axum router.
    ///
    /// The layer ordering matches app.rs:
    /// 1. Routes
    /// 2. Extensions (build_info)
    /// 3. Security headers middleware (outermost)
    #[must_use]
    pub fn build(self) -> Router {
        let build_info = self.build_info.unwrap_or_else(BuildInfoProvider::from_env);

        let mut app = Router::new();

        if self.include_health {
            app = app.route("/health", get(health_check));
        }

        if self.include_upstream {
            app = app
                .route("/api/v1/session", get(session))
                .route("/api/v1/cookies", get(multi_cookie))
                .route("/api/v1/items", get(multi_cookie).post(create_item))
                .route("/api/v1/fail", get(failing))
                .route("/static/app.js", get(cached_asset))
                .route("/q/health", get(health_check))
                .route("/api-docs", get(health_check));
        }

        app = app.layer(Extension(build_info));

        if let Some(config) = self.security_headers {
            if config.enabled {
                let policy = SecurityPolicy::from_config(&config).expect("valid policy");
                app = with_security_headers(app, Arc::new(policy));
            }
        }

        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_minimal_builder_creates_health_route() {
        let app = TestAppBuilder::minimal().build();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_routes_leak_without_hardening() {
        let app = TestAppBuilder::new().with_upstream().build();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert!(response.headers().contains_key(SERVER));
        assert_eq!(
            response.headers().get(SET_COOKIE).expect("cookie"),
            "sessionId=abc123; SameSite=None; Secure; HttpOnly; Path=/"
        );
    }
}
