//! Router assembly shared by `main.rs` and the integration tests.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    build_info::{BuildInfo, BuildInfoProvider},
    config::Config,
    http::{security_headers_middleware, PolicyError, SecurityPolicy},
};

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Route verification endpoints" }))
}

// Health check handler
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn build_info(Extension(provider): Extension<BuildInfoProvider>) -> Json<BuildInfo> {
    Json(provider.build_info())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Wrap `router` with the response hardening hook.
///
/// The hook is added as the outermost layer so it sees every response,
/// including fallbacks and method-not-allowed rejections. Call this once per
/// router; stacking it would only redo the same work.
pub fn with_security_headers(router: Router, policy: Arc<SecurityPolicy>) -> Router {
    router
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(Extension(policy))
}

/// Build the application router from configuration.
///
/// With `security_headers.enabled = false` the hardening hook is not
/// installed at all, so responses go out without security headers, HSTS,
/// cache policy or `SameSite` normalization. Only use it when another layer
/// in front of the service hardens responses.
///
/// # Errors
/// Returns an error if the security header policy cannot be compiled.
pub fn build_app(
    config: &Config,
    build_info_provider: BuildInfoProvider,
) -> Result<Router, PolicyError> {
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/v1/build-info", get(build_info))
        .fallback(not_found)
        .layer(Extension(build_info_provider))
        .layer(TraceLayer::new_for_http());

    if !config.security_headers.enabled {
        tracing::warn!(
            "Security headers disabled - responses are sent without security headers, \
             HSTS, cache policy or SameSite normalization"
        );
        return Ok(app);
    }

    let policy = SecurityPolicy::from_config(&config.security_headers)?;
    tracing::info!("Security headers enabled");
    Ok(with_security_headers(app, Arc::new(policy)))
}
