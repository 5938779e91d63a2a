//! Response hardening hook.
//!
//! Every response passes through [`harden_response`] exactly once, after the
//! handler has produced status and body and before it is written out. The
//! hook only touches headers; it never changes the status or the body and it
//! cannot fail.

use std::sync::Arc;

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response, Extension};

use super::{
    cache::PathClass, context::RequestContext, cookie::normalize_set_cookie_headers,
    policy::SecurityPolicy, scheme,
};

/// Apply the full hardening pipeline to a response's headers.
///
/// Order: static headers and disclosure stripping, HSTS gating, cache policy,
/// then `Set-Cookie` normalization.
pub fn harden_response(policy: &SecurityPolicy, ctx: &RequestContext, headers: &mut HeaderMap) {
    policy.apply_static_headers(headers);

    let secure = scheme::is_secure(ctx);
    scheme::apply_hsts(policy, secure, headers);

    let class = PathClass::classify(policy, ctx.path());
    class.apply(headers);

    let rewritten = normalize_set_cookie_headers(headers);

    tracing::debug!(
        path = ctx.path(),
        secure,
        path_class = ?class,
        cookies_rewritten = rewritten,
        "hardened response headers"
    );
}

/// Middleware running [`harden_response`] on all responses.
///
/// Reads the shared [`SecurityPolicy`] from an `Extension`. Install it once,
/// as the outermost layer, so fallback and method-not-allowed responses are
/// covered too.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use axum::{middleware, Extension, Router};
/// use shieldwall_api::config::SecurityHeadersConfig;
/// use shieldwall_api::http::{security_headers_middleware, SecurityPolicy};
///
/// let policy = Arc::new(SecurityPolicy::from_config(&SecurityHeadersConfig::default())?);
///
/// let app = Router::new()
///     // ... routes ...
///     .layer(middleware::from_fn(security_headers_middleware))
///     .layer(Extension(policy));
/// ```
pub async fn security_headers_middleware(
    Extension(policy): Extension<Arc<SecurityPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_parts(request.uri(), request.headers());
    let mut response = next.run(request).await;
    harden_response(&policy, &ctx, response.headers_mut());
    response
}
