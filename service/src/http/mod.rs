//! HTTP utilities and middleware.
//!
//! This module holds the response hardening pipeline applied to every
//! response the server produces: static security headers, HSTS gating,
//! cache classification and `Set-Cookie` SameSite normalization.

pub mod cache;
pub mod context;
pub mod cookie;
pub mod policy;
pub mod scheme;
pub mod security;

pub use cache::PathClass;
pub use context::RequestContext;
pub use cookie::{normalize_same_site, normalize_set_cookie_headers};
pub use policy::{PolicyError, SecurityPolicy};
pub use security::{harden_response, security_headers_middleware};
