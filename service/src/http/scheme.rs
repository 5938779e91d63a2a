//! Secure-transport detection for HSTS gating.
//!
//! A request counts as secure when its own URI scheme is `https`, or when one
//! of a small fixed set of forwarding headers says a trusted proxy terminated
//! TLS in front of us. The set is deliberately closed: any header on the list
//! can be spoofed by a client, so deployments behind an untrusted edge must
//! strip these headers there.

use axum::http::{header::STRICT_TRANSPORT_SECURITY, HeaderMap, HeaderName};

use super::{context::RequestContext, policy::SecurityPolicy};

/// How a forwarding header signals a secure client-facing hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingSignal {
    /// Value names the scheme (`https`).
    Scheme,
    /// Value is a flag (`on` or `true`).
    Flag,
}

#[derive(Debug, Clone)]
pub struct ForwardingHeader {
    pub name: HeaderName,
    pub signal: ForwardingSignal,
}

pub static TRUSTED_FORWARDING_HEADERS: [ForwardingHeader; 4] = [
    ForwardingHeader {
        name: HeaderName::from_static("x-forwarded-proto"),
        signal: ForwardingSignal::Scheme,
    },
    ForwardingHeader {
        name: HeaderName::from_static("x-forwarded-scheme"),
        signal: ForwardingSignal::Scheme,
    },
    ForwardingHeader {
        name: HeaderName::from_static("x-forwarded-ssl"),
        signal: ForwardingSignal::Flag,
    },
    ForwardingHeader {
        name: HeaderName::from_static("front-end-https"),
        signal: ForwardingSignal::Flag,
    },
];

impl ForwardingSignal {
    fn is_secure(self, value: &str) -> bool {
        match self {
            // Chained proxies append hops; the first entry is the client-facing one
            Self::Scheme => value
                .split(',')
                .next()
                .is_some_and(|first| first.trim().eq_ignore_ascii_case("https")),
            Self::Flag => {
                let value = value.trim();
                value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true")
            }
        }
    }
}

/// Whether the logical request was served over a secure transport.
#[must_use]
pub fn is_secure(ctx: &RequestContext) -> bool {
    if ctx
        .scheme()
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https"))
    {
        return true;
    }

    TRUSTED_FORWARDING_HEADERS.iter().any(|trusted| {
        ctx.header(trusted.name.as_str())
            .is_some_and(|value| trusted.signal.is_secure(value))
    })
}

/// Set `Strict-Transport-Security` for secure requests.
///
/// On insecure requests the header is removed rather than emitted with a zero
/// max-age, so an upstream value cannot leak over plain HTTP either.
pub fn apply_hsts(policy: &SecurityPolicy, secure: bool, headers: &mut HeaderMap) {
    if secure {
        headers.insert(STRICT_TRANSPORT_SECURITY, policy.hsts_value().clone());
    } else {
        headers.remove(STRICT_TRANSPORT_SECURITY);
    }
}
