//! SameSite normalization for `Set-Cookie` response headers.
//!
//! Each cookie is split on the literal `;` delimiter and scanned segment by
//! segment. There is no pattern matching with backtracking anywhere in here,
//! so the cost is linear in the header length whatever the input looks like.
//!
//! The name=value pair and every attribute other than `SameSite` are kept
//! verbatim (modulo surrounding whitespace) and in their original order.

use std::borrow::Cow;

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

pub const SAME_SITE_STRICT: &str = "SameSite=Strict";

const SAME_SITE: &str = "samesite";
const PATH_PREFIX: &str = "path=";

/// Force `SameSite=Strict` on a single `Set-Cookie` value.
///
/// - blank (only whitespace and `;`): returned unchanged, borrowed
/// - already `Strict` (first occurrence): returned unchanged, borrowed
/// - any other `SameSite` value: that segment becomes `SameSite=Strict`
/// - no `SameSite`: inserted before the first `HttpOnly`, `Secure` or
///   `Path=` attribute, else appended
///
/// Only the first `SameSite` attribute is considered. Malformed duplicates
/// after it are left in place.
#[must_use]
pub fn normalize_same_site(cookie: &str) -> Cow<'_, str> {
    // Nothing but whitespace and separators: no cookie to attach an attribute to
    if cookie.bytes().all(|b| b == b';' || b.is_ascii_whitespace()) {
        return Cow::Borrowed(cookie);
    }

    let segments: Vec<&str> = cookie.split(';').map(str::trim).collect();

    // Segment 0 is the name=value pair and is never an attribute
    let mut same_site = None;
    for (index, segment) in segments.iter().enumerate().skip(1) {
        if let Some(value) = same_site_value(segment) {
            if value.eq_ignore_ascii_case("strict") {
                return Cow::Borrowed(cookie);
            }
            same_site = Some(index);
            break;
        }
    }

    let insert_at = match same_site {
        Some(_) => None,
        None => segments
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, segment)| is_insertion_anchor(segment))
            .map(|(index, _)| index),
    };

    let mut rebuilt: Vec<&str> = Vec::with_capacity(segments.len() + 1);
    for (index, segment) in segments.iter().enumerate() {
        if Some(index) == insert_at {
            rebuilt.push(SAME_SITE_STRICT);
        }
        if Some(index) == same_site {
            rebuilt.push(SAME_SITE_STRICT);
        } else if index == 0 || !segment.is_empty() {
            rebuilt.push(*segment);
        }
    }
    if same_site.is_none() && insert_at.is_none() {
        rebuilt.push(SAME_SITE_STRICT);
    }

    Cow::Owned(rebuilt.join("; "))
}

/// Value of a `SameSite` attribute segment, or `None` if the segment is
/// something else. A bare `SameSite` yields an empty value.
fn same_site_value(segment: &str) -> Option<&str> {
    let (name, rest) = segment.split_at_checked(SAME_SITE.len())?;
    if !name.eq_ignore_ascii_case(SAME_SITE) {
        return None;
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('=').map(str::trim)
}

fn is_insertion_anchor(segment: &str) -> bool {
    segment.eq_ignore_ascii_case("httponly")
        || segment.eq_ignore_ascii_case("secure")
        || segment
            .split_at_checked(PATH_PREFIX.len())
            .is_some_and(|(name, _)| name.eq_ignore_ascii_case(PATH_PREFIX))
}

/// Rewrite every `Set-Cookie` header on a response in place.
///
/// Header order is preserved. Values that are not valid UTF-8 are passed
/// through untouched. Returns how many values were rewritten.
pub fn normalize_set_cookie_headers(headers: &mut HeaderMap) -> usize {
    if !headers.contains_key(SET_COOKIE) {
        return 0;
    }

    let mut rewritten = 0;
    let values: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| {
            let Ok(text) = std::str::from_utf8(value.as_bytes()) else {
                return value.clone();
            };
            match normalize_same_site(text) {
                Cow::Borrowed(_) => value.clone(),
                Cow::Owned(fixed) => match HeaderValue::from_bytes(fixed.as_bytes()) {
                    Ok(mut fixed) => {
                        fixed.set_sensitive(value.is_sensitive());
                        rewritten += 1;
                        fixed
                    }
                    Err(_) => value.clone(),
                },
            }
        })
        .collect();

    if rewritten > 0 {
        headers.remove(SET_COOKIE);
        for value in values {
            headers.append(SET_COOKIE, value);
        }
    }

    rewritten
}
