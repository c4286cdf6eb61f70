// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `session_token` cookie handling.

use axum::http::{header, HeaderMap};

/// Name of the cookie carrying the encrypted GitHub token.
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Session lifetime, matching the OAuth state TTL (one hour).
pub const SESSION_MAX_AGE_SECS: i64 = 3600;

/// Attributes of the session cookie.
///
/// Always `HttpOnly`, `SameSite=Lax`, `Path=/` and host-only (no `Domain`),
/// so it is scoped to this server. `Secure` is added in production.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: &'static str,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn new(secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE_NAME,
            secure,
            max_age_secs: SESSION_MAX_AGE_SECS,
        }
    }

    /// Build the `Set-Cookie` value for a packed encrypted token.
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, value);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax; Path=/");
        cookie.push_str(&format!("; Max-Age={}", self.max_age_secs));
        cookie
    }

    /// Build the `Set-Cookie` value that expires the session.
    pub fn build_clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; HttpOnly", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax; Path=/; Max-Age=0");
        cookie
    }
}

/// Extract a cookie value from request headers.
///
/// Looks at every `Cookie` header. A `%3A` inside the value is read as `:`
/// so tokens set by percent-encoding clients still parse.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            if key == name {
                Some(value.trim_matches('"').replace("%3A", ":").replace("%3a", ":"))
            } else {
                None
            }
        })
}
