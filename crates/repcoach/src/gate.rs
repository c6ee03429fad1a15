//! Request gate: route classification and cookie-presence authorization.
//!
//! Everything here is pure. The axum wiring lives in
//! [`crate::handlers::session_gate`]; this module only decides.
//!
//! Rules are checked in order: public prefixes, exemptions, the API namespace.
//! Anything that matches none of them is a page route, left to the page guard.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

use crate::config::GateConfig;

// ============================================================================
// Types
// ============================================================================

/// How the gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without credentials (auth endpoints, webhooks).
    Public,
    /// API route configured to accept unauthenticated callers.
    Exempt,
    /// API route that requires a session cookie.
    ProtectedApi,
    /// Anything outside the API namespace.
    Page,
}

/// Outcome of [`RouteTable::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow(RouteClass),
    /// No session cookie on a protected API route (401).
    Reject,
}

#[derive(Debug, Clone)]
struct RouteRule {
    prefix: String,
    class: RouteClass,
}

/// Ordered `(prefix, class)` rules plus the session cookie name.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    session_cookie: String,
    login_path: String,
}

// ============================================================================
// RouteTable
// ============================================================================

impl RouteTable {
    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        let public = config
            .public_prefixes
            .iter()
            .map(|p| (p, RouteClass::Public));
        let exempt = config.exempt_paths.iter().map(|p| (p, RouteClass::Exempt));
        let api = std::iter::once((&config.api_prefix, RouteClass::ProtectedApi));

        let rules = public
            .chain(exempt)
            .chain(api)
            .map(|(prefix, class)| RouteRule {
                prefix: normalize_prefix(prefix),
                class,
            })
            .collect();

        Self {
            rules,
            session_cookie: config.session_cookie.clone(),
            login_path: config.login_path.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|rule| matches_prefix(path, &rule.prefix))
            .map_or(RouteClass::Page, |rule| rule.class)
    }

    /// Decide whether a request may reach its handler.
    ///
    /// Only presence of a non-empty session cookie is checked; validity is
    /// the session verifier's job.
    pub fn authorize(&self, path: &str, headers: &HeaderMap) -> GateDecision {
        match self.classify(path) {
            RouteClass::ProtectedApi if self.session_token(headers).is_none() => {
                GateDecision::Reject
            }
            class => GateDecision::Allow(class),
        }
    }

    /// Session token from the configured cookie, if present and non-empty.
    pub fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.session_cookie)
    }

    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Segment-aware prefix match: `/api/auth` matches `/api/auth` and
/// `/api/auth/session` but not `/api/authors`.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Value of the named cookie across all `Cookie` headers.
///
/// Empty values are treated as absent.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
