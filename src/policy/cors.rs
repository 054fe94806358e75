//! Cross-origin policy registrar.
//!
//! Turns the single `cors.origin_patterns` string into an immutable
//! [`CorsPolicy`]. Only the origin list comes from configuration; the
//! method list, header wildcard, credentials flag and preflight max age are
//! fixed.
//!
//! # Origin patterns
//! - `*` alone matches any origin
//! - `*` elsewhere matches any run of characters, e.g. `https://*.example.com`
//! - a trailing port list restricts ports: `http://localhost:[8080,8081]`,
//!   or `http://localhost:[*]` for any (or no) port
//!
//! Matching ignores ASCII case and a trailing `/` on the request origin.

use std::fmt;
use std::time::Duration;

use axum::http::Method;

use crate::config::CorsConfig;

/// Path pattern the rule is registered for.
pub const ALL_PATHS: &str = "/**";

/// Preflight cache lifetime.
pub const MAX_AGE: Duration = Duration::from_secs(3600);

/// Methods a cross-origin caller may use.
pub const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Split a comma-separated pattern string into trimmed patterns.
///
/// Commas inside a `[...]` port list do not separate patterns. Empty
/// segments are dropped, so `""` yields an empty list and `"a,,b"` yields
/// `["a", "b"]`.
pub fn parse_origin_patterns(raw: &str) -> Vec<String> {
    split_segments(raw)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split on commas outside brackets.
fn split_segments(raw: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&raw[start..]);
    segments
}

/// Port constraint attached to an origin pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PortPattern {
    /// No `[...]` suffix; the pattern text covers the port, if any.
    Unspecified,
    /// `[*]`: any port, or none.
    Any,
    /// `[8080,8081]`: one of the listed ports.
    List(Vec<String>),
}

/// One configured origin pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    raw: String,
    base: String,
    ports: PortPattern,
}

impl OriginPattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lowered = raw.to_ascii_lowercase();

        let (base, ports) = match split_port_list(&lowered) {
            Some((base, list)) if list.trim() == "*" => (base.to_string(), PortPattern::Any),
            Some((base, list)) => (
                base.to_string(),
                PortPattern::List(
                    list.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect(),
                ),
            ),
            None => (lowered.clone(), PortPattern::Unspecified),
        };

        Self { raw, base, ports }
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `origin` (an `Origin` header value) matches this pattern.
    pub fn matches(&self, origin: &str) -> bool {
        if self.base == "*" && self.ports == PortPattern::Unspecified {
            return true;
        }

        let origin = origin.trim_end_matches('/').to_ascii_lowercase();

        match &self.ports {
            PortPattern::Unspecified => wildcard_match(&self.base, &origin),
            PortPattern::Any => {
                let (host, _) = split_origin_port(&origin);
                wildcard_match(&self.base, host)
            }
            PortPattern::List(ports) => match split_origin_port(&origin) {
                (host, Some(port)) => {
                    wildcard_match(&self.base, host) && ports.iter().any(|p| p == port)
                }
                (_, None) => false,
            },
        }
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `http://host:[8080,8081]` → (`http://host`, `8080,8081`)
fn split_port_list(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_suffix(']')?;
    let open = rest.rfind(":[")?;
    Some((&rest[..open], &rest[open + 2..]))
}

/// `http://host:8080` → (`http://host`, Some(`8080`))
fn split_origin_port(origin: &str) -> (&str, Option<&str>) {
    let authority_start = origin.find("://").map(|i| i + 3).unwrap_or(0);
    match origin[authority_start..].rfind(':') {
        Some(i) => {
            let colon = authority_start + i;
            let port = &origin[colon + 1..];
            if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
                (&origin[..colon], Some(port))
            } else {
                (origin, None)
            }
        }
        None => (origin, None),
    }
}

/// Glob match where `*` matches any (possibly empty) run of bytes.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&b| b == b'*')
}

/// Which request headers a cross-origin caller may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedHeaders {
    Any,
    List(Vec<String>),
}

/// Immutable cross-origin rule consulted on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    path_pattern: String,
    origin_patterns: Vec<OriginPattern>,
    allowed_methods: Vec<Method>,
    allowed_headers: AllowedHeaders,
    allow_credentials: bool,
    max_age: Duration,
}

impl CorsPolicy {
    pub fn origin_patterns(&self) -> &[OriginPattern] {
        &self.origin_patterns
    }

    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    pub fn allowed_headers(&self) -> &AllowedHeaders {
        &self.allowed_headers
    }

    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }

    /// Whether the rule is registered for `path`.
    pub fn applies_to(&self, path: &str) -> bool {
        match self.path_pattern.strip_suffix("/**") {
            Some(prefix) => {
                prefix.is_empty()
                    || path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => self.path_pattern == path,
        }
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.origin_patterns.iter().any(|p| p.matches(origin))
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Whether every header in a comma-separated request list is allowed.
    pub fn allows_headers(&self, requested: &str) -> bool {
        match &self.allowed_headers {
            AllowedHeaders::Any => true,
            AllowedHeaders::List(allowed) => requested
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .all(|h| allowed.iter().any(|a| a.eq_ignore_ascii_case(h))),
        }
    }

    /// `Access-Control-Allow-Methods` value.
    pub fn allow_methods_value(&self) -> String {
        self.allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `Access-Control-Allow-Headers` value for a preflight.
    ///
    /// With the wildcard, the browser's requested headers are echoed back
    /// when present, since credentialed requests treat `*` literally.
    pub fn allow_headers_value(&self, requested: Option<&str>) -> String {
        match &self.allowed_headers {
            AllowedHeaders::Any => match requested.map(str::trim) {
                Some(list) if !list.is_empty() => list.to_string(),
                _ => "*".to_string(),
            },
            AllowedHeaders::List(headers) => headers.join(", "),
        }
    }
}

/// Build the cross-origin policy from configuration.
pub fn build_cors_policy(config: &CorsConfig) -> CorsPolicy {
    let raw = &config.origin_patterns;
    let parsed = parse_origin_patterns(raw);

    tracing::info!("=== CORS Configuration ===");
    tracing::info!(cors_origin_patterns = %raw, "Raw origin patterns");
    tracing::info!(parsed_origins = ?parsed, "Parsed origins");

    let segments = split_segments(raw).len();
    if parsed.len() < segments {
        tracing::warn!(
            dropped = segments - parsed.len(),
            "Empty origin pattern segments ignored"
        );
    }
    if parsed.is_empty() {
        tracing::warn!("No origin patterns configured; cross-origin requests will be rejected");
    }

    let policy = CorsPolicy {
        path_pattern: ALL_PATHS.to_string(),
        origin_patterns: parsed.into_iter().map(OriginPattern::new).collect(),
        allowed_methods: ALLOWED_METHODS.to_vec(),
        allowed_headers: AllowedHeaders::Any,
        allow_credentials: true,
        max_age: MAX_AGE,
    };

    tracing::info!(
        max_age_secs = policy.max_age.as_secs(),
        "CORS registered"
    );

    policy
}
