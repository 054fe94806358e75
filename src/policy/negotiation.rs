//! Content negotiation selector.
//!
//! The response representation is picked from the `mediaType` query
//! parameter. The `Accept` header is not consulted, and a missing or
//! unknown value falls back to JSON.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use axum::extract::Query;
use axum::http::Uri;

/// Query parameter that selects the representation.
pub const MEDIA_TYPE_PARAMETER: &str = "mediaType";

/// A response representation the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    Json,
    Xml,
    Yaml,
}

impl MediaType {
    /// MIME type written to `Content-Type`.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Xml => "application/xml",
            MediaType::Yaml => "application/yaml",
        }
    }

    /// Name used in the query parameter.
    pub fn short_name(&self) -> &'static str {
        match self {
            MediaType::Json => "json",
            MediaType::Xml => "xml",
            MediaType::Yaml => "yaml",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Immutable negotiation strategy consulted on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationPolicy {
    parameter_name: String,
    default: MediaType,
    mappings: BTreeMap<String, MediaType>,
}

impl NegotiationPolicy {
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn default_media_type(&self) -> MediaType {
        self.default
    }

    /// Registered short names in sorted order.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, MediaType)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Look up a short name; `None` if unregistered.
    pub fn lookup(&self, name: &str) -> Option<MediaType> {
        self.mappings.get(&name.to_ascii_lowercase()).copied()
    }

    /// Look up a short name, falling back to the default.
    pub fn lookup_or_default(&self, name: &str) -> MediaType {
        self.lookup(name).unwrap_or(self.default)
    }

    /// Pick the representation for one request.
    ///
    /// Only the query parameter is consulted; request headers play no part.
    pub fn resolve(&self, uri: &Uri) -> MediaType {
        match self.parameter_value(uri) {
            Some(value) => self.lookup(&value).unwrap_or_else(|| {
                tracing::debug!(value = %value, "Unrecognized media type parameter");
                self.default
            }),
            None => self.default,
        }
    }

    fn parameter_value(&self, uri: &Uri) -> Option<String> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
        params
            .get(&self.parameter_name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Build the negotiation strategy.
///
/// `mediaType` parameter, unknown names fall back to JSON.
pub fn build_content_negotiation_policy() -> NegotiationPolicy {
    let mappings: BTreeMap<String, MediaType> = [MediaType::Json, MediaType::Xml, MediaType::Yaml]
        .into_iter()
        .map(|m| (m.short_name().to_string(), m))
        .collect();

    let policy = NegotiationPolicy {
        parameter_name: MEDIA_TYPE_PARAMETER.to_string(),
        default: MediaType::Json,
        mappings,
    };

    tracing::info!(
        parameter = %policy.parameter_name,
        default = %policy.default,
        media_types = ?policy.mappings.keys().collect::<Vec<_>>(),
        "Content negotiation registered"
    );

    policy
}
