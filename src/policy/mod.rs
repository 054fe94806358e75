//! Request policy configurator.
//!
//! # Data Flow
//! ```text
//! AppConfig (validated)
//!     → cors.rs        build_cors_policy(&config.cors)       → CorsPolicy
//!     → negotiation.rs build_content_negotiation_policy()    → NegotiationPolicy
//!     → RequestPolicies (immutable, shared via Arc)
//!     → http::server wires both into the router
//! ```
//!
//! # Design Decisions
//! - Building is pure apart from startup logging; equal input gives equal policies
//! - Policies are never mutated after startup
//! - Enforcement lives in `http`, not here

pub mod cors;
pub mod negotiation;

pub use cors::{build_cors_policy, parse_origin_patterns, CorsPolicy, OriginPattern};
pub use negotiation::{build_content_negotiation_policy, MediaType, NegotiationPolicy};

use crate::config::AppConfig;

/// Both request policies, as handed to the dispatch layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicies {
    pub cors: CorsPolicy,
    pub negotiation: NegotiationPolicy,
}

impl RequestPolicies {
    /// Build every policy from configuration.
    pub fn configure(config: &AppConfig) -> Self {
        Self {
            cors: build_cors_policy(&config.cors),
            negotiation: build_content_negotiation_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_twice_is_identical() {
        let mut config = AppConfig::default();
        config.cors.origin_patterns = "https://a.com, https://b.com".into();

        let first = RequestPolicies::configure(&config);
        let second = RequestPolicies::configure(&config);

        assert_eq!(first, second);
        assert_eq!(first.cors.origin_patterns().len(), 2);
    }
}
