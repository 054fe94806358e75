//! Request policy service library.
//!
//! CORS and parameter-driven content negotiation for an axum front
//! controller, plus the small game catalogue that exercises both.

pub mod config;
pub mod games;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use policy::RequestPolicies;
