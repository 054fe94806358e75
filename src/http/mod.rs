//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → request.rs (assign / propagate x-request-id)
//!     → cors.rs (preflight answers, origin + method checks)
//!     → negotiate.rs (resolve MediaType into request extensions)
//!     → handler (games, health)
//!     → negotiate.rs Negotiated<T> (JSON / XML / YAML body)
//!     → Send to client
//! ```

pub mod cors;
pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;

pub use negotiate::Negotiated;
pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResult};
pub use server::{AppState, HttpServer};
