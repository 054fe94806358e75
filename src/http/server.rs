//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build request policies from configuration
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, negotiation, limits, timeout, tracing, request ID)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::games::{self, GameStore};
use crate::http::cors::cors_middleware;
use crate::http::negotiate::{negotiation_middleware, Negotiated};
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::http::response::ApiError;
use crate::policy::{MediaType, RequestPolicies};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameStore>,
}

/// HTTP server carrying the request policies.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    policies: Arc<RequestPolicies>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self::with_store(config, Arc::new(GameStore::new()))
    }

    /// Create a server backed by an existing game store.
    pub fn with_store(config: AppConfig, games: Arc<GameStore>) -> Self {
        let policies = Arc::new(RequestPolicies::configure(&config));
        let state = AppState { games };
        let router = Self::build_router(&config, &policies, state);

        Self {
            router,
            config,
            policies,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, policies: &RequestPolicies, state: AppState) -> Router {
        let cors = Arc::new(policies.cors.clone());
        let negotiation = Arc::new(policies.negotiation.clone());

        Router::new()
            .route("/health", get(health))
            .merge(games::routes())
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(negotiation, negotiation_middleware))
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin_patterns = self.policies.cors.origin_patterns().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policies(&self) -> &RequestPolicies {
        &self.policies
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

async fn health(media_type: MediaType) -> Negotiated<SystemStatus> {
    Negotiated::new(
        media_type,
        SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
        },
    )
    .root("status")
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no route for this path".into())
}
