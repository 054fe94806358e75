//! Request policy service.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ CORS ─▶ negotiation ─▶ handler
//!                                                        │           │
//!                                              CorsPolicy│           │NegotiationPolicy
//!                                                        └─── RequestPolicies ◀── AppConfig
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_policy::config::load_config;
use request_policy::lifecycle::{wait_for_shutdown_signal, Shutdown};
use request_policy::observability::{logging, metrics};
use request_policy::HttpServer;

#[derive(Parser)]
#[command(name = "request-policy")]
#[command(about = "CORS and content negotiation front controller", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long, env = "REQUEST_POLICY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("request-policy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
