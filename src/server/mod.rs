//! # Print Relay Service
//!
//! A small HTTP service that runs next to a printer and accepts receipts
//! from clients that cannot reach the printer themselves (browser tablets,
//! phones without a usable Bluetooth stack).
//!
//! ## Usage
//!
//! ```bash
//! tillprint serve --listen 0.0.0.0:3001 --printer POS-80
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | POST | `/print` | [`api::PrintResponse`] (400 invalid receipt, 500 all primitives failed) |
//! | GET | `/printer/status` | [`api::PrinterStatus`] |
//! | GET | `/health` | [`api::HealthResponse`] |
//! | GET | `/printers` | [`api::PrintersResponse`] |
//!
//! Requests are independent: there is no queue, and each one runs the
//! [`spool::Spooler`] chain on its own.

pub mod api;
mod handlers;
pub mod spool;
mod state;

pub use state::{AppState, RelayConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::TillError;
use spool::Spooler;

/// Build the relay router with the default primitive chain.
pub fn router(config: RelayConfig) -> Router {
    let spooler = Spooler::for_printer(&config.printer, config.device.as_deref());
    router_with_spooler(config, spooler)
}

/// Build the relay router around a custom primitive chain.
pub fn router_with_spooler(config: RelayConfig, spooler: Spooler) -> Router {
    let app_state = Arc::new(AppState::new(config, spooler));

    Router::new()
        .route("/print", post(handlers::print::print))
        .route("/printer/status", get(handlers::status::printer_status))
        .route("/health", get(handlers::status::health))
        .route("/printers", get(handlers::status::printers))
        .with_state(app_state)
        // Tablets call the relay straight from the browser
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the relay and serve until the process is stopped.
///
/// ## Example
///
/// ```no_run
/// use tillprint::server::{serve, RelayConfig};
///
/// # async fn example() -> Result<(), tillprint::TillError> {
/// let config = RelayConfig {
///     listen_addr: "0.0.0.0:3001".to_string(),
///     printer: "POS-80".to_string(),
///     device: None,
///     simulate: true,
///     environment: "development".to_string(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: RelayConfig) -> Result<(), TillError> {
    let listen_addr = config.listen_addr.clone();
    info!(
        listen = %listen_addr,
        printer = %config.printer,
        simulate = config.simulate,
        environment = %config.environment,
        "print relay starting"
    );

    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| TillError::Config(format!("failed to bind to {}: {}", listen_addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| TillError::Relay(format!("server error: {}", e)))?;

    Ok(())
}
