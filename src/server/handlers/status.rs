//! Status, health and discovery endpoints.

use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

use crate::server::api::{HealthResponse, PrintMode, PrinterStatus, PrintersResponse};
use crate::server::spool;

use super::super::state::AppState;

/// Handle GET /printer/status
pub async fn printer_status(State(state): State<Arc<AppState>>) -> Json<PrinterStatus> {
    let config = &state.config;
    let mode = PrintMode::from_simulate(config.simulate);

    let (connected, status, message) = if config.simulate {
        (
            false,
            "simulation",
            "Running in simulation mode".to_string(),
        )
    } else if spool::printer_available(&config.printer, config.device.as_deref()).await {
        (true, "connected", "Printer connected and ready".to_string())
    } else {
        (
            false,
            "disconnected",
            format!("Printer {} not found", config.printer),
        )
    };

    Json(PrinterStatus {
        connected,
        status: status.to_string(),
        mode,
        message,
        environment: config.environment.clone(),
        printer: config.printer.clone(),
    })
}

/// Handle GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Handle GET /printers
pub async fn printers() -> Json<PrintersResponse> {
    Json(PrintersResponse {
        printers: spool::list_printers().await,
    })
}
