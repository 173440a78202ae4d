//! `POST /print`

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::receipt::Receipt;
use crate::server::api::{PrintMode, PrintResponse};
use crate::server::spool::SpoolJob;

use super::super::state::AppState;

/// Handle POST /print - validate the receipt and run the primitive chain.
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// every malformed receipt gets the same 400 shape, whatever the
/// content type header says.
pub async fn print(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let receipt: Receipt = match serde_json::from_slice(&body) {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(error = %e, "rejected print request");
            return respond(
                StatusCode::BAD_REQUEST,
                PrintResponse {
                    success: false,
                    message: "Invalid receipt".to_string(),
                    mode: None,
                    order_id: None,
                    error: Some(e.to_string()),
                },
            );
        }
    };

    let order_id = receipt.order_id().to_string();
    let mode = PrintMode::from_simulate(state.config.simulate);
    info!(%order_id, ?mode, "print request received");

    if state.config.simulate {
        info!(
            %order_id,
            "simulation mode, receipt not sent to hardware:\n{}",
            state.encoder.render_text(&receipt)
        );
        return respond(
            StatusCode::OK,
            PrintResponse {
                success: true,
                message: "Receipt printed successfully".to_string(),
                mode: Some(mode),
                order_id: Some(order_id),
                error: None,
            },
        );
    }

    let job = SpoolJob {
        title: format!("Receipt {}", order_id),
        command: state.encoder.encode(&receipt),
        text: state.encoder.render_text(&receipt),
    };

    match state.spooler.print(&job).await {
        Ok(primitive) => respond(
            StatusCode::OK,
            PrintResponse {
                success: true,
                message: format!("Receipt printed successfully via {}", primitive),
                mode: Some(mode),
                order_id: Some(order_id),
                error: None,
            },
        ),
        Err(e) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            PrintResponse {
                success: false,
                message: "Print failed".to_string(),
                mode: Some(mode),
                order_id: Some(order_id),
                error: Some(e.to_string()),
            },
        ),
    }
}

fn respond(status: StatusCode, body: PrintResponse) -> Response {
    (status, Json(body)).into_response()
}
