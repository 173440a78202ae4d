//! Request/response bodies of the relay HTTP API.
//!
//! Shared by the axum handlers and [`crate::channel::relay::RelayClient`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the relay touches hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    Actual,
    Simulation,
}

impl PrintMode {
    pub fn from_simulate(simulate: bool) -> Self {
        if simulate {
            PrintMode::Simulation
        } else {
            PrintMode::Actual
        }
    }
}

impl fmt::Display for PrintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintMode::Actual => write!(f, "actual"),
            PrintMode::Simulation => write!(f, "simulation"),
        }
    }
}

/// `POST /print` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PrintMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /printer/status` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub connected: bool,
    pub status: String,
    pub mode: PrintMode,
    pub message: String,
    pub environment: String,
    pub printer: String,
}

/// `GET /health` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// `GET /printers` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintersResponse {
    pub printers: Vec<String>,
}
