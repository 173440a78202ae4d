//! Relay channel: POST the receipt to a print relay over HTTP.
//!
//! The client holds an ordered list of relay base URLs. One channel attempt
//! tries each URL at most once and stops at the first relay that answers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{Channel, ChannelKind, simulate};
use crate::error::TillError;
use crate::receipt::Receipt;
use crate::server::api::{HealthResponse, PrintResponse, PrinterStatus, PrintersResponse};

/// HTTP client for the relay API.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base_urls: Vec<String>,
}

impl RelayClient {
    /// Client for one relay. `timeout` bounds each request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TillError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TillError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_urls: vec![normalize(base_url)],
        })
    }

    /// Relays to try, in order, after the primary one.
    pub fn with_fallback_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            let url = normalize(url.as_ref());
            if !url.is_empty() && !self.base_urls.contains(&url) {
                self.base_urls.push(url);
            }
        }
        self
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// `POST /print`.
    ///
    /// A 400 answer is returned as a normal [`PrintResponse`] with
    /// `success: false`; other relays are not asked since they would reject
    /// the same receipt.
    #[instrument(skip_all, fields(order_id = %receipt.order_id()))]
    pub async fn print(&self, receipt: &Receipt) -> Result<PrintResponse, TillError> {
        self.send(|http, base| http.post(format!("{}/print", base)).json(receipt))
            .await
    }

    /// `GET /printer/status`
    pub async fn status(&self) -> Result<PrinterStatus, TillError> {
        self.send(|http, base| http.get(format!("{}/printer/status", base)))
            .await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, TillError> {
        self.send(|http, base| http.get(format!("{}/health", base)))
            .await
    }

    /// `GET /printers`
    pub async fn printers(&self) -> Result<PrintersResponse, TillError> {
        self.send(|http, base| http.get(format!("{}/printers", base)))
            .await
    }

    async fn send<T, F>(&self, build: F) -> Result<T, TillError>
    where
        T: DeserializeOwned,
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let mut errors = Vec::new();

        for base in &self.base_urls {
            let response = match build(&self.http, base).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(relay = %base, error = %e, "relay unreachable");
                    errors.push(format!("{}: {}", base, e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status == StatusCode::NOT_FOUND {
                let body = response.text().await.unwrap_or_default();
                let reason = error_message(&body).unwrap_or(body);
                warn!(relay = %base, %status, %reason, "relay refused request");
                errors.push(format!("{}: HTTP {}: {}", base, status.as_u16(), reason));
                continue;
            }

            debug!(relay = %base, %status, "relay answered");
            return response.json::<T>().await.map_err(|e| {
                TillError::Relay(format!("{}: unreadable response (HTTP {}): {}", base, status, e))
            });
        }

        Err(TillError::Relay(if errors.is_empty() {
            "no relay configured".to_string()
        } else {
            errors.join("; ")
        }))
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// `message` (and `error`) fields of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?;
    match value.get("error").and_then(|e| e.as_str()) {
        Some(detail) => Some(format!("{}: {}", message, detail)),
        None => Some(message.to_string()),
    }
}

pub struct RelayChannel {
    client: RelayClient,
    simulate: bool,
}

impl RelayChannel {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            simulate: false,
        }
    }

    pub fn simulated(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }
}

#[async_trait]
impl Channel for RelayChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::RelayService
    }

    async fn print(&self, receipt: &Receipt) -> Result<String, TillError> {
        if self.simulate {
            return Ok(simulate(self.kind(), receipt));
        }

        let response = self.client.print(receipt).await?;
        if response.success {
            Ok(response.message)
        } else {
            let detail = response
                .error
                .map(|e| format!("{}: {}", response.message, e))
                .unwrap_or(response.message);
            Err(TillError::Relay(detail))
        }
    }
}
