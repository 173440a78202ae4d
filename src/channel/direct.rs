//! Direct wireless channel: connect, encode, transmit.

use async_trait::async_trait;

use super::{Channel, ChannelKind, simulate};
use crate::connection::ConnectionManager;
use crate::encoder::Encoder;
use crate::error::TillError;
use crate::receipt::Receipt;

pub struct DirectChannel {
    manager: ConnectionManager,
    encoder: Encoder,
    simulate: bool,
}

impl DirectChannel {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            encoder: Encoder::default(),
            simulate: false,
        }
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn simulated(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }
}

#[async_trait]
impl Channel for DirectChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::DirectWireless
    }

    async fn print(&self, receipt: &Receipt) -> Result<String, TillError> {
        if self.simulate {
            return Ok(simulate(self.kind(), receipt));
        }

        let command = self.encoder.encode(receipt);
        let report = self.manager.print(command).await?;
        let device = self
            .manager
            .device()
            .await
            .map(|d| d.name)
            .unwrap_or_else(|| "printer".to_string());

        Ok(format!(
            "Sent {} bytes in {} chunks to {}",
            report.bytes, report.chunks, device
        ))
    }
}
