//! System print channel.
//!
//! Renders the receipt as plain text and hands it to the platform's
//! document printer. No ESC/POS bytes are involved, so this works with any
//! queue the OS knows about, thermal or not.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{Channel, ChannelKind, simulate};
use crate::encoder::Encoder;
use crate::error::TillError;
use crate::receipt::Receipt;

/// Something that prints a text document.
#[async_trait]
pub trait DocumentPrinter: Send + Sync {
    async fn print_document(&self, title: &str, text: &str) -> Result<(), TillError>;
}

/// CUPS `lp`, document on stdin.
#[derive(Debug, Clone, Default)]
pub struct LpDocumentPrinter {
    /// Queue name; `None` uses the system default destination
    pub destination: Option<String>,
}

impl LpDocumentPrinter {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.into()),
        }
    }
}

#[async_trait]
impl DocumentPrinter for LpDocumentPrinter {
    #[instrument(skip(self, text), fields(destination = ?self.destination))]
    async fn print_document(&self, title: &str, text: &str) -> Result<(), TillError> {
        let mut cmd = Command::new("lp");
        cmd.arg("-t").arg(title);
        if let Some(dest) = &self.destination {
            cmd.arg("-d").arg(dest);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TillError::Spool(format!("failed to run lp: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| TillError::Spool(format!("failed to send document to lp: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TillError::Spool(format!("lp did not finish: {}", e)))?;
        if !output.status.success() {
            return Err(TillError::Spool(format!(
                "lp exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(output = %String::from_utf8_lossy(&output.stdout).trim(), "lp accepted job");
        Ok(())
    }
}

pub struct DialogChannel {
    printer: Arc<dyn DocumentPrinter>,
    encoder: Encoder,
    simulate: bool,
}

impl DialogChannel {
    pub fn new(printer: Arc<dyn DocumentPrinter>) -> Self {
        Self {
            printer,
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
impl Channel for DialogChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::NativeDialog
    }

    async fn print(&self, receipt: &Receipt) -> Result<String, TillError> {
        if self.simulate {
            return Ok(simulate(self.kind(), receipt));
        }

        let text = self.encoder.render_text(receipt);
        let title = format!("Receipt {}", receipt.order_id());
        self.printer.print_document(&title, &text).await?;
        Ok(format!("Sent '{}' to the system printer", title))
    }
}
