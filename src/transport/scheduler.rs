//! # Chunked Transmission
//!
//! BLE printers accept at most one small write per connection event and
//! have a tiny receive buffer. [`transmit`] splits an [`EncodedCommand`]
//! into `chunk_size` pieces and sleeps `inter_chunk_delay` between them.
//!
//! A receipt is either delivered whole or reported as failed: the first
//! chunk error aborts the transmission, and there is no partial success.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::connection::Connected;
use crate::encoder::EncodedCommand;
use crate::error::TillError;

/// Default bytes per write (BLE ATT MTU 23 minus 3 bytes of header)
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Default pause between writes
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(10);

/// How to slice and pace a transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPolicy {
    chunk_size: usize,
    inter_chunk_delay: Duration,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_DELAY)
    }
}

impl ChunkPolicy {
    /// A chunk size of 0 is treated as 1.
    pub fn new(chunk_size: usize, inter_chunk_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            inter_chunk_delay,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn inter_chunk_delay(&self) -> Duration {
        self.inter_chunk_delay
    }

    /// Number of writes needed for `len` bytes
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }
}

/// What a successful transmission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransmitReport {
    pub bytes: usize,
    pub chunks: usize,
}

/// Write `command` over `conn` in order, chunk by chunk.
///
/// ## Errors
///
/// [`TillError::TransportWrite`] naming the failed chunk. Chunks after it
/// are never written.
#[instrument(skip_all, fields(bytes = command.len(), chunk_size = policy.chunk_size()))]
pub async fn transmit(
    conn: &mut Connected<'_>,
    command: EncodedCommand,
    policy: &ChunkPolicy,
) -> Result<TransmitReport, TillError> {
    let bytes = command.into_bytes();
    let total = policy.chunk_count(bytes.len());

    for (index, chunk) in bytes.chunks(policy.chunk_size).enumerate() {
        conn.write_chunk(chunk).await.map_err(|e| {
            TillError::TransportWrite(format!("chunk {} of {} failed: {}", index + 1, total, e))
        })?;

        if index + 1 < total && !policy.inter_chunk_delay.is_zero() {
            tokio::time::sleep(policy.inter_chunk_delay).await;
        }
    }

    debug!(chunks = total, "transmission complete");
    Ok(TransmitReport {
        bytes: bytes.len(),
        chunks: total,
    })
}
