//! # Printer Connection Manager
//!
//! Owns the single wireless link to the receipt printer and the state
//! machine around it:
//!
//! ```text
//!                  connect()
//!  Disconnected ─────────────► Connecting ──ok──► Connected
//!       ▲                          │                 │  │
//!       │ disconnect()             │ fail/timeout    │  │ write failure
//!       │                          ▼                 │  ▼
//!       └──────────────────────  Faulted ◄───────────┘ Faulted
//!                                  │
//!                                  └── connect() ──► Connecting
//! ```
//!
//! All transitions and every print go through one async mutex, so at most
//! one connect or transmission is in flight per manager. The manager is a
//! cheap handle (`Clone`); clones share the same link.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tillprint::connection::{ConnectionConfig, ConnectionManager};
//! use tillprint::transport::bluetooth::BluezRadio;
//!
//! # async fn example() -> Result<(), tillprint::TillError> {
//! let manager = ConnectionManager::new(Arc::new(BluezRadio::new()), ConnectionConfig::default());
//! let device = manager.connect().await?;
//! println!("connected to {}", device.name);
//! # Ok(())
//! # }
//! ```

pub mod radio;

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::encoder::EncodedCommand;
use crate::error::TillError;
use crate::transport::scheduler::{ChunkPolicy, TransmitReport, transmit};

pub use radio::{
    DEFAULT_NAME_PREFIXES, DeviceFilter, DeviceInfo, Link, PRINTER_SERVICE_UUID, Radio,
    WRITE_CHARACTERISTIC_UUID,
};

/// Default bound for discovery + link setup + endpoint resolution
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Link lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Faulted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub filter: DeviceFilter,
    pub write_characteristic: String,
    pub connect_timeout: Duration,
    pub chunk_policy: ChunkPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            filter: DeviceFilter::default(),
            write_characteristic: WRITE_CHARACTERISTIC_UUID.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            chunk_policy: ChunkPolicy::default(),
        }
    }
}

/// Proof of a live link with a resolved write endpoint.
///
/// Only the manager can make one, so only the manager's lock holder can
/// write to the printer.
pub struct Connected<'a> {
    link: &'a mut dyn Link,
}

impl<'a> Connected<'a> {
    pub(crate) fn new(link: &'a mut dyn Link) -> Self {
        Self { link }
    }

    pub(crate) async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.link.write_chunk(chunk).await
    }
}

struct Inner {
    link: Option<Box<dyn Link>>,
    device: Option<DeviceInfo>,
}

impl Inner {
    async fn drop_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.disconnect().await;
        }
        self.device = None;
    }

    fn link_is_live(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.is_connected())
    }
}

/// Handle to the printer connection.
#[derive(Clone)]
pub struct ConnectionManager {
    radio: Arc<dyn Radio>,
    config: Arc<ConnectionConfig>,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    pub fn new(radio: Arc<dyn Radio>, config: ConnectionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            radio,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner {
                link: None,
                device: None,
            })),
            state: Arc::new(state),
        }
    }

    /// Current state. Never waits for an operation in flight.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// The connected device, if any.
    pub async fn device(&self) -> Option<DeviceInfo> {
        self.inner.lock().await.device.clone()
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "connection state changed");
        }
    }

    /// Discover and connect to a printer.
    ///
    /// A no-op returning the current device when already connected with a
    /// live link.
    ///
    /// ## Errors
    ///
    /// [`TillError::Discovery`] or [`TillError::Connect`]; the state is left
    /// at [`ConnectionState::Faulted`].
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<DeviceInfo, TillError> {
        let mut inner = self.inner.lock().await;
        self.connect_locked(&mut inner).await
    }

    async fn connect_locked(&self, inner: &mut Inner) -> Result<DeviceInfo, TillError> {
        if self.state() == ConnectionState::Connected && inner.link_is_live() {
            if let Some(device) = &inner.device {
                return Ok(device.clone());
            }
        }

        inner.drop_link().await;
        self.set_state(ConnectionState::Connecting);

        let attempt = async {
            let device = self.radio.discover(&self.config.filter).await?;
            debug!(device = %device.name, id = %device.id, "printer discovered");
            let mut link = self.radio.connect(&device).await?;
            if let Err(e) = link
                .resolve_write_endpoint(&self.config.write_characteristic)
                .await
            {
                link.disconnect().await;
                return Err(e);
            }
            Ok((device, link))
        };

        match timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok((device, link))) => {
                info!(device = %device.name, id = %device.id, "printer connected");
                inner.link = Some(link);
                inner.device = Some(device.clone());
                self.set_state(ConnectionState::Connected);
                Ok(device)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "printer connect failed");
                self.set_state(ConnectionState::Faulted);
                Err(e)
            }
            Err(_) => {
                let e = TillError::Connect(format!(
                    "timed out after {}ms",
                    self.config.connect_timeout.as_millis()
                ));
                warn!(error = %e, "printer connect failed");
                self.set_state(ConnectionState::Faulted);
                Err(e)
            }
        }
    }

    /// Tear the link down.
    ///
    /// Waits for a print in flight to finish. The next
    /// [`print`](Self::print) connects again.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        inner.drop_link().await;
        self.set_state(ConnectionState::Disconnected);
        info!("printer disconnected");
    }

    /// Reconcile the cached state with the live link.
    ///
    /// Returns whether the printer is connected. While a connect or print
    /// is in flight the cached state is reported as is.
    pub async fn check_connection(&self) -> bool {
        let Ok(mut inner) = self.inner.try_lock() else {
            return self.state() == ConnectionState::Connected;
        };

        let live = inner.link_is_live();
        match (self.state(), live) {
            (ConnectionState::Connected, true) => true,
            (ConnectionState::Connected, false) => {
                warn!("printer link dropped underneath us");
                inner.drop_link().await;
                self.set_state(ConnectionState::Disconnected);
                false
            }
            // A connect abandoned by its caller leaves Connecting behind
            (ConnectionState::Connecting, _) => {
                inner.drop_link().await;
                self.set_state(ConnectionState::Faulted);
                false
            }
            _ => false,
        }
    }

    /// Transmit `command` to the printer.
    ///
    /// Connects first whenever the state is not
    /// [`ConnectionState::Connected`]. Once the first chunk is written the
    /// transmission runs to completion or failure even if this future is
    /// dropped.
    ///
    /// ## Errors
    ///
    /// Connect errors as for [`connect`](Self::connect).
    /// [`TillError::TransportWrite`] on any chunk failure; the link is
    /// dropped and the state becomes [`ConnectionState::Faulted`].
    #[instrument(skip(self, command), fields(bytes = command.len()))]
    pub async fn print(&self, command: EncodedCommand) -> Result<TransmitReport, TillError> {
        let mut inner = self.inner.clone().lock_owned().await;

        let ready = self.state() == ConnectionState::Connected && inner.link_is_live();
        if !ready {
            self.connect_locked(&mut inner).await?;
        }

        let state = self.state.clone();
        let policy = self.config.chunk_policy.clone();
        let task = tokio::spawn(async move {
            let result = match inner.link.as_mut() {
                Some(link) => {
                    let mut conn = Connected::new(&mut **link);
                    transmit(&mut conn, command, &policy).await
                }
                None => Err(TillError::Connect("no link after connect".to_string())),
            };
            if let Err(e) = &result {
                warn!(error = %e, "transmission failed, dropping link");
                inner.drop_link().await;
                state.send_replace(ConnectionState::Faulted);
            }
            result
        });

        task.await
            .map_err(|e| TillError::TransportWrite(format!("transmit task aborted: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Shared {
        writes: StdMutex<Vec<Vec<u8>>>,
        up: AtomicBool,
        connects: AtomicUsize,
    }

    struct FakeRadio {
        shared: Arc<Shared>,
        name: &'static str,
        connect_delay: Duration,
        fail_write_at: Option<usize>,
    }

    impl FakeRadio {
        fn new(name: &'static str) -> Self {
            Self {
                shared: Arc::new(Shared::default()),
                name,
                connect_delay: Duration::ZERO,
                fail_write_at: None,
            }
        }
    }

    struct FakeLink {
        shared: Arc<Shared>,
        fail_write_at: Option<usize>,
        written: usize,
    }

    #[async_trait]
    impl Radio for FakeRadio {
        async fn discover(&self, filter: &DeviceFilter) -> Result<DeviceInfo, TillError> {
            if filter.matches_name(self.name) {
                Ok(DeviceInfo {
                    id: "00:11:22:33:44:55".into(),
                    name: self.name.into(),
                })
            } else {
                Err(TillError::Discovery("no printer in range".into()))
            }
        }

        async fn connect(&self, _device: &DeviceInfo) -> Result<Box<dyn Link>, TillError> {
            tokio::time::sleep(self.connect_delay).await;
            self.shared.connects.fetch_add(1, Ordering::SeqCst);
            self.shared.up.store(true, Ordering::SeqCst);
            Ok(Box::new(FakeLink {
                shared: self.shared.clone(),
                fail_write_at: self.fail_write_at,
                written: 0,
            }))
        }
    }

    #[async_trait]
    impl Link for FakeLink {
        async fn resolve_write_endpoint(&mut self, characteristic: &str) -> Result<(), TillError> {
            assert_eq!(characteristic, WRITE_CHARACTERISTIC_UUID);
            Ok(())
        }

        async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
            if Some(self.written) == self.fail_write_at {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link lost"));
            }
            self.written += 1;
            self.shared.writes.lock().unwrap().push(chunk.to_vec());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.shared.up.load(Ordering::SeqCst)
        }

        async fn disconnect(&mut self) {
            self.shared.up.store(false, Ordering::SeqCst);
        }
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            chunk_policy: ChunkPolicy::new(4, Duration::ZERO),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_transitions_to_connected() {
        let manager = ConnectionManager::new(Arc::new(FakeRadio::new("XP-58")), config());
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        let device = manager.connect().await.unwrap();
        assert_eq!(device.name, "XP-58");
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.device().await, Some(device));
        assert!(manager.check_connection().await);
    }

    #[tokio::test]
    async fn test_connect_when_connected_is_noop() {
        let radio = FakeRadio::new("XP-58");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(Arc::new(radio), config());
        manager.connect().await.unwrap();
        manager.connect().await.unwrap();
        assert_eq!(shared.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_faults() {
        let manager = ConnectionManager::new(Arc::new(FakeRadio::new("Headphones")), config());
        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, TillError::Discovery(_)));
        assert_eq!(manager.state(), ConnectionState::Faulted);
    }

    #[tokio::test]
    async fn test_connect_timeout_faults() {
        let mut radio = FakeRadio::new("MTP-II");
        radio.connect_delay = Duration::from_secs(5);
        let manager = ConnectionManager::new(
            Arc::new(radio),
            ConnectionConfig {
                connect_timeout: Duration::from_millis(20),
                ..config()
            },
        );
        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, TillError::Connect(ref m) if m.contains("timed out")));
        assert_eq!(manager.state(), ConnectionState::Faulted);
    }

    #[tokio::test]
    async fn test_print_connects_implicitly_and_chunks() {
        let radio = FakeRadio::new("POS-80");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(Arc::new(radio), config());

        let report = manager
            .print(EncodedCommand::from(b"0123456789".to_vec()))
            .await
            .unwrap();

        assert_eq!(report.chunks, 3);
        assert_eq!(report.bytes, 10);
        assert_eq!(manager.state(), ConnectionState::Connected);
        let writes = shared.writes.lock().unwrap().clone();
        assert_eq!(writes, vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]);
    }

    #[tokio::test]
    async fn test_write_failure_faults_and_drops_link() {
        let mut radio = FakeRadio::new("POS-80");
        radio.fail_write_at = Some(1);
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(Arc::new(radio), config());

        let err = manager
            .print(EncodedCommand::from(vec![0u8; 12]))
            .await
            .unwrap_err();

        assert!(matches!(err, TillError::TransportWrite(_)));
        assert_eq!(manager.state(), ConnectionState::Faulted);
        assert!(!shared.up.load(Ordering::SeqCst));
        assert_eq!(manager.device().await, None);
    }

    #[tokio::test]
    async fn test_print_after_disconnect_reconnects() {
        let radio = FakeRadio::new("POS-80");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(Arc::new(radio), config());
        manager.connect().await.unwrap();
        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!shared.up.load(Ordering::SeqCst));

        let report = manager
            .print(EncodedCommand::from(vec![1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(report.bytes, 3);
        assert_eq!(shared.connects.load(Ordering::SeqCst), 2);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(shared.writes.lock().unwrap().concat(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_abandoned_print_still_delivers_everything() {
        let radio = FakeRadio::new("POS-80");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(
            Arc::new(radio),
            ConnectionConfig {
                chunk_policy: ChunkPolicy::new(1, Duration::from_millis(5)),
                ..config()
            },
        );
        let data: Vec<u8> = (0..40).collect();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            manager.print(EncodedCommand::from(data.clone())),
        )
        .await;
        assert!(abandoned.is_err());

        // The lock is released only when the transmit task finishes
        manager.disconnect().await;
        assert_eq!(shared.writes.lock().unwrap().concat(), data);
    }

    #[tokio::test]
    async fn test_check_connection_notices_silent_drop() {
        let radio = FakeRadio::new("XP-58");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(Arc::new(radio), config());
        manager.connect().await.unwrap();

        shared.up.store(false, Ordering::SeqCst);
        assert!(!manager.check_connection().await);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_concurrent_prints_do_not_interleave() {
        let radio = FakeRadio::new("XP-58");
        let shared = radio.shared.clone();
        let manager = ConnectionManager::new(
            Arc::new(radio),
            ConnectionConfig {
                chunk_policy: ChunkPolicy::new(2, Duration::from_millis(1)),
                ..config()
            },
        );

        let a = manager.print(EncodedCommand::from(b"aaaaaa".to_vec()));
        let b = manager.print(EncodedCommand::from(b"bbbbbb".to_vec()));
        let (ra, rb) = tokio::join!(a, b);
        ra.unwrap();
        rb.unwrap();

        let writes = shared.writes.lock().unwrap().concat();
        assert!(writes == b"aaaaaabbbbbb".to_vec() || writes == b"bbbbbbaaaaaa".to_vec());
    }
}
