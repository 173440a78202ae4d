//! # BlueZ Radio Backend
//!
//! [`Radio`] and [`Link`] on top of the Linux BlueZ tools. Discovery reads
//! the controller's known devices from `bluetoothctl`, the link is an
//! RFCOMM serial port bound with `rfcomm bind`, and the write endpoint is
//! the `/dev/rfcommN` TTY opened in raw mode.
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired once before discovery can see it:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on
//! # Look for "XP-58", "MTP-II", "POS-80", ...
//! [bluetooth]# pair 86:67:7A:XX:XX:XX
//! [bluetooth]# trust 86:67:7A:XX:XX:XX
//! ```
//!
//! `rfcomm bind` needs root (or `CAP_NET_ADMIN`). An existing binding for
//! the printer's address is reused.
//!
//! ## TTY Configuration
//!
//! The RFCOMM device is opened in raw mode so binary data is transmitted
//! without modification:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::connection::{DeviceFilter, DeviceInfo, Link, Radio};
use crate::error::TillError;

/// RFCOMM channel used by Serial Port Profile printers
const SPP_CHANNEL: u8 = 1;

/// Time for BlueZ to create the device node after `rfcomm bind`
const BIND_SETTLE: Duration = Duration::from_millis(500);

/// Radio backed by `bluetoothctl` and `rfcomm`.
#[derive(Debug, Clone, Default)]
pub struct BluezRadio {
    /// Local `/dev/rfcommN` index to bind when no binding exists yet
    rfcomm_index: u8,
}

impl BluezRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rfcomm_index(mut self, index: u8) -> Self {
        self.rfcomm_index = index;
        self
    }
}

#[async_trait]
impl Radio for BluezRadio {
    #[instrument(skip(self, filter))]
    async fn discover(&self, filter: &DeviceFilter) -> Result<DeviceInfo, TillError> {
        let listing = run("bluetoothctl", &["devices"])
            .await
            .map_err(|e| TillError::Discovery(format!("bluetoothctl devices: {}", e)))?;
        let devices = parse_devices(&listing);
        debug!(count = devices.len(), "known bluetooth devices");

        if let Some(device) = devices.iter().find(|d| filter.matches_name(&d.name)) {
            return Ok(device.clone());
        }

        // No name match: fall back to the advertised service list
        for device in &devices {
            let Ok(info) = run("bluetoothctl", &["info", &device.id]).await else {
                continue;
            };
            if filter.matches_service(&parse_service_uuids(&info)) {
                return Ok(device.clone());
            }
        }

        Err(TillError::Discovery(format!(
            "no paired printer matching {:?} or service {}",
            filter.name_prefixes, filter.service_id
        )))
    }

    #[instrument(skip(self), fields(device = %device.name))]
    async fn connect(&self, device: &DeviceInfo) -> Result<Box<dyn Link>, TillError> {
        if !is_valid_mac(&device.id) {
            return Err(TillError::Connect(format!("invalid address {}", device.id)));
        }
        let mac = device.id.to_uppercase();

        // May fail when already connected; the bind below is the real check
        match run("bluetoothctl", &["connect", &mac]).await {
            Ok(out) if out.contains("Connection successful") || out.contains("already connected") => {
                debug!("bluetoothctl connected");
            }
            Ok(out) => debug!(output = out.trim(), "bluetoothctl connect returned"),
            Err(e) => warn!(error = %e, "bluetoothctl connect failed"),
        }

        let device_path = match find_rfcomm_for_mac(&mac).await {
            Some(path) => path,
            None => bind_rfcomm(&mac, self.rfcomm_index).await?,
        };
        info!(path = %device_path.display(), "rfcomm device ready");

        Ok(Box::new(RfcommLink {
            mac,
            device_path,
            file: None,
        }))
    }
}

/// An RFCOMM serial link.
#[derive(Debug)]
pub struct RfcommLink {
    mac: String,
    device_path: PathBuf,
    file: Option<tokio::fs::File>,
}

#[async_trait]
impl Link for RfcommLink {
    /// SPP has no characteristics; the endpoint is the TTY itself.
    async fn resolve_write_endpoint(&mut self, characteristic: &str) -> Result<(), TillError> {
        debug!(characteristic, path = %self.device_path.display(), "opening rfcomm tty");
        let path = self.device_path.clone();
        let file = tokio::task::spawn_blocking(move || open_raw(&path))
            .await
            .map_err(|e| TillError::Connect(format!("open task failed: {}", e)))??;
        self.file = Some(tokio::fs::File::from_std(file));
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "write endpoint not open"))?;
        file.write_all(chunk).await?;
        file.flush().await
    }

    fn is_connected(&self) -> bool {
        self.file.is_some() && self.device_path.exists()
    }

    async fn disconnect(&mut self) {
        self.file = None;
        if let Err(e) = run("bluetoothctl", &["disconnect", &self.mac]).await {
            debug!(error = %e, "bluetoothctl disconnect failed");
        }
    }
}

/// Run a command and return its stdout.
async fn run(program: &str, args: &[&str]) -> io::Result<String> {
    let output = Command::new(program).args(args).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::other(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Open `path` for writing and switch it to raw mode.
fn open_raw(path: &Path) -> Result<std::fs::File, TillError> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| TillError::Connect(format!("failed to open {}: {}", path.display(), e)))?;
    configure_tty_raw(&file)?;
    Ok(file)
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY are cleared so 0x11 (XON) and 0x13 (XOFF) in the byte
/// stream are not eaten as flow control.
#[cfg(unix)]
fn configure_tty_raw(file: &std::fs::File) -> Result<(), TillError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TillError::Connect(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TillError::Connect(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &std::fs::File) -> Result<(), TillError> {
    Ok(())
}

// ============================================================================
// RFCOMM SETUP HELPERS
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse `bluetoothctl devices` output (`Device <MAC> <name>` per line).
pub fn parse_devices(listing: &str) -> Vec<DeviceInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (mac, name) = rest.split_once(' ').unwrap_or((rest, ""));
            if !is_valid_mac(mac) {
                return None;
            }
            Some(DeviceInfo {
                id: mac.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Extract service UUIDs from `bluetoothctl info` output.
///
/// Lines look like `\tUUID: Serial Port   (00001101-0000-1000-8000-00805f9b34fb)`.
pub fn parse_service_uuids(info: &str) -> Vec<String> {
    info.lines()
        .filter(|line| line.trim_start().starts_with("UUID:"))
        .filter_map(|line| {
            let start = line.rfind('(')?;
            let end = line.rfind(')')?;
            (start < end).then(|| line[start + 1..end].trim().to_string())
        })
        .collect()
}

/// Find the `rfcommN` name bound to `mac` in `/proc/net/rfcomm` or
/// `rfcomm -a` output (`rfcomm0: XX:XX:XX:XX:XX:XX channel 1 ...`).
pub fn rfcomm_name_for_mac(listing: &str, mac: &str) -> Option<String> {
    let mac_upper = mac.to_uppercase();
    listing
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .filter_map(|line| line.split(':').next())
        .map(|name| name.trim().to_string())
        .find(|name| name.starts_with("rfcomm"))
}

/// Find an existing RFCOMM device bound to the given MAC address.
async fn find_rfcomm_for_mac(mac: &str) -> Option<PathBuf> {
    let mut listings = Vec::new();
    if let Ok(contents) = tokio::fs::read_to_string("/proc/net/rfcomm").await {
        listings.push(contents);
    }
    if let Ok(out) = run("rfcomm", &["-a"]).await {
        listings.push(out);
    }

    listings
        .iter()
        .filter_map(|listing| rfcomm_name_for_mac(listing, mac))
        .map(|name| PathBuf::from(format!("/dev/{}", name)))
        .find(|path| path.exists())
}

/// `rfcomm bind <index> <MAC> 1`, then wait for `/dev/rfcomm<index>`.
async fn bind_rfcomm(mac: &str, index: u8) -> Result<PathBuf, TillError> {
    let device_path = PathBuf::from(format!("/dev/rfcomm{}", index));
    run(
        "rfcomm",
        &["bind", &index.to_string(), mac, &SPP_CHANNEL.to_string()],
    )
    .await
    .map_err(|e| TillError::Connect(format!("rfcomm bind failed: {}", e)))?;

    tokio::time::sleep(BIND_SETTLE).await;

    if !device_path.exists() {
        return Err(TillError::Connect(format!(
            "device {} was not created",
            device_path.display()
        )));
    }
    Ok(device_path)
}

// ============================================================================
// TESTS
// ============================================================================
