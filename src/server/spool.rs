//! # OS Print Primitives
//!
//! The relay's way of reaching the printer attached to its own host. Each
//! [`PrintPrimitive`] is one OS mechanism; the [`Spooler`] tries them in
//! order and stops at the first clean exit:
//!
//! | Primitive | Mechanism | Payload |
//! |-----------|-----------|---------|
//! | [`RawDeviceCopy`] | write to `/dev/usb/lp0` (or the configured device) | ESC/POS bytes |
//! | [`QueueSubmit`] | `lp -d <printer> -o raw` | ESC/POS bytes |
//! | [`FormattedPrint`] | `lpr -P <printer>` | plain text |
//!
//! The device file is opened non-blocking, so a printer busy with another
//! request fails that primitive instead of queueing behind it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::encoder::EncodedCommand;
use crate::error::TillError;

/// Raw USB printer node used when no device is configured
pub const DEFAULT_DEVICE: &str = "/dev/usb/lp0";

/// One print request as the primitives see it.
#[derive(Debug)]
pub struct SpoolJob {
    pub title: String,
    pub command: EncodedCommand,
    pub text: String,
}

/// One OS-level way to print.
#[async_trait]
pub trait PrintPrimitive: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(&self, job: &SpoolJob) -> Result<(), TillError>;
}

/// Copy the command bytes straight into a device file.
#[derive(Debug, Clone)]
pub struct RawDeviceCopy {
    path: PathBuf,
}

impl RawDeviceCopy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PrintPrimitive for RawDeviceCopy {
    fn name(&self) -> &'static str {
        "raw-device"
    }

    async fn submit(&self, job: &SpoolJob) -> Result<(), TillError> {
        let path = self.path.clone();
        let bytes = job.command.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_device(&path, &bytes))
            .await
            .map_err(|e| TillError::Spool(format!("device write task failed: {}", e)))?
    }
}

fn write_device(path: &Path, bytes: &[u8]) -> Result<(), TillError> {
    let mut file = open_device(path)
        .map_err(|e| TillError::Spool(format!("cannot open {}: {}", path.display(), e)))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| TillError::Spool(format!("write to {} failed: {}", path.display(), e)))
}

/// Open a device for writing without hanging on an absent printer.
///
/// `O_NONBLOCK` only guards the open; it is cleared again so `write_all`
/// never sees `EAGAIN` on a busy port.
fn open_device(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK);
    }
    let file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd belongs to `file`, which is open for the whole block.
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) < 0 {
                return Err(std::io::Error::last_os_error());
            }
        }
    }
    Ok(file)
}

/// Submit the command bytes to a CUPS queue as a raw job.
#[derive(Debug, Clone)]
pub struct QueueSubmit {
    printer: String,
}

impl QueueSubmit {
    pub fn new(printer: impl Into<String>) -> Self {
        Self {
            printer: printer.into(),
        }
    }
}

#[async_trait]
impl PrintPrimitive for QueueSubmit {
    fn name(&self) -> &'static str {
        "queue-submit"
    }

    async fn submit(&self, job: &SpoolJob) -> Result<(), TillError> {
        pipe_to(
            "lp",
            &["-d", &self.printer, "-o", "raw", "-t", &job.title],
            job.command.as_bytes(),
        )
        .await
    }
}

/// Print the plain-text rendering through `lpr`.
#[derive(Debug, Clone)]
pub struct FormattedPrint {
    printer: String,
}

impl FormattedPrint {
    pub fn new(printer: impl Into<String>) -> Self {
        Self {
            printer: printer.into(),
        }
    }
}

#[async_trait]
impl PrintPrimitive for FormattedPrint {
    fn name(&self) -> &'static str {
        "formatted-print"
    }

    async fn submit(&self, job: &SpoolJob) -> Result<(), TillError> {
        pipe_to(
            "lpr",
            &["-P", &self.printer, "-T", &job.title],
            job.text.as_bytes(),
        )
        .await
    }
}

/// Run `program` with `input` on stdin; a non-zero exit is an error.
async fn pipe_to(program: &str, args: &[&str], input: &[u8]) -> Result<(), TillError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TillError::Spool(format!("failed to run {}: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input)
            .await
            .map_err(|e| TillError::Spool(format!("{} stdin: {}", program, e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| TillError::Spool(format!("{} did not finish: {}", program, e)))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(TillError::Spool(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Ordered primitive chain.
pub struct Spooler {
    primitives: Vec<Box<dyn PrintPrimitive>>,
}

impl Spooler {
    pub fn new(primitives: Vec<Box<dyn PrintPrimitive>>) -> Self {
        Self { primitives }
    }

    /// Raw device copy, then raw queue submission, then formatted print.
    pub fn for_printer(printer: &str, device: Option<&Path>) -> Self {
        let device = device
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE));
        Self::new(vec![
            Box::new(RawDeviceCopy::new(device)),
            Box::new(QueueSubmit::new(printer)),
            Box::new(FormattedPrint::new(printer)),
        ])
    }

    pub fn primitive_names(&self) -> Vec<&'static str> {
        self.primitives.iter().map(|p| p.name()).collect()
    }

    /// Try each primitive in order. Returns the name of the one that worked.
    ///
    /// ## Errors
    ///
    /// [`TillError::Spool`] with every primitive's error message.
    pub async fn print(&self, job: &SpoolJob) -> Result<&'static str, TillError> {
        let mut errors = Vec::new();
        for primitive in &self.primitives {
            match primitive.submit(job).await {
                Ok(()) => {
                    info!(primitive = primitive.name(), "receipt spooled");
                    return Ok(primitive.name());
                }
                Err(e) => {
                    warn!(primitive = primitive.name(), error = %e, "print primitive failed");
                    errors.push(format!("{}: {}", primitive.name(), e));
                }
            }
        }
        Err(TillError::Spool(if errors.is_empty() {
            "no print primitive configured".to_string()
        } else {
            errors.join("; ")
        }))
    }
}

/// Printers this host can see: CUPS destinations and raw USB nodes.
pub async fn list_printers() -> Vec<String> {
    let mut printers = Vec::new();

    match Command::new("lpstat").arg("-e").output().await {
        Ok(output) if output.status.success() => {
            printers.extend(parse_lpstat(&String::from_utf8_lossy(&output.stdout)));
        }
        Ok(output) => debug!(status = %output.status, "lpstat -e failed"),
        Err(e) => debug!(error = %e, "lpstat not available"),
    }

    if let Ok(mut entries) = tokio::fs::read_dir("/dev/usb").await {
        let mut devices = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("lp") {
                devices.push(format!("/dev/usb/{}", name));
            }
        }
        devices.sort();
        printers.extend(devices);
    }

    printers
}

/// Whether the configured printer looks reachable: the device node exists
/// or CUPS knows the queue.
pub async fn printer_available(printer: &str, device: Option<&Path>) -> bool {
    let device = device.unwrap_or(Path::new(DEFAULT_DEVICE));
    if tokio::fs::metadata(device).await.is_ok() {
        return true;
    }
    Command::new("lpstat")
        .args(["-p", printer])
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn parse_lpstat(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
