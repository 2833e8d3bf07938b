//! Interrupt report reader (the read/resubmit loop)
//!
//! Each logical device owns one [`ReportReader`]. A reader runs a dedicated
//! thread that keeps exactly one blocking read outstanding against its own
//! device handle, hands every complete report to a [`ReportHandler`], and
//! issues the next read. The loop ends when the reader is cancelled or when
//! the transport fails terminally; in the latter case a single
//! [`DeviceGone`] is sent to the lifecycle owner.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use hidapi::HidDevice;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::TransportError;
use crate::types::{DeviceGone, GoneReason, ReaderState};

/// Something a report can be read from
pub trait ReportSource: Send {
    /// Block for at most `timeout_ms` waiting for one input report.
    ///
    /// Returns `Ok(0)` when the timeout elapsed without data.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError>;
}

impl ReportSource for HidDevice {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError> {
        Ok(self.read_timeout(buf, timeout_ms)?)
    }
}

/// Consumer of complete reports, called synchronously on the reader thread
pub trait ReportHandler: Send + Sync {
    /// Decode and publish one report. Must not block.
    fn handle_report(&self, report: &[u8]);
}

/// Configuration for a reader loop
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Name used for the thread and in logs
    pub name: String,
    /// Fixed report length; shorter transfers are not decoded
    pub report_len: usize,
    /// Read timeout in milliseconds (how often the cancel flag is checked when idle); must be positive
    pub read_timeout_ms: i32,
    /// Sleep duration after a transient error before resubmitting
    pub error_sleep_ms: u64,
    /// Consecutive transient errors after which the device is treated as gone
    pub max_consecutive_errors: u32,
}

impl ReaderConfig {
    pub fn new(name: impl Into<String>, report_len: usize) -> Self {
        Self {
            name: name.into(),
            report_len,
            read_timeout_ms: 50,
            error_sleep_ms: 100,
            max_consecutive_errors: 50,
        }
    }
}

/// Handle to a running reader loop
pub struct ReportReader {
    name: String,
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReportReader {
    /// Spawn the reader thread and issue the first read.
    ///
    /// # Arguments
    /// * `source` - Device handle owned exclusively by this reader
    /// * `handler` - Decoder invoked for every complete report
    /// * `config` - Loop configuration
    /// * `device_path` - Reported back in [`DeviceGone`]
    /// * `gone_tx` - Channel to the lifecycle owner
    pub fn start(
        source: Box<dyn ReportSource>,
        handler: Arc<dyn ReportHandler>,
        config: ReaderConfig,
        device_path: String,
        gone_tx: mpsc::UnboundedSender<DeviceGone>,
    ) -> Result<Self, TransportError> {
        // 0 polls without blocking and negative blocks forever; neither lets cancel work
        if config.read_timeout_ms <= 0 {
            return Err(TransportError::Internal(format!(
                "{} reader: read timeout must be positive, got {}",
                config.name, config.read_timeout_ms
            )));
        }

        let state = Arc::new(AtomicU8::new(ReaderState::Idle.as_u8()));
        let cancel = Arc::new(AtomicBool::new(false));
        let name = config.name.clone();

        let ctx = LoopContext {
            state: state.clone(),
            cancel: cancel.clone(),
            device_path,
            gone_tx,
        };

        let thread = std::thread::Builder::new()
            .name(format!("{}-reader", config.name))
            .spawn(move || run_reader_loop(source, handler, config, ctx))
            .map_err(|e| TransportError::Internal(format!("failed to spawn reader thread: {e}")))?;

        Ok(Self {
            name,
            state,
            cancel,
            thread: Some(thread),
        })
    }

    /// Current loop state
    pub fn state(&self) -> ReaderState {
        ReaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Reader name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the loop is still issuing reads
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the outstanding read and wait for the loop to exit.
    ///
    /// Once this returns the handler will not be called again by this reader.
    /// Cancellation is owner-initiated, so no [`DeviceGone`] is sent.
    pub fn cancel(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("{} reader thread panicked", self.name);
            }
            debug!("{} reader cancelled", self.name);
        }
    }
}

impl Drop for ReportReader {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct LoopContext {
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
    device_path: String,
    gone_tx: mpsc::UnboundedSender<DeviceGone>,
}

impl LoopContext {
    fn set_state(&self, state: ReaderState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Reader loop body
///
/// Exactly one read is in flight at a time; after every completion the next
/// read is issued unless the loop is shutting down.
fn run_reader_loop(
    mut source: Box<dyn ReportSource>,
    handler: Arc<dyn ReportHandler>,
    config: ReaderConfig,
    ctx: LoopContext,
) {
    debug!("{} reader thread started", config.name);
    let mut buf = vec![0u8; config.report_len];
    let mut consecutive_errors: u32 = 0;

    let gone = loop {
        if ctx.cancelled() {
            break None;
        }

        ctx.set_state(ReaderState::Submitted);
        let result = source.read_report(&mut buf, config.read_timeout_ms);

        // A completion racing with cancel is dropped, never decoded
        if ctx.cancelled() {
            break None;
        }

        let failure = match result {
            Ok(0) => continue,
            Ok(len) if len < config.report_len => TransportError::ShortReport {
                expected: config.report_len,
                actual: len,
            },
            Ok(len) => {
                ctx.set_state(ReaderState::Completed);
                consecutive_errors = 0;
                handler.handle_report(&buf[..len]);
                continue;
            }
            Err(e) => e,
        };

        if failure.is_terminal() {
            error!(
                "{} - report reader shutting down with status: {}",
                config.name, failure
            );
            break Some(match failure {
                TransportError::Disconnected => GoneReason::Disconnected,
                other => GoneReason::Other(other.to_string()),
            });
        }

        ctx.set_state(ReaderState::Failed);
        consecutive_errors += 1;
        warn!(
            "{} - nonzero transfer status received: {} ({} in a row)",
            config.name, failure, consecutive_errors
        );

        if consecutive_errors >= config.max_consecutive_errors {
            error!(
                "{} - giving up after {} consecutive errors",
                config.name, consecutive_errors
            );
            break Some(GoneReason::ErrorLimit(consecutive_errors));
        }

        if !matches!(failure, TransportError::ShortReport { .. }) && config.error_sleep_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.error_sleep_ms));
        }
    };

    ctx.set_state(ReaderState::ShuttingDown);

    if let Some(reason) = gone {
        let _ = ctx.gone_tx.send(DeviceGone {
            reader: config.name.clone(),
            device_path: ctx.device_path.clone(),
            reason,
        });
    }

    debug!("{} reader thread exiting", config.name);
}
