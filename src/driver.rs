//! Tablet lifecycle: attach, open/close logical devices, detach
//!
//! A [`TabletDriver`] owns everything allocated for one physical tablet:
//! the output sink (the two logical devices), the shared tablet core, and
//! one report reader per open logical device. Readers are declared first so
//! they are cancelled before the sink they publish to is released.

use std::collections::HashMap;
use std::sync::Arc;

use bosto_tablet::{features, DeviceProfile, LogicalDevice, OutputSink, Tablet, TabletError};
use bosto_transport::{
    DeviceDiscovery, DeviceGone, DiscoveredDevice, ReportReader, TransportDeviceInfo,
    TransportError,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::DriverConfig;

/// Errors from attaching or driving a tablet
#[derive(Error, Debug)]
pub enum DriverError {
    /// No feature table entry; nothing was allocated
    #[error("Unsupported device {vid:04x}:{pid:04x}")]
    UnsupportedDevice { vid: u16, pid: u16 },

    /// Building a sink, handle or reader failed; earlier allocations are released
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<TabletError> for DriverError {
    fn from(e: TabletError) -> Self {
        match e {
            TabletError::UnsupportedDevice { vid, pid } => DriverError::UnsupportedDevice { vid, pid },
            TabletError::Transport(t) => DriverError::Transport(t),
        }
    }
}

/// One attached tablet
pub struct TabletDriver<S: OutputSink + 'static> {
    /// Open logical devices
    readers: HashMap<LogicalDevice, ReportReader>,
    tablet: Arc<Tablet<S>>,
    device: DiscoveredDevice,
    discovery: Arc<dyn DeviceDiscovery>,
    config: DriverConfig,
    gone_tx: mpsc::UnboundedSender<DeviceGone>,
    gone_rx: mpsc::UnboundedReceiver<DeviceGone>,
}

impl<S: OutputSink + 'static> TabletDriver<S> {
    /// Attach to a discovered tablet and open the configured logical devices
    ///
    /// # Arguments
    /// * `discovery` - Used to open one device handle per logical device
    /// * `device` - The tablet to attach to
    /// * `config` - Which logical devices to open and reader tuning
    /// * `make_sink` - Builds the output sink once the profile is known
    pub async fn attach<F>(
        discovery: Arc<dyn DeviceDiscovery>,
        device: DiscoveredDevice,
        config: &DriverConfig,
        make_sink: F,
    ) -> Result<Self, DriverError>
    where
        F: FnOnce(&'static DeviceProfile, &TransportDeviceInfo) -> Result<S, DriverError>,
    {
        let profile = features::lookup(device.info.pid)?;
        info!(
            "Attaching {} ({:04x}:{:04x}) at {}",
            profile.name, device.info.vid, device.info.pid, device.info.device_path
        );

        let sink = make_sink(profile, &device.info)?;
        let (gone_tx, gone_rx) = mpsc::unbounded_channel();

        let mut driver = Self {
            readers: HashMap::new(),
            tablet: Arc::new(Tablet::new(profile, sink)),
            device,
            discovery,
            config: config.clone(),
            gone_tx,
            gone_rx,
        };

        // Dropping `driver` on error cancels any reader already started
        for logical in config.enabled_devices() {
            driver.open(logical).await?;
        }

        Ok(driver)
    }

    /// Start the report reader for a logical device. No-op if already open.
    pub async fn open(&mut self, logical: LogicalDevice) -> Result<(), DriverError> {
        if self.readers.contains_key(&logical) {
            return Ok(());
        }

        let source = self.discovery.open_device(&self.device).await?;
        let reader_config = self
            .config
            .reader_config(logical, self.tablet.profile().report_len);

        let reader = ReportReader::start(
            source,
            self.tablet.clone(),
            reader_config,
            self.device.info.device_path.clone(),
            self.gone_tx.clone(),
        )
        .map_err(|e| DriverError::AllocationFailure(e.to_string()))?;

        debug!("Opened {} device", logical.display_name());
        self.readers.insert(logical, reader);
        Ok(())
    }

    /// Cancel a logical device's reader and wait for it to stop
    pub fn close(&mut self, logical: LogicalDevice) {
        if let Some(mut reader) = self.readers.remove(&logical) {
            reader.cancel();
            debug!(
                "Closed {} device ({} reader)",
                logical.display_name(),
                reader.name()
            );
        }
    }

    /// Whether a logical device currently has a reader
    pub fn is_open(&self, logical: LogicalDevice) -> bool {
        self.readers.contains_key(&logical)
    }

    /// Wait for the first reader to report the device gone
    pub async fn wait_gone(&mut self) -> Option<DeviceGone> {
        self.gone_rx.recv().await
    }

    /// The shared tablet core
    pub fn tablet(&self) -> &Arc<Tablet<S>> {
        &self.tablet
    }

    /// Device this driver is attached to
    pub fn device_info(&self) -> &TransportDeviceInfo {
        &self.device.info
    }

    /// Stop every reader, then release the sink.
    ///
    /// Blocks for at most one read timeout per open reader.
    pub fn detach(mut self) {
        for logical in LogicalDevice::ALL {
            self.close(logical);
        }
        info!("Detached {}", self.device.info.device_path);
    }
}
