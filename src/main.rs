//! Bosto tablet driver
//!
//! Main entry point: device listing and the attach/reconnect loop.

mod cli;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use bosto_driver::{DriverConfig, DriverError, LogSink, TabletDriver, UsbIdentity, VirtualTablet};
use bosto_tablet::{features, DeviceProfile, LogicalDevice, OutputSink};
use bosto_transport::{DeviceDiscovery, HidDiscovery, TransportDeviceInfo, TransportError};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path: PathBuf = cli.config.unwrap_or_else(DriverConfig::default_path);
    debug!("Loading config from {:?}", config_path);
    let config = DriverConfig::load(&config_path)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::List => list_tablets().await,
        Commands::Run => {
            let name = config.device_name.clone();
            run(&config, move |profile, info| {
                create_virtual_tablet(name.as_deref().unwrap_or(profile.name), profile, info)
            })
            .await
        }
        Commands::Monitor => run(&config, |_, _| Ok(LogSink::new())).await,
    }
}

async fn list_tablets() -> Result<()> {
    let devices = HidDiscovery::new().list_devices().await?;
    if devices.is_empty() {
        println!("No supported tablet found");
        return Ok(());
    }

    for device in devices {
        let info = &device.info;
        let model = features::lookup(info.pid)
            .map(|p| p.name)
            .unwrap_or("unknown model");
        let interface = info
            .interface
            .map(|i| i.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:04x}:{:04x}  {}  {}  interface {}  {}",
            info.vid,
            info.pid,
            info.device_path,
            model,
            interface,
            info.product_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn create_virtual_tablet(
    name: &str,
    profile: &'static DeviceProfile,
    info: &TransportDeviceInfo,
) -> Result<VirtualTablet, DriverError> {
    let id = UsbIdentity {
        vendor: info.vid,
        product: info.pid,
        version: info.release,
    };
    let mut tablet = VirtualTablet::new(name, profile, id)
        .map_err(|e| DriverError::AllocationFailure(e.to_string()))?;

    for device in LogicalDevice::ALL {
        if let Some(path) = tablet.device_path(device) {
            info!("{} device: {}", device.display_name(), path.display());
        }
    }
    Ok(tablet)
}

/// Attach to the first tablet found, drive it until it goes away, and repeat
/// until interrupted
async fn run<S, F>(config: &DriverConfig, make_sink: F) -> Result<()>
where
    S: OutputSink + 'static,
    F: Fn(&'static DeviceProfile, &TransportDeviceInfo) -> Result<S, DriverError>,
{
    let discovery: Arc<dyn DeviceDiscovery> = Arc::new(HidDiscovery::new());
    let retry = Duration::from_millis(config.reconnect_delay_ms);

    info!("Waiting for tablet. Press Ctrl+C to exit.");

    loop {
        match discovery.list_devices().await {
            Ok(devices) => {
                if let Some(device) = devices.into_iter().next() {
                    match TabletDriver::attach(discovery.clone(), device, config, &make_sink)
                        .await
                    {
                        Ok(mut driver) => {
                            let interrupted = tokio::select! {
                                gone = driver.wait_gone() => {
                                    if let Some(gone) = gone {
                                        warn!(
                                            "Tablet {} gone ({}): {:?}",
                                            gone.device_path, gone.reader, gone.reason
                                        );
                                    }
                                    false
                                }
                                _ = tokio::signal::ctrl_c() => true,
                            };
                            // Joining the readers waits up to one read timeout each
                            tokio::task::spawn_blocking(move || driver.detach()).await?;
                            if interrupted {
                                info!("Interrupted, exiting");
                                return Ok(());
                            }
                        }
                        Err(DriverError::Transport(TransportError::HidPermissionDenied(msg))) => {
                            return Err(anyhow::anyhow!(
                                "{}; install the udev rule or run as root",
                                msg
                            ));
                        }
                        Err(e) => error!("Failed to attach tablet: {}", e),
                    }
                }
            }
            Err(e) => warn!("Device scan failed: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(retry) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, exiting");
                return Ok(());
            }
        }
    }
}
