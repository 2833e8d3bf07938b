//! Driver configuration
//!
//! Stored as TOML, by default at `~/.config/bosto/driver.toml`. A missing
//! file means defaults.

use bosto_tablet::LogicalDevice;
use bosto_transport::ReaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Report reader tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Blocking read timeout; bounds how long closing a device takes.
    /// Must be nonzero.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u32,
    /// Back-off after a transient transfer error
    #[serde(default = "default_error_sleep")]
    pub error_sleep_ms: u64,
    /// Run of transient errors treated as the device being gone
    #[serde(default = "default_max_errors")]
    pub max_consecutive_errors: u32,
}

fn default_read_timeout() -> u32 {
    50
}
fn default_error_sleep() -> u64 {
    100
}
fn default_max_errors() -> u32 {
    50
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout(),
            error_sleep_ms: default_error_sleep(),
            max_consecutive_errors: default_max_errors(),
        }
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverConfig {
    /// Name prefix for the virtual devices (defaults to the tablet model name)
    #[serde(default)]
    pub device_name: Option<String>,
    /// Open the stylus device on attach
    #[serde(default = "default_true")]
    pub stylus: bool,
    /// Open the eraser device on attach
    #[serde(default = "default_true")]
    pub eraser: bool,
    /// Wait between attach attempts when no tablet is present
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    #[serde(default)]
    pub reader: ReaderSettings,
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay() -> u64 {
    2000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            stylus: true,
            eraser: true,
            reconnect_delay_ms: default_reconnect_delay(),
            reader: ReaderSettings::default(),
        }
    }
}

impl DriverConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bosto")
            .join("driver.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DriverConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the reader loop cannot honor
    pub fn validate(&self) -> anyhow::Result<()> {
        let timeout = self.reader.read_timeout_ms;
        if timeout == 0 || i32::try_from(timeout).is_err() {
            anyhow::bail!(
                "reader.read_timeout_ms must be between 1 and {}, got {}",
                i32::MAX,
                timeout
            );
        }
        Ok(())
    }

    /// Logical devices to open on attach
    pub fn enabled_devices(&self) -> Vec<LogicalDevice> {
        LogicalDevice::ALL
            .into_iter()
            .filter(|d| match d {
                LogicalDevice::Stylus => self.stylus,
                LogicalDevice::Eraser => self.eraser,
            })
            .collect()
    }

    /// Reader loop configuration for one logical device
    pub fn reader_config(&self, device: LogicalDevice, report_len: usize) -> ReaderConfig {
        ReaderConfig {
            name: device.display_name().to_lowercase(),
            report_len,
            read_timeout_ms: i32::try_from(self.reader.read_timeout_ms.max(1))
                .unwrap_or(i32::MAX),
            error_sleep_ms: self.reader.error_sleep_ms,
            max_consecutive_errors: self.reader.max_consecutive_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrip() {
        let config = DriverConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("stylus = true"));
        assert!(toml_str.contains("[reader]"));
        let parsed: DriverConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DriverConfig = toml::from_str(
            r#"
eraser = false

[reader]
read_timeout_ms = 10
"#,
        )
        .unwrap();
        assert!(config.stylus);
        assert!(!config.eraser);
        assert_eq!(config.reader.read_timeout_ms, 10);
        assert_eq!(config.reader.error_sleep_ms, 100);
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(config.enabled_devices(), vec![LogicalDevice::Stylus]);
    }

    #[test]
    fn test_reader_config() {
        let config = DriverConfig::default();
        let rc = config.reader_config(LogicalDevice::Eraser, 10);
        assert_eq!(rc.name, "eraser");
        assert_eq!(rc.report_len, 10);
        assert_eq!(rc.max_consecutive_errors, 50);
    }

    fn load_str(name: &str, content: &str) -> anyhow::Result<DriverConfig> {
        let dir = std::env::temp_dir().join(format!("bosto-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("driver.toml");
        std::fs::write(&path, content).unwrap();
        let result = DriverConfig::load(&path);
        let _ = std::fs::remove_dir_all(dir);
        result
    }

    #[test]
    fn test_read_timeout_must_be_positive() {
        let err = load_str("zero-timeout", "[reader]\nread_timeout_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("read_timeout_ms"));

        // Blocking forever would make close wait on a silent tablet
        assert!(load_str("negative-timeout", "[reader]\nread_timeout_ms = -1\n").is_err());
        assert!(load_str("huge-timeout", "[reader]\nread_timeout_ms = 3000000000\n").is_err());

        let config = load_str("ok-timeout", "[reader]\nread_timeout_ms = 20\n").unwrap();
        assert_eq!(config.reader_config(LogicalDevice::Stylus, 10).read_timeout_ms, 20);
    }

    #[test]
    fn test_reader_config_never_blocks_indefinitely() {
        let mut config = DriverConfig::default();
        config.reader.read_timeout_ms = 0;
        assert_eq!(config.reader_config(LogicalDevice::Stylus, 10).read_timeout_ms, 1);
        config.reader.read_timeout_ms = u32::MAX;
        assert_eq!(
            config.reader_config(LogicalDevice::Stylus, 10).read_timeout_ms,
            i32::MAX
        );
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = DriverConfig::load(Path::new("/nonexistent/bosto/driver.toml")).unwrap();
        assert_eq!(config, DriverConfig::default());
    }
}
