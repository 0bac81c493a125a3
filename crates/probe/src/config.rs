//! Probe configuration management

use crate::usb::Schedule;
use anyhow::{Context, Result, anyhow};
use protocol::{ControlSetup, EndpointAddress, HID_CLASS_IN, InterruptRead, UsbId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device the probe opens when nothing else is configured
pub const DEFAULT_DEVICE: UsbId = UsbId::new(0x03eb, 0x2ff4);

/// Which of the two run shapes to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Print the active configuration, one control transfer, one read
    Single,
    /// Reset and detach, then poll the interrupt endpoint repeatedly
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub control: ControlSettings,
    #[serde(default)]
    pub interrupt: InterruptSettings,
    /// Settings for `--variant single`
    #[serde(default = "VariantSettings::single")]
    pub single: VariantSettings,
    /// Settings for `--variant poll`
    #[serde(default = "VariantSettings::poll")]
    pub poll: VariantSettings,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            device: DeviceSettings::default(),
            control: ControlSettings::default(),
            interrupt: InterruptSettings::default(),
            single: VariantSettings::single(),
            poll: VariantSettings::poll(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub log_level: String,
    pub variant: Variant,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            variant: Variant::Single,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Vendor/product pair, e.g. "0x03eb:0x2ff4"
    pub id: UsbId,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self { id: DEFAULT_DEVICE }
    }
}

/// Control transfer parameters shared by both variants
///
/// The request code (`bRequest`) lives in the variant sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSettings {
    pub request_type: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
    pub timeout_ms: u64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            request_type: HID_CLASS_IN,
            value: 0x0200,
            index: 0,
            length: 64,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptSettings {
    pub endpoint: u8,
    pub length: usize,
    pub timeout_ms: u64,
}

impl Default for InterruptSettings {
    fn default() -> Self {
        Self {
            endpoint: 0x81,
            length: 8,
            timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSettings {
    /// bRequest sent in the control transfer
    pub request: u8,
    pub iterations: u32,
    /// Delay after each iteration (0 = no delay)
    pub interval_ms: u64,
    /// Reset, detach the kernel driver and set the configuration first
    pub prepare_device: bool,
    /// Print the active configuration descriptor before polling
    pub show_configuration: bool,
}

impl VariantSettings {
    fn single() -> Self {
        Self {
            request: 1,
            iterations: 1,
            interval_ms: 0,
            prepare_device: false,
            show_configuration: true,
        }
    }

    fn poll() -> Self {
        Self {
            request: 2,
            iterations: 1000,
            interval_ms: 250,
            prepare_device: true,
            show_configuration: false,
        }
    }
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub variant: Option<Variant>,
    pub device: Option<UsbId>,
    pub request: Option<u8>,
    pub iterations: Option<u32>,
    pub interval_ms: Option<u64>,
}

/// Everything one run needs, resolved and validated
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub variant: Variant,
    pub device: UsbId,
    pub control: ControlSetup,
    pub control_timeout: Duration,
    pub interrupt: InterruptRead,
    pub schedule: Schedule,
    pub prepare_device: bool,
    pub show_configuration: bool,
}

impl ProbeConfig {
    /// Load configuration from the specified path
    ///
    /// Without a path the first existing file from [`Self::search_paths`]
    /// is used, and finding none is an error.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p),
            None => Self::find().ok_or_else(|| anyhow!("No configuration file found"))?,
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ProbeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load the first configuration file found, or defaults if there is none
    ///
    /// A file that exists but cannot be read, parsed or validated is an
    /// error, not a reason to fall back.
    pub fn load_or_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(Some(path)),
            None => Ok(Self::default()),
        }
    }

    /// Locations searched when no path is given, in order
    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/hid-probe/probe.toml"),
        ]
    }

    fn find() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Expand a leading `~` in a user-supplied path
    pub fn expand_path(path: &Path) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hid-probe").join("probe.toml")
        } else {
            PathBuf::from(".config/hid-probe/probe.toml")
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = &overrides.log_level {
            self.general.log_level = level.clone();
        }
        if let Some(variant) = overrides.variant {
            self.general.variant = variant;
        }
        if let Some(device) = overrides.device {
            self.device.id = device;
        }

        let settings = self.variant_settings_mut();
        if let Some(request) = overrides.request {
            settings.request = request;
        }
        if let Some(iterations) = overrides.iterations {
            settings.iterations = iterations;
        }
        if let Some(interval_ms) = overrides.interval_ms {
            settings.interval_ms = interval_ms;
        }
    }

    pub fn variant_settings(&self) -> &VariantSettings {
        match self.general.variant {
            Variant::Single => &self.single,
            Variant::Poll => &self.poll,
        }
    }

    fn variant_settings_mut(&mut self) -> &mut VariantSettings {
        match self.general.variant {
            Variant::Single => &mut self.single,
            Variant::Poll => &mut self.poll,
        }
    }

    /// Resolve the selected variant into a validated run plan
    pub fn plan(&self) -> Result<RunPlan> {
        self.validate()?;

        let settings = self.variant_settings();
        let control = ControlSetup {
            request_type: self.control.request_type,
            request: settings.request,
            value: self.control.value,
            index: self.control.index,
            length: self.control.length,
        };
        let endpoint = EndpointAddress::new(self.interrupt.endpoint)?;
        let interrupt = InterruptRead::new(
            endpoint,
            self.interrupt.length,
            Duration::from_millis(self.interrupt.timeout_ms),
        )?;
        let interval =
            (settings.interval_ms > 0).then(|| Duration::from_millis(settings.interval_ms));

        Ok(RunPlan {
            variant: self.general.variant,
            device: self.device.id,
            control,
            control_timeout: Duration::from_millis(self.control.timeout_ms),
            interrupt,
            schedule: Schedule {
                iterations: settings.iterations,
                interval,
            },
            prepare_device: settings.prepare_device,
            show_configuration: settings.show_configuration,
        })
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.general.log_level,
                valid_levels.join(", ")
            ));
        }

        ControlSetup {
            request_type: self.control.request_type,
            request: 0,
            value: self.control.value,
            index: self.control.index,
            length: self.control.length,
        }
        .validate_in()
        .context("Invalid [control] section")?;

        let endpoint =
            EndpointAddress::new(self.interrupt.endpoint).context("Invalid [interrupt] section")?;
        InterruptRead::new(endpoint, self.interrupt.length, Duration::ZERO)
            .context("Invalid [interrupt] section")?;

        for (name, settings) in [("single", &self.single), ("poll", &self.poll)] {
            if settings.iterations == 0 {
                return Err(anyhow!("Invalid [{}] section: iterations must be > 0", name));
            }
        }

        Ok(())
    }
}
