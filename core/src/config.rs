//! Global configuration loaded from `~/.config/rootstat/config.ron`.
//!
//! Every field has a default, so an empty `()` file (or no file at all) gives
//! a working setup on a typical laptop. The sampling interval is fixed and not
//! part of the configuration.

use crate::format::Template;
use crate::SensorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the rendered status line goes.
///
/// # Examples
///
/// ```rust
/// use rootstat_core::OutputTarget;
///
/// let target: OutputTarget = "xroot".parse().unwrap();
/// assert_eq!(target, OutputTarget::XRoot);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// One plain text line per tick on stdout
    #[default]
    Stdout,
    /// One Waybar JSON object per tick on stdout
    Waybar,
    /// The X root window name (what dwm-style bars display)
    XRoot,
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stdout => "stdout",
            Self::Waybar => "waybar",
            Self::XRoot => "xroot",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for OutputTarget {
    type Err = OutputTargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" | "plain" => Ok(Self::Stdout),
            "waybar" | "json" => Ok(Self::Waybar),
            "xroot" | "x11" | "root" => Ok(Self::XRoot),
            _ => Err(OutputTargetParseError {
                input: s.to_owned(),
                valid_options: &["stdout", "waybar", "xroot"],
            }),
        }
    }
}

/// Error type for parsing [`OutputTarget`] from string.
#[derive(Debug, thiserror::Error)]
#[error("Invalid output target '{input}'. Valid options: {}", valid_options.join(", "))]
pub struct OutputTargetParseError {
    input: String,
    valid_options: &'static [&'static str],
}

/// Global configuration for the status line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Number of logical cores to sample; `None` detects at startup
    pub cpu_count: Option<usize>,
    /// Kernel CPU accounting table
    pub proc_stat: PathBuf,
    /// Kernel memory table
    pub meminfo: PathBuf,
    /// Power-supply directory of the battery (holds `status` and `capacity`)
    pub battery: PathBuf,
    /// Power-supply directory of the AC adapter (holds `online`)
    pub ac_adapter: PathBuf,
    /// Temperature pseudo-files, each holding millidegrees Celsius; empty
    /// means every thermal zone, in zone order
    pub temp_sensors: Vec<PathBuf>,
    /// Wireless interface to query for ESSID and bitrate
    pub wireless_interface: Option<String>,
    /// strftime format for the `{time}` placeholder
    pub time_format: String,
    /// Status line template
    pub format: String,
    /// Output target
    pub output: OutputTarget,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            cpu_count: None,
            proc_stat: PathBuf::from("/proc/stat"),
            meminfo: PathBuf::from("/proc/meminfo"),
            battery: PathBuf::from("/sys/class/power_supply/BAT0"),
            ac_adapter: PathBuf::from("/sys/class/power_supply/AC"),
            temp_sensors: vec![PathBuf::from("/sys/class/thermal/thermal_zone0/temp")],
            wireless_interface: Some("wlan0".to_owned()),
            time_format: "%a %d %b %H:%M".to_owned(),
            format: "{essid} {bitrate}Mb/s | {temp0}C | {mem_used}/{mem_total}MiB | cpu {cpu}% | {bat_status} {bat_capacity}% | {time}"
                .to_owned(),
            output: OutputTarget::Stdout,
        }
    }
}

impl GlobalConfig {
    const APP_DIR: &'static str = "rootstat";
    const FILE_NAME: &'static str = "config.ron";

    /// Load configuration from the standard config file location.
    ///
    /// Searches for config in:
    /// 1. ~/.config/rootstat/config.ron
    /// 2. ~/.rootstat/config.ron (fallback)
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, SensorError> {
        if let Some(config_path) = Self::find_config_file() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, SensorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse and validate configuration from RON text.
    pub fn from_ron(content: &str) -> Result<Self, SensorError> {
        let config: GlobalConfig = ron::from_str(content)
            .map_err(|e| SensorError::parse_with_source("Failed to parse config file", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Find the config file in standard locations.
    pub fn find_config_file() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join(Self::APP_DIR).join(Self::FILE_NAME);
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir
                .join(format!(".{}", Self::APP_DIR))
                .join(Self::FILE_NAME);
            if home_path.exists() {
                return Some(home_path);
            }
        }

        None
    }

    /// Get the default config file path for writing.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Check the settings that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.cpu_count == Some(0) {
            return Err(SensorError::config_with_value(
                "cpu_count must be at least 1",
                "0",
            ));
        }

        crate::format::validate_time_format(&self.time_format)?;
        Template::parse(&self.format)?;

        Ok(())
    }

    /// Core count to sample, falling back to the number of online CPUs.
    #[must_use]
    pub fn effective_cpu_count(&self) -> usize {
        self.cpu_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SensorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SensorError::parse_with_source("Failed to serialize config", e))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Save example configuration with full documentation to a file.
    pub fn save_example_config_to_file(path: &Path) -> Result<(), SensorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, Self::EXAMPLE)?;
        Ok(())
    }

    const EXAMPLE: &'static str = r##"// rootstat Configuration File
// ============================
// Every field is optional; omitted fields keep their default.
// Copy this to ~/.config/rootstat/config.ron and customize as needed.
//
// Note: Command line arguments override these settings.

(
    // Number of logical cores to sample. Leave as None to use every online CPU.
    cpu_count: None,

    // Kernel tables
    proc_stat: "/proc/stat",
    meminfo: "/proc/meminfo",

    // Power supply directories
    battery: "/sys/class/power_supply/BAT0",
    ac_adapter: "/sys/class/power_supply/AC",

    // Temperature inputs in millidegrees; referenced as {temp0}, {temp1}, ...
    // Leave empty to use every /sys/class/thermal zone.
    temp_sensors: [
        "/sys/class/thermal/thermal_zone0/temp",
    ],

    // Wireless interface for {essid} and {bitrate}
    wireless_interface: Some("wlan0"),

    // strftime format for {time}
    time_format: "%a %d %b %H:%M",

    // Available placeholders:
    //   {cpu} {cpu1}..{cpuN}         usage percent, aggregate and per core
    //   {mem_used} {mem_total} {mem_avail} {mem_pct}
    //   {temp0}..{tempN}             whole degrees Celsius
    //   {essid} {bitrate}            bitrate in Mb/s
    //   {bat_status} {bat_capacity}  status code and capacity percent
    //   {time}
    format: "{essid} {bitrate}Mb/s | {temp0}C | {mem_used}/{mem_total}MiB | cpu {cpu}% | {bat_status} {bat_capacity}% | {time}",

    // Options: stdout, waybar, xroot
    output: stdout,
)
"##;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        GlobalConfig::default().validate().unwrap();
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config = GlobalConfig::from_ron(GlobalConfig::EXAMPLE).unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = GlobalConfig::from_ron("(cpu_count: Some(4), output: xroot)").unwrap();
        assert_eq!(config.cpu_count, Some(4));
        assert_eq!(config.output, OutputTarget::XRoot);
        assert_eq!(config.proc_stat, PathBuf::from("/proc/stat"));
        assert_eq!(config.effective_cpu_count(), 4);
    }

    #[test]
    fn test_zero_cpu_count_rejected() {
        let err = GlobalConfig::from_ron("(cpu_count: Some(0))").unwrap_err();
        assert!(matches!(err, SensorError::Config { .. }));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = GlobalConfig::from_ron(r#"(format: "{gpu}%")"#).unwrap_err();
        assert!(matches!(err, SensorError::Config { .. }));
    }

    #[test]
    fn test_bad_time_format_rejected() {
        let err = GlobalConfig::from_ron(r#"(time_format: "%Q")"#).unwrap_err();
        assert!(matches!(err, SensorError::Config { .. }));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");

        let mut config = GlobalConfig::default();
        config.wireless_interface = None;
        config.temp_sensors.clear();
        config.save_to_file(&path).unwrap();

        let loaded = GlobalConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_output_target_parse() {
        assert_eq!("stdout".parse::<OutputTarget>().unwrap(), OutputTarget::Stdout);
        assert_eq!("JSON".parse::<OutputTarget>().unwrap(), OutputTarget::Waybar);
        assert_eq!("x11".parse::<OutputTarget>().unwrap(), OutputTarget::XRoot);
        assert!("tty".parse::<OutputTarget>().is_err());
        assert_eq!(OutputTarget::XRoot.to_string(), "xroot");
    }
}
