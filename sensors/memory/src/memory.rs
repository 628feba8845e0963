//! Memory usage sensor reading `/proc/meminfo`.

use rootstat_core::{Sensor, SensorError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Memory statistics from `/proc/meminfo`, in kB as the kernel reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Total physical memory
    pub total_kib: u64,
    /// Memory available for new allocations without swapping
    pub available_kib: u64,
}

impl MemoryInfo {
    /// Parse the two fields the status line needs.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Parse`] if either key is missing or its value
    /// is not a number.
    pub fn parse(content: &str) -> Result<Self, SensorError> {
        let mut total_kib = None;
        let mut available_kib = None;

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };

            let slot = match key.trim_end_matches(':') {
                "MemTotal" => &mut total_kib,
                "MemAvailable" => &mut available_kib,
                _ => continue,
            };
            *slot = Some(value.parse::<u64>().map_err(|e| {
                SensorError::parse_with_source(format!("Failed to parse {key} value"), e)
            })?);

            if total_kib.is_some() && available_kib.is_some() {
                break;
            }
        }

        Ok(Self {
            total_kib: total_kib.ok_or_else(|| SensorError::parse("MemTotal missing from meminfo"))?,
            available_kib: available_kib
                .ok_or_else(|| SensorError::parse("MemAvailable missing from meminfo"))?,
        })
    }

    /// Parse memory information from a meminfo file path.
    pub fn from_path(path: &Path) -> Result<Self, SensorError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    #[must_use]
    pub const fn used_kib(&self) -> u64 {
        self.total_kib.saturating_sub(self.available_kib)
    }

    #[must_use]
    pub const fn total_mib(&self) -> u64 {
        self.total_kib / 1024
    }

    #[must_use]
    pub const fn available_mib(&self) -> u64 {
        self.available_kib / 1024
    }

    #[must_use]
    pub const fn used_mib(&self) -> u64 {
        self.used_kib() / 1024
    }

    /// Whole percentage of physical memory in use.
    #[must_use]
    pub const fn used_percent(&self) -> u8 {
        if self.total_kib == 0 {
            0
        } else {
            (self.used_kib() * 100 / self.total_kib) as u8
        }
    }
}

/// Memory sensor over a meminfo table.
#[derive(Debug, Clone)]
pub struct MemorySensor {
    path: PathBuf,
}

impl MemorySensor {
    const PROC_MEMINFO_PATH: &'static str = "/proc/meminfo";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for MemorySensor {
    fn default() -> Self {
        Self::new(Self::PROC_MEMINFO_PATH)
    }
}

impl Sensor for MemorySensor {
    type Reading = MemoryInfo;
    type Error = SensorError;

    fn read(&mut self) -> Result<MemoryInfo, SensorError> {
        let info = MemoryInfo::from_path(&self.path)?;
        trace!(used_mib = info.used_mib(), total_mib = info.total_mib(), "memory");
        Ok(info)
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn check_availability(&self) -> Result<(), SensorError> {
        if !self.path.exists() {
            return Err(SensorError::unavailable(format!(
                "{} does not exist (not a Linux system?)",
                self.path.display()
            )));
        }

        MemoryInfo::from_path(&self.path)?;
        Ok(())
    }
}
