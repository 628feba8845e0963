use crate::types::BatteryStatus;
use rootstat_core::{Sensor, SensorError};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Longest capacity value the kernel reports ("100").
const CAPACITY_DIGITS: usize = 3;

/// Anything that can report the current power-supply status.
///
/// Implemented by [`PowerSupply`]; tests substitute scripted doubles.
pub trait StatusProbe: Send + Sync + 'static {
    fn read_status(&self) -> BatteryStatus;
}

/// Read the status of a battery, falling back to the AC adapter.
///
/// The first byte of `<battery>/status` decides the value. If that file
/// cannot be read or reports an unknown state, the first byte of
/// `<ac>/online` decides between [`BatteryStatus::OnAc`] and
/// [`BatteryStatus::OnBattery`]. If neither helps the status is
/// [`BatteryStatus::Unknown`].
///
/// An empty status file and a first byte outside `C`, `D`, `F` and `N`
/// count as unknown too, so they also fall back to the AC adapter instead
/// of being published as they are.
#[must_use]
pub fn get_battery_status(battery_dir: &Path, ac_dir: &Path) -> BatteryStatus {
    let status = first_byte(&battery_dir.join("status"))
        .map_or(BatteryStatus::Unknown, BatteryStatus::from_status_byte);
    if status != BatteryStatus::Unknown {
        return status;
    }
    trace!(battery = %battery_dir.display(), "battery status unknown, trying AC adapter");

    first_byte(&ac_dir.join("online"))
        .map_or(BatteryStatus::Unknown, BatteryStatus::from_online_byte)
}

fn first_byte(path: &Path) -> Option<u8> {
    let mut byte = [0u8; 1];
    let mut file = File::open(path).ok()?;
    match file.read(&mut byte) {
        Ok(1) => Some(byte[0]),
        _ => None,
    }
}

/// The battery and AC adapter directories under `/sys/class/power_supply`.
#[derive(Debug, Clone)]
pub struct PowerSupply {
    battery_dir: PathBuf,
    ac_dir: PathBuf,
}

impl PowerSupply {
    pub fn new(battery_dir: impl Into<PathBuf>, ac_dir: impl Into<PathBuf>) -> Self {
        Self {
            battery_dir: battery_dir.into(),
            ac_dir: ac_dir.into(),
        }
    }

    #[must_use]
    pub fn battery_dir(&self) -> &Path {
        &self.battery_dir
    }

    #[must_use]
    pub fn ac_dir(&self) -> &Path {
        &self.ac_dir
    }

    #[must_use]
    pub fn status(&self) -> BatteryStatus {
        get_battery_status(&self.battery_dir, &self.ac_dir)
    }

    /// Read the capacity percent as the kernel printed it.
    ///
    /// Only the first whitespace-separated token is used and it must be one
    /// to three ASCII digits.
    pub fn capacity(&self) -> Result<String, SensorError> {
        let path = self.battery_dir.join("capacity");
        let content = fs::read_to_string(&path)?;
        let token = content.split_whitespace().next().ok_or_else(|| {
            SensorError::invalid_data_with_value("Empty capacity file", path.display().to_string())
        })?;

        if token.is_empty()
            || token.len() > CAPACITY_DIGITS
            || !token.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(SensorError::invalid_data_with_value(
                "Capacity is not a percentage",
                token,
            ));
        }

        Ok(token.to_owned())
    }

}

impl StatusProbe for PowerSupply {
    fn read_status(&self) -> BatteryStatus {
        self.status()
    }
}

impl Sensor for PowerSupply {
    type Reading = String;
    type Error = SensorError;

    fn read(&mut self) -> Result<String, SensorError> {
        self.capacity()
    }

    fn name(&self) -> &str {
        "battery"
    }

    fn check_availability(&self) -> Result<(), SensorError> {
        if !self.battery_dir.join("status").exists() && !self.ac_dir.join("online").exists() {
            return Err(SensorError::unavailable(format!(
                "Neither {} nor {} is present",
                self.battery_dir.display(),
                self.ac_dir.display()
            )));
        }
        Ok(())
    }
}
