use rootstat_core::{Sensor, SensorError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Temperatures from a fixed list of millidegree pseudo-files.
///
/// Readings are whole degrees Celsius, one per configured file in order. A
/// file that cannot be read keeps its previous reading (`None` until the
/// first success).
#[derive(Debug, Clone)]
pub struct ThermalSensor {
    sensors: Vec<PathBuf>,
    last: Vec<Option<i64>>,
}

impl ThermalSensor {
    pub fn new(sensors: Vec<PathBuf>) -> Self {
        let last = vec![None; sensors.len()];
        Self { sensors, last }
    }

    #[must_use]
    pub fn sensors(&self) -> &[PathBuf] {
        &self.sensors
    }

    /// Read one sensor file and convert millidegrees to whole degrees.
    ///
    /// Sub-zero readings round toward zero.
    pub fn read_celsius(path: &Path) -> Result<i64, SensorError> {
        let content = fs::read_to_string(path)?;
        let millidegrees: i64 = content.trim().parse().map_err(|e| {
            SensorError::parse_with_source(
                format!("Failed to parse temperature from {}", path.display()),
                e,
            )
        })?;
        Ok(millidegrees / 1000)
    }

    /// Every `temp` file under the thermal class directory, sorted by zone.
    pub fn discover_zones(thermal_dir: &Path) -> Result<Vec<PathBuf>, SensorError> {
        let mut zones: Vec<PathBuf> = fs::read_dir(thermal_dir)?
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with("thermal_zone"))
            })
            .map(|entry| entry.path().join("temp"))
            .filter(|temp| temp.exists())
            .collect();
        zones.sort();
        Ok(zones)
    }
}

impl Sensor for ThermalSensor {
    type Reading = Vec<Option<i64>>;
    type Error = SensorError;

    fn read(&mut self) -> Result<Self::Reading, SensorError> {
        for (path, last) in self.sensors.iter().zip(self.last.iter_mut()) {
            match Self::read_celsius(path) {
                Ok(celsius) => *last = Some(celsius),
                Err(e) => debug!(sensor = %path.display(), "keeping previous temperature: {e}"),
            }
        }
        Ok(self.last.clone())
    }

    fn name(&self) -> &str {
        "thermal"
    }

    fn check_availability(&self) -> Result<(), SensorError> {
        for path in &self.sensors {
            if !path.exists() {
                return Err(SensorError::unavailable(format!(
                    "Thermal sensor not found: {}",
                    path.display()
                )));
            }
            Self::read_celsius(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_zone(dir: &TempDir, zone: &str, content: &str) -> PathBuf {
        let zone_dir = dir.path().join(zone);
        fs::create_dir_all(&zone_dir).unwrap();
        let temp = zone_dir.join("temp");
        fs::write(&temp, content).unwrap();
        temp
    }

    #[test]
    fn test_millidegrees_to_celsius() {
        let dir = TempDir::new().unwrap();
        let path = write_zone(&dir, "thermal_zone0", "47999\n");
        assert_eq!(ThermalSensor::read_celsius(&path).unwrap(), 47);

        fs::write(&path, "1000").unwrap();
        assert_eq!(ThermalSensor::read_celsius(&path).unwrap(), 1);

        fs::write(&path, "-5000\n").unwrap();
        assert_eq!(ThermalSensor::read_celsius(&path).unwrap(), -5);

        fs::write(&path, "-500").unwrap();
        assert_eq!(ThermalSensor::read_celsius(&path).unwrap(), 0);

        fs::write(&path, "warm").unwrap();
        assert!(matches!(
            ThermalSensor::read_celsius(&path),
            Err(SensorError::Parse { .. })
        ));
    }

    #[test]
    fn test_unreadable_sensor_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let first = write_zone(&dir, "thermal_zone0", "50000\n");
        let second = write_zone(&dir, "thermal_zone1", "61000\n");
        let missing = dir.path().join("thermal_zone9").join("temp");

        let mut sensor = ThermalSensor::new(vec![first.clone(), second.clone(), missing]);
        assert_eq!(sensor.read().unwrap(), vec![Some(50), Some(61), None]);

        fs::remove_file(&second).unwrap();
        assert_eq!(sensor.read().unwrap(), vec![Some(50), Some(61), None]);

        fs::write(&first, "-12000\n").unwrap();
        assert_eq!(sensor.read().unwrap(), vec![Some(-12), Some(61), None]);
        assert!(sensor.check_availability().is_err());
    }

    #[test]
    fn test_no_sensors() {
        let mut sensor = ThermalSensor::new(Vec::new());
        assert!(sensor.read().unwrap().is_empty());
        assert!(sensor.check_availability().is_ok());
    }

    #[test]
    fn test_discover_zones() {
        let dir = TempDir::new().unwrap();
        write_zone(&dir, "thermal_zone1", "40000");
        write_zone(&dir, "thermal_zone0", "30000");
        fs::create_dir_all(dir.path().join("cooling_device0")).unwrap();

        let zones = ThermalSensor::discover_zones(dir.path()).unwrap();
        assert_eq!(
            zones,
            vec![
                dir.path().join("thermal_zone0").join("temp"),
                dir.path().join("thermal_zone1").join("temp"),
            ]
        );
    }
}
