//! CPU usage sensor combining a counter source with the sampler.

use crate::counters::{CounterSample, CounterTable};
use crate::sampler::CpuSampler;
use crate::source::CounterSource;
use rootstat_core::{Sensor, SensorError};
use tracing::debug;

/// CPU usage sensor that monitors per-core and aggregate utilization.
///
/// Each read pulls one table from the source and folds it into the sampler.
/// A failed read leaves the sampler untouched, so the caller's previous
/// percentages stay valid.
#[derive(Debug)]
pub struct CpuSensor<S> {
    name: String,
    source: S,
    sampler: CpuSampler,
}

impl<S: CounterSource> CpuSensor<S> {
    /// Create a CPU sensor tracking `core_count` cores plus the aggregate.
    pub fn new(source: S, core_count: usize) -> Self {
        Self {
            name: "cpu".to_owned(),
            source,
            sampler: CpuSampler::new(core_count),
        }
    }

    #[must_use]
    pub fn sampler(&self) -> &CpuSampler {
        &self.sampler
    }
}

impl<S: CounterSource> Sensor for CpuSensor<S> {
    type Reading = Vec<u8>;
    type Error = SensorError;

    fn read(&mut self) -> Result<Vec<u8>, Self::Error> {
        let content = self.source.read_table()?;
        let table = CounterTable::parse(&content, self.sampler.slots());
        let percentages = self.sampler.sample(&table);
        debug!(aggregate = percentages.first().copied(), "sampled cpu usage");
        Ok(percentages)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn check_availability(&self) -> Result<(), Self::Error> {
        let content = self.source.read_table().map_err(|e| {
            SensorError::unavailable(format!("{}: {}", self.source.describe(), e))
        })?;

        let first = content
            .lines()
            .next()
            .ok_or_else(|| SensorError::invalid_data("Empty CPU accounting table"))?;
        first
            .parse::<CounterSample>()
            .map_err(|e| SensorError::parse_with_source("Unexpected CPU accounting line", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockCounterSource;

    const TICK_1: &str = "cpu  100 0 0 900 0 0 0 0 0 0\ncpu0 100 0 0 900 0 0 0 0 0 0\nintr 1\n";
    const TICK_2: &str = "cpu  150 0 0 900 0 0 0 0 0 0\ncpu0 150 0 0 900 0 0 0 0 0 0\nintr 2\n";

    #[test]
    fn test_read_samples_every_slot() {
        let source = MockCounterSource::default();
        source.push(TICK_1);
        source.push(TICK_2);

        let mut sensor = CpuSensor::new(source, 1);
        assert_eq!(sensor.read().unwrap(), vec![10, 10]);
        assert_eq!(sensor.read().unwrap(), vec![100, 100]);
        assert_eq!(sensor.name(), "cpu");
    }

    #[test]
    fn test_failed_read_leaves_state_alone() {
        let source = MockCounterSource::default();
        source.push(TICK_1);
        source.push_failure();
        source.push(TICK_2);

        let mut sensor = CpuSensor::new(source, 1);
        sensor.read().unwrap();
        let before = sensor.sampler().states().to_vec();

        assert!(matches!(sensor.read(), Err(SensorError::Io(_))));
        assert_eq!(sensor.sampler().states(), before.as_slice());

        assert_eq!(sensor.read().unwrap(), vec![100, 100]);
    }

    #[test]
    fn test_check_availability() {
        let source = MockCounterSource::default();
        source.push(TICK_1);
        assert!(CpuSensor::new(source, 1).check_availability().is_ok());

        let source = MockCounterSource::default();
        source.push("page 1 2\n");
        assert!(matches!(
            CpuSensor::new(source, 1).check_availability(),
            Err(SensorError::Parse { .. })
        ));

        let source = MockCounterSource::default();
        source.push_failure();
        assert!(matches!(
            CpuSensor::new(source, 1).check_availability(),
            Err(SensorError::Unavailable { .. })
        ));
    }
}
