//! Memory usage for rootstat.
//!
//! Reads `MemTotal` and `MemAvailable` from `/proc/meminfo` and derives the
//! used amount and percentage shown on the status line.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rootstat_core::Sensor;
//! use rootstat_memory::MemorySensor;
//!
//! let mut sensor = MemorySensor::default();
//! let info = sensor.read()?;
//! println!("{}/{} MiB", info.used_mib(), info.total_mib());
//! # Ok::<(), rootstat_core::SensorError>(())
//! ```

pub mod memory;

pub use memory::{MemoryInfo, MemorySensor};
