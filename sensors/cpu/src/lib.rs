//! CPU usage sampling for rootstat.
//!
//! This crate turns the cumulative time counters of the kernel CPU
//! accounting table (`/proc/stat`) into per-slot utilization percentages.
//! Slot 0 is the aggregate "all cores" line and slot N is core N, so a
//! machine with N cores is tracked in N+1 slots.
//!
//! # Examples
//!
//! ```no_run
//! use rootstat_cpu::{CpuSensor, ProcStat};
//! use rootstat_core::Sensor;
//!
//! let mut sensor = CpuSensor::new(ProcStat::default(), 4);
//! let usage = sensor.read()?;
//! println!("all cores: {}%", usage[0]);
//! # Ok::<(), rootstat_core::SensorError>(())
//! ```

pub mod counters;
pub mod cpu;
pub mod sampler;
pub mod source;

pub use counters::{CounterParseError, CounterSample, CounterTable};
pub use cpu::CpuSensor;
pub use sampler::{CpuSampler, CpuState};
pub use source::{CounterSource, ProcStat};
