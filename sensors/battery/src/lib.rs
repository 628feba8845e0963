//! Battery status and capacity monitoring for rootstat.
//!
//! The status (charging, discharging, on AC, ...) is kept current by a
//! [`BatteryMonitor`] task that sleeps on kernel power-supply events and
//! publishes into a [`StatusCell`]. The capacity is cheap to read and is
//! refreshed by the caller on every tick through [`PowerSupply`].

pub mod battery;
pub mod error;
pub mod events;
pub mod monitor;
pub mod types;

pub use battery::{get_battery_status, PowerSupply, StatusProbe};
pub use error::BatteryError;
pub use events::{EventSource, Subscription, UeventSource};
pub use monitor::{BatteryMonitor, MonitorState};
pub use types::{BatteryReading, BatteryStatus, StatusCell};
