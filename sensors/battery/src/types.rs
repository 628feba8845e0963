//! Battery status values and the cell they are published through.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Status of the power supply, shown as a single character.
///
/// The first five mirror the battery's own `status` file. The last two come
/// from the AC adapter when the battery cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    #[default]
    Unknown,
    /// No readable battery, mains power present
    OnAc,
    /// No readable battery, mains power absent
    OnBattery,
}

impl BatteryStatus {
    /// Map the first byte of the battery `status` file.
    ///
    /// Anything the kernel may add later reads as [`BatteryStatus::Unknown`].
    #[must_use]
    pub const fn from_status_byte(byte: u8) -> Self {
        match byte {
            b'C' => Self::Charging,
            b'D' => Self::Discharging,
            b'F' => Self::Full,
            b'N' => Self::NotCharging,
            _ => Self::Unknown,
        }
    }

    /// Map the first byte of the AC adapter `online` file.
    #[must_use]
    pub const fn from_online_byte(byte: u8) -> Self {
        match byte {
            b'1' => Self::OnAc,
            b'0' => Self::OnBattery,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Charging => 'C',
            Self::Discharging | Self::OnBattery => 'D',
            Self::Full => 'F',
            Self::NotCharging => 'N',
            Self::Unknown => 'U',
            Self::OnAc => 'A',
        }
    }

    /// Lowercase name, used as a CSS class by the Waybar output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Discharging => "discharging",
            Self::Full => "full",
            Self::NotCharging => "not-charging",
            Self::Unknown => "unknown",
            Self::OnAc => "ac",
            Self::OnBattery => "on-battery",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Everything the status line shows about the battery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatteryReading {
    pub status: BatteryStatus,
    /// Capacity percent as the kernel printed it, up to three digits
    pub capacity: Option<String>,
}

/// Shared, lock-protected battery reading.
///
/// The monitor task writes the status and the sampling loop writes the
/// capacity; readers always get both fields from one consistent snapshot.
/// Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct StatusCell {
    inner: Arc<RwLock<BatteryReading>>,
}

impl StatusCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> BatteryReading {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn status(&self) -> BatteryStatus {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    pub fn set_status(&self, status: BatteryStatus) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status;
    }

    pub fn set_capacity(&self, capacity: Option<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity = capacity;
    }

    /// Replace the whole reading at once.
    pub fn store(&self, reading: BatteryReading) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = reading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_status_bytes() {
        assert_eq!(BatteryStatus::from_status_byte(b'C'), BatteryStatus::Charging);
        assert_eq!(BatteryStatus::from_status_byte(b'D'), BatteryStatus::Discharging);
        assert_eq!(BatteryStatus::from_status_byte(b'F'), BatteryStatus::Full);
        assert_eq!(BatteryStatus::from_status_byte(b'N'), BatteryStatus::NotCharging);
        assert_eq!(BatteryStatus::from_status_byte(b'U'), BatteryStatus::Unknown);
        assert_eq!(BatteryStatus::from_status_byte(b'x'), BatteryStatus::Unknown);
    }

    #[test]
    fn test_online_bytes() {
        assert_eq!(BatteryStatus::from_online_byte(b'1'), BatteryStatus::OnAc);
        assert_eq!(BatteryStatus::from_online_byte(b'0'), BatteryStatus::OnBattery);
        assert_eq!(BatteryStatus::from_online_byte(b'2'), BatteryStatus::Unknown);
    }

    #[test]
    fn test_codes() {
        assert_eq!(BatteryStatus::OnAc.to_string(), "A");
        assert_eq!(BatteryStatus::OnBattery.to_string(), "D");
        assert_eq!(BatteryStatus::Discharging.to_string(), "D");
        assert_eq!(BatteryStatus::default().to_string(), "U");
    }

    #[test]
    fn test_cell_fields_are_independent() {
        let cell = StatusCell::new();
        cell.set_capacity(Some("87".to_owned()));
        cell.set_status(BatteryStatus::Charging);

        let other = cell.clone();
        other.set_status(BatteryStatus::Full);

        assert_eq!(
            cell.snapshot(),
            BatteryReading {
                status: BatteryStatus::Full,
                capacity: Some("87".to_owned()),
            }
        );
    }

    #[test]
    fn test_concurrent_readers_see_whole_writes() {
        let cell = StatusCell::new();
        let pairs = [
            (BatteryStatus::Charging, "11"),
            (BatteryStatus::Discharging, "22"),
            (BatteryStatus::Full, "100"),
        ];
        cell.store(BatteryReading {
            status: pairs[0].0,
            capacity: Some(pairs[0].1.to_owned()),
        });

        let done = AtomicBool::new(false);
        thread::scope(|scope| {
            let writer = scope.spawn(|| {
                for i in 0..5000 {
                    let (status, capacity) = pairs[i % pairs.len()];
                    cell.store(BatteryReading {
                        status,
                        capacity: Some(capacity.to_owned()),
                    });
                }
                done.store(true, Ordering::Release);
            });

            for _ in 0..2 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let reading = cell.snapshot();
                        assert!(pairs.iter().any(|(status, capacity)| {
                            reading.status == *status
                                && reading.capacity.as_deref() == Some(*capacity)
                        }));
                    }
                });
            }

            writer.join().unwrap();
        });
    }
}
