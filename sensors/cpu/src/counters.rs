//! Counter tuples read from the kernel CPU accounting table.
//!
//! see `proc_stat(5)`: each `cpu` line carries the time, in clock ticks, that
//! the system (or one core) spent in each state since boot.

use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Cumulative time counters of one slot.
///
/// All values are in "jiffies" (clock ticks) since boot and only grow under
/// normal operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSample {
    /// Time spent in user mode (normal processes)
    pub user: u64,
    /// Time spent in user mode with low priority (nice)
    pub nice: u64,
    /// Time spent in system mode (kernel)
    pub system: u64,
    /// Time spent idle
    pub idle: u64,
    /// Time waiting for I/O to complete
    pub iowait: u64,
    /// Time servicing hardware interrupts
    pub irq: u64,
    /// Time servicing software interrupts
    pub softirq: u64,
    /// Time stolen by virtualization
    pub steal: u64,
    /// Time spent running a virtual CPU for a guest
    pub guest: u64,
    /// Time spent running a niced guest
    pub guest_nice: u64,
}

/// A `cpu` line that could not be turned into a [`CounterSample`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CounterParseError {
    #[error("not a cpu line: {line:?}")]
    NotACpuLine { line: String },
    #[error("expected between {min} and {max} counters, found {found}")]
    FieldCount {
        found: usize,
        min: usize,
        max: usize,
    },
    #[error("invalid counter value: {source}")]
    InvalidField {
        #[from]
        source: std::num::ParseIntError,
    },
}

impl CounterSample {
    /// Fewest counters a kernel has ever reported (user, nice, system, idle).
    pub const MIN_FIELDS: usize = 4;
    /// Counters reported by current kernels.
    pub const MAX_FIELDS: usize = 10;

    /// Kernel time including interrupt servicing.
    #[must_use]
    pub const fn system_all(&self) -> u64 {
        self.system.wrapping_add(self.irq).wrapping_add(self.softirq)
    }

    /// Time spent running guests.
    #[must_use]
    pub const fn virtual_all(&self) -> u64 {
        self.guest.wrapping_add(self.guest_nice)
    }

    /// Idle time including time blocked on I/O.
    #[must_use]
    pub const fn idle_all(&self) -> u64 {
        self.idle.wrapping_add(self.iowait)
    }

    /// Every non-idle state.
    #[must_use]
    pub const fn nonidle_all(&self) -> u64 {
        self.user
            .wrapping_add(self.nice)
            .wrapping_add(self.system_all())
            .wrapping_add(self.steal)
            .wrapping_add(self.virtual_all())
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.nonidle_all().wrapping_add(self.idle_all())
    }
}

impl FromStr for CounterSample {
    type Err = CounterParseError;

    /// Parse one `cpu`/`cpuN` line. Counters missing on older kernels read
    /// as zero; anything else out of place rejects the whole line.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(label) if label.starts_with("cpu") => {}
            _ => {
                return Err(CounterParseError::NotACpuLine {
                    line: line.to_owned(),
                })
            }
        }

        let values = tokens
            .map(str::parse::<u64>)
            .collect::<Result<Vec<_>, _>>()?;

        if !(Self::MIN_FIELDS..=Self::MAX_FIELDS).contains(&values.len()) {
            return Err(CounterParseError::FieldCount {
                found: values.len(),
                min: Self::MIN_FIELDS,
                max: Self::MAX_FIELDS,
            });
        }

        let field = |i: usize| values.get(i).copied().unwrap_or(0);
        Ok(Self {
            user: field(0),
            nice: field(1),
            system: field(2),
            idle: field(3),
            iowait: field(4),
            irq: field(5),
            softirq: field(6),
            steal: field(7),
            guest: field(8),
            guest_nice: field(9),
        })
    }
}

/// One tick's worth of counter tuples, indexed by slot.
///
/// Lines are taken positionally from the top of the table. A slot whose
/// line is missing or malformed holds `None` and is skipped by the sampler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterTable {
    slots: Vec<Option<CounterSample>>,
}

impl CounterTable {
    /// Parse the first `slots` lines of an accounting table.
    #[must_use]
    pub fn parse(content: &str, slots: usize) -> Self {
        let mut lines = content.lines();
        let slots = (0..slots)
            .map(|slot| {
                let line = lines.next()?;
                match line.parse::<CounterSample>() {
                    Ok(sample) => Some(sample),
                    Err(error) => {
                        warn!(slot, %error, "skipping malformed counter line");
                        None
                    }
                }
            })
            .collect();
        Self { slots }
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&CounterSample> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<Option<CounterSample>> for CounterTable {
    fn from_iter<I: IntoIterator<Item = Option<CounterSample>>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // the two examples provided in the `proc_stat(5)` man page.
    const EXAMPLE_1: &str = "cpu 10132153 290696 3084719 46828483 16683 0 25195 0 175628 0";
    const EXAMPLE_2: &str = "cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0";

    #[test]
    fn test_parse_full_line() {
        let sample: CounterSample = EXAMPLE_1.parse().unwrap();
        assert_eq!(sample.user, 10132153);
        assert_eq!(sample.nice, 290696);
        assert_eq!(sample.system, 3084719);
        assert_eq!(sample.idle, 46828483);
        assert_eq!(sample.iowait, 16683);
        assert_eq!(sample.softirq, 25195);
        assert_eq!(sample.guest, 175628);
        assert_eq!(sample.guest_nice, 0);
    }

    #[test]
    fn test_parse_core_line_with_double_space() {
        let sample: CounterSample = EXAMPLE_2.parse().unwrap();
        assert_eq!(sample.user, 1393280);

        let padded: CounterSample = "cpu  1 2 3 4 5 6 7 8 9 10".parse().unwrap();
        assert_eq!(padded.guest_nice, 10);
    }

    #[test]
    fn test_parse_old_kernel_line() {
        let sample: CounterSample = "cpu 100 200 300 400".parse().unwrap();
        assert_eq!(sample.idle, 400);
        assert_eq!(sample.iowait, 0);
        assert_eq!(sample.guest_nice, 0);
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(matches!(
            "intr 1462898".parse::<CounterSample>(),
            Err(CounterParseError::NotACpuLine { .. })
        ));
        assert!(matches!(
            "cpu 1 2 3".parse::<CounterSample>(),
            Err(CounterParseError::FieldCount { found: 3, .. })
        ));
        assert!(matches!(
            "cpu 1 2 3 4 5 6 7 8 9 10 11".parse::<CounterSample>(),
            Err(CounterParseError::FieldCount { found: 11, .. })
        ));
        assert!(matches!(
            "cpu 1 2 x 4".parse::<CounterSample>(),
            Err(CounterParseError::InvalidField { .. })
        ));
        assert!(matches!(
            "".parse::<CounterSample>(),
            Err(CounterParseError::NotACpuLine { .. })
        ));
    }

    #[test]
    fn test_aggregates() {
        let sample = CounterSample {
            user: 1,
            nice: 2,
            system: 3,
            idle: 4,
            iowait: 5,
            irq: 6,
            softirq: 7,
            steal: 8,
            guest: 9,
            guest_nice: 10,
        };
        assert_eq!(sample.system_all(), 16);
        assert_eq!(sample.virtual_all(), 19);
        assert_eq!(sample.idle_all(), 9);
        assert_eq!(sample.nonidle_all(), 1 + 2 + 16 + 8 + 19);
        assert_eq!(sample.total(), 46 + 9);
    }

    #[test]
    fn test_table_marks_bad_and_missing_slots() {
        let content = format!("{EXAMPLE_1}\ncpu0 garbage\n{EXAMPLE_2}\n");
        let table = CounterTable::parse(&content, 4);

        assert_eq!(table.len(), 4);
        assert!(table.get(0).is_some());
        assert!(table.get(1).is_none());
        assert!(table.get(2).is_some());
        assert!(table.get(3).is_none());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_table_stops_at_requested_slots() {
        let content = format!("{EXAMPLE_1}\n{EXAMPLE_2}\nintr 1462898\n");
        let table = CounterTable::parse(&content, 1);
        assert_eq!(table.len(), 1);
    }
}
