//! Stateful conversion of cumulative counters into usage percentages.

use crate::counters::CounterTable;
use tracing::trace;

/// What the sampler remembers about one slot between ticks.
///
/// Starts zeroed, so the first tick reports usage averaged since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuState {
    pub idle_total: u64,
    pub nonidle_total: u64,
    pub last_pct: u8,
}

/// Tracks N cores plus the aggregate slot and computes the busy fraction
/// since the previous sample for each of them.
///
/// Nothing is clamped. Counters that go backwards (wraparound, a
/// hot-unplugged core) produce an out-of-range value.
#[derive(Debug, Clone)]
pub struct CpuSampler {
    states: Vec<CpuState>,
}

impl CpuSampler {
    #[must_use]
    pub fn new(core_count: usize) -> Self {
        Self {
            states: vec![CpuState::default(); core_count + 1],
        }
    }

    /// Number of tracked slots (cores plus the aggregate).
    #[must_use]
    pub fn slots(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn core_count(&self) -> usize {
        self.states.len() - 1
    }

    #[must_use]
    pub fn states(&self) -> &[CpuState] {
        &self.states
    }

    /// The most recent percentage of every slot.
    #[must_use]
    pub fn percentages(&self) -> Vec<u8> {
        self.states.iter().map(|state| state.last_pct).collect()
    }

    /// Fold one tick of counters into the state and return the percentages.
    ///
    /// Slots without a parsed sample keep their state untouched. When a
    /// slot's counters have not advanced at all, this tick and every slot
    /// after it keep their previous percentages: there is no new data yet.
    pub fn sample(&mut self, table: &CounterTable) -> Vec<u8> {
        for (slot, state) in self.states.iter_mut().enumerate() {
            let Some(sample) = table.get(slot) else {
                trace!(slot, "no usable counters, keeping previous state");
                continue;
            };

            let idle = sample.idle_all();
            let nonidle = sample.nonidle_all();
            let total = idle.wrapping_add(nonidle);
            let prev_total = state.idle_total.wrapping_add(state.nonidle_total);

            if total == prev_total {
                trace!(slot, "counters have not advanced");
                break;
            }

            state.last_pct = busy_percent(total, prev_total, idle, state.idle_total);
            state.idle_total = idle;
            state.nonidle_total = nonidle;
        }

        self.percentages()
    }
}

/// `(busy delta * 100) / total delta`, where the busy delta is the total
/// delta minus the idle delta. `total != prev_total` is required.
fn busy_percent(total: u64, prev_total: u64, idle: u64, prev_idle: u64) -> u8 {
    let busy = total
        .wrapping_add(prev_idle)
        .wrapping_sub(prev_total.wrapping_add(idle));
    let elapsed = total.wrapping_sub(prev_total);
    (busy.wrapping_mul(100) / elapsed) as u8
}
