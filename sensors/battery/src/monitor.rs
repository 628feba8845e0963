//! Background task keeping the battery status current.
//!
//! The task sleeps on power-supply events instead of polling. After an event
//! it waits for the hardware to settle before reading the status, because
//! the kernel signals a cable change before the battery reports its new
//! state. When only the AC adapter is readable it reads once more after a
//! second, since the adapter flips before the battery driver catches up.
//!
//! A failed wait never ends the task. Lost events are handled like an
//! event; any other failure is retried after a growing delay.

use crate::battery::{PowerSupply, StatusProbe};
use crate::error::BatteryError;
use crate::events::{EventSource, Subscription, UeventSource};
use crate::types::{BatteryReading, BatteryStatus, StatusCell};
use rootstat_core::{Shutdown, ShutdownListener};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

/// Delay between an event and the first status read.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Extra delay before re-reading a status that came from the AC adapter.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single wait for events. Expiry is not an event.
pub const EVENT_WAIT_TIMEOUT: Duration = Duration::from_secs(9 * 60);

/// First delay before waiting again after a failed wait.
pub const WAIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Longest delay between two failed waits.
pub const MAX_WAIT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// What the background task is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MonitorState {
    /// Waiting for a power-supply event
    Idle = 0,
    /// Sleeping before (re-)reading the status
    Debouncing = 1,
    /// The task has exited and released its subscription
    Stopped = 2,
}

impl MonitorState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Debouncing,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(MonitorState::Idle as u8)))
    }

    fn set(&self, state: MonitorState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> MonitorState {
        MonitorState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Handle to the battery monitor task.
///
/// Dropping the handle without calling [`BatteryMonitor::stop`] still ends
/// the task at its next wait, but nothing waits for it to finish.
#[derive(Debug)]
pub struct BatteryMonitor {
    cell: StatusCell,
    state: SharedState,
    stop: Shutdown,
    task: JoinHandle<()>,
}

impl BatteryMonitor {
    /// Read the status once, publish it, then start watching for changes.
    ///
    /// The initial read happens before this returns, so [`read`](Self::read)
    /// is meaningful immediately. `subscribe` runs on the background task,
    /// which reads the status once more as soon as it is subscribed. If
    /// subscribing fails the error is logged and the cell keeps the initial
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<P, S, F>(cell: StatusCell, probe: P, subscribe: F) -> Self
    where
        P: StatusProbe,
        S: EventSource,
        F: FnOnce() -> Result<S, BatteryError> + Send + 'static,
    {
        refresh(&probe, &cell);

        let stop = Shutdown::new();
        let state = SharedState::new();
        let task = tokio::spawn(run(
            subscribe,
            probe,
            cell.clone(),
            stop.listener(),
            state.clone(),
        ));

        Self {
            cell,
            state,
            stop,
            task,
        }
    }

    /// Watch `supply` through kernel uevents.
    pub fn start_uevent(cell: StatusCell, supply: PowerSupply) -> Self {
        Self::start(cell, supply, UeventSource::subscribe)
    }

    /// Current battery reading. Never blocks on the monitor task.
    #[must_use]
    pub fn read(&self) -> BatteryReading {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn status(&self) -> BatteryStatus {
        self.cell.status()
    }

    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.state.get()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the task to exit and wait until it has.
    ///
    /// A wait for events is interrupted at once. A debounce already in
    /// progress runs to completion first, so this can take up to
    /// [`DEBOUNCE_DELAY`] plus [`SETTLE_DELAY`].
    pub async fn stop(self) {
        self.stop.trigger();
        if let Err(e) = self.task.await {
            error!("battery monitor task failed: {e}");
        }
    }
}

fn refresh(probe: &impl StatusProbe, cell: &StatusCell) -> BatteryStatus {
    let status = probe.read_status();
    cell.set_status(status);
    status
}

async fn run<P, S, F>(
    subscribe: F,
    probe: P,
    cell: StatusCell,
    mut stop: ShutdownListener,
    state: SharedState,
) where
    P: StatusProbe,
    S: EventSource,
    F: FnOnce() -> Result<S, BatteryError>,
{
    let mut subscription = match subscribe() {
        Ok(source) => Subscription::new(source),
        Err(e) => {
            error!("battery monitor disabled, cannot subscribe to power supply events: {e}");
            state.set(MonitorState::Stopped);
            return;
        }
    };

    // A change between the initial read and the subscription sent no event.
    refresh(&probe, &cell);

    let mut retry_delay = WAIT_RETRY_DELAY;
    loop {
        state.set(MonitorState::Idle);

        let waited = tokio::select! {
            biased;
            () = stop.triggered() => break,
            waited = time::timeout(EVENT_WAIT_TIMEOUT, subscription.next_event()) => waited,
        };

        match waited {
            Err(_elapsed) => continue,
            Ok(Ok(())) => retry_delay = WAIT_RETRY_DELAY,
            Ok(Err(e)) if e.is_overflow() => warn!("power supply events lost, re-reading status"),
            Ok(Err(e)) => {
                warn!(
                    category = e.category(),
                    retry_in = ?retry_delay,
                    "power supply event wait failed: {e}"
                );
                tokio::select! {
                    biased;
                    () = stop.triggered() => break,
                    () = time::sleep(retry_delay) => {}
                }
                retry_delay = (retry_delay * 2).min(MAX_WAIT_RETRY_DELAY);
                continue;
            }
        }

        state.set(MonitorState::Debouncing);
        time::sleep(DEBOUNCE_DELAY).await;
        let status = refresh(&probe, &cell);
        debug!(%status, "battery status after event");

        if status == BatteryStatus::OnAc {
            time::sleep(SETTLE_DELAY).await;
            let status = refresh(&probe, &cell);
            debug!(%status, "battery status after settling");
        }
    }

    drop(subscription);
    state.set(MonitorState::Stopped);
    info!("battery monitor stopped");
}
