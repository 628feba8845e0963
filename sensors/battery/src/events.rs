//! Power-supply change notifications.
//!
//! The kernel broadcasts a uevent on a netlink socket whenever a power
//! supply changes state (cable plugged, charge finished, ...). The monitor
//! only needs to know *that* something changed; it re-reads the status
//! files itself.

use crate::error::BatteryError;
use async_trait::async_trait;
use nix::sys::socket::{
    bind, recv, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType,
};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, trace};

/// Multicast group the kernel itself sends uevents to.
const KERNEL_UEVENT_GROUP: u32 = 1;

/// Large enough for any single uevent message.
const UEVENT_BUFFER_SIZE: usize = 8192;

const POWER_SUPPLY_MATCH: &[u8] = b"SUBSYSTEM=power_supply";

/// A stream of "the power supply changed" notifications.
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Wait for the next notification.
    ///
    /// [`BatteryError::Overflow`] means notifications were dropped; the
    /// source itself is still usable.
    async fn next_event(&mut self) -> Result<(), BatteryError>;

    /// Release the underlying resource. Called exactly once, by
    /// [`Subscription`], when the subscription ends.
    fn unsubscribe(&mut self);
}

/// Owns an [`EventSource`] for as long as the monitor is interested in it.
///
/// Dropping the subscription releases the source on every exit path,
/// including early returns and panics in the owning task.
#[derive(Debug)]
pub struct Subscription<S: EventSource> {
    source: S,
}

impl<S: EventSource> Subscription<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn next_event(&mut self) -> Result<(), BatteryError> {
        self.source.next_event().await
    }
}

impl<S: EventSource> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.source.unsubscribe();
    }
}

/// Kernel uevents filtered down to the `power_supply` subsystem.
#[derive(Debug)]
pub struct UeventSource {
    socket: Option<AsyncFd<OwnedFd>>,
    buf: Box<[u8]>,
}

impl UeventSource {
    /// Open and bind the uevent socket.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe() -> Result<Self, BatteryError> {
        let fd = socket(
            AddressFamily::Netlink,
            SockType::Datagram,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
            SockProtocol::NetlinkKObjectUEvent,
        )?;
        bind(fd.as_raw_fd(), &NetlinkAddr::new(0, KERNEL_UEVENT_GROUP))?;
        let socket = AsyncFd::try_with_interest(fd, Interest::READABLE)
            .map_err(|e| BatteryError::subscription(e.into_parts().1.to_string()))?;

        debug!("subscribed to power_supply uevents");
        Ok(Self {
            socket: Some(socket),
            buf: vec![0; UEVENT_BUFFER_SIZE].into_boxed_slice(),
        })
    }
}

#[async_trait]
impl EventSource for UeventSource {
    async fn next_event(&mut self) -> Result<(), BatteryError> {
        let Self { socket, buf } = self;
        let socket = socket
            .as_ref()
            .ok_or_else(|| BatteryError::subscription("uevent socket already released"))?;

        loop {
            let mut guard = socket.readable().await?;
            let received = guard.try_io(|inner| {
                recv(inner.get_ref().as_raw_fd(), buf, MsgFlags::MSG_DONTWAIT)
                    .map_err(io::Error::from)
            });

            match received {
                Ok(Ok(len)) => {
                    if is_power_supply_event(&buf[..len]) {
                        trace!(len, "power_supply uevent");
                        return Ok(());
                    }
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                Ok(Err(e)) => return Err(e.into()),
                // Spurious wakeup, readiness was cleared.
                Err(_would_block) => {}
            }
        }
    }

    fn unsubscribe(&mut self) {
        if self.socket.take().is_some() {
            debug!("unsubscribed from power_supply uevents");
        }
    }
}

/// Whether a raw uevent payload concerns a power supply.
///
/// Payloads are a header followed by NUL-separated `KEY=value` pairs.
#[must_use]
pub fn is_power_supply_event(payload: &[u8]) -> bool {
    payload
        .split(|&b| b == 0)
        .any(|field| field == POWER_SUPPLY_MATCH)
}
