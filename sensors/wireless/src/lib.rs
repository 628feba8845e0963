//! Wireless link state for rootstat: the associated network name and the
//! current bitrate of one interface.

pub mod detect;
pub mod wireless;

pub use detect::{find_wireless_interface, wireless_interfaces, InterfaceInfo};
pub use wireless::{WirelessInfo, WirelessSensor};
