//! Wireless interface discovery under `/sys/class/net`.

use rootstat_core::SensorError;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub is_up: bool,
}

/// Every wireless interface, up ones first, then by name.
///
/// An interface is wireless when the kernel exposes a `wireless` or
/// `phy80211` entry in its sysfs directory.
pub fn wireless_interfaces(net_dir: &Path) -> Result<Vec<InterfaceInfo>, SensorError> {
    let mut interfaces = Vec::new();

    for entry in fs::read_dir(net_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.join("wireless").exists() && !path.join("phy80211").exists() {
            continue;
        }

        let is_up = fs::read_to_string(path.join("operstate"))
            .map(|s| s.trim() == "up")
            .unwrap_or(false);

        interfaces.push(InterfaceInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_up,
        });
    }

    interfaces.sort_by(|a, b| b.is_up.cmp(&a.is_up).then_with(|| a.name.cmp(&b.name)));
    Ok(interfaces)
}

/// The interface most likely to be the active wireless link.
#[must_use]
pub fn find_wireless_interface(net_dir: &Path) -> Option<String> {
    wireless_interfaces(net_dir)
        .ok()?
        .into_iter()
        .next()
        .map(|iface| iface.name)
}
