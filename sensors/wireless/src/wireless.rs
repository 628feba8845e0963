//! ESSID and bitrate through the Linux wireless-extension ioctls.

use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use rootstat_core::{Sensor, SensorError};
use std::ffi::c_char;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use tracing::trace;

const IFNAMSIZ: usize = libc::IFNAMSIZ;
const IW_ESSID_MAX_SIZE: usize = 32;

const SIOCGIWESSID: u32 = 0x8B1B;
const SIOCGIWRATE: u32 = 0x8B21;

// Kernel ABI mirrors; not every field is read back.

/// `struct iw_point`: a variable-length payload living in user memory.
#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy)]
struct IwPoint {
    pointer: *mut libc::c_void,
    length: u16,
    flags: u16,
}

/// `struct iw_param`: a generic scalar value.
#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy)]
struct IwParam {
    value: i32,
    fixed: u8,
    disabled: u8,
    flags: u16,
}

#[allow(dead_code)]
#[repr(C)]
union IwReqData {
    essid: IwPoint,
    bitrate: IwParam,
    name: [c_char; IFNAMSIZ],
}

/// `struct iwreq`
#[allow(dead_code)]
#[repr(C)]
struct IwReq {
    ifr_name: [c_char; IFNAMSIZ],
    u: IwReqData,
}

impl IwReq {
    fn new(ifr_name: [c_char; IFNAMSIZ]) -> Self {
        Self {
            ifr_name,
            u: IwReqData {
                name: [0; IFNAMSIZ],
            },
        }
    }
}

/// Link details of a wireless interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WirelessInfo {
    /// Network name; empty when not associated or unreadable
    pub essid: String,
    /// Current bitrate in bits per second
    pub bitrate: Option<u64>,
}

/// Queries one wireless interface on every read.
#[derive(Debug, Clone)]
pub struct WirelessSensor {
    interface: String,
    ifr_name: [c_char; IFNAMSIZ],
    net_dir: PathBuf,
}

impl WirelessSensor {
    /// # Errors
    ///
    /// Returns [`SensorError::Config`] if the name is empty, contains a NUL
    /// byte or does not fit the kernel's interface name buffer.
    pub fn new(interface: impl Into<String>) -> Result<Self, SensorError> {
        let interface = interface.into();
        let ifr_name = encode_ifname(&interface)?;
        Ok(Self {
            interface,
            ifr_name,
            net_dir: PathBuf::from("/sys/class/net"),
        })
    }

    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Look the interface up below `net_dir` instead of `/sys/class/net`.
    #[must_use]
    pub fn with_net_dir(mut self, net_dir: impl Into<PathBuf>) -> Self {
        self.net_dir = net_dir.into();
        self
    }

    fn open_socket() -> Result<OwnedFd, SensorError> {
        socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(|e| SensorError::Io(e.into()))
    }

    fn essid(&self, fd: &OwnedFd) -> Option<String> {
        let mut buf = [0u8; IW_ESSID_MAX_SIZE + 1];
        let mut req = IwReq::new(self.ifr_name);
        req.u.essid = IwPoint {
            pointer: buf.as_mut_ptr().cast(),
            length: buf.len() as u16,
            flags: 0,
        };

        // SAFETY: `req` is a properly laid out `struct iwreq` whose payload
        // pointer refers to `buf`, which outlives the call and is as long as
        // the length the kernel is told.
        let rc = unsafe {
            libc::ioctl(fd.as_raw_fd(), SIOCGIWESSID as _, &mut req as *mut IwReq)
        };
        if rc < 0 {
            trace!(interface = %self.interface, "SIOCGIWESSID failed");
            return None;
        }

        // SAFETY: the kernel filled in the `essid` member of the union.
        let length = usize::from(unsafe { req.u.essid.length }).min(IW_ESSID_MAX_SIZE);
        Some(decode_essid(&buf[..length]))
    }

    fn bitrate(&self, fd: &OwnedFd) -> Option<u64> {
        let mut req = IwReq::new(self.ifr_name);

        // SAFETY: `req` is a properly laid out `struct iwreq`; the kernel only
        // writes into its `bitrate` member.
        let rc = unsafe {
            libc::ioctl(fd.as_raw_fd(), SIOCGIWRATE as _, &mut req as *mut IwReq)
        };
        if rc < 0 {
            trace!(interface = %self.interface, "SIOCGIWRATE failed");
            return None;
        }

        // SAFETY: the kernel filled in the `bitrate` member of the union.
        let param = unsafe { req.u.bitrate };
        if param.disabled != 0 {
            return None;
        }
        u64::try_from(param.value).ok()
    }
}

impl Sensor for WirelessSensor {
    type Reading = WirelessInfo;
    type Error = SensorError;

    fn read(&mut self) -> Result<WirelessInfo, SensorError> {
        let fd = Self::open_socket()?;
        Ok(WirelessInfo {
            essid: self.essid(&fd).unwrap_or_default(),
            bitrate: self.bitrate(&fd),
        })
    }

    fn name(&self) -> &str {
        &self.interface
    }

    fn check_availability(&self) -> Result<(), SensorError> {
        let iface = self.net_dir.join(&self.interface);
        if !iface.exists() {
            return Err(SensorError::temporarily_unavailable(format!(
                "Interface {} not found",
                self.interface
            )));
        }
        if !is_wireless(&iface) {
            return Err(SensorError::unavailable(format!(
                "Interface {} is not a wireless interface",
                self.interface
            )));
        }
        Self::open_socket().map(drop)
    }
}

fn is_wireless(iface_dir: &Path) -> bool {
    iface_dir.join("wireless").exists() || iface_dir.join("phy80211").exists()
}

fn encode_ifname(interface: &str) -> Result<[c_char; IFNAMSIZ], SensorError> {
    let bytes = interface.as_bytes();
    if bytes.is_empty() || bytes.len() >= IFNAMSIZ || bytes.contains(&0) {
        return Err(SensorError::config_with_value(
            "Invalid network interface name",
            interface,
        ));
    }

    let mut name = [0 as c_char; IFNAMSIZ];
    for (dst, &src) in name.iter_mut().zip(bytes) {
        *dst = src as c_char;
    }
    Ok(name)
}

/// Older drivers count a trailing NUL in the reported length.
fn decode_essid(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
