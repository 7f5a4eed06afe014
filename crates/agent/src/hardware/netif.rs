//! IPv4 address lookup through `getifaddrs(3)`.

use std::ffi::CStr;
use std::net::Ipv4Addr;

use super::AddressSource;

pub struct InterfaceAddress {
    iface: String,
}

impl InterfaceAddress {
    pub fn new(iface: impl Into<String>) -> Self {
        Self {
            iface: iface.into(),
        }
    }
}

impl AddressSource for InterfaceAddress {
    fn ipv4(&self) -> Option<Ipv4Addr> {
        let addr = first_ipv4(&self.iface);
        if addr.is_none() {
            tracing::debug!(iface = %self.iface, "Interface has no IPv4 address");
        }
        addr
    }
}

/// First IPv4 address bound to `iface`, if any.
fn first_ipv4(iface: &str) -> Option<Ipv4Addr> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();

    // Safety: getifaddrs initialises `head` on success; the list is freed
    // below with freeifaddrs and not used afterwards.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        tracing::warn!(
            error = %std::io::Error::last_os_error(),
            "getifaddrs failed",
        );
        return None;
    }

    let mut found = None;
    let mut cursor = head;
    while !cursor.is_null() {
        // Safety: `cursor` is a non-null node of the list returned above.
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_name.is_null() || entry.ifa_addr.is_null() {
            continue;
        }
        // Safety: ifa_name is a NUL-terminated string owned by the list.
        let name = unsafe { CStr::from_ptr(entry.ifa_name) };
        if name.to_bytes() != iface.as_bytes() {
            continue;
        }
        // Safety: ifa_addr is non-null; the family tells us the concrete type.
        let family = unsafe { (*entry.ifa_addr).sa_family };
        if i32::from(family) != libc::AF_INET {
            continue;
        }
        // Safety: AF_INET addresses are `sockaddr_in`.
        let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
        found = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
        break;
    }

    // Safety: `head` came from a successful getifaddrs call.
    unsafe { libc::freeifaddrs(head) };
    found
}
