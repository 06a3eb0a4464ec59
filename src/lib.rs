//! Resolve, connect and fetch over `embedded-nal` stacks
//!
//! The four steps of fetching a page from a small device:
//! [dns::nslookup], [dns::print_addrinfo_results], [connect::connect_socket]
//! and [http_client::http_get]. Every step is generic over the
//! [embedded_nal::Dns] and [embedded_nal::TcpClientStack] traits, so the same
//! code drives a hosted stack or a Wifi module driver.
//!
//! ```no_run
//! # use netfetch::{connect::connect_socket, dns::nslookup, http_client::*};
//! # use embedded_nal::AddrType;
//! # let mut stack = std_embedded_nal::Stack::default();
//! let addrs = nslookup(&mut stack, "example.com", AddrType::Either).unwrap();
//! let mut sock = connect_socket(&mut stack, &addrs, 80).unwrap();
//! http_get(&mut stack, &mut sock, "example.com", "/", || 0, |rsp, _| {
//!     let _ = rsp.body_frag();
//! })
//! .unwrap();
//! ```
#![no_std]
// Dual logging system compatibility: defmt doesn't support modern format syntax
#![allow(clippy::uninlined_format_args)]

#[cfg(any(test, feature = "std"))]
extern crate std;

// Compile-time checks for logging features
#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features 'defmt' and 'log' are mutually exclusive. Enable only one for logging.");

#[cfg(not(any(feature = "defmt", feature = "log")))]
compile_error!("Must enable either 'defmt' or 'log' feature for logging support.");

#[cfg(feature = "defmt")]
use defmt::{debug, error, info, trace};

#[cfg(feature = "log")]
use log::{debug, error, info, trace};

pub mod connect;
pub mod dns;
pub mod errors;
pub mod http_client;

#[cfg(test)]
mod test_stack;

pub use errors::ClientError;

/// Log-friendly view of an address, usable from both logging backends.
#[derive(Debug)]
struct IpAddrWrap<'a> {
    addr: &'a core::net::IpAddr,
}

#[derive(Debug)]
struct SocketAddrWrap<'a> {
    addr: &'a core::net::SocketAddr,
}

#[cfg(feature = "log")]
impl core::fmt::Display for IpAddrWrap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self.addr, f)
    }
}

#[cfg(feature = "log")]
impl core::fmt::Display for SocketAddrWrap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self.addr, f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IpAddrWrap<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match self.addr {
            core::net::IpAddr::V4(ip) => {
                let o = ip.octets();
                defmt::write!(fmt, "{=u8}.{=u8}.{=u8}.{=u8}", o[0], o[1], o[2], o[3]);
            }
            core::net::IpAddr::V6(ip) => {
                let s = ip.segments();
                defmt::write!(
                    fmt,
                    "{=u16:x}:{=u16:x}:{=u16:x}:{=u16:x}:{=u16:x}:{=u16:x}:{=u16:x}:{=u16:x}",
                    s[0],
                    s[1],
                    s[2],
                    s[3],
                    s[4],
                    s[5],
                    s[6],
                    s[7]
                );
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SocketAddrWrap<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        let ip = self.addr.ip();
        match self.addr {
            core::net::SocketAddr::V4(_) => {
                defmt::write!(fmt, "{}:{}", IpAddrWrap { addr: &ip }, self.addr.port())
            }
            core::net::SocketAddr::V6(_) => {
                defmt::write!(fmt, "[{}]:{}", IpAddrWrap { addr: &ip }, self.addr.port())
            }
        }
    }
}
