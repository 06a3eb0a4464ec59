//! Hostname lookup on top of [embedded_nal::Dns]
//!
//! `Dns` answers a single address per query, so the unspecified family is
//! resolved as one IPv4 query followed by one IPv6 query.

use super::{debug, info, IpAddrWrap};
use crate::ClientError;
use core::fmt::Write;
use core::net::IpAddr;
use embedded_nal::nb::block;
use embedded_nal::{AddrType, Dns};

/// One answer per address family.
pub const MAX_ADDRS: usize = 2;

pub type AddrList = heapless::Vec<IpAddr, MAX_ADDRS>;

fn family_matches(addr: &IpAddr, addr_type: &AddrType) -> bool {
    match addr_type {
        AddrType::IPv4 => addr.is_ipv4(),
        AddrType::IPv6 => addr.is_ipv6(),
        AddrType::Either => true,
    }
}

/// Resolve `hostname` to the addresses allowed by `addr_type`.
///
/// Address literals are returned as-is. With [AddrType::Either] a failure of
/// one family is tolerated as long as the other one answers.
pub fn nslookup<T>(
    stack: &mut T,
    hostname: &str,
    addr_type: AddrType,
) -> Result<AddrList, ClientError<T::Error>>
where
    T: Dns + ?Sized,
{
    let mut results = AddrList::new();

    if let Ok(literal) = hostname.parse::<IpAddr>() {
        if family_matches(&literal, &addr_type) {
            // Capacity is at least one
            let _ = results.push(literal);
            return Ok(results);
        }
        return Err(ClientError::NoAddresses);
    }

    info!("DNS lookup for: {}", hostname);

    let (want_v4, want_v6) = match addr_type {
        AddrType::IPv4 => (true, false),
        AddrType::IPv6 => (false, true),
        AddrType::Either => (true, true),
    };
    let queries = [
        want_v4.then_some(AddrType::IPv4),
        want_v6.then_some(AddrType::IPv6),
    ];

    let mut last_error = None;
    let mut answered = false;
    for query in queries.into_iter().flatten() {
        match block!(stack.get_host_by_name(hostname, query.clone())) {
            Ok(ip) => {
                answered = true;
                debug!("DNS: {} -> {}", hostname, IpAddrWrap { addr: &ip });
                if family_matches(&ip, &addr_type) && !results.contains(&ip) {
                    let _ = results.push(ip);
                }
            }
            Err(e) => {
                debug!("DNS query failed for {}", hostname);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !answered => Err(ClientError::Dns(e)),
        _ if results.is_empty() => Err(ClientError::NoAddresses),
        _ => {
            info!("DNS: {} resolved to {} address(es)", hostname, results.len());
            Ok(results)
        }
    }
}

/// Write one `IPv4: ...` or `IPv6: ...` line per address.
pub fn print_addrinfo_results<W: Write + ?Sized>(out: &mut W, addrs: &[IpAddr]) -> core::fmt::Result {
    for addr in addrs {
        match addr {
            IpAddr::V4(ip) => writeln!(out, "IPv4: {}", ip)?,
            IpAddr::V6(ip) => writeln!(out, "IPv6: {}", ip)?,
        }
    }
    Ok(())
}
