//! Scripted in-memory network stack for unit tests.

use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use embedded_nal::{nb, AddrType, Dns, TcpClientStack, TcpError, TcpErrorKind};
use std::collections::VecDeque;
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    NotFound,
    Refused,
    OutOfSockets,
    Reset,
}

impl TcpError for MockError {
    fn kind(&self) -> TcpErrorKind {
        match self {
            MockError::Reset => TcpErrorKind::PipeClosed,
            _ => TcpErrorKind::Other,
        }
    }
}

/// One scripted result of a `receive` call.
pub enum Rx {
    Data(Vec<u8>),
    WouldBlock,
    Fail(MockError),
}

#[derive(Debug, PartialEq)]
pub struct MockSocket(pub usize);

#[derive(Default)]
pub struct MockStack {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
    /// Number of `WouldBlock` answers before each DNS query resolves.
    pub dns_pending: usize,
    pub dns_queries: usize,
    /// Answer every query with this address, whatever family was asked for.
    pub fixed_answer: Option<IpAddr>,
    pub refused: Vec<SocketAddr>,
    pub connects: Vec<SocketAddr>,
    pub max_sockets: Option<usize>,
    pub opened: usize,
    pub closed: usize,
    /// Largest number of bytes accepted by a single `send`.
    pub send_limit: Option<usize>,
    pub send_would_block: usize,
    pub send_error: Option<MockError>,
    pub sent: Vec<u8>,
    pub rx: VecDeque<Rx>,
    /// Keep answering `WouldBlock` once `rx` runs dry instead of closing.
    pub stall: bool,
}

impl MockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_v4(mut self, ip: Ipv4Addr) -> Self {
        self.v4 = Some(ip);
        self
    }

    pub fn with_v6(mut self, ip: Ipv6Addr) -> Self {
        self.v6 = Some(ip);
        self
    }

    pub fn with_response(mut self, data: &[u8]) -> Self {
        self.rx.push_back(Rx::Data(data.to_vec()));
        self
    }

    pub fn sent_str(&self) -> &str {
        core::str::from_utf8(&self.sent).unwrap()
    }
}

impl Dns for MockStack {
    type Error = MockError;

    fn get_host_by_name(&mut self, _hostname: &str, addr_type: AddrType) -> nb::Result<IpAddr, Self::Error> {
        if self.dns_pending > 0 {
            self.dns_pending -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.dns_queries += 1;
        if let Some(ip) = self.fixed_answer {
            return Ok(ip);
        }
        let answer = match addr_type {
            AddrType::IPv4 => self.v4.map(IpAddr::V4),
            AddrType::IPv6 => self.v6.map(IpAddr::V6),
            AddrType::Either => self.v4.map(IpAddr::V4).or(self.v6.map(IpAddr::V6)),
        };
        answer.ok_or(nb::Error::Other(MockError::NotFound))
    }

    fn get_host_by_address(&mut self, _addr: IpAddr, _result: &mut [u8]) -> nb::Result<usize, Self::Error> {
        Err(nb::Error::Other(MockError::NotFound))
    }
}

impl TcpClientStack for MockStack {
    type TcpSocket = MockSocket;
    type Error = MockError;

    fn socket(&mut self) -> Result<Self::TcpSocket, Self::Error> {
        if self.max_sockets.is_some_and(|max| self.opened - self.closed >= max) {
            return Err(MockError::OutOfSockets);
        }
        self.opened += 1;
        Ok(MockSocket(self.opened))
    }

    fn connect(&mut self, _socket: &mut Self::TcpSocket, remote: SocketAddr) -> nb::Result<(), Self::Error> {
        self.connects.push(remote);
        if self.refused.contains(&remote) {
            return Err(nb::Error::Other(MockError::Refused));
        }
        Ok(())
    }

    fn send(&mut self, _socket: &mut Self::TcpSocket, buffer: &[u8]) -> nb::Result<usize, Self::Error> {
        if let Some(e) = self.send_error {
            return Err(nb::Error::Other(e));
        }
        if self.send_would_block > 0 {
            self.send_would_block -= 1;
            return Err(nb::Error::WouldBlock);
        }
        let n = self.send_limit.map_or(buffer.len(), |l| l.min(buffer.len()));
        self.sent.extend_from_slice(&buffer[..n]);
        Ok(n)
    }

    fn receive(&mut self, _socket: &mut Self::TcpSocket, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
        match self.rx.pop_front() {
            Some(Rx::Data(mut data)) => {
                let n = data.len().min(buffer.len());
                buffer[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    self.rx.push_front(Rx::Data(rest));
                }
                Ok(n)
            }
            Some(Rx::WouldBlock) => Err(nb::Error::WouldBlock),
            Some(Rx::Fail(e)) => Err(nb::Error::Other(e)),
            None if self.stall => Err(nb::Error::WouldBlock),
            None => Ok(0),
        }
    }

    fn close(&mut self, _socket: Self::TcpSocket) -> Result<(), Self::Error> {
        self.closed += 1;
        Ok(())
    }
}
