use core::fmt;

pub use crate::http_client::ResponseError;

/// Failure of one of the fetch steps, generic over the network stack error `E`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq)]
pub enum ClientError<E> {
    /// Every DNS query failed, carries the last stack error.
    Dns(E),
    /// Lookup succeeded but produced nothing usable, or nothing to connect to.
    NoAddresses,
    SocketCreation(E),
    /// Every address refused the connection, carries the last stack error.
    Connect(E),
    Send(E),
    Receive(E),
    Timeout,
    /// The request was given an empty receive buffer.
    BufferTooSmall,
    /// Peer closed before the response framing was satisfied.
    ConnectionClosed,
    InvalidResponse(ResponseError),
}

impl<E> From<ResponseError> for ClientError<E> {
    fn from(inner: ResponseError) -> Self {
        Self::InvalidResponse(inner)
    }
}

impl<E: fmt::Debug> fmt::Display for ClientError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(e) => write!(f, "DNS lookup failed: {:?}", e),
            Self::NoAddresses => write!(f, "no addresses"),
            Self::SocketCreation(e) => write!(f, "socket creation failed: {:?}", e),
            Self::Connect(e) => write!(f, "connect failed: {:?}", e),
            Self::Send(e) => write!(f, "send failed: {:?}", e),
            Self::Receive(e) => write!(f, "receive failed: {:?}", e),
            Self::Timeout => write!(f, "request timed out"),
            Self::BufferTooSmall => write!(f, "receive buffer too small"),
            Self::ConnectionClosed => write!(f, "connection closed before response was complete"),
            Self::InvalidResponse(e) => write!(f, "invalid response: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for ClientError<E> {}
