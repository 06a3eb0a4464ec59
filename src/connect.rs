use super::{error, info, SocketAddrWrap};
use crate::ClientError;
use core::net::{IpAddr, SocketAddr};
use embedded_nal::nb::block;
use embedded_nal::TcpClientStack;

pub const HTTP_PORT: u16 = 80;

/// Connect to the first address in `addrs` that accepts on `port`.
///
/// Each attempt gets a fresh socket; a socket whose connect failed is closed
/// before moving on.
pub fn connect_socket<T>(
    stack: &mut T,
    addrs: &[IpAddr],
    port: u16,
) -> Result<T::TcpSocket, ClientError<T::Error>>
where
    T: TcpClientStack + ?Sized,
{
    let mut last_error = None;
    for addr in addrs {
        let remote = SocketAddr::new(*addr, port);
        let mut sock = stack.socket().map_err(|e| {
            error!("Socket creation failed");
            ClientError::SocketCreation(e)
        })?;
        info!("-----connecting to ----- {}", SocketAddrWrap { addr: &remote });
        match block!(stack.connect(&mut sock, remote)) {
            Ok(()) => {
                info!("-----Socket connected-----");
                return Ok(sock);
            }
            Err(e) => {
                error!("Connect to {} failed", SocketAddrWrap { addr: &remote });
                // The attempt already failed, a close error adds nothing
                let _ = stack.close(sock);
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => Err(ClientError::Connect(e)),
        None => Err(ClientError::NoAddresses),
    }
}
