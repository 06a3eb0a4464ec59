//! Single-shot HTTP/1.1 client over an already connected TCP socket
//!
//! The request is streamed out through a small send buffer, the response is
//! received into the caller's receive buffer and handed to the response
//! callback one buffer at a time.

use super::{debug, error, info, trace};
use crate::ClientError;
use core::fmt::Write;
use embedded_nal::nb;
use embedded_nal::TcpClientStack;

mod request;
mod response;

pub use request::{HttpRequest, Method, HTTP_PROTOCOL};
pub use response::{print_response, FinalCall, Response, ResponseError, HTTP_STATUS_STR_SIZE};

use response::ResponseParser;

pub const RECV_BUF_LEN: usize = 512;
pub const DEFAULT_TIMEOUT_MS: u32 = 5000;

const SEND_BUF_LEN: usize = 64;
const CRLF: &[u8] = b"\r\n";

/// Socket, clock and send buffer for one request/response exchange.
struct Exchange<'s, T, C>
where
    T: TcpClientStack + ?Sized,
{
    stack: &'s mut T,
    sock: &'s mut T::TcpSocket,
    clock: C,
    started: u32,
    timeout_ms: Option<u32>,
    send_buf: [u8; SEND_BUF_LEN],
    send_len: usize,
    sent: usize,
}

impl<'s, T, C> Exchange<'s, T, C>
where
    T: TcpClientStack + ?Sized,
    C: Fn() -> u32,
{
    fn new(stack: &'s mut T, sock: &'s mut T::TcpSocket, clock: C, timeout_ms: Option<u32>) -> Self {
        let started = clock();
        Self {
            stack,
            sock,
            clock,
            started,
            timeout_ms,
            send_buf: [0; SEND_BUF_LEN],
            send_len: 0,
            sent: 0,
        }
    }

    fn expired(&self) -> bool {
        self.timeout_ms
            .is_some_and(|timeout| (self.clock)().wrapping_sub(self.started) >= timeout)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ClientError<T::Error>> {
        if self.send_len + data.len() > SEND_BUF_LEN {
            self.flush()?;
        }
        if data.len() >= SEND_BUF_LEN {
            return self.send_all(data);
        }
        self.send_buf[self.send_len..self.send_len + data.len()].copy_from_slice(data);
        self.send_len += data.len();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ClientError<T::Error>> {
        let len = core::mem::take(&mut self.send_len);
        let pending = self.send_buf;
        self.send_all(&pending[..len])
    }

    fn send_all(&mut self, mut data: &[u8]) -> Result<(), ClientError<T::Error>> {
        while !data.is_empty() {
            match self.stack.send(self.sock, data) {
                Ok(n) => {
                    trace!("sent {} bytes", n);
                    self.sent += n;
                    data = &data[n..];
                }
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => {
                    error!("Send failed");
                    return Err(ClientError::Send(e));
                }
            }
            if !data.is_empty() && self.expired() {
                error!("Send timed out");
                return Err(ClientError::Timeout);
            }
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, ClientError<T::Error>> {
        loop {
            if self.expired() {
                error!("Receive timed out");
                return Err(ClientError::Timeout);
            }
            match self.stack.receive(self.sock, buf) {
                Ok(n) => return Ok(n),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => {
                    error!("Receive failed");
                    return Err(ClientError::Receive(e));
                }
            }
        }
    }
}

/// Send `req` on a connected socket and deliver the response to its callback.
///
/// The whole exchange must finish within `timeout_ms` as measured by `clock`,
/// a wrapping millisecond counter; `None` waits forever. Returns the number of
/// request bytes sent.
pub fn http_client_req<T, F, C>(
    stack: &mut T,
    sock: &mut T::TcpSocket,
    req: HttpRequest<'_, F>,
    timeout_ms: Option<u32>,
    clock: C,
) -> Result<usize, ClientError<T::Error>>
where
    T: TcpClientStack + ?Sized,
    F: FnMut(&Response<'_>, FinalCall),
    C: Fn() -> u32,
{
    let HttpRequest {
        method,
        url,
        host,
        protocol,
        header_fields,
        content_type,
        payload,
        recv_buf,
        mut response,
    } = req;

    if recv_buf.is_empty() {
        return Err(ClientError::BufferTooSmall);
    }

    let mut ex = Exchange::new(stack, sock, clock, timeout_ms);

    debug!("HTTP request: {} {} {}", method.as_str(), url, protocol);
    ex.write(method.as_str().as_bytes())?;
    ex.write(b" ")?;
    ex.write(url.as_bytes())?;
    ex.write(b" ")?;
    ex.write(protocol.as_bytes())?;
    ex.write(CRLF)?;
    ex.write(b"Host: ")?;
    ex.write(host.as_bytes())?;
    ex.write(CRLF)?;
    for (name, value) in header_fields {
        ex.write(name.as_bytes())?;
        ex.write(b": ")?;
        ex.write(value.as_bytes())?;
        ex.write(CRLF)?;
    }
    if let Some(payload) = payload {
        if let Some(content_type) = content_type {
            ex.write(b"Content-Type: ")?;
            ex.write(content_type.as_bytes())?;
            ex.write(CRLF)?;
        }
        let mut len: heapless::String<20> = heapless::String::new();
        // usize always fits in 20 digits
        let _ = write!(len, "{}", payload.len());
        ex.write(b"Content-Length: ")?;
        ex.write(len.as_bytes())?;
        ex.write(CRLF)?;
    }
    ex.write(CRLF)?;
    if let Some(payload) = payload {
        ex.write(payload)?;
    }
    ex.flush()?;
    let sent = ex.sent;
    info!("-----Request sent {}-----", sent);

    let capacity = recv_buf.len();
    let mut parser = ResponseParser::new(method == Method::Head);
    let mut filled = 0;
    let mut total = 0;
    let mut body_start = None;

    let closed = loop {
        if parser.is_complete() {
            break false;
        }
        if filled == capacity {
            debug!("Receive buffer full");
            response(&parser.response(&recv_buf[..filled], capacity, body_start), FinalCall::More);
            filled = 0;
            body_start = parser.body_found().then_some(0);
        }
        let n = ex.receive(&mut recv_buf[filled..])?;
        if n == 0 {
            break true;
        }
        let fed = parser.feed(&recv_buf[filled..filled + n])?;
        if body_start.is_none() {
            body_start = fed.body_start.map(|offset| filled + offset);
        }
        filled += fed.consumed;
        total += fed.consumed;
    };

    let complete = if closed {
        debug!("Connection closed by peer");
        parser.finish_on_close()
    } else {
        true
    };
    if total > 0 {
        response(&parser.response(&recv_buf[..filled], capacity, body_start), FinalCall::Final);
    }
    if !complete {
        error!("Connection closed after {} response bytes", total);
        return Err(ClientError::ConnectionClosed);
    }
    info!("-----Response received {}-----", total);
    Ok(sent)
}

/// `GET url HTTP/1.1` with a [RECV_BUF_LEN] receive buffer and a
/// [DEFAULT_TIMEOUT_MS] timeout.
pub fn http_get<T, F, C>(
    stack: &mut T,
    sock: &mut T::TcpSocket,
    hostname: &str,
    url: &str,
    clock: C,
    response: F,
) -> Result<usize, ClientError<T::Error>>
where
    T: TcpClientStack + ?Sized,
    F: FnMut(&Response<'_>, FinalCall),
    C: Fn() -> u32,
{
    let mut recv_buf = [0u8; RECV_BUF_LEN];
    let req = HttpRequest::new(Method::Get, url, hostname, &mut recv_buf, response);
    http_client_req(stack, sock, req, Some(DEFAULT_TIMEOUT_MS), clock)
}
