//! Incremental response framing
//!
//! Bytes are pushed through [ResponseParser::feed] as they arrive. The parser
//! keeps no copy of the body, only the current head/chunk-size line, so the
//! caller's receive buffer can be handed out and reused chunk by chunk.
//! Status line, header and chunk-size tokenizing is done by `httparse`.

use core::fmt::Write;

/// Longest status text kept for the callback, longer reasons are truncated.
pub const HTTP_STATUS_STR_SIZE: usize = 32;

/// Longest head or chunk-size line kept, line terminator not counted.
const LINE_LEN: usize = 128;
const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Whether more callbacks follow for the same response.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalCall {
    More,
    Final,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    StatusLine,
    Header,
    ContentLength,
    ChunkSize,
}

/// One receive-buffer worth of response, as seen by the response callback.
#[derive(Debug)]
pub struct Response<'a> {
    /// Filled part of the receive buffer, raw bytes as received.
    pub recv_buf: &'a [u8],
    /// Capacity of the receive buffer.
    pub recv_buf_len: usize,
    pub http_status_code: u16,
    pub http_status: &'a str,
    pub content_length: Option<usize>,
    pub chunked: bool,
    /// Body payload bytes seen so far, chunk framing excluded.
    pub processed: usize,
    /// Offset in `recv_buf` of the first body byte, once the head is done.
    pub body_start: Option<usize>,
    pub message_complete: bool,
}

impl Response<'_> {
    pub fn data_len(&self) -> usize {
        self.recv_buf.len()
    }

    /// Bytes of this chunk past the response head.
    ///
    /// For chunked responses this still contains the chunk framing.
    pub fn body_frag(&self) -> &[u8] {
        match self.body_start {
            Some(start) => &self.recv_buf[start..],
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StatusLine,
    Headers,
    Body(usize),
    UntilClose,
    ChunkSize,
    ChunkData(u64),
    ChunkEnd,
    Trailers,
    Done,
}

/// Result of feeding one slice to the parser.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Fed {
    /// Bytes that belong to this response; the rest of the slice is ignored.
    pub consumed: usize,
    /// Offset in the slice where the body begins, if the head ended in it.
    pub body_start: Option<usize>,
}

pub(crate) struct ResponseParser {
    state: State,
    no_body: bool,
    line: heapless::Vec<u8, { LINE_LEN + 2 }>,
    line_truncated: bool,
    status: heapless::String<HTTP_STATUS_STR_SIZE>,
    status_code: u16,
    content_length: Option<usize>,
    chunked: bool,
    processed: usize,
}

impl ResponseParser {
    /// `no_body` is set for requests whose responses never carry a body (HEAD).
    pub fn new(no_body: bool) -> Self {
        Self {
            state: State::StatusLine,
            no_body,
            line: heapless::Vec::new(),
            line_truncated: false,
            status: heapless::String::new(),
            status_code: 0,
            content_length: None,
            chunked: false,
            processed: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    pub fn body_found(&self) -> bool {
        !matches!(self.state, State::StatusLine | State::Headers)
    }

    /// A close-delimited body is complete when the peer closes.
    pub fn finish_on_close(&mut self) -> bool {
        if self.state == State::UntilClose {
            self.state = State::Done;
        }
        self.is_complete()
    }

    pub fn response<'a>(&'a self, recv_buf: &'a [u8], capacity: usize, body_start: Option<usize>) -> Response<'a> {
        Response {
            recv_buf,
            recv_buf_len: capacity,
            http_status_code: self.status_code,
            http_status: self.status.as_str(),
            content_length: self.content_length,
            chunked: self.chunked,
            processed: self.processed,
            body_start,
            message_complete: self.is_complete(),
        }
    }

    pub fn feed(&mut self, data: &[u8]) -> Result<Fed, ResponseError> {
        let mut fed = Fed::default();
        let mut pos = 0;
        while pos < data.len() && self.state != State::Done {
            let rest = &data[pos..];
            match self.state {
                State::StatusLine | State::Headers | State::ChunkSize | State::ChunkEnd | State::Trailers => {
                    let (used, complete) = self.take_line(rest);
                    pos += used;
                    if complete {
                        let in_head = !self.body_found();
                        self.on_line()?;
                        if in_head && self.body_found() {
                            fed.body_start = Some(pos);
                        }
                    }
                }
                State::Body(remaining) => {
                    let n = remaining.min(rest.len());
                    pos += n;
                    self.processed += n;
                    self.state = if n == remaining { State::Done } else { State::Body(remaining - n) };
                }
                State::ChunkData(remaining) => {
                    let n = usize::try_from(remaining).unwrap_or(usize::MAX).min(rest.len());
                    pos += n;
                    self.processed += n;
                    let left = remaining - n as u64;
                    self.state = if left == 0 { State::ChunkEnd } else { State::ChunkData(left) };
                }
                State::UntilClose => {
                    pos += rest.len();
                    self.processed += rest.len();
                }
                State::Done => unreachable!(),
            }
        }
        fed.consumed = pos;
        Ok(fed)
    }

    /// Accumulate bytes up to and including the next `\n`.
    fn take_line(&mut self, data: &[u8]) -> (usize, bool) {
        let (used, complete) = match data.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (data.len(), false),
        };
        for &b in &data[..used] {
            if self.line.push(b).is_err() {
                self.line_truncated = true;
            }
        }
        (used, complete)
    }

    fn on_line(&mut self) -> Result<(), ResponseError> {
        let mut truncated = core::mem::take(&mut self.line_truncated);
        let mut line = core::mem::take(&mut self.line);
        while matches!(line.last(), Some(b'\r' | b'\n')) {
            line.pop();
        }
        truncated |= line.len() > LINE_LEN;

        match self.state {
            State::StatusLine => {
                if truncated {
                    return Err(ResponseError::StatusLine);
                }
                self.on_status_line(&line)
            }
            State::Headers if line.is_empty() => {
                self.on_headers_complete();
                Ok(())
            }
            State::Headers => {
                if !truncated {
                    self.on_header(&line)?;
                }
                Ok(())
            }
            State::ChunkSize => {
                let size = parse_chunk_size(&line)?;
                self.state = if size == 0 { State::Trailers } else { State::ChunkData(size) };
                Ok(())
            }
            State::ChunkEnd => {
                self.state = State::ChunkSize;
                Ok(())
            }
            State::Trailers => {
                if line.is_empty() {
                    self.state = State::Done;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_status_line(&mut self, line: &[u8]) -> Result<(), ResponseError> {
        let mut buf: heapless::Vec<u8, { LINE_LEN + 4 }> = heapless::Vec::new();
        buf.extend_from_slice(line).map_err(|_| ResponseError::StatusLine)?;
        buf.extend_from_slice(CRLF_CRLF).map_err(|_| ResponseError::StatusLine)?;

        let mut headers = [httparse::EMPTY_HEADER; 0];
        let mut rsp = httparse::Response::new(&mut headers);
        match rsp.parse(&buf) {
            Ok(httparse::Status::Complete(_)) => {}
            _ => return Err(ResponseError::StatusLine),
        }
        self.status_code = rsp.code.ok_or(ResponseError::StatusLine)?;
        self.status.clear();
        for c in rsp.reason.unwrap_or("").chars() {
            if self.status.push(c).is_err() {
                break;
            }
        }
        self.content_length = None;
        self.chunked = false;
        self.state = State::Headers;
        Ok(())
    }

    fn on_header(&mut self, line: &[u8]) -> Result<(), ResponseError> {
        let mut buf: heapless::Vec<u8, { LINE_LEN + 4 }> = heapless::Vec::new();
        buf.extend_from_slice(line).map_err(|_| ResponseError::Header)?;
        buf.extend_from_slice(CRLF_CRLF).map_err(|_| ResponseError::Header)?;

        let mut headers = [httparse::EMPTY_HEADER; 1];
        let header = match httparse::parse_headers(&buf, &mut headers) {
            Ok(httparse::Status::Complete((_, [header]))) => *header,
            _ => return Err(ResponseError::Header),
        };
        if header.name.eq_ignore_ascii_case("content-length") {
            let len = core::str::from_utf8(header.value)
                .ok()
                .and_then(|value| value.trim().parse::<usize>().ok())
                .ok_or(ResponseError::ContentLength)?;
            self.content_length = Some(len);
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            let value = core::str::from_utf8(header.value).map_err(|_| ResponseError::Header)?;
            self.chunked = value
                .rsplit(',')
                .next()
                .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        }
        Ok(())
    }

    fn on_headers_complete(&mut self) {
        let code = self.status_code;
        if (100..200).contains(&code) {
            // Interim response, the real one follows
            self.state = State::StatusLine;
            return;
        }
        self.state = if self.no_body || code == 204 || code == 304 {
            State::Done
        } else if self.chunked {
            State::ChunkSize
        } else {
            match self.content_length {
                Some(0) => State::Done,
                Some(len) => State::Body(len),
                None => State::UntilClose,
            }
        };
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ResponseError> {
    let mut buf: heapless::Vec<u8, { LINE_LEN + 2 }> = heapless::Vec::new();
    buf.extend_from_slice(line).map_err(|_| ResponseError::ChunkSize)?;
    buf.extend_from_slice(b"\r\n").map_err(|_| ResponseError::ChunkSize)?;
    match httparse::parse_chunk_size(&buf) {
        Ok(httparse::Status::Complete((_, size))) => Ok(size),
        _ => Err(ResponseError::ChunkSize),
    }
}

/// Default response callback body: banner, counters, status and the raw chunk.
pub fn print_response<W: Write + ?Sized>(out: &mut W, rsp: &Response<'_>, final_data: FinalCall) -> core::fmt::Result {
    match final_data {
        FinalCall::More => writeln!(out, "Partial data received ({} bytes)", rsp.data_len())?,
        FinalCall::Final => writeln!(out, "All the data received ({} bytes)", rsp.data_len())?,
    }
    writeln!(out, "Bytes Recv {}", rsp.data_len())?;
    writeln!(out, "Response status {}", rsp.http_status)?;
    writeln!(out, "Recv Buffer Length {}", rsp.recv_buf_len)?;
    for chunk in rsp.recv_buf.utf8_chunks() {
        out.write_str(chunk.valid())?;
        if !chunk.invalid().is_empty() {
            out.write_char(char::REPLACEMENT_CHARACTER)?;
        }
    }
    Ok(())
}
