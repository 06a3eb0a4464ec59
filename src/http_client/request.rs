use super::response::{FinalCall, Response};

pub const HTTP_PROTOCOL: &str = "HTTP/1.1";

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

/// A request plus the buffer and callback its response is delivered through.
///
/// `response` is called with [FinalCall::More] every time `recv_buf` fills up,
/// and once with [FinalCall::Final] at the end of the response.
pub struct HttpRequest<'a, F>
where
    F: FnMut(&Response<'_>, FinalCall),
{
    pub method: Method,
    pub url: &'a str,
    pub host: &'a str,
    pub protocol: &'a str,
    /// Extra `name: value` header fields, sent after `Host`.
    pub header_fields: &'a [(&'a str, &'a str)],
    pub content_type: Option<&'a str>,
    pub payload: Option<&'a [u8]>,
    pub recv_buf: &'a mut [u8],
    pub response: F,
}

impl<'a, F> HttpRequest<'a, F>
where
    F: FnMut(&Response<'_>, FinalCall),
{
    pub fn new(method: Method, url: &'a str, host: &'a str, recv_buf: &'a mut [u8], response: F) -> Self {
        Self {
            method,
            url,
            host,
            protocol: HTTP_PROTOCOL,
            header_fields: &[],
            content_type: None,
            payload: None,
            recv_buf,
            response,
        }
    }
}
