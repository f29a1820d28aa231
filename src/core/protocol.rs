// src/core/protocol.rs

//! Implements the wire format: inbound request framing ("read until
//! `\r\n\r\n`") and the fixed-shape HTTP/1.1 response, with the
//! corresponding `Encoder` and `Decoder` for network communication.

use crate::core::TallyError;
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence separating header lines.
const CRLF: &[u8] = b"\r\n";
/// The blank line ending a request's header block.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Protocol-level limit to prevent denial-of-service attacks: a peer that
/// streams bytes without ever sending the terminator is cut off here.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// The accumulated header block of one inbound request, up to but excluding
/// the terminator. The content is logged and discarded; no method/URI
/// validation is performed.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHead {
    head: Bytes,
}

impl RequestHead {
    /// The raw header bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.head
    }

    /// The header block as text, with invalid UTF-8 replaced, for logging.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.head)
    }
}

/// The HTTP status of an outbound [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    InternalServerError,
    ServiceUnavailable,
}

impl Status {
    /// The code and reason phrase as they appear on the status line.
    pub fn status_line(&self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::BadRequest => "400 Bad Request",
            Status::InternalServerError => "500 Internal Server Error",
            Status::ServiceUnavailable => "503 Service Unavailable",
        }
    }
}

/// One complete response: status plus body. The headers are fixed by the
/// encoder (`Content-Type: text/html`, exact `Content-Length`,
/// `Connection: close`).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub body: Bytes,
}

impl Response {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            body: body.into(),
        }
    }

    /// The service's success payload for a given visit count.
    pub fn visits(count: u64) -> Self {
        Self::ok(format!("Hello, world! Visits: {count}"))
    }

    /// An error response with an empty body (`Content-Length: 0`).
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }
}

/// A `tokio_util::codec` implementation for the service's wire protocol:
/// decodes inbound [`RequestHead`]s and encodes outbound [`Response`]s.
#[derive(Debug)]
pub struct HttpCodec;

impl Decoder for HttpCodec {
    type Item = RequestHead;
    type Error = TallyError;

    /// Scans the buffered input for the header terminator. Returns `Ok(None)`
    /// until the terminator has arrived; anything before it is the head.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(pos) = find_terminator(src) {
            let mut head = src.split_to(pos + HEADER_TERMINATOR.len());
            head.truncate(pos);
            return Ok(Some(RequestHead { head: head.freeze() }));
        }

        if src.len() > MAX_REQUEST_BYTES {
            return Err(TallyError::RequestTooLarge(src.len()));
        }

        Ok(None)
    }

    /// A peer that closes before the terminator gets no response; the
    /// partial head is discarded and the stream ends cleanly.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(head) => Ok(Some(head)),
            None => {
                src.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = TallyError;

    /// Encodes a `Response` into a `BytesMut` buffer as a fixed-shape
    /// HTTP/1.1 message. `Content-Length` is the exact byte length of the
    /// body, and the connection is always advertised as closing.
    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(b"HTTP/1.1 ");
        dst.extend_from_slice(item.status.status_line().as_bytes());
        dst.extend_from_slice(CRLF);
        dst.extend_from_slice(b"Content-Type: text/html");
        dst.extend_from_slice(CRLF);
        dst.extend_from_slice(b"Content-Length: ");
        dst.extend_from_slice(item.body.len().to_string().as_bytes());
        dst.extend_from_slice(CRLF);
        dst.extend_from_slice(b"Connection: close");
        dst.extend_from_slice(CRLF);
        dst.extend_from_slice(CRLF);
        dst.extend_from_slice(&item.body);
        Ok(())
    }
}

/// Returns the offset of the first header terminator in `buf`, if present.
fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}
