//! Host resource contracts.
//!
//! Each trait mirrors one `wasi:http` / `wasi:io` resource the adapter
//! consumes. Implementations live in [`crate::wasip2`] (the real host, behind
//! the `wasi` feature) and [`crate::mock`] (an in-memory host for tests).
//!
//! # Resource ordering
//!
//! The host traps when a parent resource is released while one of its
//! children is still alive. Child resources are therefore generic
//! associated types borrowing their parent: an input stream borrows its
//! incoming body, which borrows its request. Finishing a body consumes it
//! by value, so doing so while its stream is alive is rejected by the
//! borrow checker rather than by the host at runtime.
//!
//! The response out-parameter is consumed by value when set, so it can be
//! resolved at most once. [`crate::incoming`] wraps it in a guard that
//! resolves it on every other exit path.

use std::time::Duration;

use crate::header::FieldList;
use crate::method::{Method, Scheme};
use crate::Result;

/// Outcome of a failed stream operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The stream ended. Not a failure for read loops.
    Closed,
    /// The last operation failed; carries the host's debug description.
    LastOperationFailed(String),
}

/// A readable byte stream.
pub trait InputStream {
    /// Block until at least one byte is available or the stream ends,
    /// returning at most `len` bytes.
    fn blocking_read(&self, len: u64) -> std::result::Result<Vec<u8>, StreamError>;
}

/// A writable byte stream.
pub trait OutputStream {
    /// Write and flush up to 4096 bytes, blocking until done.
    fn blocking_write_and_flush(&self, contents: &[u8]) -> std::result::Result<(), StreamError>;
}

/// The body of an incoming request or response.
pub trait IncomingBody {
    type Stream<'a>: InputStream
    where
        Self: 'a;

    /// Take the body's byte stream. May only succeed once.
    fn stream(&self) -> Result<Self::Stream<'_>>;

    /// Release the body. Trailers are not inspected.
    fn finish(self);
}

/// A request delivered by the host to the exported incoming handler.
pub trait IncomingRequest {
    type Body<'a>: IncomingBody
    where
        Self: 'a;

    fn method(&self) -> Method;

    fn path_with_query(&self) -> Option<String>;

    fn headers(&self) -> FieldList;

    /// Take the request body. May only succeed once.
    fn consume(&self) -> Result<Self::Body<'_>>;
}

/// The body of an outgoing response.
pub trait OutgoingBody {
    type Stream<'a>: OutputStream
    where
        Self: 'a;

    fn write(&self) -> Result<Self::Stream<'_>>;

    /// Release the body without trailers.
    fn finish(self) -> Result<()>;
}

/// A response under construction.
pub trait OutgoingResponse {
    type Body: OutgoingBody;

    fn set_status_code(&self, status: u16) -> Result<()>;

    /// Take the response body. Must happen before the response is handed
    /// to the out-parameter.
    fn body(&self) -> Result<Self::Body>;
}

/// The single-use slot through which the response is delivered.
pub trait ResponseOutparam {
    type Response: OutgoingResponse;

    /// Create an outgoing response with the given headers.
    fn new_response(&self, headers: FieldList) -> Result<Self::Response>;

    fn set(self, response: Self::Response);

    /// Resolve with an internal error instead of a response.
    fn set_error(self, message: String);
}

/// Everything an outbound request needs besides its (unsupported) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequestHead {
    pub method: Method,
    pub scheme: Scheme,
    pub authority: String,
    pub path_with_query: String,
    pub headers: FieldList,
}

/// Transport timeouts forwarded to the host for outbound requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub connect_timeout: Option<Duration>,
    pub first_byte_timeout: Option<Duration>,
    pub between_bytes_timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn is_empty(&self) -> bool {
        self.connect_timeout.is_none()
            && self.first_byte_timeout.is_none()
            && self.between_bytes_timeout.is_none()
    }
}

/// Readiness handle for a pending host operation.
pub trait Pollable {
    /// Block until the operation is ready.
    fn block(&self);
}

/// A response from the host's outgoing handler that may not be ready yet.
pub trait FutureIncomingResponse {
    type Pollable<'a>: Pollable
    where
        Self: 'a;
    type Response: IncomingResponse;

    fn subscribe(&self) -> Self::Pollable<'_>;

    /// `None` while pending. Once ready, yields the response or the
    /// transport error, and [`Error::ResponseAlreadyTaken`](crate::Error)
    /// on subsequent calls.
    fn get(&self) -> Option<Result<Self::Response>>;
}

/// A response received for an outbound request.
pub trait IncomingResponse {
    type Body<'a>: IncomingBody
    where
        Self: 'a;

    fn status(&self) -> u16;

    fn headers(&self) -> FieldList;

    fn consume(&self) -> Result<Self::Body<'_>>;
}

/// The host's `outgoing-handler` interface.
pub trait OutgoingHandler {
    type Future: FutureIncomingResponse;

    fn handle(
        &self,
        request: OutgoingRequestHead,
        options: Option<RequestOptions>,
    ) -> Result<Self::Future>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_options_default_is_empty() {
        assert!(RequestOptions::default().is_empty());
    }

    #[test]
    fn request_options_with_any_timeout_is_not_empty() {
        let options = RequestOptions {
            between_bytes_timeout: Some(Duration::from_millis(250)),
            ..RequestOptions::default()
        };
        assert!(!options.is_empty());
    }
}
