use bytes::Bytes;

use crate::header::HeaderMap;

/// A fully buffered HTTP response.
///
/// Handlers build one per request; the adapter consumes it exactly once
/// to drive the host's outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    /// Create a response with a buffered body.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: Some(body.into()),
        }
    }

    /// Create a response without a body.
    pub fn empty(status: u16, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            body: None,
        }
    }

    /// A `text/plain` response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(
            status,
            HeaderMap::new().with("content-type", "text/plain"),
            body.into(),
        )
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body, or an empty slice when there is none.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn into_parts(self) -> (u16, HeaderMap, Option<Bytes>) {
        (self.status, self.headers, self.body)
    }
}
