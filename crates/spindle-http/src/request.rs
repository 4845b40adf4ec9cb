use bytes::Bytes;

use crate::header::HeaderMap;
use crate::method::Method;

/// A fully buffered HTTP request.
///
/// Inbound requests built by [`serve`](crate::serve) always carry a body,
/// possibly empty. Requests passed to [`send`](crate::send) must not carry
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Create a request with a buffered body.
    pub fn new(
        method: impl Into<Method>,
        uri: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers,
            body: Some(body.into()),
        }
    }

    /// Create a request without a body.
    pub fn empty(method: impl Into<Method>, uri: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers,
            body: None,
        }
    }

    /// Shorthand for a bodiless `GET`.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::empty(Method::Get, uri, HeaderMap::new())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
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

    pub fn into_parts(self) -> (Method, String, HeaderMap, Option<Bytes>) {
        (self.method, self.uri, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accessors() {
        let headers = HeaderMap::new().with("Content-Type", "application/x-www-form-urlencoded");

        let req = Request::new("POST", "/login?next=%2F", headers, "user=ada");
        assert_eq!(req.method(), &Method::Post);
        assert_eq!(req.uri(), "/login?next=%2F");
        assert_eq!(
            req.headers().get("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.body_bytes(), b"user=ada");
    }

    #[test]
    fn request_empty_has_no_body() {
        let req = Request::empty("HEAD", "/", HeaderMap::new());
        assert!(req.body().is_none());
        assert!(req.body_bytes().is_empty());
    }

    #[test]
    fn request_get_shorthand() {
        let req = Request::get("https://example.com/");
        assert_eq!(req.method(), "GET");
        assert!(req.body().is_none());
    }

    #[test]
    fn request_other_method() {
        let req = Request::new("PROPFIND", "/dav", HeaderMap::new(), Bytes::new());
        assert_eq!(req.method(), &Method::Other("PROPFIND".into()));
        assert_eq!(req.body().map(Bytes::len), Some(0));
    }
}
