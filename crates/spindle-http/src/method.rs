//! HTTP method and scheme variants as the host models them.
//!
//! Both are a fixed set of well-known cases plus an `Other` escape that
//! carries the literal string unchanged.

use std::fmt;

/// An HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Other(String),
}

impl Method {
    /// The canonical uppercase name, or the carried literal for `Other`.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Other(other) => other,
        }
    }
}

impl From<&str> for Method {
    /// Matching is exact: `"get"` becomes `Other("get")`.
    fn from(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "PATCH" => Method::Patch,
            other => Method::Other(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        match Method::from(s.as_str()) {
            Method::Other(_) => Method::Other(s),
            known => known,
        }
    }
}

impl PartialEq<str> for Method {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Method {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URI scheme for outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Other(String),
}

impl Scheme {
    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Other(other) => other,
        }
    }
}

impl From<&str> for Scheme {
    fn from(s: &str) -> Self {
        match s {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => Scheme::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_map_to_canonical_names() {
        let cases = [
            (Method::Get, "GET"),
            (Method::Head, "HEAD"),
            (Method::Post, "POST"),
            (Method::Put, "PUT"),
            (Method::Delete, "DELETE"),
            (Method::Connect, "CONNECT"),
            (Method::Options, "OPTIONS"),
            (Method::Trace, "TRACE"),
            (Method::Patch, "PATCH"),
        ];
        for (method, name) in cases {
            assert_eq!(method.as_str(), name);
            assert_eq!(Method::from(name), method, "{name} did not parse back");
        }
    }

    #[test]
    fn other_method_keeps_literal() {
        let method = Method::from("PURGE");
        assert_eq!(method, Method::Other("PURGE".into()));
        assert_eq!(method.as_str(), "PURGE");
    }

    #[test]
    fn method_parsing_is_case_sensitive() {
        assert_eq!(Method::from("get"), Method::Other("get".into()));
    }

    #[test]
    fn method_from_owned_string() {
        assert_eq!(Method::from("PATCH".to_string()), Method::Patch);
        assert_eq!(
            Method::from("MKCOL".to_string()),
            Method::Other("MKCOL".into())
        );
    }

    #[test]
    fn method_compares_with_str() {
        assert_eq!(Method::Get, "GET");
        assert!(Method::Post != "GET");
    }

    #[test]
    fn scheme_variants() {
        assert_eq!(Scheme::from("http"), Scheme::Http);
        assert_eq!(Scheme::from("https"), Scheme::Https);
        assert_eq!(Scheme::from("ftp"), Scheme::Other("ftp".into()));
        assert_eq!(Scheme::Https.to_string(), "https");
    }
}
