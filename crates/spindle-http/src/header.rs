use crate::{Error, Result};

/// Header entries as the host stores them: names as strings, values as raw bytes.
pub type FieldList = Vec<(String, Vec<u8>)>;

/// One header field with its value decoded as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Header fields in the order the host delivered them.
///
/// Repeated names are kept as separate entries; lookups compare names
/// ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Header::new(name, value));
    }

    /// Builder-style [`insert`](HeaderMap::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Every value for `name`, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-encode values as UTF-8 bytes for the host, keeping order.
    pub fn to_fields(&self) -> FieldList {
        self.entries
            .iter()
            .map(|h| (h.name.clone(), h.value.as_bytes().to_vec()))
            .collect()
    }

    /// Decode a host field list, rejecting values that are not valid UTF-8.
    pub fn from_fields(fields: FieldList) -> Result<Self> {
        fields
            .into_iter()
            .map(|(name, value)| match String::from_utf8(value) {
                Ok(value) => Ok(Header { name, value }),
                Err(e) => Err(Error::Header(format!(
                    "value of `{name}` is not valid utf-8: {e}"
                ))),
            })
            .collect()
    }
}

impl FromIterator<Header> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderMap
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, value)| Header::new(name, value))
            .collect()
    }
}
