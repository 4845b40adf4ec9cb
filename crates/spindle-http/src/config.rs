//! AdapterConfig: tunables for the blocking adapter.
//!
//! Chunk sizes bound each host read and write. The optional timeouts are
//! only forwarded to the host for outbound sends; the adapter itself never
//! enforces them.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::body::{DEFAULT_READ_CHUNK_SIZE, MAX_BLOCKING_WRITE_SIZE};
use crate::host::RequestOptions;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Maximum bytes requested per blocking read.
    pub read_chunk_size: u64,
    /// Maximum bytes per blocking write-and-flush (at most 4096).
    pub write_chunk_size: usize,
    pub connect_timeout_ms: Option<u64>,
    pub first_byte_timeout_ms: Option<u64>,
    pub between_bytes_timeout_ms: Option<u64>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            write_chunk_size: MAX_BLOCKING_WRITE_SIZE,
            connect_timeout_ms: None,
            first_byte_timeout_ms: None,
            between_bytes_timeout_ms: None,
        }
    }
}

impl AdapterConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AdapterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(Error::Config("read_chunk_size must be > 0".to_string()));
        }
        if self.write_chunk_size == 0 || self.write_chunk_size > MAX_BLOCKING_WRITE_SIZE {
            return Err(Error::Config(format!(
                "write_chunk_size must be between 1 and {MAX_BLOCKING_WRITE_SIZE}, got {}",
                self.write_chunk_size
            )));
        }
        Ok(())
    }

    /// Builder method: set the read chunk size.
    pub fn with_read_chunk_size(self, read_chunk_size: u64) -> Self {
        Self {
            read_chunk_size,
            ..self
        }
    }

    /// Builder method: set the write chunk size.
    pub fn with_write_chunk_size(self, write_chunk_size: usize) -> Self {
        Self {
            write_chunk_size,
            ..self
        }
    }

    /// Builder method: set all three outbound timeouts.
    pub fn with_timeouts(
        self,
        connect: Option<Duration>,
        first_byte: Option<Duration>,
        between_bytes: Option<Duration>,
    ) -> Self {
        Self {
            connect_timeout_ms: connect.map(duration_to_ms),
            first_byte_timeout_ms: first_byte.map(duration_to_ms),
            between_bytes_timeout_ms: between_bytes.map(duration_to_ms),
            ..self
        }
    }

    /// Outbound options to forward, or `None` when no timeout is set.
    pub fn request_options(&self) -> Option<RequestOptions> {
        let options = RequestOptions {
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            first_byte_timeout: self.first_byte_timeout_ms.map(Duration::from_millis),
            between_bytes_timeout: self.between_bytes_timeout_ms.map(Duration::from_millis),
        };
        (!options.is_empty()).then_some(options)
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_host_limits() {
        let config = AdapterConfig::default();
        assert_eq!(config.read_chunk_size, 16 * 1024);
        assert_eq!(config.write_chunk_size, 4096);
        assert!(config.request_options().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let config = AdapterConfig::from_toml_str(
            r#"
            read_chunk_size = 1024
            connect_timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.write_chunk_size, 4096);
        let options = config.request_options().unwrap();
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(500)));
        assert_eq!(options.first_byte_timeout, None);
    }

    #[test]
    fn parse_empty_toml_is_default() {
        let config = AdapterConfig::from_toml_str("").unwrap();
        assert_eq!(config, AdapterConfig::default());
    }

    #[test]
    fn rejects_oversized_write_chunk() {
        let err = AdapterConfig::from_toml_str("write_chunk_size = 8192").unwrap_err();
        assert!(err.to_string().contains("write_chunk_size"));
    }

    #[test]
    fn rejects_zero_read_chunk() {
        let config = AdapterConfig::default().with_read_chunk_size(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(AdapterConfig::from_toml_str("chunk = 1").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = AdapterConfig::default()
            .with_write_chunk_size(1024)
            .with_timeouts(Some(Duration::from_secs(2)), None, Some(Duration::from_millis(750)));

        let text = config.to_toml_string().unwrap();
        let parsed = AdapterConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.connect_timeout_ms, Some(2000));
    }

    #[test]
    fn from_file_reads_toml() {
        let path = std::env::temp_dir().join(format!(
            "spindle-adapter-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "first_byte_timeout_ms = 100\n").unwrap();

        let config = AdapterConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.request_options().unwrap().first_byte_timeout,
            Some(Duration::from_millis(100))
        );
    }
}
