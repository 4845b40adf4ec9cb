//! Error types for the blocking HTTP adapter.

use thiserror::Error;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bridging host HTTP resources.
///
/// A stream reporting `closed` is not an error: it terminates a read loop
/// normally and never surfaces here.
#[derive(Debug, Error)]
pub enum Error {
    /// A host stream failed with something other than `closed`.
    #[error("stream error: {0}")]
    Stream(String),

    /// A body or stream resource could not be obtained from its parent.
    #[error("body error: {0}")]
    Body(String),

    /// A header could not be decoded or rejected by the host.
    #[error("header error: {0}")]
    Header(String),

    #[error("invalid uri `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Outgoing requests cannot carry a body.
    #[error("outgoing request bodies are not supported")]
    OutgoingBodyUnsupported,

    /// The host reported a transport-level error code for an outbound send.
    #[error("transport error: {0}")]
    Transport(String),

    /// The outbound response future was already consumed.
    #[error("incoming response already taken")]
    ResponseAlreadyTaken,

    /// Any other host call rejected its arguments.
    #[error("host error: {0}")]
    Host(String),

    #[error("invalid adapter config: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_stream() {
        let err = Error::Stream("connection reset".into());
        assert_eq!(err.to_string(), "stream error: connection reset");
    }

    #[test]
    fn error_display_invalid_uri() {
        let err = Error::InvalidUri {
            uri: "not a uri".into(),
            reason: "missing scheme".into(),
        };
        assert_eq!(err.to_string(), "invalid uri `not a uri`: missing scheme");
    }

    #[test]
    fn error_is_std_error() {
        let err = Error::OutgoingBodyUnsupported;
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn error_converts_into_anyhow() {
        let err: anyhow::Error = Error::ResponseAlreadyTaken.into();
        assert_eq!(err.to_string(), "incoming response already taken");
    }
}
