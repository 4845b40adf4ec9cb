//! Outbound adapter: buffered [`Request`] → host outgoing handler →
//! buffered [`Response`].
//!
//! Outgoing request bodies are not supported; a request carrying one is
//! rejected before anything reaches the host.

use http::Uri;
use tracing::debug;

use crate::body::read_to_end;
use crate::config::AdapterConfig;
use crate::header::{FieldList, HeaderMap};
use crate::host::{
    FutureIncomingResponse, IncomingResponse, OutgoingHandler, OutgoingRequestHead, Pollable,
};
use crate::method::{Method, Scheme};
use crate::{Error, Request, Response, Result};

/// Send `request` through `host` with the default [`AdapterConfig`].
pub fn send<H: OutgoingHandler>(host: &H, request: Request) -> Result<Response> {
    send_with_config(host, request, &AdapterConfig::default())
}

/// Send `request` through `host`, blocking until the whole response body
/// has been read.
pub fn send_with_config<H: OutgoingHandler>(
    host: &H,
    request: Request,
    config: &AdapterConfig,
) -> Result<Response> {
    config.validate()?;
    let (method, uri, headers, body) = request.into_parts();
    if body.is_some() {
        return Err(Error::OutgoingBodyUnsupported);
    }

    let head = request_head(method, &uri, headers.to_fields())?;
    debug!(method = %head.method, %uri, "sending outgoing request");

    let future = host.handle(head, config.request_options())?;
    let incoming = {
        let pollable = future.subscribe();
        loop {
            match future.get() {
                Some(result) => break result?,
                None => pollable.block(),
            }
        }
    };
    drop(future);

    let status = incoming.status();
    let headers = HeaderMap::from_fields(incoming.headers())?;
    let body = read_to_end(incoming.consume()?, config.read_chunk_size)?;
    debug!(status, body_len = body.len(), "outgoing response buffered");

    Ok(Response::new(status, headers, body))
}

/// Split an absolute URI into the parts the host sets individually.
///
/// A URI without a path is sent with path `/`, keeping any query.
/// Userinfo in the authority is rejected.
pub(crate) fn request_head(
    method: Method,
    uri: &str,
    headers: FieldList,
) -> Result<OutgoingRequestHead> {
    let invalid = |reason: String| Error::InvalidUri {
        uri: uri.to_string(),
        reason,
    };

    let parsed: Uri = uri.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
    let scheme = parsed
        .scheme_str()
        .ok_or_else(|| invalid("missing scheme".to_string()))?;
    let authority = parsed
        .authority()
        .ok_or_else(|| invalid("missing authority".to_string()))?;
    if authority.as_str().contains('@') {
        return Err(invalid("userinfo is not allowed in the authority".to_string()));
    }
    // `Uri::path` reports `/` for an empty path, including `http://host?q`.
    let path_with_query = match parsed.query() {
        Some(query) => format!("{}?{query}", parsed.path()),
        None => parsed.path().to_string(),
    };

    Ok(OutgoingRequestHead {
        method,
        scheme: Scheme::from(scheme),
        authority: authority.as_str().to_string(),
        path_with_query,
        headers,
    })
}
