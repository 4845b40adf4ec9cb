//! `wasi:http@0.2` implementation of the host traits.
//!
//! The resource types from the `wasi` crate implement the [`crate::host`]
//! traits directly. Their child resources do not carry lifetimes, but the
//! adapter only sees them through the borrowing associated types, so the
//! release order is still checked where it matters.

use std::time::Duration;

use tracing::error;
use wasi::http::types as wasi_http;
use wasi::io::{poll, streams};

use crate::header::FieldList;
use crate::host::{self, OutgoingRequestHead, RequestOptions, StreamError};
use crate::incoming::Handler;
use crate::method::{Method, Scheme};
use crate::{Error, Request, Response, Result};

/// Run `handler` for a request delivered to the exported
/// `wasi:http/incoming-handler#handle`.
///
/// Fatal host failures are logged; the out-parameter has already been
/// resolved by then.
pub fn serve_wasi<H: Handler + ?Sized>(
    handler: &H,
    request: wasi_http::IncomingRequest,
    response_out: wasi_http::ResponseOutparam,
) {
    if let Err(e) = crate::serve(handler, request, response_out) {
        error!(error = %e, "incoming request failed");
    }
}

/// Send `request` through the host's `wasi:http/outgoing-handler`.
pub fn send_wasi(request: Request) -> Result<Response> {
    crate::send(&WasiOutgoingHandler, request)
}

fn stream_error(e: streams::StreamError) -> StreamError {
    match e {
        streams::StreamError::Closed => StreamError::Closed,
        streams::StreamError::LastOperationFailed(err) => {
            StreamError::LastOperationFailed(err.to_debug_string())
        }
    }
}

fn fields(headers: &FieldList) -> Result<wasi_http::Fields> {
    wasi_http::Fields::from_list(headers).map_err(|e| Error::Header(format!("{e:?}")))
}

fn method_from_wasi(method: wasi_http::Method) -> Method {
    match method {
        wasi_http::Method::Get => Method::Get,
        wasi_http::Method::Head => Method::Head,
        wasi_http::Method::Post => Method::Post,
        wasi_http::Method::Put => Method::Put,
        wasi_http::Method::Delete => Method::Delete,
        wasi_http::Method::Connect => Method::Connect,
        wasi_http::Method::Options => Method::Options,
        wasi_http::Method::Trace => Method::Trace,
        wasi_http::Method::Patch => Method::Patch,
        wasi_http::Method::Other(other) => Method::Other(other),
    }
}

fn method_to_wasi(method: &Method) -> wasi_http::Method {
    match method {
        Method::Get => wasi_http::Method::Get,
        Method::Head => wasi_http::Method::Head,
        Method::Post => wasi_http::Method::Post,
        Method::Put => wasi_http::Method::Put,
        Method::Delete => wasi_http::Method::Delete,
        Method::Connect => wasi_http::Method::Connect,
        Method::Options => wasi_http::Method::Options,
        Method::Trace => wasi_http::Method::Trace,
        Method::Patch => wasi_http::Method::Patch,
        Method::Other(other) => wasi_http::Method::Other(other.clone()),
    }
}

fn scheme_to_wasi(scheme: &Scheme) -> wasi_http::Scheme {
    match scheme {
        Scheme::Http => wasi_http::Scheme::Http,
        Scheme::Https => wasi_http::Scheme::Https,
        Scheme::Other(other) => wasi_http::Scheme::Other(other.clone()),
    }
}

/// The host measures durations in nanoseconds.
fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn options_to_wasi(options: RequestOptions) -> Result<wasi_http::RequestOptions> {
    let wasi_options = wasi_http::RequestOptions::new();
    let rejected = |name: &str| Error::Host(format!("{name} timeout not supported by host"));
    if let Some(timeout) = options.connect_timeout {
        wasi_options
            .set_connect_timeout(Some(nanos(timeout)))
            .map_err(|()| rejected("connect"))?;
    }
    if let Some(timeout) = options.first_byte_timeout {
        wasi_options
            .set_first_byte_timeout(Some(nanos(timeout)))
            .map_err(|()| rejected("first-byte"))?;
    }
    if let Some(timeout) = options.between_bytes_timeout {
        wasi_options
            .set_between_bytes_timeout(Some(nanos(timeout)))
            .map_err(|()| rejected("between-bytes"))?;
    }
    Ok(wasi_options)
}

// ── Streams ─────────────────────────────────────────────────────────

impl host::InputStream for streams::InputStream {
    fn blocking_read(&self, len: u64) -> std::result::Result<Vec<u8>, StreamError> {
        streams::InputStream::blocking_read(self, len).map_err(stream_error)
    }
}

impl host::OutputStream for streams::OutputStream {
    fn blocking_write_and_flush(&self, contents: &[u8]) -> std::result::Result<(), StreamError> {
        streams::OutputStream::blocking_write_and_flush(self, contents).map_err(stream_error)
    }
}

// ── Inbound ─────────────────────────────────────────────────────────

impl host::IncomingBody for wasi_http::IncomingBody {
    type Stream<'a> = streams::InputStream;

    fn stream(&self) -> Result<streams::InputStream> {
        wasi_http::IncomingBody::stream(self)
            .map_err(|()| Error::Body("incoming body stream already taken".to_string()))
    }

    fn finish(self) {
        let _trailers = wasi_http::IncomingBody::finish(self);
    }
}

impl host::IncomingRequest for wasi_http::IncomingRequest {
    type Body<'a> = wasi_http::IncomingBody;

    fn method(&self) -> Method {
        method_from_wasi(wasi_http::IncomingRequest::method(self))
    }

    fn path_with_query(&self) -> Option<String> {
        wasi_http::IncomingRequest::path_with_query(self)
    }

    fn headers(&self) -> FieldList {
        wasi_http::IncomingRequest::headers(self).entries()
    }

    fn consume(&self) -> Result<wasi_http::IncomingBody> {
        wasi_http::IncomingRequest::consume(self)
            .map_err(|()| Error::Body("request body already consumed".to_string()))
    }
}

impl host::OutgoingBody for wasi_http::OutgoingBody {
    type Stream<'a> = streams::OutputStream;

    fn write(&self) -> Result<streams::OutputStream> {
        wasi_http::OutgoingBody::write(self)
            .map_err(|()| Error::Body("outgoing body stream already taken".to_string()))
    }

    fn finish(self) -> Result<()> {
        wasi_http::OutgoingBody::finish(self, None).map_err(|e| Error::Host(format!("{e:?}")))
    }
}

impl host::OutgoingResponse for wasi_http::OutgoingResponse {
    type Body = wasi_http::OutgoingBody;

    fn set_status_code(&self, status: u16) -> Result<()> {
        wasi_http::OutgoingResponse::set_status_code(self, status)
            .map_err(|()| Error::Host(format!("invalid status code {status}")))
    }

    fn body(&self) -> Result<wasi_http::OutgoingBody> {
        wasi_http::OutgoingResponse::body(self)
            .map_err(|()| Error::Body("response body already taken".to_string()))
    }
}

impl host::ResponseOutparam for wasi_http::ResponseOutparam {
    type Response = wasi_http::OutgoingResponse;

    fn new_response(&self, headers: FieldList) -> Result<wasi_http::OutgoingResponse> {
        Ok(wasi_http::OutgoingResponse::new(fields(&headers)?))
    }

    fn set(self, response: wasi_http::OutgoingResponse) {
        wasi_http::ResponseOutparam::set(self, Ok(response));
    }

    fn set_error(self, message: String) {
        wasi_http::ResponseOutparam::set(
            self,
            Err(wasi_http::ErrorCode::InternalError(Some(message))),
        );
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// The host's `wasi:http/outgoing-handler` import.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasiOutgoingHandler;

impl host::OutgoingHandler for WasiOutgoingHandler {
    type Future = wasi_http::FutureIncomingResponse;

    fn handle(
        &self,
        request: OutgoingRequestHead,
        options: Option<RequestOptions>,
    ) -> Result<wasi_http::FutureIncomingResponse> {
        let outgoing = wasi_http::OutgoingRequest::new(fields(&request.headers)?);
        outgoing
            .set_method(&method_to_wasi(&request.method))
            .map_err(|()| Error::Host(format!("method `{}` rejected", request.method)))?;
        outgoing
            .set_scheme(Some(&scheme_to_wasi(&request.scheme)))
            .map_err(|()| Error::Host(format!("scheme `{}` rejected", request.scheme)))?;
        outgoing
            .set_authority(Some(request.authority.as_str()))
            .map_err(|()| Error::Host(format!("authority `{}` rejected", request.authority)))?;
        outgoing
            .set_path_with_query(Some(request.path_with_query.as_str()))
            .map_err(|()| {
                Error::Host(format!("path `{}` rejected", request.path_with_query))
            })?;

        let options = options.map(options_to_wasi).transpose()?;
        wasi::http::outgoing_handler::handle(outgoing, options)
            .map_err(|e| Error::Transport(format!("{e:?}")))
    }
}

impl host::Pollable for poll::Pollable {
    fn block(&self) {
        poll::Pollable::block(self);
    }
}

impl host::FutureIncomingResponse for wasi_http::FutureIncomingResponse {
    type Pollable<'a> = poll::Pollable;
    type Response = wasi_http::IncomingResponse;

    fn subscribe(&self) -> poll::Pollable {
        wasi_http::FutureIncomingResponse::subscribe(self)
    }

    fn get(&self) -> Option<Result<wasi_http::IncomingResponse>> {
        wasi_http::FutureIncomingResponse::get(self).map(|ready| match ready {
            Err(()) => Err(Error::ResponseAlreadyTaken),
            Ok(Err(code)) => Err(Error::Transport(format!("{code:?}"))),
            Ok(Ok(response)) => Ok(response),
        })
    }
}

impl host::IncomingResponse for wasi_http::IncomingResponse {
    type Body<'a> = wasi_http::IncomingBody;

    fn status(&self) -> u16 {
        wasi_http::IncomingResponse::status(self)
    }

    fn headers(&self) -> FieldList {
        wasi_http::IncomingResponse::headers(self).entries()
    }

    fn consume(&self) -> Result<wasi_http::IncomingBody> {
        wasi_http::IncomingResponse::consume(self)
            .map_err(|()| Error::Body("response body already consumed".to_string()))
    }
}
