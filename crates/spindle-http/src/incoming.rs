//! Inbound adapter: host incoming request → [`Handler`] → host response.
//!
//! The request body is fully buffered before the handler runs, and the
//! handler's response body is fully written before control returns to the
//! host. Handler failures never escape: they become a bodiless 500.

use tracing::{debug, error, warn};

use crate::body::{read_to_end, write_all};
use crate::config::AdapterConfig;
use crate::header::{FieldList, HeaderMap};
use crate::host::{IncomingRequest, OutgoingBody, OutgoingResponse, ResponseOutparam};
use crate::{Error, Request, Response, Result};

/// A synchronous, fully-buffered request handler.
///
/// Implemented for any `Fn(Request) -> anyhow::Result<Response>`.
pub trait Handler {
    /// Handle an incoming request and return a response or an error.
    fn handle_request(&self, request: Request) -> anyhow::Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> anyhow::Result<Response>,
{
    fn handle_request(&self, request: Request) -> anyhow::Result<Response> {
        self(request)
    }
}

/// Serve one incoming request with the default [`AdapterConfig`].
pub fn serve<H, R, O>(handler: &H, request: R, response_out: O) -> Result<()>
where
    H: Handler + ?Sized,
    R: IncomingRequest,
    O: ResponseOutparam,
{
    serve_with_config(handler, request, response_out, &AdapterConfig::default())
}

/// Serve one incoming request.
///
/// Returns `Ok` whenever a response was delivered, including the 500
/// produced for a failing handler. Returns `Err` for fatal host failures
/// (e.g. a request stream error); the out-parameter has then already been
/// resolved with an internal error.
pub fn serve_with_config<H, R, O>(
    handler: &H,
    request: R,
    response_out: O,
    config: &AdapterConfig,
) -> Result<()>
where
    H: Handler + ?Sized,
    R: IncomingRequest,
    O: ResponseOutparam,
{
    let outparam = OutparamGuard::new(response_out);
    config.validate()?;

    let method = request.method();
    let body = read_to_end(request.consume()?, config.read_chunk_size)?;
    let uri = request
        .path_with_query()
        .unwrap_or_else(|| "/".to_string());
    debug!(%method, %uri, body_len = body.len(), "incoming request buffered");

    let result = HeaderMap::from_fields(request.headers())
        .map_err(anyhow::Error::from)
        .and_then(|headers| handler.handle_request(Request::new(method, uri, headers, body)));

    match result {
        Ok(response) => respond(outparam, response, config),
        Err(e) => {
            error!(error = format!("{e:#}"), "handler failed, responding with 500");
            respond_internal_error(outparam)
        }
    }
}

fn respond<O: ResponseOutparam>(
    outparam: OutparamGuard<O>,
    response: Response,
    config: &AdapterConfig,
) -> Result<()> {
    let (status, headers, body) = response.into_parts();
    let outgoing = outparam.new_response(headers.to_fields())?;
    outgoing.set_status_code(status)?;
    let outgoing_body = outgoing.body()?;
    outparam.set(outgoing);

    let body_len = body.as_ref().map_or(0, |b| b.len());
    let writes = write_all(outgoing_body, body, config.write_chunk_size)?;
    debug!(status, body_len, writes, "response written");
    Ok(())
}

fn respond_internal_error<O: ResponseOutparam>(outparam: OutparamGuard<O>) -> Result<()> {
    let outgoing = outparam.new_response(FieldList::new())?;
    let outgoing_body = outgoing.body()?;
    outgoing.set_status_code(500)?;
    outparam.set(outgoing);
    outgoing_body.finish()
}

/// Owns the response out-parameter until it is set.
///
/// [`set`](OutparamGuard::set) consumes the guard, so the out-parameter is
/// resolved at most once. Dropping the guard unset resolves it with an
/// internal error, so it is resolved at least once.
struct OutparamGuard<O: ResponseOutparam> {
    inner: Option<O>,
}

impl<O: ResponseOutparam> OutparamGuard<O> {
    fn new(inner: O) -> Self {
        Self { inner: Some(inner) }
    }

    fn new_response(&self, headers: FieldList) -> Result<O::Response> {
        match &self.inner {
            Some(inner) => inner.new_response(headers),
            None => Err(Error::Host("response out-parameter already set".to_string())),
        }
    }

    fn set(mut self, response: O::Response) {
        if let Some(inner) = self.inner.take() {
            inner.set(response);
        }
    }
}

impl<O: ResponseOutparam> Drop for OutparamGuard<O> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            warn!("request aborted before a response was set, resolving with internal error");
            inner.set_error("request aborted before a response was produced".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::mock::{Event, MockHost};

    fn ok_handler(_req: Request) -> anyhow::Result<Response> {
        Ok(Response::text(200, "ok"))
    }

    #[test]
    fn guard_resolves_unset_outparam_on_drop() {
        let host = MockHost::new();
        let guard = OutparamGuard::new(host.outparam());
        drop(guard);

        let recorded = host.recorded();
        assert_eq!(recorded.outparam_sets, 1);
        assert!(recorded.outparam_error.is_some());
        assert_eq!(recorded.status, None);
    }

    #[test]
    fn guard_set_does_not_fire_on_drop() {
        let host = MockHost::new();
        let guard = OutparamGuard::new(host.outparam());
        let response = guard.new_response(FieldList::new()).unwrap();
        guard.set(response);

        let recorded = host.recorded();
        assert_eq!(recorded.outparam_sets, 1);
        assert!(recorded.outparam_error.is_none());
    }

    #[test]
    fn closure_handlers_are_handlers() {
        let handler = |req: Request| -> anyhow::Result<Response> {
            Ok(Response::text(200, req.method().to_string()))
        };
        let resp = handler.handle_request(Request::get("/")).unwrap();
        assert_eq!(resp.body_bytes(), b"GET");
    }

    #[test]
    fn invalid_config_still_resolves_outparam() {
        let host = MockHost::new();
        let config = AdapterConfig::default().with_write_chunk_size(0);

        let err = serve_with_config(
            &ok_handler,
            host.incoming_request(Method::Get),
            host.outparam(),
            &config,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(host.recorded().outparam_sets, 1);
    }

    #[test]
    fn status_is_set_before_outparam_and_writes_follow() {
        let host = MockHost::new();
        serve(&ok_handler, host.incoming_request(Method::Get), host.outparam()).unwrap();

        let events = host.recorded().events;
        let position = |event: Event| events.iter().position(|e| *e == event).unwrap();
        let status = position(Event::StatusSet(200));
        let set = position(Event::OutparamSet);
        let write = position(Event::Write(2));
        assert!(status < set, "status must be set before the out-parameter: {events:?}");
        assert!(set < write, "body must be written after the out-parameter: {events:?}");
    }

    #[test]
    fn invalid_status_resolves_outparam_with_error() {
        let host = MockHost::new();
        let handler = |_req: Request| -> anyhow::Result<Response> {
            Ok(Response::empty(1000, HeaderMap::new()))
        };

        let err = serve(&handler, host.incoming_request(Method::Get), host.outparam()).unwrap_err();

        assert!(matches!(err, Error::Host(_)));
        let recorded = host.recorded();
        assert_eq!(recorded.outparam_sets, 1);
        assert!(recorded.outparam_error.is_some());
    }
}
