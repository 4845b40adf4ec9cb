//! hello-http: a `wasi:http/proxy` component built on spindle-http.
//!
//! Build: cargo build --target wasm32-wasip2 --release
//!
//! Routes:
//!   GET  /            plain-text greeting
//!   POST /echo        echoes the request body and content type
//!   GET  /fetch?url=U fetches U (percent-encoded) through the host and
//!                     relays the response

use std::sync::Once;

use anyhow::{bail, Context};
use spindle_http::wasip2::{send_wasi, serve_wasi};
use spindle_http::{HeaderMap, Method, Request, Response};
use tracing::info;
use wasi::http::types::{IncomingRequest, ResponseOutparam};

struct Component;

wasi::http::proxy::export!(Component);

impl wasi::exports::http::incoming_handler::Guest for Component {
    fn handle(request: IncomingRequest, response_out: ResponseOutparam) {
        init_tracing();
        serve_wasi(&route, request, response_out);
    }
}

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn route(request: Request) -> anyhow::Result<Response> {
    let method = request.method().clone();
    let path = request.uri().split('?').next().unwrap_or("/").to_string();
    info!(%method, %path, "request");
    match (&method, path.as_str()) {
        (Method::Get, "/") => Ok(Response::text(200, "hello from spindle-http\n")),
        (Method::Post, "/echo") => echo(request),
        (Method::Get, "/fetch") => fetch(&request),
        _ => Ok(Response::text(404, "not found\n")),
    }
}

fn echo(request: Request) -> anyhow::Result<Response> {
    let mut headers = HeaderMap::new();
    if let Some(content_type) = request.headers().get("content-type") {
        headers.insert("content-type", content_type);
    }
    let (_, _, _, body) = request.into_parts();
    Ok(Response::new(200, headers, body.unwrap_or_default()))
}

fn fetch(request: &Request) -> anyhow::Result<Response> {
    let Some(raw) = query_param(request.uri(), "url") else {
        return Ok(Response::text(400, "missing url parameter\n"));
    };
    let Some(target) = percent_decode(raw) else {
        return Ok(Response::text(400, "malformed url parameter\n"));
    };
    if !target.starts_with("http://") && !target.starts_with("https://") {
        bail!("refusing to fetch non-http url {target}");
    }
    let upstream =
        send_wasi(Request::get(target.as_str())).with_context(|| format!("fetching {target}"))?;
    let (status, headers, body) = upstream.into_parts();
    Ok(Response::new(status, headers, body.unwrap_or_default()))
}

fn query_param<'a>(uri: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = uri.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Decode `%XX` escapes and `+` in a query value. `None` on a truncated or
/// non-hex escape, or when the result is not UTF-8.
fn percent_decode(value: &str) -> Option<String> {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let hi = char::from(bytes.next()?).to_digit(16)?;
                let lo = char::from(bytes.next()?).to_digit(16)?;
                out.push(u8::try_from(hi * 16 + lo).ok()?);
            }
            b'+' => out.push(b' '),
            other => out.push(other),
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_finds_named_value() {
        assert_eq!(query_param("/fetch?a=1&url=x", "url"), Some("x"));
        assert_eq!(query_param("/fetch", "url"), None);
    }

    #[test]
    fn percent_decode_handles_encoded_url() {
        assert_eq!(
            percent_decode("https%3A%2F%2Fexample.com%2Fa%3Fb%3D1").as_deref(),
            Some("https://example.com/a?b=1")
        );
        assert_eq!(percent_decode("http://plain.example/").as_deref(), Some("http://plain.example/"));
    }

    #[test]
    fn percent_decode_rejects_bad_escapes() {
        assert_eq!(percent_decode("abc%2"), None);
        assert_eq!(percent_decode("%zz"), None);
        assert_eq!(percent_decode("%ff"), None);
    }
}
