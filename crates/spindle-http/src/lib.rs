//! spindle-http: blocking, fully-buffered HTTP handlers for WASI components.
//!
//! The host delivers requests as streaming, lifetime-managed `wasi:http`
//! resources. This crate hides them behind a synchronous contract:
//!
//! - [`serve`] drains the incoming body into a [`Request`], calls a
//!   [`Handler`], and writes the returned [`Response`] back in bounded
//!   chunks. A failing handler becomes a bodiless 500.
//! - [`send`] performs an outbound request through the host's outgoing
//!   handler and buffers the whole response. Outgoing request bodies are
//!   not supported.
//!
//! # Host resources
//!
//! Both adapters are generic over the traits in [`host`]. With the `wasi`
//! feature, [`wasip2`] implements them for the `wasi` crate's bindings;
//! [`mock`] implements them in memory so handlers can be exercised natively.
//!
//! # Module Structure
//!
//! - **method** / **header** / **request** / **response**: buffered value types
//! - **body**: bounded read loop and chunked writes
//! - **host**: resource contracts
//! - **incoming** / **outgoing**: the two adapters
//! - **config**: chunk sizes and outbound timeouts

pub mod body;
pub mod config;
mod error;
mod header;
pub mod host;
pub mod incoming;
mod method;
pub mod mock;
pub mod outgoing;
mod request;
mod response;
#[cfg(feature = "wasi")]
pub mod wasip2;

pub use config::AdapterConfig;
pub use error::{Error, Result};
pub use header::{FieldList, Header, HeaderMap};
pub use incoming::{serve, serve_with_config, Handler};
pub use method::{Method, Scheme};
pub use outgoing::{send, send_with_config};
pub use request::Request;
pub use response::Response;
