//! In-memory host for running handlers and the adapter natively.
//!
//! [`MockHost`] hands out resources implementing every [`crate::host`]
//! trait and records what the adapter does with them: reads, writes,
//! status codes, out-parameter resolution, outbound requests, and the
//! order in which resources are released.
//!
//! ```
//! use spindle_http::mock::MockHost;
//! use spindle_http::{serve, Method, Request, Response};
//!
//! let host = MockHost::new();
//! let request = host.incoming_request(Method::Post).path_with_query("/echo").body("hi");
//! let echo = |req: Request| -> anyhow::Result<Response> {
//!     Ok(Response::new(200, Default::default(), req.body_bytes().to_vec()))
//! };
//!
//! serve(&echo, request, host.outparam()).unwrap();
//! assert_eq!(host.recorded().body, b"hi");
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::body::MAX_BLOCKING_WRITE_SIZE;
use crate::header::FieldList;
use crate::host::{
    FutureIncomingResponse, IncomingBody, IncomingRequest, IncomingResponse, InputStream,
    OutgoingBody, OutgoingHandler, OutgoingRequestHead, OutgoingResponse, OutputStream, Pollable,
    RequestOptions, ResponseOutparam, StreamError,
};
use crate::method::Method;
use crate::{Error, Result};

/// A host-side effect observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A blocking read returned this many bytes.
    Read(usize),
    InputStreamDropped,
    IncomingBodyFinished,
    StatusSet(u16),
    OutparamSet,
    OutparamFailed,
    /// A blocking write-and-flush of this many bytes.
    Write(usize),
    OutputStreamDropped,
    /// The outgoing body was finished (the mock has no trailers).
    OutgoingBodyFinished,
    RequestSent,
    Blocked,
    PollableDropped,
    FutureDropped,
}

/// Snapshot of everything the mock host observed.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub events: Vec<Event>,
    /// Number of times the out-parameter was resolved, either way.
    pub outparam_sets: usize,
    pub outparam_error: Option<String>,
    /// Status of the response handed to the out-parameter.
    pub status: Option<u16>,
    pub headers: FieldList,
    /// Concatenation of all written chunks.
    pub body: Vec<u8>,
    /// Size of each write, in order.
    pub writes: Vec<usize>,
    pub sent: Vec<(OutgoingRequestHead, Option<RequestOptions>)>,
}

type Log = Rc<RefCell<Recording>>;

fn record(log: &Log, event: Event) {
    log.borrow_mut().events.push(event);
}

/// Factory for mock resources sharing one [`Recording`].
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    log: Log,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// An incoming request with no path, headers or body.
    pub fn incoming_request(&self, method: Method) -> MockIncomingRequest {
        MockIncomingRequest {
            method,
            path_with_query: None,
            headers: FieldList::new(),
            body: BodyScript::default(),
            consumed: Cell::new(false),
            log: self.log.clone(),
        }
    }

    pub fn outparam(&self) -> MockOutparam {
        MockOutparam {
            write_failure: None,
            rejected_headers: Vec::new(),
            log: self.log.clone(),
        }
    }

    /// An outgoing handler with no queued replies.
    pub fn outgoing_handler(&self) -> MockOutgoingHandler {
        MockOutgoingHandler {
            replies: RefCell::new(VecDeque::new()),
            pending_polls: 0,
            log: self.log.clone(),
        }
    }

    pub fn recorded(&self) -> Recording {
        self.log.borrow().clone()
    }
}

// ── Incoming bodies ─────────────────────────────────────────────────

/// One scripted outcome of a blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    Data(Vec<u8>),
    Fail(String),
}

/// Reads replay the steps in order; an exhausted script reports `Closed`.
/// A `Data` step longer than the requested length is split across reads.
#[derive(Debug, Default)]
struct BodyScript {
    steps: RefCell<VecDeque<ReadStep>>,
}

impl BodyScript {
    fn push(&mut self, step: ReadStep) {
        self.steps.get_mut().push_back(step);
    }
}

#[derive(Debug)]
pub struct MockIncomingBody<'a> {
    script: &'a BodyScript,
    stream_taken: Cell<bool>,
    log: Log,
}

impl IncomingBody for MockIncomingBody<'_> {
    type Stream<'s>
        = MockInputStream<'s>
    where
        Self: 's;

    fn stream(&self) -> Result<MockInputStream<'_>> {
        if self.stream_taken.replace(true) {
            return Err(Error::Body("input stream already taken".to_string()));
        }
        Ok(MockInputStream {
            script: self.script,
            log: self.log.clone(),
        })
    }

    fn finish(self) {
        record(&self.log, Event::IncomingBodyFinished);
    }
}

#[derive(Debug)]
pub struct MockInputStream<'a> {
    script: &'a BodyScript,
    log: Log,
}

impl InputStream for MockInputStream<'_> {
    fn blocking_read(&self, len: u64) -> std::result::Result<Vec<u8>, StreamError> {
        let mut steps = self.script.steps.borrow_mut();
        match steps.pop_front() {
            None => Err(StreamError::Closed),
            Some(ReadStep::Fail(message)) => Err(StreamError::LastOperationFailed(message)),
            Some(ReadStep::Data(mut data)) => {
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                if data.len() > len {
                    let rest = data.split_off(len);
                    steps.push_front(ReadStep::Data(rest));
                }
                record(&self.log, Event::Read(data.len()));
                Ok(data)
            }
        }
    }
}

impl Drop for MockInputStream<'_> {
    fn drop(&mut self) {
        record(&self.log, Event::InputStreamDropped);
    }
}

// ── Incoming requests ───────────────────────────────────────────────

#[derive(Debug)]
pub struct MockIncomingRequest {
    method: Method,
    path_with_query: Option<String>,
    headers: FieldList,
    body: BodyScript,
    consumed: Cell<bool>,
    log: Log,
}

impl MockIncomingRequest {
    pub fn path_with_query(mut self, path_with_query: impl Into<String>) -> Self {
        self.path_with_query = Some(path_with_query.into());
        self
    }

    /// Add a header with a raw byte value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Deliver `body` as one read step (still split by the read bound).
    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        self.chunks([body.into()])
    }

    /// Deliver each chunk as its own read step.
    pub fn chunks<I, C>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        for chunk in chunks {
            self.body.push(ReadStep::Data(chunk.into()));
        }
        self
    }

    /// Fail the next read after the steps queued so far.
    pub fn fail_read(mut self, message: impl Into<String>) -> Self {
        self.body.push(ReadStep::Fail(message.into()));
        self
    }
}

impl IncomingRequest for MockIncomingRequest {
    type Body<'a> = MockIncomingBody<'a>;

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn path_with_query(&self) -> Option<String> {
        self.path_with_query.clone()
    }

    fn headers(&self) -> FieldList {
        self.headers.clone()
    }

    fn consume(&self) -> Result<MockIncomingBody<'_>> {
        if self.consumed.replace(true) {
            return Err(Error::Body("request body already consumed".to_string()));
        }
        Ok(MockIncomingBody {
            script: &self.body,
            stream_taken: Cell::new(false),
            log: self.log.clone(),
        })
    }
}

// ── Outgoing responses ──────────────────────────────────────────────

#[derive(Debug)]
pub struct MockOutparam {
    write_failure: Option<String>,
    rejected_headers: Vec<String>,
    log: Log,
}

impl MockOutparam {
    /// Make every write on the response body fail with `message`.
    pub fn failing_writes(self, message: impl Into<String>) -> Self {
        Self {
            write_failure: Some(message.into()),
            ..self
        }
    }

    /// Refuse to build a response carrying any of `names`, the way the
    /// host refuses forbidden header names.
    pub fn rejecting_headers<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            rejected_headers: names.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}

impl ResponseOutparam for MockOutparam {
    type Response = MockOutgoingResponse;

    fn new_response(&self, headers: FieldList) -> Result<MockOutgoingResponse> {
        if let Some((name, _)) = headers.iter().find(|(name, _)| {
            self.rejected_headers
                .iter()
                .any(|rejected| rejected.eq_ignore_ascii_case(name))
        }) {
            return Err(Error::Header(format!("forbidden header `{name}`")));
        }
        Ok(MockOutgoingResponse {
            headers,
            status: Cell::new(200),
            body_taken: Cell::new(false),
            write_failure: self.write_failure.clone(),
            log: self.log.clone(),
        })
    }

    fn set(self, response: MockOutgoingResponse) {
        let mut log = self.log.borrow_mut();
        log.outparam_sets += 1;
        log.status = Some(response.status.get());
        log.headers = response.headers.clone();
        log.events.push(Event::OutparamSet);
    }

    fn set_error(self, message: String) {
        let mut log = self.log.borrow_mut();
        log.outparam_sets += 1;
        log.outparam_error = Some(message);
        log.events.push(Event::OutparamFailed);
    }
}

#[derive(Debug)]
pub struct MockOutgoingResponse {
    headers: FieldList,
    status: Cell<u16>,
    body_taken: Cell<bool>,
    write_failure: Option<String>,
    log: Log,
}

impl OutgoingResponse for MockOutgoingResponse {
    type Body = MockOutgoingBody;

    /// Accepts 100..=999, like the host.
    fn set_status_code(&self, status: u16) -> Result<()> {
        if !(100..=999).contains(&status) {
            return Err(Error::Host(format!("invalid status code {status}")));
        }
        self.status.set(status);
        record(&self.log, Event::StatusSet(status));
        Ok(())
    }

    fn body(&self) -> Result<MockOutgoingBody> {
        if self.body_taken.replace(true) {
            return Err(Error::Body("response body already taken".to_string()));
        }
        Ok(MockOutgoingBody {
            stream_taken: Cell::new(false),
            write_failure: self.write_failure.clone(),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockOutgoingBody {
    stream_taken: Cell<bool>,
    write_failure: Option<String>,
    log: Log,
}

impl OutgoingBody for MockOutgoingBody {
    type Stream<'a> = MockOutputStream<'a>;

    fn write(&self) -> Result<MockOutputStream<'_>> {
        if self.stream_taken.replace(true) {
            return Err(Error::Body("output stream already taken".to_string()));
        }
        Ok(MockOutputStream { body: self })
    }

    fn finish(self) -> Result<()> {
        record(&self.log, Event::OutgoingBodyFinished);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockOutputStream<'a> {
    body: &'a MockOutgoingBody,
}

impl OutputStream for MockOutputStream<'_> {
    fn blocking_write_and_flush(&self, contents: &[u8]) -> std::result::Result<(), StreamError> {
        if let Some(message) = &self.body.write_failure {
            return Err(StreamError::LastOperationFailed(message.clone()));
        }
        if contents.len() > MAX_BLOCKING_WRITE_SIZE {
            return Err(StreamError::LastOperationFailed(format!(
                "write of {} bytes exceeds the permitted {MAX_BLOCKING_WRITE_SIZE}",
                contents.len()
            )));
        }
        let mut log = self.body.log.borrow_mut();
        log.events.push(Event::Write(contents.len()));
        log.writes.push(contents.len());
        log.body.extend_from_slice(contents);
        Ok(())
    }
}

impl Drop for MockOutputStream<'_> {
    fn drop(&mut self) {
        record(&self.body.log, Event::OutputStreamDropped);
    }
}

// ── Outbound requests ───────────────────────────────────────────────

/// A response the mock outgoing handler replies with.
#[derive(Debug)]
pub struct MockIncomingResponse {
    status: u16,
    headers: FieldList,
    body: BodyScript,
    consumed: Cell<bool>,
    log: Log,
}

impl MockIncomingResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: FieldList::new(),
            body: BodyScript::default(),
            consumed: Cell::new(false),
            log: Log::default(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        self.chunks([body.into()])
    }

    pub fn chunks<I, C>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        for chunk in chunks {
            self.body.push(ReadStep::Data(chunk.into()));
        }
        self
    }

    pub fn fail_read(mut self, message: impl Into<String>) -> Self {
        self.body.push(ReadStep::Fail(message.into()));
        self
    }
}

impl IncomingResponse for MockIncomingResponse {
    type Body<'a> = MockIncomingBody<'a>;

    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> FieldList {
        self.headers.clone()
    }

    fn consume(&self) -> Result<MockIncomingBody<'_>> {
        if self.consumed.replace(true) {
            return Err(Error::Body("response body already consumed".to_string()));
        }
        Ok(MockIncomingBody {
            script: &self.body,
            stream_taken: Cell::new(false),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
enum MockReply {
    Response(MockIncomingResponse),
    Transport(String),
}

/// Replies to each outbound request with the next queued reply.
#[derive(Debug)]
pub struct MockOutgoingHandler {
    replies: RefCell<VecDeque<MockReply>>,
    pending_polls: usize,
    log: Log,
}

impl MockOutgoingHandler {
    pub fn reply(self, response: MockIncomingResponse) -> Self {
        self.replies
            .borrow_mut()
            .push_back(MockReply::Response(response));
        self
    }

    /// Resolve the next request with a transport error code.
    pub fn reply_error(self, message: impl Into<String>) -> Self {
        self.replies
            .borrow_mut()
            .push_back(MockReply::Transport(message.into()));
        self
    }

    /// Report each response as pending for `polls` polls before it is ready.
    pub fn pending_polls(self, polls: usize) -> Self {
        Self {
            pending_polls: polls,
            ..self
        }
    }
}

impl OutgoingHandler for MockOutgoingHandler {
    type Future = MockFutureResponse;

    fn handle(
        &self,
        request: OutgoingRequestHead,
        options: Option<RequestOptions>,
    ) -> Result<MockFutureResponse> {
        {
            let mut log = self.log.borrow_mut();
            log.sent.push((request, options));
            log.events.push(Event::RequestSent);
        }
        let reply = match self.replies.borrow_mut().pop_front() {
            Some(MockReply::Response(mut response)) => {
                response.log = self.log.clone();
                MockReply::Response(response)
            }
            Some(other) => other,
            None => return Err(Error::Host("no reply queued".to_string())),
        };
        Ok(MockFutureResponse {
            reply: RefCell::new(Some(reply)),
            remaining_polls: Cell::new(self.pending_polls),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockFutureResponse {
    reply: RefCell<Option<MockReply>>,
    remaining_polls: Cell<usize>,
    log: Log,
}

impl FutureIncomingResponse for MockFutureResponse {
    type Pollable<'a> = MockPollable<'a>;
    type Response = MockIncomingResponse;

    fn subscribe(&self) -> MockPollable<'_> {
        MockPollable { future: self }
    }

    fn get(&self) -> Option<Result<MockIncomingResponse>> {
        if self.remaining_polls.get() > 0 {
            return None;
        }
        Some(match self.reply.borrow_mut().take() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Transport(message)) => Err(Error::Transport(message)),
            None => Err(Error::ResponseAlreadyTaken),
        })
    }
}

impl Drop for MockFutureResponse {
    fn drop(&mut self) {
        record(&self.log, Event::FutureDropped);
    }
}

#[derive(Debug)]
pub struct MockPollable<'a> {
    future: &'a MockFutureResponse,
}

impl Pollable for MockPollable<'_> {
    fn block(&self) {
        let remaining = self.future.remaining_polls.get();
        self.future.remaining_polls.set(remaining.saturating_sub(1));
        record(&self.future.log, Event::Blocked);
    }
}

impl Drop for MockPollable<'_> {
    fn drop(&mut self) {
        record(&self.future.log, Event::PollableDropped);
    }
}
