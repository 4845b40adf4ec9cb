//! Property tests for the buffering and resolution guarantees of the
//! inbound adapter.

use std::cell::RefCell;

use anyhow::anyhow;
use proptest::prelude::*;

use spindle_http::mock::{Event, MockHost};
use spindle_http::{serve, AdapterConfig, HeaderMap, Method, Request, Response};

fn body_chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..2048), 0..12)
}

fn header_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z][a-z0-9-]{0,15}", "[ -~]{0,32}"), 0..10)
}

proptest! {
    #[test]
    fn prop_request_body_is_concatenation_of_reads(
        chunks in body_chunks(),
        read_chunk_size in 1u64..8192,
    ) {
        let expected: Vec<u8> = chunks.concat();
        let host = MockHost::new();
        let request = host
            .incoming_request(Method::Post)
            .path_with_query("/upload")
            .chunks(chunks);
        let seen = RefCell::new(None);
        let handler = |req: Request| -> anyhow::Result<Response> {
            *seen.borrow_mut() = Some(req.body_bytes().to_vec());
            Ok(Response::empty(204, HeaderMap::new()))
        };
        let config = AdapterConfig::default().with_read_chunk_size(read_chunk_size);

        spindle_http::serve_with_config(&handler, request, host.outparam(), &config).unwrap();

        prop_assert_eq!(seen.into_inner(), Some(expected));
        let recorded = host.recorded();
        for event in &recorded.events {
            if let Event::Read(n) = event {
                prop_assert!((*n as u64) <= read_chunk_size);
            }
        }
    }

    #[test]
    fn prop_response_body_written_in_bounded_chunks(len in 0usize..40_000) {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let host = MockHost::new();
        let request = host.incoming_request(Method::Get);
        let body = payload.clone();
        let handler = move |_req: Request| -> anyhow::Result<Response> {
            Ok(Response::new(200, HeaderMap::new(), body.clone()))
        };

        serve(&handler, request, host.outparam()).unwrap();

        let recorded = host.recorded();
        prop_assert_eq!(recorded.writes.len(), len.div_ceil(4096));
        prop_assert!(recorded.writes.iter().all(|w| *w > 0 && *w <= 4096));
        prop_assert_eq!(recorded.body, payload);
        prop_assert_eq!(recorded.outparam_sets, 1);
    }

    #[test]
    fn prop_headers_survive_host_encoding(pairs in header_pairs()) {
        let headers: HeaderMap = pairs.iter().cloned().collect();
        let decoded = HeaderMap::from_fields(headers.to_fields()).unwrap();
        prop_assert_eq!(decoded, headers);
    }

    #[test]
    fn prop_response_headers_reach_host_in_order(pairs in header_pairs()) {
        let host = MockHost::new();
        let request = host.incoming_request(Method::Get);
        let headers: HeaderMap = pairs.iter().cloned().collect();
        let handler = move |_req: Request| -> anyhow::Result<Response> {
            Ok(Response::empty(200, headers.clone()))
        };

        serve(&handler, request, host.outparam()).unwrap();

        let expected: Vec<(String, Vec<u8>)> = pairs
            .into_iter()
            .map(|(name, value)| (name, value.into_bytes()))
            .collect();
        prop_assert_eq!(host.recorded().headers, expected);
    }

    #[test]
    fn prop_failing_handler_always_yields_bodiless_500(
        chunks in body_chunks(),
        message in "[a-z ]{1,40}",
    ) {
        let host = MockHost::new();
        let request = host.incoming_request(Method::Put).chunks(chunks);
        let handler = move |_req: Request| -> anyhow::Result<Response> {
            Err(anyhow!(message.clone()))
        };

        serve(&handler, request, host.outparam()).unwrap();

        let recorded = host.recorded();
        prop_assert_eq!(recorded.outparam_sets, 1);
        prop_assert_eq!(recorded.status, Some(500));
        prop_assert!(recorded.headers.is_empty());
        prop_assert!(recorded.writes.is_empty());
        prop_assert!(recorded.outparam_error.is_none());
        prop_assert_eq!(recorded.events.last(), Some(&Event::OutgoingBodyFinished));
    }
}
