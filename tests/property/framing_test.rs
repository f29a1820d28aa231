// tests/property/framing_test.rs

//! Property-based tests for request framing and response encoding
//! Verifies the decoder only yields on a full terminator, survives arbitrary
//! chunking, and that encoded responses always carry an exact Content-Length.

use bytes::BytesMut;
use proptest::prelude::*;
use tallyd::core::protocol::{HttpCodec, Response, Status};
use tokio_util::codec::{Decoder, Encoder};

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_decode_never_yields_before_terminator(head in "[ -~]{0,512}") {
        // Printable ASCII cannot contain the terminator.
        let mut codec = HttpCodec;
        let mut buf = BytesMut::from(head.as_bytes());

        prop_assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_extracts_exactly_the_head(
        lines in prop::collection::vec("[ -~]{1,64}", 1..6),
        trailing in "[ -~]{0,64}"
    ) {
        let head = lines.join("\r\n");
        let mut codec = HttpCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(head.as_bytes());
        buf.extend_from_slice(b"\r\n\r\n");
        buf.extend_from_slice(trailing.as_bytes());

        let decoded = codec.decode(&mut buf).unwrap().expect("head is complete");
        prop_assert_eq!(decoded.as_bytes(), head.as_bytes());
        prop_assert_eq!(&buf[..], trailing.as_bytes());
    }

    #[test]
    fn test_decode_is_chunking_independent(head in "[ -~]{0,256}", split in 0usize..300) {
        let mut wire = Vec::from(head.as_bytes());
        wire.extend_from_slice(b"\r\n\r\n");
        let cut = split.min(wire.len());

        let mut codec = HttpCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&wire[..cut]);
        let first = codec.decode(&mut buf).unwrap();
        buf.extend_from_slice(&wire[cut..]);
        let second = codec.decode(&mut buf).unwrap();

        let decoded = first.or(second).expect("head after full delivery");
        prop_assert_eq!(decoded.as_bytes(), head.as_bytes());
    }

    #[test]
    fn test_decode_eof_never_yields_a_partial_head(head in "[ -~]{0,512}") {
        let mut codec = HttpCodec;
        let mut buf = BytesMut::from(head.as_bytes());

        prop_assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_content_length_is_exact(body in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut codec = HttpCodec;
        let mut buf = BytesMut::new();
        codec.encode(Response::ok(body.clone()), &mut buf).unwrap();

        let terminator = find_subslice(&buf, b"\r\n\r\n").expect("header terminator");
        let (head, tail) = buf.split_at(terminator + 4);

        prop_assert_eq!(tail, &body[..]);
        let head_text = std::str::from_utf8(head).unwrap();
        prop_assert!(head_text.starts_with("HTTP/1.1 200 OK\r\n"));
        let content_length_header = format!("\r\nContent-Length: {}\r\n", body.len());
        prop_assert!(head_text.contains(&content_length_header));
        prop_assert!(head_text.contains("\r\nConnection: close\r\n"));
    }

    #[test]
    fn test_every_status_encodes_with_empty_body(index in 0usize..4) {
        let status = [
            Status::Ok,
            Status::BadRequest,
            Status::InternalServerError,
            Status::ServiceUnavailable,
        ][index];

        let mut codec = HttpCodec;
        let mut buf = BytesMut::new();
        codec.encode(Response::empty(status), &mut buf).unwrap();

        let text = std::str::from_utf8(&buf).unwrap();
        let status_line = format!("HTTP/1.1 {}\r\n", status.status_line());
        prop_assert!(text.starts_with(&status_line));
        prop_assert!(text.contains("\r\nContent-Length: 0\r\n"));
        prop_assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_visit_count_body_shape(count in any::<u64>()) {
        let response = Response::visits(count);
        prop_assert_eq!(response.status, Status::Ok);

        let body = String::from_utf8(response.body.to_vec()).unwrap();
        prop_assert_eq!(body, format!("Hello, world! Visits: {count}"));
    }
}
