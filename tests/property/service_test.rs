// tests/property/service_test.rs

//! Property-based tests for the served wire contract
//! Any terminated request head, however it is phrased or delivered, gets
//! exactly one well-formed counted response.

use crate::test_helpers::{TestContext, body, status_line};
use proptest::prelude::*;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 25,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_any_terminated_head_gets_a_counted_response(
        lines in prop::collection::vec("[ -~]{1,64}", 1..5)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;

            let mut request = lines.join("\r\n").into_bytes();
            request.extend_from_slice(b"\r\n\r\n");
            let response = ctx.exchange_with(&request).await;

            assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
            assert_eq!(body(&response), "Hello, world! Visits: 1");
        });
    }

    #[test]
    fn test_request_survives_arbitrary_tcp_chunking(
        split in 0usize..30,
        pause_ms in 0u64..20
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;

            let request = b"GET / HTTP/1.1\r\nHost: prop\r\n\r\n";
            let cut = split.min(request.len());

            let mut stream = TcpStream::connect(ctx.addr).await.unwrap();
            stream.write_all(&request[..cut]).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
            stream.write_all(&request[cut..]).await.unwrap();

            let mut response = Vec::new();
            stream.read_to_end(&mut response).await.unwrap();

            assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
            assert_eq!(body(&response), "Hello, world! Visits: 1");
        });
    }
}
