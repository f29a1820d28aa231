// tests/integration/server_test.rs

//! End-to-end tests against a running server: accept, count, respond, close.

use super::test_helpers::{SIMPLE_REQUEST, TestContext, body, header, send_request, status_line};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_first_visit_is_counted_and_reported() {
    let ctx = TestContext::new().await;

    let response = ctx.exchange().await;

    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert_eq!(body(&response), "Hello, world! Visits: 1");
}

#[tokio::test]
async fn test_sequential_visits_count_up() {
    let ctx = TestContext::new().await;

    for expected in 1..=3 {
        let response = ctx.exchange().await;
        assert_eq!(body(&response), format!("Hello, world! Visits: {expected}"));
    }
}

#[tokio::test]
async fn test_response_header_contract() {
    let ctx = TestContext::new().await;

    let response = ctx.exchange().await;

    assert_eq!(header(&response, "Content-Type").as_deref(), Some("text/html"));
    assert_eq!(header(&response, "Connection").as_deref(), Some("close"));
    assert_eq!(
        header(&response, "Content-Length").as_deref(),
        Some(body(&response).len().to_string().as_str())
    );
}

#[tokio::test]
async fn test_request_content_is_irrelevant() {
    let ctx = TestContext::new().await;

    let response = ctx
        .exchange_with(b"BREW /coffee TEAPOT/0.9\r\nX-Anything: at all\r\n\r\n")
        .await;

    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert_eq!(body(&response), "Hello, world! Visits: 1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_all_succeed() {
    let ctx = TestContext::new().await;
    let addr = ctx.addr;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        tasks.push(tokio::spawn(async move {
            send_request(addr, SIMPLE_REQUEST).await
        }));
    }
    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        assert!(body(&response).starts_with("Hello, world! Visits: "));
    }

    // All eight earlier visits are recorded by now, so the ninth session
    // sees a deterministic count.
    let response = ctx.exchange().await;
    assert_eq!(body(&response), "Hello, world! Visits: 9");

    ctx.wait_for_active_sessions(0).await;
    assert_eq!(ctx.state.stats.get_total_connections(), 9);
    assert_eq!(ctx.state.stats.get_total_responses(), 9);
}

#[tokio::test]
async fn test_aborted_connection_still_counts_the_visit() {
    let ctx = TestContext::new().await;

    {
        let mut stream = TcpStream::connect(ctx.addr).await.unwrap();
        stream.write_all(b"GET / HT").await.unwrap();
    }
    ctx.wait_for_visits(1).await;

    let response = ctx.exchange().await;
    assert_eq!(body(&response), "Hello, world! Visits: 2");
}

#[tokio::test]
async fn test_idle_client_hits_read_deadline() {
    let mut config = TestContext::config();
    config.read_timeout = Duration::from_millis(200);
    let ctx = TestContext::with_config(config).await;

    let mut idle = TcpStream::connect(ctx.addr).await.unwrap();
    let mut response = Vec::new();
    idle.read_to_end(&mut response).await.unwrap();

    // The deadline closes the connection without a response.
    assert!(response.is_empty());

    // The server is unaffected, and the idle visit was still counted.
    let response = ctx.exchange().await;
    assert_eq!(body(&response), "Hello, world! Visits: 2");
}

#[tokio::test]
async fn test_shutdown_signal_closes_idle_sessions() {
    let ctx = TestContext::new().await;

    let mut first = TcpStream::connect(ctx.addr).await.unwrap();
    let mut second = TcpStream::connect(ctx.addr).await.unwrap();
    ctx.wait_for_active_sessions(2).await;

    ctx.shutdown_tx
        .send(())
        .expect("idle sessions should be subscribed");

    let drain = async {
        let mut buf = Vec::new();
        first.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
        let mut buf = Vec::new();
        second.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
    };
    tokio::time::timeout(Duration::from_secs(2), drain)
        .await
        .expect("shutdown should close idle sessions promptly");

    ctx.wait_for_active_sessions(0).await;

    // The accept loop itself is still running; only sessions were told to
    // stop.
    let response = ctx.exchange().await;
    assert_eq!(body(&response), "Hello, world! Visits: 3");
}

#[tokio::test]
async fn test_servers_are_isolated() {
    let first = TestContext::new().await;
    let second = TestContext::new().await;

    assert_eq!(body(&first.exchange().await), "Hello, world! Visits: 1");
    assert_eq!(body(&first.exchange().await), "Hello, world! Visits: 2");
    assert_eq!(body(&second.exchange().await), "Hello, world! Visits: 1");
}
