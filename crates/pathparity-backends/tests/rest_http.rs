//! REST adapter against a local HTTP stub

use parking_lot::Mutex;
use pathparity_backends::{RestBackend, RestConfig};
use pathparity_core::{updates, AdapterErrorKind};
use pathparity_probe::{BackendAdapter, ReadOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// (method, request target, body)
type Seen = Arc<Mutex<Vec<(String, String, String)>>>;

fn respond(method: &str, target: &str) -> (u16, &'static str) {
    if target.contains("reject") {
        return (400, r#"{"error": "Invalid path"}"#);
    }
    match method {
        "GET" if target.contains("missing") => (200, "null"),
        "GET" => (200, r#"{"v": 1}"#),
        _ => (200, "{}"),
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn serve() -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(end) = header_end(&buf) {
                        break end;
                    }
                };

                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < end + length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let mut request_line = head.split_whitespace();
                let method = request_line.next().unwrap_or_default().to_string();
                let target = request_line.next().unwrap_or_default().to_string();
                let body = String::from_utf8_lossy(&buf[end..]).to_string();
                let (status, reply) = respond(&method, &target);
                log.lock().push((method, target, body));

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                    reply.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), seen)
}

fn backend(url: &str) -> RestBackend {
    RestBackend::new(
        RestConfig::new(url)
            .with_auth_token("tok")
            .with_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn write_is_a_put_with_json_body() {
    let (url, seen) = serve().await;
    backend(&url).write("a/b", &json!({"x": 1})).await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen[0].0, "PUT");
    assert_eq!(seen[0].1, "/a/b.json?auth=tok");
    assert_eq!(serde_json::from_str::<Value>(&seen[0].2).unwrap(), json!({"x": 1}));
}

#[tokio::test]
async fn batch_update_patches_the_base_path() {
    let (url, seen) = serve().await;
    backend(&url)
        .batch_update("/", &updates([("/users/u1", json!("one")), ("users/u2", json!("two"))]))
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen[0].0, "PATCH");
    assert_eq!(seen[0].1, "/.json?auth=tok");
    assert_eq!(
        serde_json::from_str::<Value>(&seen[0].2).unwrap(),
        json!({"/users/u1": "one", "users/u2": "two"})
    );
}

#[tokio::test]
async fn null_body_reads_as_missing() {
    let (url, _seen) = serve().await;
    let rest = backend(&url);

    assert_eq!(rest.read("/missing").await.unwrap(), ReadOutcome::missing());
    assert_eq!(rest.read("/present").await.unwrap(), ReadOutcome::found(json!({"v": 1})));
}

#[tokio::test]
async fn status_errors_map_to_rejected() {
    let (url, _seen) = serve().await;
    let err = backend(&url)
        .write("/reject//me", &json!(1))
        .await
        .unwrap_err();

    assert_eq!(err.kind, AdapterErrorKind::Rejected { status: Some(400) });
    assert_eq!(err.message, "Invalid path");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{addr}")).read("/x").await.unwrap_err();
    assert!(matches!(
        err.kind,
        AdapterErrorKind::Transport | AdapterErrorKind::Timeout
    ));
    assert!(err.is_retryable());
}
