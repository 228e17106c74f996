//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rank_router::{HttpServer, RouterConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Request header asking the mock backend for a response status.
pub const MOCK_STATUS: &str = "x-mock-status";
/// Request header asking the mock backend to delay its response.
pub const MOCK_DELAY_MS: &str = "x-mock-delay-ms";

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A mock backend that records every request it receives.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a mock backend on an ephemeral port.
///
/// It answers `{"ok":true}` with an `x-backend: mock` header. The status and
/// a delay can be requested through [`MOCK_STATUS`] and [`MOCK_DELAY_MS`].
pub async fn start_mock_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        addr: listener.local_addr().unwrap(),
        captured: Arc::default(),
    };

    let app = Router::new().fallback(record).with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    backend
}

async fn record(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let status = header_value::<u16>(&headers, MOCK_STATUS)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::OK);
    let delay = header_value::<u64>(&headers, MOCK_DELAY_MS);

    backend.captured.lock().unwrap().push(Captured { method, uri, headers, body });

    if let Some(ms) = delay {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    let mut response = (status, r#"{"ok":true}"#).into_response();
    response.headers_mut().insert("x-backend", HeaderValue::from_static("mock"));
    response
        .headers_mut()
        .insert("content-type", HeaderValue::from_static("application/json"));
    response
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// Router config pointing at `backend` with `dp_size` ranks.
pub fn proxy_config(backend: &str, dp_size: u64) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.upstream.backend = backend.to_string();
    config.routing.dp_size = dp_size;
    config
}

/// Start the router on an ephemeral port.
///
/// The server stops when the returned sender fires or is dropped.
pub async fn start_proxy(config: RouterConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server
            .run(listener, async {
                let _ = stop_rx.await;
            })
            .await;
    });
    (addr, stop_tx)
}

/// Raw upstream response framed with `Transfer-Encoding: chunked`.
pub const CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: text/plain\r\n\
Transfer-Encoding: chunked\r\n\
Connection: close\r\n\
X-Backend: chunked\r\n\
\r\n\
5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";

/// Start a raw HTTP/1.1 backend that answers every request with
/// [`CHUNKED_RESPONSE`] and then closes the connection.
pub async fn start_chunked_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let _ = socket.write_all(CHUNKED_RESPONSE).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

/// A backend that accepts one connection and never answers.
pub struct SilentBackend {
    pub url: String,
    /// Fires once request bytes arrive.
    pub received: oneshot::Receiver<()>,
    /// Fires once the peer closes the connection.
    pub closed: oneshot::Receiver<()>,
}

pub async fn start_silent_backend() -> SilentBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received_tx = Some(received_tx);
        let mut buf = [0u8; 4096];
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if let Some(tx) = received_tx.take() {
                        let _ = tx.send(());
                    }
                }
            }
        }
        let _ = closed_tx.send(());
    });

    SilentBackend {
        url: format!("http://{}", addr),
        received,
        closed,
    }
}

/// Read until the end of the request head.
async fn read_request_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    head
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
