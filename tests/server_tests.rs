//! Serving over a real socket, including shutdown

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use common::fixture;
use spa_server::config::AppState;
use spa_server::server::{create_listener, serve_until};

async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    // A rejected connection may be reset before or during the exchange
    if stream.write_all(request.as_bytes()).await.is_err() {
        return String::new();
    }

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let dist = fixture::dist();
    let state = Arc::new(AppState::new(fixture::config(dist.path())).unwrap());

    let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_until(listener, Arc::clone(&state), async move {
        let _ = stop_rx.await;
        "test"
    }));

    let response = raw_get(addr, "/").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.to_ascii_lowercase().contains("cache-control: no-store"));
    assert!(response.ends_with(fixture::INDEX_HTML));

    let response = raw_get(addr, "/client/route").await;
    assert!(response.ends_with(fixture::INDEX_HTML));

    let response = raw_get(addr, "/vite.svg").await;
    assert!(response.to_ascii_lowercase().contains("cache-control: max-age=604800"));

    stop_tx.send(()).unwrap();
    server.await.unwrap();

    assert_eq!(state.cache.stats().entries, 0);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_connection_limit_rejects_excess() {
    let dist = fixture::dist();
    let mut config = fixture::config(dist.path());
    config.performance.max_connections = Some(1);
    let state = Arc::new(AppState::new(config).unwrap());

    // Hold the only slot
    assert!(state.try_acquire_connection());

    let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(listener, Arc::clone(&state), async move {
        let _ = stop_rx.await;
        "test"
    }));

    // Rejected connections are closed without a response
    let response = raw_get(addr, "/").await;
    assert!(response.is_empty(), "{response}");

    state.release_connection();
    let response = raw_get(addr, "/").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");

    stop_tx.send(()).unwrap();
    server.await.unwrap();
}
