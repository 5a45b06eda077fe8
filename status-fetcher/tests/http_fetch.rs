//! Integration tests for the HTTP status fetcher against a local mock endpoint.

use std::sync::Arc;

use status_fetcher::{FetchError, HttpStatusFetcher, StatusFetcher, StatusPayload, Url};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Minimal HTTP server answering every request with the same canned response
struct MockStatusServer {
    listener: TcpListener,
    port: u16,
    received_requests: Arc<Mutex<Vec<String>>>,
}

impl MockStatusServer {
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        Self {
            listener,
            port,
            received_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}{}", self.port, path)).unwrap()
    }

    fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.received_requests)
    }

    fn start(self, status_line: &'static str, body: &'static str) -> tokio::task::JoinHandle<()> {
        let received_requests = self.received_requests;
        let listener = self.listener;

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let received_requests = Arc::clone(&received_requests);

                tokio::spawn(async move {
                    let mut buffer = [0; 4096];
                    let n = match stream.read(&mut buffer).await {
                        Ok(n) => n,
                        Err(_) => return,
                    };
                    let request = String::from_utf8_lossy(&buffer[..n]).to_string();
                    received_requests.lock().await.push(request);

                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        })
    }
}

#[tokio::test]
async fn test_fetch_decodes_payload() {
    let server = MockStatusServer::new().await;
    let url = server.url("/jobs/42/progress");
    let requests = server.requests();
    let _handle = server.start(
        "200 OK",
        r#"{"value": 50, "max": 100, "finished": false, "age": 4}"#,
    );

    let fetcher = HttpStatusFetcher::new().unwrap();
    let payload = fetcher.fetch(&url).await.unwrap();

    assert_eq!(payload, StatusPayload::in_progress(50.0, 100.0).with_age(4.0));

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /jobs/42/progress HTTP/1.1"));
    assert!(requests[0].to_ascii_lowercase().contains("accept: application/json"));
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let server = MockStatusServer::new().await;
    let url = server.url("/missing");
    let _handle = server.start("404 Not Found", r#"{"error": "no such job"}"#);

    let fetcher = HttpStatusFetcher::new().unwrap();
    let error = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(error, FetchError::Status { status: 404 });
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_fetch_reports_server_error_as_retryable() {
    let server = MockStatusServer::new().await;
    let url = server.url("/progress");
    let _handle = server.start("503 Service Unavailable", "{}");

    let fetcher = HttpStatusFetcher::new().unwrap();
    let error = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(error, FetchError::Status { status: 503 });
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_fetch_rejects_malformed_body() {
    let server = MockStatusServer::new().await;
    let url = server.url("/progress");
    let _handle = server.start("200 OK", r#"{"value": 50, "finished": false}"#);

    let fetcher = HttpStatusFetcher::new().unwrap();
    match fetcher.fetch(&url).await {
        Err(FetchError::Schema(msg)) => assert!(msg.contains("max")),
        other => panic!("Expected FetchError::Schema, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_connection_refused_is_network_error() {
    // Grab a free port and release it so nothing is listening there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = Url::parse(&format!("http://127.0.0.1:{}/progress", port)).unwrap();
    let fetcher = HttpStatusFetcher::new().unwrap();
    let error = fetcher.fetch(&url).await.unwrap_err();

    assert!(matches!(error, FetchError::Network(_)));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_fetch_through_shared_trait_object() {
    let server = MockStatusServer::new().await;
    let url = server.url("/progress");
    let _handle = server.start("200 OK", r#"{"value": 3, "max": 3, "finished": true}"#);

    let fetcher: Arc<dyn StatusFetcher> = Arc::new(HttpStatusFetcher::new().unwrap());
    let payload = fetcher.fetch(&url).await.unwrap();

    assert!(payload.finished);
    assert_eq!(payload.progress(), (3.0, 3.0));
}
