//! Helpers shared by the integration tests: throwaway HTTP servers on random
//! ports, each running its own tokio runtime on a background thread.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    Router,
};

pub const CHECK_ID: &str = "73d29e72-6540-4bb5-967e-e07fa2c9465e";
pub const CHECK_JSON: &str = include_str!("../../../test-vectors/check.json");
pub const BAD_REQUEST_JSON: &str = include_str!("../../../test-vectors/bad_request.json");

/// What a recording server saw for one request.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

/// Serve `router` on 127.0.0.1 and return its base URL.
pub fn serve(router: Router) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, router).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Start the mock Checkly API with `api_key` and return its base URL.
pub fn serve_mock(api_key: &str) -> String {
    serve(mock_server::app(api_key))
}

/// Answer every request with `status` and `body`, recording what was sent.
pub fn recording_server(status: u16, body: &str) -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let status = StatusCode::from_u16(status).unwrap();
    let body = body.to_string();

    let handler_log = log.clone();
    let router = Router::new().fallback(move |request: Request| {
        let log = handler_log.clone();
        let body = body.clone();
        async move {
            let (parts, request_body) = request.into_parts();
            let bytes = axum::body::to_bytes(request_body, usize::MAX).await.unwrap();
            log.lock().unwrap().push(Recorded {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                authorization: header_value(&parts.headers, header::AUTHORIZATION),
                content_type: header_value(&parts.headers, header::CONTENT_TYPE),
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            });
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    });

    (serve(router), log)
}

/// The single request a recording server received.
pub fn only_request(log: &Log) -> Recorded {
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1, "expected exactly one request, got {log:?}");
    log[0].clone()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
