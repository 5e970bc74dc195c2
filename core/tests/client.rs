//! Client operations over real HTTP against throwaway servers.
//!
//! Each test starts a server that answers with a fixed status and body and
//! records what the client sent, then checks both the request on the wire
//! and how the client interpreted the response.

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};

use checkly_core::{
    ApiError, Check, CheckType, ChecklyClient, HttpMethod, HttpRequest, HttpResponse, Request,
    Subscription, Transport, TransportError,
};
use common::{only_request, recording_server, serve_mock, BAD_REQUEST_JSON, CHECK_ID, CHECK_JSON};
use uuid::Uuid;

fn client(base_url: &str) -> ChecklyClient {
    ChecklyClient::new("dummy").unwrap().with_base_url(base_url)
}

fn test_check() -> Check {
    Check {
        tags: vec!["auto".to_string()],
        alert_channel_subscriptions: vec![Subscription {
            alert_channel_id: 2996,
            activated: true,
        }],
        degraded_response_time: 15000,
        max_response_time: 30000,
        ..Check::new(
            "test",
            CheckType::Api,
            Request::new(HttpMethod::Get, "http://example.com"),
        )
    }
}

/// Last path segment, which must be a UUID.
fn path_id(path: &str) -> Uuid {
    let id = path.rsplit('/').next().unwrap();
    id.parse()
        .unwrap_or_else(|_| panic!("malformed id {id:?} in path {path:?}"))
}

// --- create ---

#[test]
fn create_returns_server_assigned_id() {
    let (url, log) = recording_server(201, CHECK_JSON);
    let check = test_check();

    let id = client(&url).create(&check).unwrap();
    assert_eq!(id, CHECK_ID);

    let sent = only_request(&log);
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.path, "/v1/checks");
    assert_eq!(sent.authorization.as_deref(), Some("Bearer dummy"));
    assert_eq!(sent.content_type.as_deref(), Some("application/json"));
    let decoded: Check = serde_json::from_str(&sent.body).unwrap();
    assert_eq!(decoded, check);
}

#[test]
fn create_surfaces_api_error_message() {
    let (url, _log) = recording_server(400, BAD_REQUEST_JSON);

    let err = client(&url).create(&Check::default()).unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 400, .. }));
    assert!(
        err.to_string().contains("frequency"),
        "want error mentioning frequency, got {err}"
    );
}

#[test]
fn create_with_unparseable_error_body_reports_status() {
    let (url, _log) = recording_server(503, "upstream unavailable");

    let err = client(&url).create(&test_check()).unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { status: 503, .. }));
    assert!(err.to_string().contains("503"));
}

#[test]
fn create_with_malformed_success_body_is_a_deserialization_error() {
    let (url, _log) = recording_server(201, "{\"id\":");

    let err = client(&url).create(&test_check()).unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}

#[test]
fn create_answered_without_an_id_is_an_error() {
    let (url, _log) = recording_server(201, r#"{"name":"test","checkType":"API"}"#);

    let err = client(&url).create(&test_check()).unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)), "got {err:?}");
}

// --- get ---

#[test]
fn get_returns_check_from_payload() {
    let (url, log) = recording_server(200, CHECK_JSON);

    let check = client(&url).get(CHECK_ID).unwrap();
    assert_eq!(check.id, CHECK_ID);
    assert_eq!(check.request.url, "http://example.com");
    assert_eq!(check.request.method, HttpMethod::Get);
    assert!(check.use_global_alert_settings);
    assert!(check.created_at.is_some());

    let sent = only_request(&log);
    assert_eq!(sent.method, "GET");
    assert!(sent.path.starts_with("/v1/checks/"));
    assert_eq!(path_id(&sent.path).to_string(), CHECK_ID);
    assert!(sent.body.is_empty());
}

#[test]
fn get_unknown_id_is_not_found() {
    let (url, _log) = recording_server(
        404,
        r#"{"statusCode":404,"error":"Not Found","message":"Not Found"}"#,
    );

    let err = client(&url).get(CHECK_ID).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, ApiError::Api { .. }));
}

// --- update ---

#[test]
fn update_sends_exact_serialized_check() {
    let (url, log) = recording_server(200, CHECK_JSON);
    let check = test_check();

    client(&url).update(CHECK_ID, &check).unwrap();

    let sent = only_request(&log);
    assert_eq!(sent.method, "PUT");
    assert_eq!(sent.path, format!("/v1/checks/{CHECK_ID}"));
    assert_eq!(sent.content_type.as_deref(), Some("application/json"));
    assert_eq!(sent.body, serde_json::to_string(&check).unwrap());
}

#[test]
fn update_fails_on_any_status_but_200() {
    for status in [201, 202, 400, 500] {
        let (url, _log) = recording_server(status, CHECK_JSON);
        let err = client(&url).update(CHECK_ID, &test_check()).unwrap_err();
        assert_eq!(err.status(), Some(status), "status {status}");
    }
}

#[test]
fn id_with_path_characters_never_reaches_the_server() {
    let (url, log) = recording_server(200, CHECK_JSON);
    let c = client(&url);

    let err = c.get("../../v2/secrets").unwrap_err();
    assert!(matches!(err, ApiError::InvalidId(_)), "got {err:?}");
    let err = c.update("abc?force=true", &test_check()).unwrap_err();
    assert!(matches!(err, ApiError::InvalidId(_)), "got {err:?}");
    let err = c.delete("abc#x").unwrap_err();
    assert!(matches!(err, ApiError::InvalidId(_)), "got {err:?}");

    assert!(log.lock().unwrap().is_empty());
}

// --- delete ---

#[test]
fn delete_accepts_204() {
    let (url, log) = recording_server(204, "");

    client(&url).delete(CHECK_ID).unwrap();

    let sent = only_request(&log);
    assert_eq!(sent.method, "DELETE");
    assert!(sent.path.starts_with("/v1/checks/"));
    path_id(&sent.path);
}

#[test]
fn delete_fails_on_any_status_but_204() {
    for status in [200, 202, 404] {
        let (url, _log) = recording_server(status, "{}");
        let err = client(&url).delete(CHECK_ID).unwrap_err();
        assert_eq!(err.status(), Some(status), "status {status}");
    }
}

// --- configuration ---

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn debug_sink_receives_request_and_response() {
    let (url, _log) = recording_server(201, CHECK_JSON);
    let sink = SharedBuffer::default();
    let client = client(&url).with_debug(sink.clone());

    let id = client.create(&test_check()).unwrap();
    assert_eq!(id, CHECK_ID);

    let dump = sink.contents();
    assert!(dump.contains(&format!("POST {url}/v1/checks")), "{dump}");
    assert!(dump.contains("authorization: Bearer dummy"), "{dump}");
    assert!(dump.contains(r#""name":"test""#), "{dump}");
    assert!(dump.contains("HTTP 201"), "{dump}");
    assert!(dump.contains(CHECK_ID), "{dump}");
}

/// Records requests and answers each with a canned response.
#[derive(Clone)]
struct StubTransport {
    response: HttpResponse,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

#[test]
fn custom_transport_replaces_network() {
    let stub = StubTransport {
        response: HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: CHECK_JSON.to_string(),
        },
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let seen = stub.seen.clone();
    let client = ChecklyClient::new("dummy").unwrap().with_transport(stub);

    let check = client.get(CHECK_ID).unwrap();
    assert_eq!(check.name, "test");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].url,
        format!("https://api.checklyhq.com/v1/checks/{CHECK_ID}")
    );
    assert_eq!(seen[0].method, HttpMethod::Get);
}

#[test]
fn connection_failure_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).get(CHECK_ID).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[test]
fn one_client_serves_concurrent_callers() {
    let url = serve_mock("dummy");
    let client = client(&url);

    let ids: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let client = &client;
                scope.spawn(move || {
                    let check = Check {
                        frequency: 5,
                        ..Check::new(
                            format!("concurrent-{n}"),
                            CheckType::Api,
                            Request::new(HttpMethod::Get, "http://example.com"),
                        )
                    };
                    client.create(&check).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(ids.len(), 4);
    for (n, id) in ids.iter().enumerate() {
        assert_eq!(client.get(id).unwrap().name, format!("concurrent-{n}"));
    }
}
