//! Checkly check client: request building, transport dispatch, response
//! parsing.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! high-level `create`/`get`/`update`/`delete` methods glue the two halves
//! together through the configured `Transport`. Callers that want to drive
//! I/O themselves can use the halves directly.
//!
//! The client holds only configuration and is `Send + Sync`; concurrent calls
//! share the transport's connection pool.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::de;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{Check, ErrorResponse};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.checklyhq.com";

/// Environment variable read by `ChecklyClient::from_env` for the API key.
pub const API_KEY_ENV: &str = "CHECKLY_API_KEY";

/// Environment variable read by `ChecklyClient::from_env` for a base URL
/// override.
pub const API_URL_ENV: &str = "CHECKLY_API_URL";

const CHECKS_PATH: &str = "/v1/checks";
const JSON_CONTENT_TYPE: &str = "application/json";

type DebugSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Client for the Checkly checks API.
#[derive(Clone)]
pub struct ChecklyClient {
    api_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
    debug: Option<DebugSink>,
}

impl fmt::Debug for ChecklyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecklyClient")
            .field("base_url", &self.base_url)
            .field("debug", &self.debug.is_some())
            .finish_non_exhaustive()
    }
}

impl ChecklyClient {
    /// Client for the production API using the default transport.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: Arc::new(UreqTransport::new()),
            debug: None,
        })
    }

    /// Client configured from `CHECKLY_API_KEY` and, when set,
    /// `CHECKLY_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ApiError::MissingApiKey)?;
        let client = Self::new(api_key)?;
        Ok(match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(&url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Dump every request and response to `sink`.
    pub fn with_debug(mut self, sink: impl Write + Send + 'static) -> Self {
        self.debug = Some(Arc::new(Mutex::new(Box::new(sink))));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create `check` and return the id the server assigned to it.
    pub fn create(&self, check: &Check) -> Result<String, ApiError> {
        let request = self.build_create(check)?;
        self.parse_create(self.send(&request)?)
    }

    pub fn get(&self, id: &str) -> Result<Check, ApiError> {
        let request = self.build_get(id)?;
        self.parse_get(self.send(&request)?)
    }

    /// Replace the check stored under `id` with `check`.
    pub fn update(&self, id: &str, check: &Check) -> Result<(), ApiError> {
        let request = self.build_update(id, check)?;
        self.parse_update(self.send(&request)?)
    }

    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        let request = self.build_delete(id)?;
        self.parse_delete(self.send(&request)?)
    }

    pub fn build_create(&self, check: &Check) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(check).map_err(ApiError::Serialization)?;
        Ok(self.request(HttpMethod::Post, self.checks_url(), Some(body)))
    }

    pub fn build_get(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Get, self.check_url(id)?, None))
    }

    pub fn build_update(&self, id: &str, check: &Check) -> Result<HttpRequest, ApiError> {
        let url = self.check_url(id)?;
        let body = serde_json::to_string(check).map_err(ApiError::Serialization)?;
        Ok(self.request(HttpMethod::Put, url, Some(body)))
    }

    pub fn build_delete(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Delete, self.check_url(id)?, None))
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<String, ApiError> {
        ensure_status(&response, |status| (200..300).contains(&status))?;
        let check: Check =
            serde_json::from_str(&response.body).map_err(ApiError::Deserialization)?;
        if check.id.is_empty() {
            return Err(ApiError::Deserialization(de::Error::missing_field("id")));
        }
        Ok(check.id)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<Check, ApiError> {
        ensure_status(&response, |status| status == 200)?;
        serde_json::from_str(&response.body).map_err(ApiError::Deserialization)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<(), ApiError> {
        ensure_status(&response, |status| status == 200)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        ensure_status(&response, |status| status == 204)
    }

    fn checks_url(&self) -> String {
        format!("{}{CHECKS_PATH}", self.base_url)
    }

    fn check_url(&self, id: &str) -> Result<String, ApiError> {
        if id.is_empty() {
            return Err(ApiError::MissingId);
        }
        if !is_path_segment(id) {
            return Err(ApiError::InvalidId(id.to_string()));
        }
        Ok(format!("{}{CHECKS_PATH}/{id}", self.base_url))
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            ("authorization".to_string(), format!("Bearer {}", self.api_key)),
            ("accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        self.dump(|out| dump_request(out, request));

        let response = self.transport.execute(request).map_err(|err| {
            debug!(method = %request.method, url = %request.url, error = %err, "transport failed");
            ApiError::Transport(err)
        })?;

        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "received response"
        );
        self.dump(|out| dump_response(out, &response));
        Ok(response)
    }

    fn dump(&self, write: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) {
        let Some(sink) = &self.debug else {
            return;
        };
        let mut out = match sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = write(&mut **out).and_then(|()| out.flush()) {
            warn!(error = %err, "failed to write to debug sink");
        }
    }
}

/// Non-empty, not a dot segment, and made only of RFC 3986 unreserved
/// characters, so it cannot escape `/v1/checks/{id}`.
fn is_path_segment(id: &str) -> bool {
    id != "."
        && id != ".."
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Accept the response if `accept(status)` holds, otherwise turn it into an
/// `ApiError`.
fn ensure_status(response: &HttpResponse, accept: impl Fn(u16) -> bool) -> Result<(), ApiError> {
    if accept(response.status) {
        return Ok(());
    }
    Err(decode_error(response))
}

fn decode_error(response: &HttpResponse) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(decoded) if !decoded.message.is_empty() => ApiError::Api {
            status: response.status,
            message: decoded.message,
        },
        _ => ApiError::UnexpectedStatus {
            status: response.status,
            body: response.body.clone(),
        },
    }
}

fn dump_request(out: &mut dyn Write, request: &HttpRequest) -> std::io::Result<()> {
    writeln!(out, "{} {}", request.method, request.url)?;
    for (name, value) in &request.headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    if let Some(body) = &request.body {
        writeln!(out, "{body}")?;
    }
    writeln!(out)
}

fn dump_response(out: &mut dyn Write, response: &HttpResponse) -> std::io::Result<()> {
    writeln!(out, "HTTP {}", response.status)?;
    for (name, value) in &response.headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    if !response.body.is_empty() {
        writeln!(out, "{}", response.body)?;
    }
    writeln!(out)
}
