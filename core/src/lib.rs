//! Synchronous client for the Checkly checks API.
//!
//! # Overview
//! Create, read, update and delete checks over `/v1/checks`. A `Check` is
//! serialized to the vendor's JSON schema, sent with a bearer token, and the
//! response is decoded back into a `Check` or an `ApiError`.
//!
//! # Design
//! - `ChecklyClient` holds only configuration (API key, base URL, transport,
//!   optional debug sink) and no per-call state.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response); the high-level methods run the round trip through a
//!   pluggable `Transport`, `UreqTransport` by default.
//! - No retries, pagination or rate limiting: every failure is returned to
//!   the caller immediately.
//!
//! ```no_run
//! use checkly_core::{Check, CheckType, ChecklyClient, HttpMethod, Request};
//!
//! let client = ChecklyClient::new("api-key")?;
//! let check = Check::new(
//!     "homepage",
//!     CheckType::Api,
//!     Request::new(HttpMethod::Get, "https://example.com"),
//! );
//! let id = client.create(&check)?;
//! let stored = client.get(&id)?;
//! client.delete(&stored.id)?;
//! # Ok::<(), checkly_core::ApiError>(())
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{ChecklyClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use types::{
    AlertChannels, AlertEmail, AlertSettings, AlertSlack, AlertSms, AlertWebhook, Assertion,
    AssertionSource, BasicAuth, BodyType, Check, CheckType, Comparison, EnvironmentVariable,
    ErrorResponse, EscalationType, KeyValue, Reminders, Request, RunBasedEscalation,
    SslCertificates, Subscription, TimeBasedEscalation,
};
