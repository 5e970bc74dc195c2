//! Wire schema for Checkly checks.
//!
//! # Design
//! Field names are fixed by the remote API and are case-sensitive. Two quirks
//! of the established wire format are kept as-is:
//! - `UseGlobalAlertSettings` is sent with a capital `U`. The lower-camel
//!   spelling is accepted on input, but a payload carrying both spellings is
//!   rejected as a duplicate field.
//! - `alertChannels` and `alertSettings` are always sent, even when empty.
//!
//! Server-assigned fields (`id`, `created_at`, `updated_at`) are never sent
//! unless populated; timestamps are never sent at all. On input, list, object
//! and string fields tolerate `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::http::HttpMethod;

/// The kind of check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    #[default]
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "BROWSER")]
    Browser,
}

/// A monitored endpoint or browser script.
///
/// `id` stays empty until the check has been created; `ChecklyClient::create`
/// returns the id the server assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Check {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "checkType")]
    pub check_type: CheckType,
    /// Minutes between runs.
    pub frequency: u32,
    pub activated: bool,
    pub muted: bool,
    #[serde(rename = "shouldFail")]
    pub should_fail: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(rename = "doubleCheck")]
    pub double_check: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(rename = "sslCheck", skip_serializing_if = "std::ops::Not::not")]
    pub ssl_check: bool,
    #[serde(rename = "sslCheckDomain", skip_serializing_if = "Option::is_none")]
    pub ssl_check_domain: Option<String>,
    #[serde(rename = "setupSnippetId", skip_serializing_if = "Option::is_none")]
    pub setup_snippet_id: Option<i64>,
    #[serde(rename = "tearDownSnippetId", skip_serializing_if = "Option::is_none")]
    pub tear_down_snippet_id: Option<i64>,
    #[serde(rename = "localSetupScript", skip_serializing_if = "Option::is_none")]
    pub local_setup_script: Option<String>,
    #[serde(rename = "localTearDownScript", skip_serializing_if = "Option::is_none")]
    pub local_tear_down_script: Option<String>,
    #[serde(rename = "alertChannels", deserialize_with = "null_as_default")]
    pub alert_channels: AlertChannels,
    #[serde(rename = "alertSettings", deserialize_with = "null_as_default")]
    pub alert_settings: AlertSettings,
    #[serde(rename = "UseGlobalAlertSettings", alias = "useGlobalAlertSettings")]
    pub use_global_alert_settings: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub request: Request,
    #[serde(
        rename = "alertChannelSubscriptions",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub alert_channel_subscriptions: Vec<Subscription>,
    /// Milliseconds after which a run is reported as degraded.
    #[serde(rename = "degradedResponseTime", skip_serializing_if = "is_zero")]
    pub degraded_response_time: u32,
    /// Milliseconds after which a run is reported as failed.
    #[serde(rename = "maxResponseTime", skip_serializing_if = "is_zero")]
    pub max_response_time: u32,
}

impl Check {
    /// An activated check with the given name, type and request. Every other
    /// field takes its default.
    pub fn new(name: impl Into<String>, check_type: CheckType, request: Request) -> Self {
        Self {
            name: name.into(),
            check_type,
            activated: true,
            request,
            ..Self::default()
        }
    }

    /// Copy with server-assigned fields cleared, for comparing a local value
    /// with one read back from the API.
    pub fn without_server_fields(&self) -> Self {
        Self {
            id: String::new(),
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }
}

/// The HTTP request an API check performs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    pub method: HttpMethod,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(rename = "followRedirects")]
    pub follow_redirects: bool,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(rename = "bodyType")]
    pub body_type: BodyType,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: Vec<KeyValue>,
    #[serde(rename = "queryParameters", deserialize_with = "null_as_default")]
    pub query_parameters: Vec<KeyValue>,
    #[serde(deserialize_with = "null_as_default")]
    pub assertions: Vec<Assertion>,
    #[serde(rename = "basicAuth", skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BodyType {
    #[default]
    None,
    Json,
    Form,
    Raw,
    #[serde(rename = "GRAPHQL")]
    GraphQl,
}

/// One entry of an ordered header or query-parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub locked: bool,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            locked: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// A pass/fail condition evaluated against a check run's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub source: AssertionSource,
    /// JSON path, header name, or empty when the source has no sub-field.
    #[serde(default, deserialize_with = "null_as_default")]
    pub property: String,
    pub comparison: Comparison,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
}

impl Assertion {
    pub fn new(source: AssertionSource, comparison: Comparison, target: impl Into<String>) -> Self {
        Self {
            source,
            property: String::new(),
            comparison,
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionSource {
    StatusCode,
    JsonBody,
    Headers,
    TextBody,
    ResponseTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    Equals,
    NotEquals,
    HasKey,
    NotHasKey,
    HasValue,
    NotHasValue,
    IsEmpty,
    NotEmpty,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
}

/// A variable exposed to the check's scripts at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub locked: bool,
}

/// Per-channel alert recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertChannels {
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub email: Vec<AlertEmail>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub webhook: Vec<AlertWebhook>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub slack: Vec<AlertSlack>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub sms: Vec<AlertSms>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEmail {
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertWebhook {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSlack {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSms {
    pub number: String,
    pub name: String,
}

/// When and how often alerts fire for a failing check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    #[serde(rename = "escalationType", skip_serializing_if = "Option::is_none")]
    pub escalation_type: Option<EscalationType>,
    #[serde(rename = "runBasedEscalation", deserialize_with = "null_as_default")]
    pub run_based_escalation: RunBasedEscalation,
    #[serde(rename = "timeBasedEscalation", deserialize_with = "null_as_default")]
    pub time_based_escalation: TimeBasedEscalation,
    #[serde(deserialize_with = "null_as_default")]
    pub reminders: Reminders,
    #[serde(rename = "sslCertificates", deserialize_with = "null_as_default")]
    pub ssl_certificates: SslCertificates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationType {
    RunBased,
    TimeBased,
}

/// Escalate after this many consecutive failed runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunBasedEscalation {
    #[serde(rename = "failedRunThreshold", skip_serializing_if = "is_zero")]
    pub failed_run_threshold: u32,
}

/// Escalate once the check has been failing for this many minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBasedEscalation {
    #[serde(rename = "minutesFailingThreshold", skip_serializing_if = "is_zero")]
    pub minutes_failing_threshold: u32,
}

/// Follow-up notifications after the first alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reminders {
    #[serde(skip_serializing_if = "is_zero")]
    pub amount: u32,
    /// Minutes between reminders.
    #[serde(skip_serializing_if = "is_zero")]
    pub interval: u32,
}

/// Alerting on certificates close to expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslCertificates {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enabled: bool,
    /// Days before expiry.
    #[serde(rename = "alertThreshold", skip_serializing_if = "is_zero")]
    pub alert_threshold: u32,
}

/// A check's subscription to a shared alert channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "alertChannelId")]
    pub alert_channel_id: i64,
    #[serde(default)]
    pub activated: bool,
}

/// Body of a non-2xx response from the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    pub message: String,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
