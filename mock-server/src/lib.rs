use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Frequencies, in minutes, the API accepts.
pub const FREQUENCIES: [u64; 8] = [1, 5, 10, 15, 30, 60, 720, 1440];

/// Error body in the vendor's shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Missing or invalid API key".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            error: self.status.canonical_reason().unwrap_or_default().to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Stored checks, kept as raw JSON so this crate stays independent of the
/// client's schema.
pub type Db = Arc<RwLock<HashMap<Uuid, Value>>>;

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/v1/checks", post(create_check))
        .route(
            "/v1/checks/{id}",
            get(get_check).put(update_check).delete(delete_check),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if token != Some(&*state.api_key) {
        tracing::warn!(uri = %request.uri(), "rejected request without valid bearer token");
        return Err(ApiError::unauthorized());
    }
    Ok(next.run(request).await)
}

async fn create_check(
    State(state): State<AppState>,
    Json(mut check): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validate(&check).map_err(ApiError::bad_request)?;
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    if let Some(fields) = check.as_object_mut() {
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.insert("created_at".to_string(), Value::String(now.clone()));
        fields.insert("updated_at".to_string(), Value::String(now));
    }
    state.db.write().await.insert(id, check.clone());
    tracing::info!(%id, "created check");
    Ok((StatusCode::CREATED, Json(check)))
}

async fn get_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let checks = state.db.read().await;
    checks.get(&id).cloned().map(Json).ok_or_else(ApiError::not_found)
}

async fn update_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut check): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    validate(&check).map_err(ApiError::bad_request)?;
    let mut checks = state.db.write().await;
    let stored = checks.get_mut(&id).ok_or_else(ApiError::not_found)?;
    let created_at = stored.get("created_at").cloned().unwrap_or(Value::Null);
    if let Some(fields) = check.as_object_mut() {
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.insert("created_at".to_string(), created_at);
        fields.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
    }
    *stored = check.clone();
    tracing::info!(%id, "updated check");
    Ok(Json(check))
}

async fn delete_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut checks = state.db.write().await;
    checks.remove(&id).ok_or_else(ApiError::not_found)?;
    tracing::info!(%id, "deleted check");
    Ok(StatusCode::NO_CONTENT)
}

/// Reject checks the real API would refuse, with a message naming the field.
pub fn validate(check: &Value) -> Result<(), String> {
    if !check.is_object() {
        return Err(r#""value" must be an object"#.to_string());
    }
    match check.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err(field_error("name", "is not allowed to be empty")),
    }
    match check.get("checkType").and_then(Value::as_str) {
        Some("API" | "BROWSER") => {}
        _ => return Err(field_error("checkType", "must be one of [BROWSER, API]")),
    }
    match check.get("frequency").and_then(Value::as_u64) {
        Some(frequency) if FREQUENCIES.contains(&frequency) => {}
        _ => {
            return Err(field_error(
                "frequency",
                "must be one of [1, 5, 10, 15, 30, 60, 720, 1440]",
            ))
        }
    }
    let is_api = check.get("checkType").and_then(Value::as_str) == Some("API");
    let url = check
        .get("request")
        .and_then(|request| request.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if is_api && url.is_empty() {
        return Err(field_error(
            "request",
            r#"child "url" fails because ["url" is not allowed to be empty]"#,
        ));
    }
    Ok(())
}

fn field_error(field: &str, reason: &str) -> String {
    format!(r#"child "{field}" fails because ["{field}" {reason}]"#)
}
