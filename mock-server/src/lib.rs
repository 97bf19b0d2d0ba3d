//! Stand-in for the authentication endpoint and the bearer-protected JSON API.
//!
//! Routes:
//! - `POST /auth/login` trades matching credentials for the configured token.
//! - `POST /auth/tokenless` answers 200 without a token field.
//! - `/echo` (any method) describes the request it received.
//! - `/reflect` (any method) answers 200 with the request body as JSON.
//! - `/status/{code}` (any method) replies with that status.
//! - `/large/{len}` (any method) answers with a body of `len` filler bytes:
//!   a JSON string on 200, raw text when `?status=` asks for another code.
//! - `/items`, `/items/{id}` an in-memory item store.
//!
//! Everything except `/auth/*` and `/status/*` requires
//! `Authorization: Bearer <token>`. Successful calls always answer 200 so the
//! client's "only 200 is success" rule can be exercised end to end.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Credentials the server accepts and the token it hands out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockConfig {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "secret".to_string(),
            token: "abc".to_string(),
        }
    }
}

impl MockConfig {
    /// Read `MOCK_USERNAME`, `MOCK_PASSWORD` and `MOCK_TOKEN`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            username: std::env::var("MOCK_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("MOCK_PASSWORD").unwrap_or(defaults.password),
            token: std::env::var("MOCK_TOKEN").unwrap_or(defaults.token),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Deserialize)]
pub struct ItemFilter {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    items: Db,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        items: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/tokenless", post(tokenless))
        .route("/echo", any(echo))
        .route("/reflect", any(reflect))
        .route("/status/{code}", any(status))
        .route("/large/{len}", any(large))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .with_state(state)
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app_with(config)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {}", state.config.token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<Login>,
) -> Result<Json<serde_json::Value>, (StatusCode, &'static str)> {
    if input.username == state.config.username && input.password == state.config.password {
        info!(username = %input.username, "login accepted");
        Ok(Json(serde_json::json!({ "token": state.config.token })))
    } else {
        info!(username = %input.username, "login rejected");
        Err((StatusCode::UNAUTHORIZED, "invalid credentials"))
    }
}

async fn tokenless() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn echo(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Result<Json<Echo>, StatusCode> {
    authorize(&state, &headers)?;
    Ok(Json(Echo {
        method: method.to_string(),
        query,
        authorization: header_text(&headers, header::AUTHORIZATION),
        content_type: header_text(&headers, header::CONTENT_TYPE),
        body,
    }))
}

async fn reflect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<([(header::HeaderName, &'static str); 1], String), StatusCode> {
    authorize(&state, &headers)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")),
        Err(_) => (StatusCode::BAD_REQUEST, format!("invalid status {code}")),
    }
}

#[derive(Deserialize)]
pub struct LargeOptions {
    pub status: Option<u16>,
}

async fn large(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(len): Path<usize>,
    Query(options): Query<LargeOptions>,
) -> Result<(StatusCode, [(header::HeaderName, &'static str); 1], String), StatusCode> {
    authorize(&state, &headers)?;
    let filler = "a".repeat(len);
    match options.status {
        None | Some(200) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            format!("\"{filler}\""),
        )),
        Some(code) => {
            let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
            Ok((status, [(header::CONTENT_TYPE, "text/plain")], filler))
        }
    }
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Vec<Item>>, StatusCode> {
    authorize(&state, &headers)?;
    let items = state.items.read().await;
    let mut found: Vec<Item> = items
        .values()
        .filter(|item| filter.name.as_deref().is_none_or(|name| item.name == name))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(Json(found))
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateItem>,
) -> Result<Json<Item>, StatusCode> {
    authorize(&state, &headers)?;
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
    };
    state.items.write().await.insert(item.id, item.clone());
    Ok(Json(item))
}

async fn get_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, StatusCode> {
    authorize(&state, &headers)?;
    let items = state.items.read().await;
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, StatusCode> {
    authorize(&state, &headers)?;
    let mut items = state.items.write().await;
    let item = items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        item.name = name;
    }
    if let Some(quantity) = input.quantity {
        item.quantity = quantity;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, StatusCode> {
    authorize(&state, &headers)?;
    let mut items = state.items.write().await;
    items.remove(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}
