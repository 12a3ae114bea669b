use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Number of crons served by `GET /crons`.
pub const CRON_COUNT: usize = 23;

/// Records in insertion order so offset/limit paging is stable.
pub type Db = Arc<RwLock<Vec<Value>>>;

#[derive(Clone, Default)]
pub struct AppState {
    pub assistants: Db,
    pub threads: Db,
    pub store: Arc<RwLock<HashMap<String, Value>>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub fn app() -> Router {
    Router::new()
        .route("/assistants", post(create_assistant))
        .route("/assistants/search", post(search_assistants))
        .route(
            "/assistants/{id}",
            get(get_assistant).patch(update_assistant).delete(delete_assistant),
        )
        .route("/threads", post(create_thread))
        .route("/threads/search", post(search_threads))
        .route(
            "/threads/{id}",
            get(get_thread).patch(update_thread).delete(delete_thread),
        )
        .route("/threads/{id}/runs/stream", post(stream_thread_run))
        .route("/runs/stream", post(stream_stateless_run))
        .route("/crons", get(list_crons))
        .route("/store/batch", delete(batch_delete_items))
        .route(
            "/store/{namespace}/{key}",
            put(put_item).get(get_item).delete(delete_item),
        )
        .route("/echo", any(echo))
        .route("/empty", any(empty))
        .route("/status/{code}", any(status))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": format!("{what} not found")}))).into_response()
}

fn page(records: &[Value], query: &PageQuery) -> Vec<Value> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(10);
    records.iter().skip(offset).take(limit).cloned().collect()
}

fn page_from_body(body: &Value) -> PageQuery {
    PageQuery {
        limit: body.get("limit").and_then(Value::as_u64).map(|n| n as usize),
        offset: body.get("offset").and_then(Value::as_u64).map(|n| n as usize),
    }
}

fn find_index(records: &[Value], key: &str, id: &str) -> Option<usize> {
    records.iter().position(|r| r[key] == id)
}

/// Shallow-merge `patch` into `record`.
fn merge(record: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(fields)) = (record, patch) {
        target.extend(fields);
    }
}

// --- assistants ---

async fn create_assistant(State(state): State<AppState>, Json(input): Json<Value>) -> Response {
    let Some(graph_id) = input.get("graph_id").and_then(Value::as_str) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "graph_id is required"})),
        )
            .into_response();
    };
    let assistant = json!({
        "assistant_id": Uuid::new_v4().to_string(),
        "graph_id": graph_id,
        "name": input.get("name").cloned().unwrap_or(Value::Null),
        "config": input.get("config").cloned().unwrap_or(json!({})),
        "metadata": input.get("metadata").cloned().unwrap_or(json!({})),
        "version": 1,
    });
    state.assistants.write().await.push(assistant.clone());
    (StatusCode::OK, Json(assistant)).into_response()
}

async fn get_assistant(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let assistants = state.assistants.read().await;
    match find_index(&assistants, "assistant_id", &id) {
        Some(i) => Json(assistants[i].clone()).into_response(),
        None => not_found("Assistant"),
    }
}

async fn update_assistant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> Response {
    let mut assistants = state.assistants.write().await;
    match find_index(&assistants, "assistant_id", &id) {
        Some(i) => {
            merge(&mut assistants[i], input);
            Json(assistants[i].clone()).into_response()
        }
        None => not_found("Assistant"),
    }
}

async fn delete_assistant(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut assistants = state.assistants.write().await;
    match find_index(&assistants, "assistant_id", &id) {
        Some(i) => {
            assistants.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Assistant"),
    }
}

async fn search_assistants(State(state): State<AppState>, Json(input): Json<Value>) -> Json<Vec<Value>> {
    let assistants = state.assistants.read().await;
    let matching: Vec<Value> = match input.get("graph_id").and_then(Value::as_str) {
        Some(graph_id) => assistants
            .iter()
            .filter(|a| a["graph_id"] == graph_id)
            .cloned()
            .collect(),
        None => assistants.clone(),
    };
    Json(page(&matching, &page_from_body(&input)))
}

// --- threads ---

async fn create_thread(State(state): State<AppState>, Json(input): Json<Value>) -> Response {
    let mut threads = state.threads.write().await;
    let thread_id = match input.get("thread_id").and_then(Value::as_str) {
        Some(id) if find_index(&threads, "thread_id", id).is_some() => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"error": "Thread already exists"})),
            )
                .into_response();
        }
        Some(id) => id.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    let thread = json!({
        "thread_id": thread_id,
        "status": "idle",
        "metadata": input.get("metadata").cloned().unwrap_or(json!({})),
        "values": {},
    });
    threads.push(thread.clone());
    Json(thread).into_response()
}

async fn get_thread(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let threads = state.threads.read().await;
    match find_index(&threads, "thread_id", &id) {
        Some(i) => Json(threads[i].clone()).into_response(),
        None => not_found("Thread"),
    }
}

async fn update_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> Response {
    let mut threads = state.threads.write().await;
    match find_index(&threads, "thread_id", &id) {
        Some(i) => {
            merge(&mut threads[i], input);
            Json(threads[i].clone()).into_response()
        }
        None => not_found("Thread"),
    }
}

async fn delete_thread(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut threads = state.threads.write().await;
    match find_index(&threads, "thread_id", &id) {
        Some(i) => {
            threads.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Thread"),
    }
}

async fn search_threads(State(state): State<AppState>, Json(input): Json<Value>) -> Json<Vec<Value>> {
    let threads = state.threads.read().await;
    Json(page(&threads, &page_from_body(&input)))
}

// --- runs ---

/// Frames of a canned run, exercising JSON, raw text, multi-line data, ids,
/// retry hints and comments.
fn run_events(thread_id: Option<&str>, input: &Value) -> String {
    let metadata = json!({
        "run_id": Uuid::new_v4().to_string(),
        "thread_id": thread_id,
        "stream_mode": input.get("stream_mode").cloned().unwrap_or(Value::Null),
    });
    let values = input.get("input").cloned().unwrap_or(json!({}));
    format!(
        "event: metadata\ndata: {metadata}\n\n\
         : heartbeat\n\n\
         event: values\ndata: {values}\n\n\
         event: messages\ndata: partial token\n\n\
         id: 3\nretry: 2500\nevent: updates\ndata: {{\"step\":\ndata: 1}}\n\n\
         event: end\n\n"
    )
}

fn event_stream(headers: &HeaderMap, body: String) -> Response {
    let accepts_events = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if !accepts_events {
        return (
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({"error": "Accept: text/event-stream required"})),
        )
            .into_response();
    }
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn stream_thread_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    if find_index(&state.threads.read().await, "thread_id", &id).is_none() {
        return not_found("Thread");
    }
    event_stream(&headers, run_events(Some(&id), &input))
}

async fn stream_stateless_run(headers: HeaderMap, Json(input): Json<Value>) -> Response {
    event_stream(&headers, run_events(None, &input))
}

// --- crons ---

async fn list_crons(Query(query): Query<PageQuery>) -> Json<Vec<Value>> {
    let crons: Vec<Value> = (0..CRON_COUNT)
        .map(|i| json!({"cron_id": format!("cron-{i}"), "schedule": "*/5 * * * *"}))
        .collect();
    Json(page(&crons, &query))
}

// --- store ---

fn store_key(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}

async fn put_item(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    Json(input): Json<Value>,
) -> Json<Value> {
    let item = json!({
        "namespace": namespace,
        "key": key,
        "value": input.get("value").cloned().unwrap_or(Value::Null),
    });
    state
        .store
        .write()
        .await
        .insert(store_key(&namespace, &key), item.clone());
    Json(item)
}

async fn get_item(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Response {
    match state.store.read().await.get(&store_key(&namespace, &key)) {
        Some(item) => Json(item.clone()).into_response(),
        None => not_found("Item"),
    }
}

async fn delete_item(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> StatusCode {
    match state.store.write().await.remove(&store_key(&namespace, &key)) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn batch_delete_items(State(state): State<AppState>, Json(input): Json<Value>) -> StatusCode {
    let Some(items) = input.get("items").and_then(Value::as_array) else {
        return StatusCode::BAD_REQUEST;
    };
    let mut store = state.store.write().await;
    for item in items {
        if let (Some(namespace), Some(key)) = (item["namespace"].as_str(), item["key"].as_str()) {
            store.remove(&store_key(namespace, key));
        }
    }
    StatusCode::NO_CONTENT
}

// --- diagnostics ---

/// Reflect the request back so clients can check what they sent.
async fn echo(
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let get_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": {
            "authorization": get_header(header::AUTHORIZATION),
            "user-agent": get_header(header::USER_AGENT),
            "content-type": get_header(header::CONTENT_TYPE),
            "accept": get_header(header::ACCEPT),
            "cache-control": get_header(header::CACHE_CONTROL),
        },
        "body": serde_json::from_str::<Value>(&body).ok(),
    }))
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Respond with `code`. `?shape=` picks the error body: `error` (default),
/// `message`, `text` or `empty`.
async fn status(Path(code): Path<u16>, Query(query): Query<HashMap<String, String>>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match query.get("shape").map(String::as_str) {
        Some("message") => (status, Json(json!({"message": format!("status {code}")}))).into_response(),
        Some("text") => (status, format!("plain failure {code}")).into_response(),
        Some("empty") => status.into_response(),
        _ => (status, Json(json!({"error": format!("status {code}")}))).into_response(),
    }
}
