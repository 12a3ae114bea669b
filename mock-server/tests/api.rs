use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, CRON_COUNT};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- assistants ---

#[tokio::test]
async fn create_assistant_fills_defaults() {
    let resp = app()
        .oneshot(json_request("POST", "/assistants", r#"{"graph_id":"agent"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let assistant = body_json(resp).await;
    assert_eq!(assistant["graph_id"], "agent");
    assert_eq!(assistant["config"], json!({}));
    assert!(assistant["assistant_id"].is_string());
}

#[tokio::test]
async fn create_assistant_without_graph_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/assistants", r#"{"name":"nameless"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["message"], "graph_id is required");
}

#[tokio::test]
async fn get_missing_assistant_returns_404() {
    let resp = app().oneshot(empty_request("GET", "/assistants/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Assistant not found");
}

// --- threads ---

#[tokio::test]
async fn thread_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/threads", r#"{"thread_id":"t-1","metadata":{"user":"u"}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["thread_id"], "t-1");

    // duplicate id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/threads", r#"{"thread_id":"t-1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", "/threads/t-1", r#"{"metadata":{"user":"v"}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["metadata"]["user"], "v");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/threads/t-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/threads/t-1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- runs ---

#[tokio::test]
async fn stateless_stream_requires_event_stream_accept() {
    let resp = app()
        .oneshot(json_request("POST", "/runs/stream", r#"{"assistant_id":"agent"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn stateless_stream_emits_event_stream_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/runs/stream")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::ACCEPT, "text/event-stream")
        .body(r#"{"input":{"q":1}}"#.to_string())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "text/event-stream"
    );
    let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(body.starts_with("event: metadata\n"));
    assert!(body.contains("event: values\ndata: {\"q\":1}\n\n"));
}

#[tokio::test]
async fn thread_stream_for_unknown_thread_returns_404() {
    let request = Request::builder()
        .method("POST")
        .uri("/threads/missing/runs/stream")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::ACCEPT, "text/event-stream")
        .body("{}".to_string())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- crons ---

#[tokio::test]
async fn crons_are_paged_by_offset_and_limit() {
    let resp = app()
        .oneshot(empty_request("GET", "/crons?limit=10&offset=20"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let crons = body_json(resp).await;
    let crons = crons.as_array().unwrap();
    assert_eq!(crons.len(), CRON_COUNT - 20);
    assert_eq!(crons[0]["cron_id"], "cron-20");
}

// --- store ---

#[tokio::test]
async fn store_batch_delete_removes_items() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/store/prefs/theme", r#"{"value":{"dark":true}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "DELETE",
            "/store/batch",
            r#"{"items":[{"namespace":"prefs","key":"theme"}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/store/prefs/theme"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- diagnostics ---

#[tokio::test]
async fn echo_reflects_method_query_and_headers() {
    let request = Request::builder()
        .method("GET")
        .uri("/echo?limit=5&xray=false")
        .header(http::header::AUTHORIZATION, "Bearer k")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    let echoed = body_json(resp).await;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["query"], json!({"limit": "5", "xray": "false"}));
    assert_eq!(echoed["headers"]["authorization"], "Bearer k");
    assert_eq!(echoed["body"], Value::Null);
}

#[tokio::test]
async fn status_shapes() {
    let resp = app().oneshot(empty_request("GET", "/status/409")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await, json!({"error": "status 409"}));

    let resp = app()
        .oneshot(empty_request("POST", "/status/503?shape=text"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_bytes(resp).await, "plain failure 503");
}
