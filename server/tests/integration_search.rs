use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sift_core::{Document, EngineConfig, SearchEngine};
use sift_server::{router, AppState};
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn app_with(engine: SearchEngine) -> Router {
    router(AppState { engine: Arc::new(engine), admin_token: Some(TOKEN.into()) })
}

fn built_engine() -> SearchEngine {
    let engine = SearchEngine::new(&EngineConfig::default());
    engine
        .build_index(vec![
            Document::new("d1", "the cat sat on the mat"),
            Document::new("d2", "the dog sat on the log"),
            Document::new("d3", "cats and dogs are friends"),
        ])
        .unwrap();
    engine
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn post_index(docs: Value, token: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/index").header("content-type", "application/json");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    req.body(Body::from(docs.to_string())).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_ids() {
    let app = app_with(built_engine());
    let (status, json) = get(app, "/search?q=cat%20dog&k=3&mode=BM-25").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ids"], json!(["d1", "d2"]));
    assert_eq!(json["mode"], "BM-25");
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_errors_map_to_status_codes() {
    let app = app_with(built_engine());
    let (status, json) = get(app.clone(), "/search?q=%20%20&k=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "query_syntax");

    let (status, json) = get(app.clone(), "/search?q=cat&k=0&mode=TF-IDF").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");

    let (status, _) = get(app.clone(), "/search?q=cat&k=-4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(app, "/search?q=cat&mode=cosine").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");
}

#[tokio::test]
async fn search_without_index_is_unavailable() {
    let app = app_with(SearchEngine::new(&EngineConfig::default()));
    let (status, json) = get(app.clone(), "/search?q=cat").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "index_unavailable");

    let (status, json) = get(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn posting_documents_rebuilds_and_persists() {
    let dir = tempdir().unwrap();
    let config = EngineConfig { index_dir: Some(dir.path().to_path_buf()), ..Default::default() };
    let app = app_with(SearchEngine::new(&config));

    let docs = json!([
        { "id": "a", "text": "rust search engine" },
        { "id": "b", "text": "search party" },
    ]);
    let (status, _) = send(app.clone(), post_index(docs.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(app.clone(), post_index(docs, Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["documents"], 2);

    let (_, json) = get(app.clone(), "/search?q=rust").await;
    assert_eq!(json["ids"], json!(["a"]));

    let reopened = SearchEngine::start(&config).unwrap();
    assert_eq!(reopened.search(sift_core::ScoringMode::Bm25, 5, "party").unwrap(), vec!["b"]);
}

#[tokio::test]
async fn malformed_post_keeps_the_old_index() {
    let app = app_with(built_engine());
    let docs = json!([{ "id": "x", "text": "fresh" }, { "text": "no id" }]);
    let (status, json) = send(app.clone(), post_index(docs, Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "malformed_document");

    let (_, json) = get(app, "/stats").await;
    assert_eq!(json["documents"], 3);
}

#[tokio::test]
async fn unparseable_query_string_is_a_json_invalid_argument() {
    let app = app_with(built_engine());
    let (status, json) = get(app, "/search?q=cat&k=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn mistyped_documents_are_a_json_malformed_document() {
    let app = app_with(built_engine());
    let mistyped = json!([{ "id": 5, "text": "x" }]);
    let (status, json) = send(app.clone(), post_index(mistyped, Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "malformed_document");

    // the token is checked before the body
    let (status, json) = send(app.clone(), post_index(json!({ "not": "a list" }), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let (_, json) = get(app, "/stats").await;
    assert_eq!(json["documents"], 3);
}
