use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use clap::Parser;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_app, Args};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const PETS: &str = "Cats are small.\n\nDogs are loyal.\n\nCats and dogs are pets.";

fn write_book(text: &str) -> NamedTempFile {
    let f = NamedTempFile::new().unwrap();
    std::fs::write(f.path(), text).unwrap();
    f
}

fn app_for(text: &str) -> Router {
    let book = write_book(text);
    let args = Args::parse_from(["server", "--corpus", book.path().to_str().unwrap()]);
    let retriever = args.load_retriever().unwrap();
    build_app(Arc::new(retriever), args.default_top_k)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn post_contexts(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/get_contexts/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = call(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = call(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn contexts_are_ranked_passages() {
    let (status, json) = post_contexts(app_for(PETS), json!({ "query": "cats" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "contexts": ["Cats are small.", "Cats and dogs are pets."] }));
}

#[tokio::test]
async fn contexts_default_to_five() {
    let text = (0..8).map(|i| format!("whale number {i}")).collect::<Vec<_>>().join("\n\n");
    let (status, json) = post_contexts(app_for(&text), json!({ "query": "whale" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contexts"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn contexts_honor_top_k() {
    let (_, json) = post_contexts(app_for(PETS), json!({ "query": "cats dogs", "top_k": 1 })).await;
    assert_eq!(json["contexts"].as_array().unwrap().len(), 1);
    let (_, json) = post_contexts(app_for(PETS), json!({ "query": "cats", "top_k": 0 })).await;
    assert_eq!(json["contexts"], json!([]));
}

#[tokio::test]
async fn negative_top_k_is_bad_request() {
    let (status, json) = post_contexts(app_for(PETS), json!({ "query": "cats", "top_k": -1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("top_k"));
}

#[tokio::test]
async fn non_integer_top_k_is_bad_request_with_json_error() {
    for top_k in [json!("five"), json!(2.5)] {
        let (status, json) = post_contexts(app_for(PETS), json!({ "query": "cats", "top_k": top_k })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn malformed_body_is_bad_request_with_json_error() {
    let req = Request::post("/get_contexts/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = call(app_for(PETS), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn contexts_without_top_k_use_configured_default() {
    let text = (0..8).map(|i| format!("whale number {i}")).collect::<Vec<_>>().join("\n\n");
    let book = write_book(&text);
    let args = Args::parse_from(["server", "--corpus", book.path().to_str().unwrap(), "--default-top-k", "3"]);
    let app = build_app(Arc::new(args.load_retriever().unwrap()), args.default_top_k);
    let (_, json) = post_contexts(app, json!({ "query": "whale" })).await;
    assert_eq!(json["contexts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unmatched_and_empty_queries_are_empty() {
    let (status, json) = post_contexts(app_for(PETS), json!({ "query": "elephants" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contexts"], json!([]));
    let (status, json) = post_contexts(app_for(PETS), json!({ "query": "" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contexts"], json!([]));
}

#[tokio::test]
async fn empty_book_serves_empty_results() {
    let (status, json) = post_contexts(app_for(""), json!({ "query": "cats" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contexts"], json!([]));
}

#[tokio::test]
async fn search_returns_scored_hits() {
    let (status, json) = get_json(app_for(PETS), "/search?q=cats&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"], 0);
    assert_eq!(arr[1]["doc_id"], 2);
    assert!(arr[0]["score"].as_f64().unwrap() > arr[1]["score"].as_f64().unwrap());
    assert_eq!(arr[1]["content"], "Cats and dogs are pets.");
}

#[tokio::test]
async fn search_rejects_negative_k() {
    let (status, _) = get_json(app_for(PETS), "/search?q=cats&k=-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_rejects_non_integer_k_with_json_error() {
    let (status, json) = get_json(app_for(PETS), "/search?q=cats&k=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn doc_lookup() {
    let (status, json) = get_json(app_for(PETS), "/doc/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "doc_id": 1, "content": "Dogs are loyal." }));
    let (status, json) = get_json(app_for(PETS), "/doc/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn stats_report_index_shape() {
    let (status, json) = get_json(app_for(PETS), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);
    assert_eq!(json["k1"], 1.5);
    assert_eq!(json["b"], 0.75);
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = call(app_for(PETS), Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[test]
fn missing_corpus_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("book.txt");
    let args = Args::parse_from(["server", "--corpus", missing.to_str().unwrap()]);
    assert!(args.load_retriever().is_err());
}

#[test]
fn bad_bm25_params_fail_startup() {
    let book = write_book(PETS);
    let args = Args::parse_from(["server", "--corpus", book.path().to_str().unwrap(), "--bm25-b", "2"]);
    assert!(args.load_retriever().is_err());
}
