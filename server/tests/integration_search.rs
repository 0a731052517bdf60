use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::{Corpus, CorpusOptions, Index, IndexConfig, SearchEngine};
use serde_json::Value;
use server::{build_app, load_and_publish, spawn_index_build, BuildSettings};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const TWEETS: [&str; 4] = [
    "strong border policy now",
    "we need strong borders",
    "healthcare reform now",
    "Thank you Iowa! https://t.co/abc #Caucus",
];

fn tiny_engine() -> Arc<SearchEngine> {
    let cfg = IndexConfig { min_document_frequency: 1, ..Default::default() };
    let index = Index::build(&TWEETS, cfg).unwrap();
    Arc::new(SearchEngine::ready(index, Corpus::from_texts(TWEETS)).unwrap())
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

async fn post_search(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = build_app(tiny_engine());
    let (status, json) = post_search(app, serde_json::json!({ "query": "strong border", "top_k": 3 })).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    // The healthcare tweet scores zero and is filtered out.
    assert_eq!(arr.len(), 2);
    assert_eq!(json["total_results"], 2);
    let mut ids: Vec<u64> = arr.iter().map(|r| r["doc_id"].as_u64().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(arr[0]["rank"], 1);
    assert!(arr[0]["cleaned_tweet"].as_str().unwrap().contains("border"));
}

#[tokio::test]
async fn get_search_uses_query_params() {
    let app = build_app(tiny_engine());
    let (status, json) = get(app, "/search?q=healthcare&k=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["tweet"], "healthcare reform now");
}

#[tokio::test]
async fn out_of_vocabulary_query_is_empty_not_an_error() {
    let app = build_app(tiny_engine());
    let (status, json) = post_search(app, serde_json::json!({ "query": "zzzz" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_results"], 0);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let engine = tiny_engine();
    let (status, _) = post_search(build_app(engine.clone()), serde_json::json!({ "query": "", "top_k": 3 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = post_search(build_app(engine.clone()), serde_json::json!({ "query": "border", "top_k": 0 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, json) = post_search(build_app(engine), serde_json::json!({ "query": "border", "top_k": 51 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("top_k"));
}

#[tokio::test]
async fn not_ready_until_published() {
    let engine = Arc::new(SearchEngine::new());
    let (status, _) = post_search(build_app(engine.clone()), serde_json::json!({ "query": "border" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = get(build_app(engine.clone()), "/stats").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (_, json) = get(build_app(engine.clone()), "/health").await;
    assert_eq!(json["status"], "loading");
    let (_, json) = get(build_app(engine), "/").await;
    assert_eq!(json["status"], "initializing");
}

#[tokio::test]
async fn stats_and_doc_lookup() {
    let engine = tiny_engine();
    let (status, json) = get(build_app(engine.clone()), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_documents"], 4);
    assert_eq!(json["max_features"], 5000);
    assert_eq!(json["min_df"], 1);
    let vocab = json["vocabulary_size"].as_u64().unwrap();
    assert_eq!(json["tfidf_shape"], serde_json::json!([4, vocab]));

    let (status, json) = get(build_app(engine.clone()), "/doc/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tweet"], "healthcare reform now");
    let (status, _) = get(build_app(engine.clone()), "/doc/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = get(build_app(engine), "/health").await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["total_tweets"], 4);
}

#[tokio::test]
async fn builds_from_csv_corpus() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tweets.csv");
    let mut csv = String::from("Date,Tweet_Text\n");
    for t in TWEETS {
        csv.push_str(&format!("2016-01-01,\"{t}\"\n"));
    }
    fs::write(&path, csv).unwrap();

    let engine = Arc::new(SearchEngine::new());
    let settings = BuildSettings {
        corpus_path: path,
        corpus: CorpusOptions { limit: Some(3), ..Default::default() },
        index: IndexConfig { min_document_frequency: 1, ..Default::default() },
    };
    load_and_publish(&engine, &settings).unwrap();
    assert_eq!(engine.stats().unwrap().document_count, 3);
    // Publishing is one-shot.
    assert!(load_and_publish(&engine, &settings).is_err());
}

#[tokio::test]
async fn malformed_requests_get_json_detail() {
    let engine = tiny_engine();
    let (status, json) = get(build_app(engine.clone()), "/search?k=3").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("q"));

    let (status, json) = get(build_app(engine.clone()), "/search?q=border&k=-1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());

    let (status, json) = post_search(build_app(engine.clone()), serde_json::json!({ "top_k": 3 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("query"));

    let req = Request::post("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(build_app(engine), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn failed_build_is_reported() {
    let dir = tempdir().unwrap();
    let engine = Arc::new(SearchEngine::new());
    let settings = BuildSettings {
        corpus_path: dir.path().join("missing").join("tweets.csv"),
        corpus: CorpusOptions::default(),
        index: IndexConfig::default(),
    };
    spawn_index_build(engine.clone(), settings).await.unwrap();
    assert!(engine.failure().is_some());

    let (status, json) = get(build_app(engine.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "failed");
    let (_, json) = get(build_app(engine.clone()), "/").await;
    assert_eq!(json["status"], "failed");
    assert!(json["message"].as_str().unwrap().contains("does not exist"));

    let (status, json) = post_search(build_app(engine.clone()), serde_json::json!({ "query": "border" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"].as_str().unwrap().contains("failed to initialize"));
    let (status, _) = get(build_app(engine), "/stats").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
