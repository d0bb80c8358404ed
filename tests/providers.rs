//! Provider HTTP round trips against a fake Ollama server on loopback.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use doc_insights::config::parse_config;
use doc_insights::embedding::create_embedder;
use doc_insights::generation::create_generator;
use doc_insights_core::embedding::Embedder;
use doc_insights_core::generation::Generator;

async fn fake_ollama() -> String {
    let app = Router::new()
        .route(
            "/api/embed",
            post(|Json(body): Json<Value>| async move {
                let count = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
                let embeddings: Vec<Value> = (0..count).map(|i| json!([i as f64, 1.0])).collect();
                Json(json!({ "model": body["model"], "embeddings": embeddings }))
            }),
        )
        .route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                if body["stream"] != json!(false) {
                    return Err(StatusCode::BAD_REQUEST);
                }
                let reply = format!("echo t={}", body["options"]["temperature"]);
                Ok(Json(json!({ "response": reply, "done": true })))
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{}", addr)
}

async fn broken_server() -> String {
    let app = Router::new().route(
        "/api/embed",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model not loaded") }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{}", addr)
}

#[tokio::test]
async fn ollama_embed_batch_keeps_input_order() {
    let url = fake_ollama().await;
    let cfg = parse_config(&format!(
        "[embedding]\nprovider = \"ollama\"\nmodel = \"tiny\"\nurl = \"{}/\"\n",
        url
    ))
    .unwrap();

    let embedder = create_embedder(&cfg.embedding).unwrap();
    assert_eq!(embedder.model_name(), "tiny");

    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = embedder.embed_batch(&texts).await.unwrap();
    assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 1.0], vec![2.0, 1.0]]);
    assert_eq!(embedder.embed("single").await.unwrap(), vec![0.0, 1.0]);
}

#[tokio::test]
async fn ollama_generate_sends_temperature() {
    let url = fake_ollama().await;
    let cfg = parse_config(&format!(
        "[generation]\nprovider = \"ollama\"\nurl = \"{}\"\n",
        url
    ))
    .unwrap();

    let generator = create_generator(&cfg.generation).unwrap();
    assert_eq!(generator.model_name(), "llama3.2");
    let text = generator.generate("hello", 0.5).await.unwrap();
    assert_eq!(text, "echo t=0.5");
}

#[tokio::test]
async fn http_errors_carry_status_and_body() {
    let url = broken_server().await;
    let cfg = parse_config(&format!(
        "[embedding]\nprovider = \"ollama\"\nurl = \"{}\"\n",
        url
    ))
    .unwrap();

    let embedder = create_embedder(&cfg.embedding).unwrap();
    let err = embedder.embed("x").await.unwrap_err().to_string();
    assert!(err.contains("503"), "got: {}", err);
    assert!(err.contains("model not loaded"), "got: {}", err);
}
