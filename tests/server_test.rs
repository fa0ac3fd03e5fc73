use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use spam_filtering::server::{self, AppState};
use spam_filtering::{Classifier, Corpus, ModelHandle, RemoteScorer};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const CORPUS: &str = "label,text
spam,spam rules
ham,ham rules
ham,hello ham
";

fn trained_app(remote: Option<RemoteScorer>) -> Router {
    let corpus = Corpus::from_reader(CORPUS.as_bytes()).unwrap();
    let model = ModelHandle::new(Classifier::trained(0.5, corpus.messages()).unwrap());

    server::router(
        AppState {
            model,
            corpus: Arc::new(corpus),
            remote,
        },
        None,
    )
}

fn untrained_app() -> Router {
    server::router(
        AppState {
            model: ModelHandle::unfitted(0.5).unwrap(),
            corpus: Arc::new(Corpus::default()),
            remote: None,
        },
        None,
    )
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_model_info() {
    let (status, body) = send(trained_app(None), get("/getModelInfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["content"],
        json!({
            "hasbeentrained": true,
            "numobs": 3,
            "numtkns": 4,
            "numspam": 1,
            "numham": 2,
        })
    );
}

#[tokio::test]
async fn test_model_info_untrained() {
    let (status, body) = send(untrained_app(), get("/getModelInfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["hasbeentrained"], false);
    assert_eq!(body["content"]["numobs"], 0);
}

#[tokio::test]
async fn test_prediction() {
    let (status, body) = send(
        trained_app(None),
        post_json("/getModelPred", r#"{"text": "hello spam"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "a spam prediction");
    assert_eq!(body["content"]["havepred"], true);
    assert_eq!(body["content"]["prediction"], "83.51");
}

#[tokio::test]
async fn test_prediction_untrained() {
    let (status, body) = send(
        untrained_app(),
        post_json("/getModelPred", r#"{"text": "hello spam"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["msg"], "model has not yet been trained");
    assert_eq!(body["content"]["havepred"], false);
    assert!(body["content"].get("prediction").is_none());
}

#[tokio::test]
async fn test_prediction_missing_text() {
    for payload in [r#"{"text": ""}"#, "{}"] {
        let (status, body) = send(trained_app(None), post_json("/getModelPred", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "error missing text value");
        assert_eq!(body["content"]["havepred"], false);
    }
}

#[tokio::test]
async fn test_prediction_malformed_body() {
    let (status, body) = send(trained_app(None), post_json("/getModelPred", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["content"]["havepred"], false);
}

#[tokio::test]
async fn test_random_message() {
    let (status, body) = send(trained_app(None), get("/getRandMsg/spam")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "spam rules");

    let (_, body) = send(trained_app(None), get("/getRandMsg/ham")).await;
    let text = body["content"].as_str().unwrap();
    assert!(text == "ham rules" || text == "hello ham");

    let (status, body) = send(trained_app(None), get("/getRandMsg/eggs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "");
}

#[tokio::test]
async fn test_remote_disabled() {
    let (status, body) = send(
        trained_app(None),
        post_json("/getPyModelPred", r#"{"text": "hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["content"]["havepred"], false);
}

#[tokio::test]
async fn test_remote_prediction_is_relayed() {
    let scorer = Router::new().route(
        "/predict",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "msg": "remote prediction",
                "content": { "havepred": true, "prediction": "100.0%", "echo": body["text"] },
            }))
        }),
    );
    let addr = spawn_scorer(scorer).await;

    let remote = RemoteScorer::new(format!("http://{addr}/predict"), Duration::from_secs(5)).unwrap();
    let (status, body) = send(
        trained_app(Some(remote)),
        post_json("/getPyModelPred", r#"{"text": "free money"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "remote prediction");
    assert_eq!(body["content"]["echo"], "free money");
}

async fn spawn_scorer(scorer: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, scorer).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_remote_error_body_is_relayed() {
    let scorer = Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "msg": "missing text value" })),
            )
        }),
    );
    let addr = spawn_scorer(scorer).await;

    let remote = RemoteScorer::new(format!("http://{addr}/predict"), Duration::from_secs(5)).unwrap();
    let (status, body) = send(
        trained_app(Some(remote)),
        post_json("/getPyModelPred", r#"{"text": "free money"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "msg": "missing text value" }));
}

#[tokio::test]
async fn test_remote_error_without_json() {
    let scorer = Router::new().route(
        "/predict",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Traceback (most recent call last)") }),
    );
    let addr = spawn_scorer(scorer).await;

    let remote = RemoteScorer::new(format!("http://{addr}/predict"), Duration::from_secs(5)).unwrap();
    let (status, body) = send(
        trained_app(Some(remote)),
        post_json("/getPyModelPred", r#"{"text": "free money"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["content"]["havepred"], false);
}

#[tokio::test]
async fn test_remote_unreachable() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = RemoteScorer::new(format!("http://{addr}/predict"), Duration::from_secs(2)).unwrap();
    let (status, body) = send(
        trained_app(Some(remote)),
        post_json("/getPyModelPred", r#"{"text": "free money"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["content"]["havepred"], false);
}

#[tokio::test]
async fn test_health() {
    let response = trained_app(None).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>spam filter</h1>").unwrap();

    let app = server::router(
        AppState {
            model: ModelHandle::unfitted(0.5).unwrap(),
            corpus: Arc::new(Corpus::default()),
            remote: None,
        },
        Some(dir.path().to_path_buf()),
    );

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>spam filter</h1>");
}
