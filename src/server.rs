//! HTTP serving layer
//!
//! JSON endpoints consumed by the browser frontend, plus the static files of
//! that frontend as the fallback route.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, warn};

use crate::classifier::{ClassifierError, ModelInfo};
use crate::corpus::{Corpus, MessageClass};
use crate::model::ModelHandle;
use crate::remote::{RemoteError, RemoteScorer};

/// Shared state behind every handler
pub struct AppState {
    pub model: ModelHandle,
    pub corpus: Arc<Corpus>,
    pub remote: Option<RemoteScorer>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub content: T,
}

#[derive(Debug, Serialize)]
pub struct Prediction {
    pub havepred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    NotTrained,
    MissingText,
    BadBody(String),
    RemoteDisabled,
    Remote(RemoteError),
    Internal(String),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::NotFitted => ApiError::NotTrained,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        ApiError::Remote(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::NotTrained => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "model has not yet been trained".to_string(),
            ),
            ApiError::MissingText => {
                (StatusCode::BAD_REQUEST, "error missing text value".to_string())
            }
            ApiError::BadBody(reason) => {
                warn!("Rejected request body: {}", reason);
                (
                    StatusCode::BAD_REQUEST,
                    "an error occurred, please try again".to_string(),
                )
            }
            ApiError::RemoteDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "remote scorer is not configured".to_string(),
            ),
            ApiError::Remote(e) => {
                error!("Remote scorer failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "an error occurred, please try again".to_string(),
                )
            }
            ApiError::Internal(e) => {
                error!("Prediction failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an error occurred, please try again".to_string(),
                )
            }
        };

        let body = Envelope {
            msg: Some(msg),
            content: Prediction {
                havepred: false,
                prediction: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

fn request_text(body: Result<Json<PredictRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadBody(e.body_text()))?;

    if request.text.is_empty() {
        return Err(ApiError::MissingText);
    }

    Ok(request.text)
}

/// Score text with the local classifier
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Envelope<Prediction>>, ApiError> {
    let classifier = state.model.current();
    if !classifier.is_fitted() {
        return Err(ApiError::NotTrained);
    }

    let text = request_text(body)?;
    let probability = classifier.predict(&text)?;

    Ok(Json(Envelope {
        msg: Some("a spam prediction".to_string()),
        content: Prediction {
            havepred: true,
            prediction: Some(format!("{:.2}", probability * 100.)),
        },
    }))
}

/// Relay the prediction request to the remote scorer
pub async fn remote_predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let text = request_text(body)?;
    let remote = state.remote.as_ref().ok_or(ApiError::RemoteDisabled)?;

    let answer = remote.predict(&text).await?;
    Ok((answer.status, Json(answer.body)))
}

pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<Envelope<ModelInfo>> {
    Json(Envelope {
        msg: None,
        content: state.model.current().info(),
    })
}

/// Random training message of the requested class, or an empty string
pub async fn random_message(
    State(state): State<Arc<AppState>>,
    Path(class): Path<String>,
) -> Json<Envelope<String>> {
    let text = class
        .parse::<MessageClass>()
        .ok()
        .and_then(|class| state.corpus.random(class, &mut rand::rng()))
        .unwrap_or_default()
        .to_string();

    Json(Envelope {
        msg: None,
        content: text,
    })
}

pub async fn health() -> &'static str {
    "OK"
}

/// Build the router with all routes
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/getModelPred", post(predict))
        .route("/getPyModelPred", post(remote_predict))
        .route("/getModelInfo", get(model_info))
        .route("/getRandMsg/:class", get(random_message))
        .with_state(Arc::new(state));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
