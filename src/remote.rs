//! Pass-through client for an external prediction service.

use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote scorer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("remote scorer answered HTTP {0} without a JSON body")]
    Status(reqwest::StatusCode),

    #[error("remote scorer sent invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Status and JSON body exactly as the remote scorer sent them.
#[derive(Debug)]
pub struct RemoteAnswer {
    pub status: reqwest::StatusCode,
    pub body: Value,
}

#[derive(Clone)]
pub struct RemoteScorer {
    client: reqwest::Client,
    url: String,
}

impl RemoteScorer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post `text` to the remote service and hand back its answer untouched.
    ///
    /// Error statuses are relayed too as long as the body is JSON.
    pub async fn predict(&self, text: &str) -> Result<RemoteAnswer, RemoteError> {
        debug!(url = %self.url, "Forwarding prediction to remote scorer");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice(&bytes) {
            Ok(body) => Ok(RemoteAnswer { status, body }),
            Err(e) if status.is_success() => Err(RemoteError::Decode(e)),
            Err(_) => Err(RemoteError::Status(status)),
        }
    }
}
