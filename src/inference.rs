use crate::{
    classification::{ClassificationResult, Confidence, ImageFile, ModelChoice},
    config::InferenceConfig,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::instrument;

/// The only failure callers of [`InferenceClient::submit`] ever see.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Inference request failed")]
pub struct InferenceFailed;

#[derive(Error, Debug)]
enum RequestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Inference service reported an error")]
    Remote,
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Remote classification: one attempt per call, bounded in time, no state between calls.
#[async_trait]
pub trait InferenceClient: Send + Sync + 'static {
    async fn submit(
        &self,
        image: &ImageFile,
        model: ModelChoice,
    ) -> Result<ClassificationResult, InferenceFailed>;
}

#[derive(Deserialize)]
struct EventId {
    event_id: String,
}

#[derive(Deserialize)]
struct LabelOutput {
    label: Option<String>,
    #[serde(default)]
    confidences: Option<Vec<RawConfidence>>,
}

#[derive(Deserialize)]
struct RawConfidence {
    label: String,
    confidence: f64,
}

/// Client for a Gradio app exposing `/{api_name}` with an image and a model name.
pub struct GradioClient {
    client: Client,
    base_url: String,
    api_name: String,
    budget: Duration,
}

impl GradioClient {
    pub fn new(base_url: &str, api_name: &str, budget: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_name: api_name.trim_matches('/').to_string(),
            budget,
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.base_url, &config.api_name, config.get_budget())
    }

    async fn upload(&self, image: &ImageFile) -> Result<String, RequestError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part("files", part);

        let paths: Vec<String> = self
            .client
            .post(format!("{}/gradio_api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        paths
            .into_iter()
            .next()
            .ok_or_else(|| RequestError::Malformed("upload returned no path".to_string()))
    }

    async fn start_call(&self, path: &str, model: ModelChoice) -> Result<String, RequestError> {
        let payload = json!({
            "data": [
                { "path": path, "meta": { "_type": "gradio.FileData" } },
                model.as_str(),
            ]
        });

        let response: EventId = self
            .client
            .post(format!("{}/gradio_api/call/{}", self.base_url, self.api_name))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.event_id)
    }

    async fn fetch_result(&self, event_id: &str) -> Result<ClassificationResult, RequestError> {
        let body = self
            .client
            .get(format!(
                "{}/gradio_api/call/{}/{}",
                self.base_url, self.api_name, event_id
            ))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_event_stream(&body)
    }

    async fn classify(
        &self,
        image: &ImageFile,
        model: ModelChoice,
    ) -> Result<ClassificationResult, RequestError> {
        let path = self.upload(image).await?;
        let event_id = self.start_call(&path, model).await?;
        tracing::debug!("Classification call started with event {}", event_id);
        self.fetch_result(&event_id).await
    }
}

#[async_trait]
impl InferenceClient for GradioClient {
    #[instrument(skip(self, image), fields(bytes = image.bytes.len()))]
    async fn submit(
        &self,
        image: &ImageFile,
        model: ModelChoice,
    ) -> Result<ClassificationResult, InferenceFailed> {
        match timeout(self.budget, self.classify(image, model)).await {
            Ok(Ok(result)) => {
                tracing::info!(
                    "Classified image as {} with {} confidences",
                    result.label,
                    result.confidences.len()
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                tracing::warn!("Classification failed: {}", e);
                Err(InferenceFailed)
            }
            Err(_) => {
                tracing::warn!("Classification exceeded budget of {:?}", self.budget);
                Err(InferenceFailed)
            }
        }
    }
}

/// Reads the server-sent events of a Gradio call and returns the `complete` payload.
fn parse_event_stream(body: &str) -> Result<ClassificationResult, RequestError> {
    let mut event = "";
    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            match event {
                "complete" => return parse_output(data.trim()),
                "error" => return Err(RequestError::Remote),
                _ => {}
            }
        } else if line.is_empty() {
            event = "";
        }
    }

    Err(RequestError::Malformed(
        "event stream ended without a result".to_string(),
    ))
}

fn parse_output(data: &str) -> Result<ClassificationResult, RequestError> {
    let outputs: Vec<Value> =
        serde_json::from_str(data).map_err(|e| RequestError::Malformed(e.to_string()))?;
    let first = outputs
        .into_iter()
        .next()
        .filter(|value| !value.is_null())
        .ok_or_else(|| RequestError::Malformed("empty output".to_string()))?;
    let output: LabelOutput =
        serde_json::from_value(first).map_err(|e| RequestError::Malformed(e.to_string()))?;

    normalize(output)
}

fn normalize(output: LabelOutput) -> Result<ClassificationResult, RequestError> {
    let label = output
        .label
        .filter(|label| !label.trim().is_empty())
        .ok_or_else(|| RequestError::Malformed("missing label".to_string()))?;

    let mut confidences = Vec::new();
    for raw in output.confidences.unwrap_or_default() {
        if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
            return Err(RequestError::Malformed(format!(
                "confidence {} for {} is out of range",
                raw.confidence, raw.label
            )));
        }
        confidences.push(Confidence {
            label: raw.label,
            confidence: raw.confidence,
        });
    }
    confidences.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    Ok(ClassificationResult { label, confidences })
}
