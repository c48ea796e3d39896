use std::fs;
use std::path::Path;

use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use crate::{PredictError, PredictionResult, PredictorConfig};

/// Outcome of a single prediction exchange.
pub type PredictOutcome = Result<PredictionResult, PredictError>;

/// Seam between the controller and whatever performs the actual exchange.
pub trait PredictionService {
    fn predict(&self, file: &Path) -> PredictOutcome;
}

/// Success body shape: `{ "result": <string>, "confidence": <number 0..1> }`.
#[derive(Debug, Deserialize)]
struct PredictionBody {
    result: String,
    confidence: f32,
}

/// Error body shape the service emits on failures, when it emits one at all.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// Client speaking the service's multipart contract: one POST with the image
/// bytes in a part named `file`. No authentication, no retries.
#[derive(Debug, Clone)]
pub struct HttpPredictionService {
    client: reqwest::blocking::Client,
    endpoint_url: String,
}

impl HttpPredictionService {
    pub fn new(config: &PredictorConfig) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint_url: config.endpoint_url.clone(),
        }
    }
}

impl PredictionService for HttpPredictionService {
    fn predict(&self, file: &Path) -> PredictOutcome {
        let bytes = fs::read(file).map_err(|e| {
            PredictError::Transport(format!("could not read {}: {e}", file.display()))
        })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        tracing::debug!(endpoint = %self.endpoint_url, file = %file.display(), "posting image");
        let response = self
            .client
            .post(&self.endpoint_url)
            .multipart(form)
            .send()
            .map_err(|e| PredictError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(PredictError::Service {
                status: status.as_u16(),
                message: service_message(&body, status),
            });
        }
        parse_prediction_body(&body)
    }
}

/// Non-2xx bodies carry no guaranteed shape; prefer the service's own
/// `{ "error": ... }` text, fall back to the status line.
fn service_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) if !parsed.error.trim().is_empty() => parsed.error,
        _ => status
            .canonical_reason()
            .unwrap_or("prediction failed")
            .to_string(),
    }
}

/// Validates a 2xx body. Missing fields, empty labels, and out-of-range
/// confidences are all unusable.
pub fn parse_prediction_body(body: &str) -> PredictOutcome {
    let parsed: PredictionBody =
        serde_json::from_str(body).map_err(|e| PredictError::InvalidResponse(e.to_string()))?;
    if parsed.result.trim().is_empty() {
        return Err(PredictError::InvalidResponse(
            "empty result label".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(PredictError::InvalidResponse(format!(
            "confidence {} outside [0,1]",
            parsed.confidence
        )));
    }
    Ok(PredictionResult {
        label: parsed.result,
        confidence: parsed.confidence,
    })
}
