//! Client-side upload/predict workflow for remote cell-image classification.
//!
//! The crate owns the state machine behind "pick an image, send it to the
//! prediction service, show the verdict": [`UploadController`] tracks the
//! selection, the in-flight request, and the terminal outcome, while
//! [`HttpPredictionService`] speaks the service's multipart contract. The
//! controller has no dependency on any rendering mechanism; a front end
//! drives it through `select_file`, `begin_submit`/`finish_submit` (or the
//! synchronous `submit`), and `dismiss`.

use serde::{Deserialize, Serialize};

mod config;
mod controller;
mod error;
mod service;

pub use config::PredictorConfig;
pub use controller::{
    PendingRequest, Preview, RequestId, RequestState, Selection, UploadController,
};
pub use error::PredictError;
pub use service::{
    HttpPredictionService, PredictOutcome, PredictionService, parse_prediction_body,
};

/// Structured outcome of a successful classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Diagnostic label as reported by the service, e.g. "Uninfected".
    pub label: String,
    /// Model confidence in [0,1].
    pub confidence: f32,
}
