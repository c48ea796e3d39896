use serde::{Deserialize, Serialize};

/// The wire contract declares no size cap, so the client picks one.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration injected into the controller and HTTP client at
/// construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Full URL of the prediction endpoint.
    pub endpoint_url: String,
    /// Uploads larger than this are rejected locally, before any request.
    pub max_upload_bytes: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:8000/predict".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
