use thiserror::Error;

/// Everything that can go wrong between picking a file and seeing a result.
///
/// `NoFileSelected` and `FileTooLarge` are rejected locally before any
/// request is issued; the rest describe a failed exchange. None are fatal
/// and none are retried; recovery is re-selecting or re-submitting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("no image file selected")]
    NoFileSelected,
    #[error("image is {size} bytes, over the {cap} byte upload cap")]
    FileTooLarge { size: u64, cap: u64 },
    #[error("could not reach the prediction service: {0}")]
    Transport(String),
    #[error("prediction service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },
    #[error("prediction service returned an unusable body: {0}")]
    InvalidResponse(String),
}
