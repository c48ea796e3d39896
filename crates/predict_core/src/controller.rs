use std::fs;
use std::path::PathBuf;

use crate::{PredictError, PredictOutcome, PredictionResult, PredictionService, PredictorConfig};

/// Lifecycle of a submission: `Idle → Submitting → {Succeeded | Failed}`,
/// with `dismiss` as the only path back to a clean `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Transient, locally derived handle for rendering the selected file.
/// Ids are never reused, so a front end can key decoded textures on them
/// and drop anything keyed on a superseded id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    pub id: u64,
}

/// The currently chosen input file and its derived preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: PathBuf,
    pub preview: Preview,
}

/// Identity token for one issued request. Outcomes carrying a token that no
/// longer matches the latest issued request are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

/// A request the controller has committed to; hand the file to a
/// [`PredictionService`] and report back via `finish_submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub file: PathBuf,
}

/// State machine behind the upload-submit-result workflow.
///
/// Single-threaded by construction: a front end may run the network call on
/// a worker thread, but all mutation goes through these methods on one
/// owner. At most one request is in flight at a time.
#[derive(Debug)]
pub struct UploadController {
    config: PredictorConfig,
    selection: Option<Selection>,
    state: RequestState,
    error: Option<PredictError>,
    result: Option<PredictionResult>,
    next_preview_id: u64,
    next_request_id: u64,
    in_flight: Option<RequestId>,
}

impl UploadController {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            selection: None,
            state: RequestState::Idle,
            error: None,
            result: None,
            next_preview_id: 0,
            next_request_id: 0,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.selection.as_ref().map(|s| &s.preview)
    }

    pub fn error(&self) -> Option<&PredictError> {
        self.error.as_ref()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    /// Whether the result surface (modal) should be shown.
    pub fn result_visible(&self) -> bool {
        self.state == RequestState::Succeeded && self.result.is_some()
    }

    /// Replaces the selection, deriving a fresh preview and discarding the
    /// previous one. Clears any prior error and result. Ignored while a
    /// request is in flight; the UI also disables the picker then.
    pub fn select_file(&mut self, path: Option<PathBuf>) {
        if self.state == RequestState::Submitting {
            tracing::debug!("file selection ignored while a request is in flight");
            return;
        }
        self.error = None;
        self.result = None;
        self.selection = path.map(|path| {
            self.next_preview_id += 1;
            Selection {
                path,
                preview: Preview {
                    id: self.next_preview_id,
                },
            }
        });
    }

    /// Starts a submission. Returns `None` without issuing a request when a
    /// request is already in flight (no-op), when nothing is selected
    /// ([`PredictError::NoFileSelected`], state stays `Idle`), or when the
    /// file exceeds the configured cap ([`PredictError::FileTooLarge`]).
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        if self.state == RequestState::Submitting {
            tracing::debug!("submit ignored: a request is already in flight");
            return None;
        }
        let Some(selection) = &self.selection else {
            self.error = Some(PredictError::NoFileSelected);
            self.state = RequestState::Idle;
            return None;
        };
        // Unreadable files are left for the transport layer to report.
        if let Ok(meta) = fs::metadata(&selection.path)
            && meta.len() > self.config.max_upload_bytes
        {
            self.error = Some(PredictError::FileTooLarge {
                size: meta.len(),
                cap: self.config.max_upload_bytes,
            });
            self.state = RequestState::Idle;
            return None;
        }
        self.error = None;
        self.result = None;
        self.next_request_id += 1;
        let id = RequestId(self.next_request_id);
        self.in_flight = Some(id);
        self.state = RequestState::Submitting;
        tracing::info!(
            request = id.0,
            file = %selection.path.display(),
            "submitting image for prediction"
        );
        Some(PendingRequest {
            id,
            file: selection.path.clone(),
        })
    }

    /// Applies the outcome of an issued request. Outcomes for anything but
    /// the latest issued request (superseded by `dismiss` or a newer
    /// submission) are discarded, never applied over fresher state.
    pub fn finish_submit(&mut self, id: RequestId, outcome: PredictOutcome) {
        if self.in_flight != Some(id) {
            tracing::debug!(request = id.0, "discarding outcome of a superseded request");
            return;
        }
        self.in_flight = None;
        match outcome {
            Ok(result) => {
                tracing::info!(
                    request = id.0,
                    label = %result.label,
                    confidence = result.confidence,
                    "prediction succeeded"
                );
                self.result = Some(result);
                self.state = RequestState::Succeeded;
            }
            Err(err) => {
                tracing::warn!(request = id.0, error = %err, "prediction failed");
                self.error = Some(err);
                self.state = RequestState::Failed;
            }
        }
    }

    /// Synchronous convenience: begin, run the exchange, finish. Issues at
    /// most one request per call.
    pub fn submit(&mut self, service: &impl PredictionService) {
        if let Some(pending) = self.begin_submit() {
            let outcome = service.predict(&pending.file);
            self.finish_submit(pending.id, outcome);
        }
    }

    /// Returns to a clean slate: no selection, no preview, no error, no
    /// result, `Idle`. Any in-flight request is abandoned; its outcome will
    /// be discarded on arrival. Idempotent.
    pub fn dismiss(&mut self) {
        self.selection = None;
        self.result = None;
        self.error = None;
        self.in_flight = None;
        self.state = RequestState::Idle;
    }
}
