use std::path::PathBuf;

use crate::error::{BookError, Result};
use crate::models::{BookConfig, DownloadRequest, StatusResponse};
use crate::services::api::BookApiClient;
use crate::services::download::DownloadHandler;
use crate::services::poller::{PollOutcome, StatusPoller};
use crate::utils::download_filename;

pub const STARTING_MESSAGE: &str = "Starting book generation...";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to start book generation";
pub const TIMED_OUT_MESSAGE: &str = "Timed out waiting for book generation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
}

/// Final result of one [`GenerationSession::generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The book was handed to the download handler and saved here.
    Downloaded(PathBuf),
    /// The cycle ended with an error; the same text is in [`GenerationSession::error`].
    Failed(String),
    Cancelled,
}

/// Form state and job lifecycle for one user generating books.
///
/// The session starts idle with a default [`BookConfig`]. Submitting moves it
/// to `Generating`; every terminal path (completion, backend error, failed
/// check, poll limit, cancellation) brings it back to `Idle`.
#[derive(Debug, Clone, Default)]
pub struct GenerationSession {
    config: BookConfig,
    phase: Phase,
    job_id: Option<String>,
    progress: u8,
    status_message: String,
    error: Option<String>,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BookConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BookConfig {
        &mut self.config
    }

    /// Update a form field by name, e.g. `set_field("chapters", "8")`.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        self.config.set_field(name, value)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase == Phase::Generating
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && self.config.validate().is_ok()
    }

    /// Send the current config to the backend and start a fresh job cycle.
    ///
    /// On failure the session is back to idle showing a generic failure
    /// message; the request is not retried.
    pub async fn submit(&mut self, api: &BookApiClient) -> Result<String> {
        if self.is_generating() {
            return Err(BookError::Validation(
                "A book is already being generated".into(),
            ));
        }
        self.config.validate()?;

        self.error = None;
        self.phase = Phase::Generating;
        self.job_id = None;
        self.progress = 0;
        self.status_message = STARTING_MESSAGE.to_string();

        match api.generate(&self.config).await {
            Ok(created) => {
                self.status_message = created.message;
                self.job_id = Some(created.job_id.clone());
                Ok(created.job_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "book generation request failed");
                self.error = Some(CREATE_FAILED_MESSAGE.to_string());
                self.phase = Phase::Idle;
                Err(e)
            }
        }
    }

    pub fn record_status(&mut self, status: &StatusResponse) {
        self.progress = status.progress.min(100) as u8;
        self.status_message = status.message.clone();
    }

    /// Apply the end of a polling run. Returns the download to trigger when
    /// the job completed.
    pub fn finish(
        &mut self,
        api: &BookApiClient,
        outcome: Result<PollOutcome>,
    ) -> Option<DownloadRequest> {
        self.phase = Phase::Idle;
        match outcome {
            Ok(PollOutcome::Completed) => {
                self.progress = 100;
                let job_id = self.job_id.clone()?;
                Some(DownloadRequest {
                    url: api.download_url(&job_id),
                    filename: download_filename(&self.config.title),
                    job_id,
                })
            }
            Ok(PollOutcome::Failed { message }) => {
                self.error = Some(message);
                None
            }
            Ok(PollOutcome::TimedOut) => {
                self.error = Some(TIMED_OUT_MESSAGE.to_string());
                None
            }
            Ok(PollOutcome::Cancelled) => None,
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Run a whole cycle: submit, poll until terminal, then hand the
    /// finished book to `handler` exactly once.
    pub async fn generate<H>(
        &mut self,
        api: &BookApiClient,
        poller: &StatusPoller,
        handler: &H,
    ) -> Result<SessionOutcome>
    where
        H: DownloadHandler,
    {
        let job_id = match self.submit(api).await {
            Ok(id) => id,
            Err(BookError::Validation(msg)) => return Err(BookError::Validation(msg)),
            Err(_) => return Ok(SessionOutcome::Failed(CREATE_FAILED_MESSAGE.to_string())),
        };

        let outcome = poller.watch(api, &job_id, |s| self.record_status(s)).await;
        let cancelled = matches!(outcome, Ok(PollOutcome::Cancelled));

        match self.finish(api, outcome) {
            Some(request) => {
                match handler.handle(&request).await {
                    Ok(path) => Ok(SessionOutcome::Downloaded(path)),
                    Err(e) => {
                        self.error = Some(e.to_string());
                        Ok(SessionOutcome::Failed(e.to_string()))
                    }
                }
            }
            None if cancelled => Ok(SessionOutcome::Cancelled),
            None => Ok(SessionOutcome::Failed(self.error.clone().unwrap_or_default())),
        }
    }
}
