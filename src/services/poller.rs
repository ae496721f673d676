use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{JobStatus, StatusResponse};
use crate::services::api::BookApiClient;

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The backend reported the job as completed.
    Completed,
    /// The backend reported a generation error; `message` is passed through verbatim.
    Failed { message: String },
    /// A configured poll limit was reached before a terminal status.
    TimedOut,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Interval-driven status checker for a single job.
///
/// The first check fires one interval after polling starts. Checks never
/// overlap: a slow round-trip delays the next tick instead of queueing a burst.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    interval: Duration,
    max_polls: Option<u32>,
    timeout: Option<Duration>,
    cancellation: Option<Arc<AtomicBool>>,
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl StatusPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
            timeout: None,
            cancellation: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_polls: config.max_polls,
            timeout: config.poll_timeout,
            cancellation: None,
        }
    }

    pub fn with_max_polls(mut self, max: u32) -> Self {
        self.max_polls = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a flag that stops polling before the next check once raised.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(cancel);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Poll `job_id` until it reaches a terminal status, a limit is hit, or
    /// polling is cancelled. `on_update` sees every successful status response.
    ///
    /// A failed check (transport error or non-success HTTP status) ends
    /// polling with that error.
    pub async fn watch<F>(
        &self,
        api: &BookApiClient,
        job_id: &str,
        mut on_update: F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(&StatusResponse),
    {
        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: u32 = 0;

        loop {
            ticker.tick().await;

            if self.is_cancelled() {
                tracing::info!(job_id, polls, "status polling cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            if self.max_polls.is_some_and(|max| polls >= max)
                || self.timeout.is_some_and(|t| start.elapsed() >= t)
            {
                tracing::warn!(job_id, polls, "status polling gave up before a terminal status");
                return Ok(PollOutcome::TimedOut);
            }

            polls += 1;
            let status = api.status(job_id).await?;
            tracing::debug!(
                job_id,
                progress = status.progress,
                message = %status.message,
                "status check"
            );
            on_update(&status);

            match status.status {
                JobStatus::Completed => {
                    tracing::info!(job_id, polls, "book generation completed");
                    return Ok(PollOutcome::Completed);
                }
                JobStatus::Error => {
                    tracing::warn!(job_id, message = %status.message, "book generation failed");
                    return Ok(PollOutcome::Failed {
                        message: status.message,
                    });
                }
                JobStatus::Pending => {}
            }
        }
    }
}
