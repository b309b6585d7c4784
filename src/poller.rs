//! Driving a queued provider job to a terminal state.
//!
//! The job moves through Pending → Processing → Completed | Failed and never
//! backward. Each attempt walks the adapter's status templates in order; a 404
//! on one template falls through to the next immediately, anything else that
//! is not a usable answer is transient and waits for the next attempt.
//! Attempts are spaced by a fixed interval and capped; running out of attempts
//! while the job is still open is a `Timeout`, never a provider failure.

use crate::config::PollOverrides;
use crate::error::GenerationError;
use crate::http::ProviderHttpClient;
use crate::models::{ArtifactKind, Job, JobStatus};
use crate::normalize::{self, Artifact};
use crate::providers::{render_template, ProviderAdapter};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPLETED_SYNONYMS: &[&str] = &["completed", "succeeded", "success"];
const FAILED_SYNONYMS: &[&str] = &["failed", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Grace period before the first probe, so the provider has registered the job.
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(initial_delay: Duration, interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn with_overrides(self, overrides: &PollOverrides) -> Self {
        Self::new(
            overrides.initial_delay.unwrap_or(self.initial_delay),
            overrides.interval.unwrap_or(self.interval),
            overrides.max_attempts.unwrap_or(self.max_attempts),
        )
    }

    /// Upper bound on time spent waiting between probes.
    pub fn budget(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Map a provider's free-text status onto the canonical states.
///
/// Returns `None` for a blank status, which counts as no observation.
pub fn classify_status(raw: &str) -> Option<JobStatus> {
    let status = raw.trim().to_ascii_lowercase();
    if status.is_empty() {
        return None;
    }
    if COMPLETED_SYNONYMS.contains(&status.as_str()) {
        Some(JobStatus::Completed)
    } else if FAILED_SYNONYMS.contains(&status.as_str()) {
        Some(JobStatus::Failed)
    } else {
        Some(JobStatus::Processing)
    }
}

/// Why an attempt did not finish the job.
#[derive(Debug)]
enum AttemptError {
    StillRunning,
    Transport(GenerationError),
    Terminal(GenerationError),
}

pub struct JobPoller<'a> {
    http: &'a ProviderHttpClient,
    adapter: &'a dyn ProviderAdapter,
    policy: PollPolicy,
}

impl<'a> JobPoller<'a> {
    pub fn new(http: &'a ProviderHttpClient, adapter: &'a dyn ProviderAdapter) -> Self {
        Self {
            http,
            adapter,
            policy: adapter.poll_policy(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Poll `job` until it completes, fails, runs out of attempts or `cancel` fires.
    ///
    /// `job` is updated in place with the last accepted status and the number of attempts made.
    pub async fn poll(
        &self,
        job: &mut Job,
        kind: ArtifactKind,
        cancel: &CancellationToken,
    ) -> Result<Artifact, GenerationError> {
        let state = Mutex::new(job.clone());
        info!(
            "Polling job {} up to {} times over {:?}",
            job.id,
            self.policy.max_attempts,
            self.policy.budget()
        );

        let polling = async {
            tokio::time::sleep(self.policy.initial_delay).await;
            self.run_attempts(&state).await
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Polling for job {} cancelled", job.id);
                Err(AttemptError::Terminal(GenerationError::Cancelled))
            }
            outcome = polling => outcome,
        };

        *job = lock(&state).clone();

        match outcome {
            Ok(body) => self.fetch_artifact(job, &body, kind).await,
            Err(AttemptError::Terminal(err)) => Err(err),
            Err(AttemptError::StillRunning) | Err(AttemptError::Transport(_)) => {
                warn!(
                    "Job {} still {:?} after {} attempts",
                    job.id,
                    job.status(),
                    job.attempts_made
                );
                Err(GenerationError::Timeout {
                    attempts: job.attempts_made,
                })
            }
        }
    }

    async fn run_attempts(&self, state: &Mutex<Job>) -> Result<Value, AttemptError> {
        let retries = self.policy.max_attempts.saturating_sub(1) as usize;
        let strategy = FixedInterval::new(self.policy.interval).take(retries);
        let this = self;

        RetryIf::spawn(
            strategy,
            move || async move { this.attempt(state).await },
            |e: &AttemptError| match e {
                AttemptError::StillRunning => true,
                AttemptError::Transport(err) => err.is_transient(),
                AttemptError::Terminal(_) => false,
            },
        )
        .await
    }

    async fn attempt(&self, state: &Mutex<Job>) -> Result<Value, AttemptError> {
        let (job_id, attempt) = {
            let mut job = lock(state);
            job.attempts_made += 1;
            (job.id.clone(), job.attempts_made)
        };

        let body = match self.probe(&job_id).await {
            Ok(body) => body,
            Err(err) => {
                debug!(
                    "[{}] attempt {}/{}: {}",
                    job_id, attempt, self.policy.max_attempts, err
                );
                return Err(AttemptError::Transport(err));
            }
        };

        let observed = normalize::first_string(&body, self.adapter.status_paths())
            .and_then(|raw| classify_status(&raw));

        let mut job = lock(state);
        if let Some(next) = observed {
            if !job.observe(next) {
                debug!(
                    "[{}] ignoring {:?} after {:?}",
                    job_id,
                    next,
                    job.status()
                );
            }
        }
        debug!(
            "[{}] attempt {}/{}: {:?}",
            job_id,
            attempt,
            self.policy.max_attempts,
            job.status()
        );

        match job.status() {
            JobStatus::Completed => Ok(body),
            JobStatus::Failed => {
                let message = normalize::first_string(&body, self.adapter.message_paths())
                    .unwrap_or_else(|| "provider reported failure without detail".to_string());
                warn!("[{}] provider reported failure: {}", job_id, message);
                Err(AttemptError::Terminal(
                    GenerationError::ProviderReportedFailure { message },
                ))
            }
            JobStatus::Pending | JobStatus::Processing => Err(AttemptError::StillRunning),
        }
    }

    /// One status read, trying each template until one knows the job.
    async fn probe(&self, job_id: &str) -> Result<Value, GenerationError> {
        for template in self.adapter.status_templates() {
            let path = render_template(template, job_id).ok_or_else(|| {
                GenerationError::PollTransport(format!("job id '{}' cannot be addressed", job_id))
            })?;
            let reply = self
                .http
                .get(&path)
                .await
                .map_err(|e| GenerationError::PollTransport(e.to_string()))?;

            if reply.status == StatusCode::NOT_FOUND {
                debug!("[{}] {} not found, trying next template", job_id, path);
                continue;
            }
            if !reply.status.is_success() {
                return Err(GenerationError::PollTransport(format!(
                    "{} returned status {}",
                    path, reply.status
                )));
            }
            return reply.json().ok_or_else(|| {
                GenerationError::PollTransport(format!("{} returned a non-JSON body", path))
            });
        }

        Err(GenerationError::PollTransport(
            "no status endpoint recognised the job".to_string(),
        ))
    }

    /// Pull the artifact out of the completed status body, or fetch the full result once.
    async fn fetch_artifact(
        &self,
        job: &Job,
        status_body: &Value,
        kind: ArtifactKind,
    ) -> Result<Artifact, GenerationError> {
        let paths = self.adapter.artifact_paths();
        if let Ok(artifact) = normalize::extract(status_body, paths, kind) {
            info!("[{}] completed after {} attempts", job.id, job.attempts_made);
            return Ok(artifact);
        }

        let Some(template) = self.adapter.result_template() else {
            warn!("[{}] completed without an artifact URL", job.id);
            return Err(GenerationError::ArtifactMissing);
        };

        let Some(path) = render_template(template, &job.id) else {
            warn!("[{}] job id cannot be addressed for the result fetch", job.id);
            return Err(GenerationError::ArtifactMissing);
        };
        let result_body = match self.http.get(&path).await {
            Ok(reply) if reply.status.is_success() => reply.json(),
            Ok(reply) => {
                warn!("[{}] result fetch returned {}", job.id, reply.status);
                None
            }
            Err(e) => {
                warn!("[{}] result fetch failed: {}", job.id, e);
                None
            }
        };

        let artifact = result_body
            .ok_or(GenerationError::ArtifactMissing)
            .and_then(|body| normalize::extract(&body, paths, kind))?;
        info!("[{}] completed after {} attempts", job.id, job.attempts_made);
        Ok(artifact)
    }
}

fn lock(state: &Mutex<Job>) -> MutexGuard<'_, Job> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
