//! Submission of a built request to a provider.

use crate::builder::ProviderRequest;
use crate::error::GenerationError;
use crate::http::ProviderHttpClient;
use crate::models::{ArtifactKind, Job};
use crate::normalize::{self, lookup, Artifact};
use crate::providers::ProviderAdapter;
use serde_json::Value;

const MAX_BODY_IN_ERROR: usize = 500;

/// What a provider handed back for a submission.
#[derive(Debug)]
pub enum Submission {
    /// The provider answered synchronously with the finished artifact.
    Artifact(Artifact),
    /// The provider queued the work; the job must be polled.
    Job(Job),
}

pub struct JobSubmitter<'a> {
    http: &'a ProviderHttpClient,
    adapter: &'a dyn ProviderAdapter,
}

impl<'a> JobSubmitter<'a> {
    pub fn new(http: &'a ProviderHttpClient, adapter: &'a dyn ProviderAdapter) -> Self {
        Self { http, adapter }
    }

    pub async fn submit(
        &self,
        request: &ProviderRequest,
        kind: ArtifactKind,
    ) -> Result<Submission, GenerationError> {
        let provider = self.adapter.provider();

        let reply = self
            .http
            .post_json(&request.endpoint, &request.payload)
            .await
            .map_err(|e| GenerationError::SubmissionRejected {
                status: None,
                message: e.to_string(),
            })?;

        if !reply.status.is_success() {
            let message = reply
                .json()
                .and_then(|body| normalize::first_string(&body, self.adapter.message_paths()))
                .unwrap_or_else(|| {
                    let text = reply.body.trim();
                    if text.is_empty() {
                        reply
                            .status
                            .canonical_reason()
                            .unwrap_or("unknown error")
                            .to_string()
                    } else {
                        clip(text)
                    }
                });
            tracing::error!(
                "{} rejected submission (status {}): {}",
                provider,
                reply.status,
                message
            );
            return Err(GenerationError::SubmissionRejected {
                status: Some(reply.status.as_u16()),
                message,
            });
        }

        let body = reply
            .json()
            .ok_or_else(|| GenerationError::UnrecognizedResponse {
                body: clip(&reply.body),
            })?;

        if let Some(url) = normalize::first_string(&body, self.adapter.artifact_paths()) {
            tracing::info!("{} returned artifact synchronously", provider);
            return Ok(Submission::Artifact(Artifact { url, kind }));
        }

        if let Some(id) = first_id(&body, self.adapter.job_id_paths()) {
            tracing::info!("{} accepted job {}", provider, id);
            return Ok(Submission::Job(Job::new(id, provider)));
        }

        tracing::warn!("{} submission response has no artifact or job id", provider);
        Err(GenerationError::UnrecognizedResponse {
            body: clip(&reply.body),
        })
    }
}

/// Job ids show up as strings or bare numbers depending on the provider.
fn first_id(body: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match lookup(body, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn clip(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credential, CredentialTier, JobStatus, Provider};
    use crate::providers::{ImageStudioAdapter, MotionTaskAdapter, VideoQueueAdapter};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_for(server: &MockServer, adapter: &dyn ProviderAdapter) -> ProviderHttpClient {
        let credential = Credential {
            provider: adapter.provider(),
            secret: "test-secret-key".to_string(),
            source_tier: CredentialTier::Settings,
        };
        ProviderHttpClient::new(
            reqwest::Client::new(),
            &server.uri(),
            adapter.auth_scheme(),
            &credential,
            Duration::from_secs(5),
        )
    }

    fn request(endpoint: &str) -> ProviderRequest {
        ProviderRequest {
            endpoint: endpoint.to_string(),
            payload: json!({"prompt": "a sunrise"}),
        }
    }

    #[tokio::test]
    async fn test_sync_artifact_is_detected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [{"url": "https://x/img.png", "width": 1024}]
            })))
            .mount(&server)
            .await;

        let adapter = ImageStudioAdapter::new();
        let http = http_for(&server, &adapter);
        let submission = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/images/generate"), ArtifactKind::Image)
            .await
            .unwrap();

        match submission {
            Submission::Artifact(artifact) => {
                assert_eq!(artifact.url, "https://x/img.png");
                assert_eq!(artifact.kind, ArtifactKind::Image);
            }
            other => panic!("expected artifact, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_task_id_yields_pending_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/video/text-to-video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "abc"})))
            .mount(&server)
            .await;

        let adapter = VideoQueueAdapter::new();
        let http = http_for(&server, &adapter);
        let submission = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/video/text-to-video"), ArtifactKind::Video)
            .await
            .unwrap();

        match submission {
            Submission::Job(job) => {
                assert_eq!(job.id, "abc");
                assert_eq!(job.provider, Provider::VideoQueue);
                assert_eq!(job.status(), JobStatus::Pending);
                assert_eq!(job.attempts_made, 0);
            }
            other => panic!("expected job, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_numeric_id_inside_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/generate/text2video"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"task_id": 9912}})),
            )
            .mount(&server)
            .await;

        let adapter = MotionTaskAdapter::new();
        let http = http_for(&server, &adapter);
        let submission = JobSubmitter::new(&http, &adapter)
            .submit(&request("/api/v1/generate/text2video"), ArtifactKind::Video)
            .await
            .unwrap();

        assert!(matches!(submission, Submission::Job(job) if job.id == "9912"));
    }

    #[tokio::test]
    async fn test_rejection_preserves_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/video/text-to-video"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"message": "Insufficient credits"}
            })))
            .mount(&server)
            .await;

        let adapter = VideoQueueAdapter::new();
        let http = http_for(&server, &adapter);
        let err = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/video/text-to-video"), ArtifactKind::Video)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::SubmissionRejected {
                status: Some(402),
                message: "Insufficient credits".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rejection_with_plain_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/video/text-to-video"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let adapter = VideoQueueAdapter::new();
        let http = http_for(&server, &adapter);
        let err = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/video/text-to-video"), ArtifactKind::Video)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::SubmissionRejected { status: Some(500), ref message } if message == "upstream exploded"
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_shape_is_not_guessed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/video/text-to-video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let adapter = VideoQueueAdapter::new();
        let http = http_for(&server, &adapter);
        let err = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/video/text-to-video"), ArtifactKind::Video)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::UnrecognizedResponse { .. }));
    }

    #[tokio::test]
    async fn test_non_json_success_is_unrecognized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/video/text-to-video"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let adapter = VideoQueueAdapter::new();
        let http = http_for(&server, &adapter);
        let err = JobSubmitter::new(&http, &adapter)
            .submit(&request("/v1/video/text-to-video"), ArtifactKind::Video)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::UnrecognizedResponse {
                body: "<html>ok</html>".to_string()
            }
        );
    }

    #[test]
    fn test_clip_long_bodies() {
        let long = "z".repeat(MAX_BODY_IN_ERROR + 10);
        let clipped = clip(&long);
        assert!(clipped.ends_with("..."));
        assert_eq!(clipped.len(), MAX_BODY_IN_ERROR + 3);
    }
}
