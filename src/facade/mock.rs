use super::GenerationService;
use crate::models::{ArtifactKind, GenerationRequest, GenerationResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned-result generation service for callers' tests.
#[derive(Clone)]
pub struct MockGenerationService {
    responses: Arc<Mutex<Vec<GenerationResult>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerationService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_result(self, result: GenerationResult) -> Self {
        self.responses.lock().unwrap().push(result);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let count = requests.len();

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response
            let kind = request.mode().artifact_kind();
            let extension = match kind {
                ArtifactKind::Image => "png",
                ArtifactKind::Video => "mp4",
            };
            GenerationResult::succeeded(
                format!("https://mock-cdn.example.com/{}/{}.{}", request.provider(), count, extension),
                kind,
                None,
            )
        } else {
            let index = (count - 1) % responses.len();
            responses[index].clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GenerationError};
    use crate::models::{Mode, Provider};

    fn request() -> GenerationRequest {
        GenerationRequest::builder(Provider::VideoQueue, Mode::TextToVideo, "test")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_mock_default_result_is_successful() {
        let service = MockGenerationService::new();
        let result = service.generate(&request()).await;

        assert!(result.success());
        assert_eq!(
            result.artifact_url(),
            Some("https://mock-cdn.example.com/video_queue/1.mp4")
        );
        assert_eq!(service.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_cycles_through_configured_results() {
        let service = MockGenerationService::new()
            .with_result(GenerationResult::failed(
                &GenerationError::Timeout { attempts: 3 },
                ArtifactKind::Video,
                Some("job-1".to_string()),
            ))
            .with_result(GenerationResult::succeeded(
                "https://x/v.mp4".to_string(),
                ArtifactKind::Video,
                Some("job-2".to_string()),
            ));

        let first = service.generate(&request()).await;
        assert_eq!(first.error_kind(), Some(ErrorKind::Timeout));

        let second = service.generate(&request()).await;
        assert_eq!(second.artifact_url(), Some("https://x/v.mp4"));

        // Should cycle back
        let third = service.generate(&request()).await;
        assert_eq!(third.error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(service.get_requests().len(), 3);
    }
}
