//! Queue-based video provider. Every submission becomes a background task.

use super::ProviderAdapter;
use crate::builder::{truncate_prompt, DurationBuckets, ProviderRequest, RatioTable};
use crate::http::AuthScheme;
use crate::models::{AspectRatio, GenerationRequest, Provider};
use crate::poller::PollPolicy;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.videoqueue.ai";
const PROMPT_LIMIT: usize = 2000;

const RATIOS: RatioTable = RatioTable {
    entries: &[
        (AspectRatio::Landscape, "16:9"),
        (AspectRatio::Portrait, "9:16"),
        (AspectRatio::Square, "1:1"),
    ],
    default: "16:9",
};

const DURATIONS: DurationBuckets = DurationBuckets {
    seconds: &[5, 10],
    default: 5,
};

#[derive(Debug, Clone)]
pub struct VideoQueueAdapter {
    base_url: String,
    poll: PollPolicy,
}

impl VideoQueueAdapter {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollPolicy::new(Duration::from_secs(5), Duration::from_secs(5), 60),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

impl Default for VideoQueueAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for VideoQueueAdapter {
    fn provider(&self) -> Provider {
        Provider::VideoQueue
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest {
        let mut payload = json!({
            "prompt": truncate_prompt(request.prompt(), PROMPT_LIMIT),
            "aspect_ratio": RATIOS.literal(request.aspect_ratio()),
            "duration": DURATIONS.pick(request.duration_seconds()),
        });

        let endpoint = match request.source_artifact_ref() {
            Some(image_url) => {
                payload["image_url"] = Value::String(image_url.to_string());
                "/v1/video/image-to-video"
            }
            None => "/v1/video/text-to-video",
        };

        ProviderRequest {
            endpoint: endpoint.to_string(),
            payload,
        }
    }

    fn status_templates(&self) -> &'static [&'static str] {
        &["/v1/video/tasks/{id}", "/v1/tasks/{id}"]
    }

    fn result_template(&self) -> Option<&'static str> {
        Some("/v1/video/tasks/{id}/result")
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    #[test]
    fn test_text_to_video_uses_text_endpoint() {
        let request = GenerationRequest::builder(Provider::VideoQueue, Mode::TextToVideo, "waves")
            .aspect_ratio(AspectRatio::Portrait)
            .duration_seconds(8)
            .build()
            .unwrap();

        let built = VideoQueueAdapter::new().build_request(&request);
        assert_eq!(built.endpoint, "/v1/video/text-to-video");
        assert_eq!(built.payload["aspect_ratio"], "9:16");
        assert_eq!(built.payload["duration"], 10);
        assert!(built.payload.get("image_url").is_none());
    }

    #[test]
    fn test_image_to_video_uses_image_endpoint() {
        let request =
            GenerationRequest::builder(Provider::VideoQueue, Mode::ImageToVideo, "zoom in")
                .source_artifact("https://cdn.test/a.png")
                .aspect_ratio(AspectRatio::Feed)
                .build()
                .unwrap();

        let built = VideoQueueAdapter::new().build_request(&request);
        assert_eq!(built.endpoint, "/v1/video/image-to-video");
        assert_eq!(built.payload["image_url"], "https://cdn.test/a.png");
        assert_eq!(built.payload["aspect_ratio"], "16:9");
        assert_eq!(built.payload["duration"], 5);
    }

    #[test]
    fn test_long_prompt_is_truncated() {
        let request =
            GenerationRequest::builder(Provider::VideoQueue, Mode::TextToVideo, "x".repeat(3000))
                .build()
                .unwrap();

        let built = VideoQueueAdapter::new().build_request(&request);
        assert_eq!(
            built.payload["prompt"].as_str().unwrap().len(),
            PROMPT_LIMIT
        );
    }
}
