//! Image provider that usually answers synchronously with the finished image,
//! but may queue heavy requests and hand back a request id instead.

use super::ProviderAdapter;
use crate::builder::{truncate_prompt, ProviderRequest, RatioTable};
use crate::http::AuthScheme;
use crate::models::{AspectRatio, GenerationRequest, Provider};
use crate::poller::PollPolicy;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.imagestudio.ai";
pub(crate) const PROMPT_LIMIT: usize = 1000;

pub(crate) const SIZES: RatioTable = RatioTable {
    entries: &[
        (AspectRatio::Square, "square_hd"),
        (AspectRatio::Landscape, "landscape_16_9"),
        (AspectRatio::Portrait, "portrait_16_9"),
        (AspectRatio::Standard, "landscape_4_3"),
        (AspectRatio::Feed, "portrait_4_3"),
    ],
    default: "square_hd",
};

#[derive(Debug, Clone)]
pub struct ImageStudioAdapter {
    base_url: String,
    poll: PollPolicy,
}

impl ImageStudioAdapter {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollPolicy::new(Duration::from_secs(2), Duration::from_secs(3), 40),
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

    /// Build a submission with an already-prepared prompt. Shared with derived adapters.
    pub(crate) fn request_with_prompt(
        &self,
        prompt: &str,
        request: &GenerationRequest,
    ) -> ProviderRequest {
        let mut payload = json!({
            "prompt": truncate_prompt(prompt, PROMPT_LIMIT),
            "image_size": SIZES.literal(request.aspect_ratio()),
            "num_images": 1,
        });

        let endpoint = match request.source_artifact_ref() {
            Some(image_url) => {
                payload["image_url"] = Value::String(image_url.to_string());
                "/v1/images/edit"
            }
            None => "/v1/images/generate",
        };

        ProviderRequest {
            endpoint: endpoint.to_string(),
            payload,
        }
    }
}

impl Default for ImageStudioAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for ImageStudioAdapter {
    fn provider(&self) -> Provider {
        Provider::ImageStudio
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::Header("x-api-key")
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest {
        self.request_with_prompt(request.prompt(), request)
    }

    fn status_templates(&self) -> &'static [&'static str] {
        // The bare request URL is the result endpoint and carries no status field.
        &["/v1/requests/{id}/status"]
    }

    fn result_template(&self) -> Option<&'static str> {
        Some("/v1/requests/{id}")
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    fn artifact_paths(&self) -> &'static [&'static str] {
        &[
            "images[0].url",
            "url",
            "image.url",
            "result.url",
            "results[0].url",
            "output[0]",
        ]
    }

    fn job_id_paths(&self) -> &'static [&'static str] {
        &["request_id", "id"]
    }
}
