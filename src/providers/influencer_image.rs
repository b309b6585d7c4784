//! Influencer-style portraits on top of the image studio provider.

use super::{ImageStudioAdapter, ProviderAdapter};
use crate::builder::ProviderRequest;
use crate::http::AuthScheme;
use crate::models::{GenerationRequest, Provider};
use crate::poller::PollPolicy;

const STYLE_PREFIX: &str = "Photorealistic lifestyle photo of a social media influencer, natural light, shot on a smartphone, candid framing.";

#[derive(Debug, Clone)]
pub struct InfluencerImageAdapter {
    base: ImageStudioAdapter,
}

impl InfluencerImageAdapter {
    pub fn new() -> Self {
        Self::from_base(ImageStudioAdapter::new())
    }

    pub fn from_base(base: ImageStudioAdapter) -> Self {
        Self { base }
    }
}

impl Default for InfluencerImageAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for InfluencerImageAdapter {
    fn provider(&self) -> Provider {
        Provider::InfluencerImage
    }

    fn base_url(&self) -> &str {
        self.base.base_url()
    }

    fn auth_scheme(&self) -> AuthScheme {
        self.base.auth_scheme()
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest {
        let styled = format!("{} {}", STYLE_PREFIX, request.prompt());
        self.base.request_with_prompt(&styled, request)
    }

    fn status_templates(&self) -> &'static [&'static str] {
        self.base.status_templates()
    }

    fn result_template(&self) -> Option<&'static str> {
        self.base.result_template()
    }

    fn poll_policy(&self) -> PollPolicy {
        self.base.poll_policy()
    }

    fn artifact_paths(&self) -> &'static [&'static str] {
        self.base.artifact_paths()
    }

    fn job_id_paths(&self) -> &'static [&'static str] {
        self.base.job_id_paths()
    }
}
