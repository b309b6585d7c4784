//! Talking-avatar video, served by the motion-task provider's avatar endpoint.
//!
//! The prompt is the script the avatar speaks. When an audio track is supplied
//! it drives the lip sync instead and the prompt only steers the performance.

use super::motion_task::{ARTIFACT_PATHS, JOB_ID_PATHS, RATIOS, STATUS_PATHS, STATUS_TEMPLATES};
use super::{MotionTaskAdapter, ProviderAdapter};
use crate::builder::{truncate_prompt, ProviderRequest};
use crate::http::AuthScheme;
use crate::models::{ArtifactKind, GenerationRequest, Mode, Provider};
use crate::poller::PollPolicy;
use serde_json::{json, Value};
use std::time::Duration;

const SCRIPT_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct TalkingAvatarAdapter {
    base: MotionTaskAdapter,
    poll: PollPolicy,
}

impl TalkingAvatarAdapter {
    pub fn new() -> Self {
        Self::from_base(MotionTaskAdapter::new())
    }

    pub fn from_base(base: MotionTaskAdapter) -> Self {
        // Lip-synced renders take noticeably longer than plain clips.
        let poll = PollPolicy::new(Duration::from_secs(15), Duration::from_secs(10), 60);
        Self { base, poll }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

impl Default for TalkingAvatarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for TalkingAvatarAdapter {
    fn provider(&self) -> Provider {
        Provider::TalkingAvatar
    }

    fn base_url(&self) -> &str {
        self.base.base_url()
    }

    fn auth_scheme(&self) -> AuthScheme {
        self.base.auth_scheme()
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest {
        let mut payload = json!({
            "image_url": request.source_artifact_ref().unwrap_or_default(),
            "aspect_ratio": RATIOS.literal(request.aspect_ratio()),
        });

        let script = truncate_prompt(request.prompt(), SCRIPT_LIMIT);
        match request.audio_artifact_ref() {
            Some(audio_url) => {
                payload["audio_url"] = Value::String(audio_url.to_string());
                payload["prompt"] = Value::String(script);
            }
            None => payload["script"] = Value::String(script),
        }

        ProviderRequest {
            endpoint: "/api/v1/avatar/talk".to_string(),
            payload,
        }
    }

    fn status_templates(&self) -> &'static [&'static str] {
        STATUS_TEMPLATES
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    fn artifact_kind(&self, _mode: Mode) -> ArtifactKind {
        ArtifactKind::Video
    }

    fn artifact_paths(&self) -> &'static [&'static str] {
        ARTIFACT_PATHS
    }

    fn job_id_paths(&self) -> &'static [&'static str] {
        JOB_ID_PATHS
    }

    fn status_paths(&self) -> &'static [&'static str] {
        STATUS_PATHS
    }

    fn message_paths(&self) -> &'static [&'static str] {
        self.base.message_paths()
    }
}
