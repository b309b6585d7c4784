//! Task-envelope video provider: every response wraps its fields in `data`.

use super::ProviderAdapter;
use crate::builder::{truncate_prompt, DurationBuckets, ProviderRequest, RatioTable};
use crate::http::AuthScheme;
use crate::models::{AspectRatio, GenerationRequest, Provider};
use crate::poller::PollPolicy;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.motiontask.ai";
const PROMPT_LIMIT: usize = 2500;
const MODEL: &str = "motion-standard";

pub(crate) const RATIOS: RatioTable = RatioTable {
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

pub(crate) const STATUS_TEMPLATES: &[&str] = &[
    "/api/v1/tasks/{id}",
    "/api/v1/generate/record-info?taskId={id}",
];

pub(crate) const ARTIFACT_PATHS: &[&str] = &[
    "data.video_url",
    "data.result.url",
    "data.works[0].url",
    "data.task_result.videos[0].url",
    "url",
    "result.url",
    "result.video_url",
    "results[0].url",
    "results[0].video_url",
];

pub(crate) const JOB_ID_PATHS: &[&str] = &["data.task_id", "data.taskId", "task_id", "id"];

pub(crate) const STATUS_PATHS: &[&str] = &["data.status", "data.state", "data.task_status", "status"];

#[derive(Debug, Clone)]
pub struct MotionTaskAdapter {
    base_url: String,
    poll: PollPolicy,
}

impl MotionTaskAdapter {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollPolicy::new(Duration::from_secs(10), Duration::from_secs(10), 36),
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

impl Default for MotionTaskAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for MotionTaskAdapter {
    fn provider(&self) -> Provider {
        Provider::MotionTask
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest {
        // This provider wants the duration as a string literal.
        let mut payload = json!({
            "model": MODEL,
            "prompt": truncate_prompt(request.prompt(), PROMPT_LIMIT),
            "aspect_ratio": RATIOS.literal(request.aspect_ratio()),
            "duration": DURATIONS.pick(request.duration_seconds()).to_string(),
        });

        let endpoint = match request.source_artifact_ref() {
            Some(image_url) => {
                payload["image"] = Value::String(image_url.to_string());
                "/api/v1/generate/image2video"
            }
            None => "/api/v1/generate/text2video",
        };

        ProviderRequest {
            endpoint: endpoint.to_string(),
            payload,
        }
    }

    fn status_templates(&self) -> &'static [&'static str] {
        STATUS_TEMPLATES
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
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
        &[
            "data.fail_msg",
            "data.error",
            "msg",
            "error.message",
            "message",
            "error",
        ]
    }
}
