//! Provider adapters
//!
//! Each adapter describes one third-party generation API: where to send a
//! submission, how to authenticate, and which key paths hold the job id, the
//! status, the failure message and the finished artifact. The submit/poll/extract
//! algorithms are shared and only ever read these descriptions.

pub mod image_studio;
pub mod influencer_image;
pub mod motion_task;
pub mod talking_avatar;
pub mod video_queue;

pub use image_studio::ImageStudioAdapter;
pub use influencer_image::InfluencerImageAdapter;
pub use motion_task::MotionTaskAdapter;
pub use talking_avatar::TalkingAvatarAdapter;
pub use video_queue::VideoQueueAdapter;

use crate::builder::ProviderRequest;
use crate::config::Config;
use crate::http::AuthScheme;
use crate::models::{ArtifactKind, GenerationRequest, Mode, Provider};
use crate::normalize::DEFAULT_ARTIFACT_PATHS;
use crate::poller::PollPolicy;
use reqwest::Url;
use std::sync::Arc;

pub const DEFAULT_JOB_ID_PATHS: &[&str] = &[
    "task_id",
    "taskId",
    "job_id",
    "request_id",
    "id",
    "data.task_id",
    "data.id",
];

pub const DEFAULT_STATUS_PATHS: &[&str] = &["status", "state", "data.status", "task_status"];

pub const DEFAULT_MESSAGE_PATHS: &[&str] = &[
    "error.message",
    "message",
    "detail",
    "error",
    "error_message",
    "failure_reason",
];

pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    fn base_url(&self) -> &str;

    fn auth_scheme(&self) -> AuthScheme;

    /// Build the submission for `request`. Must not fail for any valid request.
    fn build_request(&self, request: &GenerationRequest) -> ProviderRequest;

    /// Status endpoint templates tried in order; `{id}` is replaced with the job id.
    fn status_templates(&self) -> &'static [&'static str];

    /// Endpoint holding the full result once a job completes, when the status body lacks it.
    fn result_template(&self) -> Option<&'static str> {
        None
    }

    fn poll_policy(&self) -> PollPolicy;

    fn artifact_kind(&self, mode: Mode) -> ArtifactKind {
        mode.artifact_kind()
    }

    fn artifact_paths(&self) -> &'static [&'static str] {
        DEFAULT_ARTIFACT_PATHS
    }

    fn job_id_paths(&self) -> &'static [&'static str] {
        DEFAULT_JOB_ID_PATHS
    }

    fn status_paths(&self) -> &'static [&'static str] {
        DEFAULT_STATUS_PATHS
    }

    fn message_paths(&self) -> &'static [&'static str] {
        DEFAULT_MESSAGE_PATHS
    }
}

/// Substitute the job id into an endpoint template.
///
/// The id is percent-encoded for where `{id}` sits: as one path segment, or as a
/// form value when it follows the `?`. Returns `None` for an id that cannot be
/// carried as a single segment (`.` or `..`).
pub fn render_template(template: &str, job_id: &str) -> Option<String> {
    let in_query = template
        .find('?')
        .zip(template.find("{id}"))
        .is_some_and(|(query, id)| query < id);

    let encoded = encode_job_id(job_id, in_query)?;
    Some(template.replace("{id}", &encoded))
}

fn encode_job_id(job_id: &str, in_query: bool) -> Option<String> {
    let mut scratch = Url::parse("http://job.invalid/").ok()?;

    let encoded = if in_query {
        scratch.query_pairs_mut().append_pair("id", job_id);
        scratch.query()?.strip_prefix("id=")?.to_string()
    } else {
        scratch.path_segments_mut().ok()?.clear().push(job_id);
        scratch.path().trim_start_matches('/').to_string()
    };

    (!encoded.is_empty()).then_some(encoded)
}

/// One adapter per provider; lookups are total.
#[derive(Clone)]
pub struct AdapterRegistry {
    video_queue: Arc<dyn ProviderAdapter>,
    image_studio: Arc<dyn ProviderAdapter>,
    motion_task: Arc<dyn ProviderAdapter>,
    talking_avatar: Arc<dyn ProviderAdapter>,
    influencer_image: Arc<dyn ProviderAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            video_queue: Arc::new(VideoQueueAdapter::new()),
            image_studio: Arc::new(ImageStudioAdapter::new()),
            motion_task: Arc::new(MotionTaskAdapter::new()),
            talking_avatar: Arc::new(TalkingAvatarAdapter::new()),
            influencer_image: Arc::new(InfluencerImageAdapter::new()),
        }
    }
}

impl AdapterRegistry {
    /// Adapters pointed at configured base URLs, with poll overrides applied.
    pub fn from_config(config: &Config) -> Self {
        let url = |provider: Provider, adapter_default: &str| {
            config
                .base_url(provider)
                .unwrap_or(adapter_default)
                .to_string()
        };
        let poll = |policy: PollPolicy| policy.with_overrides(&config.poll);

        let video_queue = VideoQueueAdapter::new();
        let video_queue = video_queue
            .clone()
            .with_base_url(url(Provider::VideoQueue, video_queue.base_url()))
            .with_poll_policy(poll(video_queue.poll_policy()));

        let image_studio = ImageStudioAdapter::new();
        let image_studio = image_studio
            .clone()
            .with_base_url(url(Provider::ImageStudio, image_studio.base_url()))
            .with_poll_policy(poll(image_studio.poll_policy()));

        let motion_task = MotionTaskAdapter::new();
        let motion_task = motion_task
            .clone()
            .with_base_url(url(Provider::MotionTask, motion_task.base_url()))
            .with_poll_policy(poll(motion_task.poll_policy()));

        // Derived adapters follow their base provider unless given their own URL.
        let talking_avatar = TalkingAvatarAdapter::from_base(
            motion_task
                .clone()
                .with_base_url(url(Provider::TalkingAvatar, motion_task.base_url())),
        );
        let talking_avatar = talking_avatar
            .clone()
            .with_poll_policy(poll(talking_avatar.poll_policy()));

        let influencer_image = InfluencerImageAdapter::from_base(
            image_studio
                .clone()
                .with_base_url(url(Provider::InfluencerImage, image_studio.base_url())),
        );

        Self::default()
            .with_adapter(video_queue)
            .with_adapter(image_studio)
            .with_adapter(motion_task)
            .with_adapter(talking_avatar)
            .with_adapter(influencer_image)
    }

    /// Replace the adapter registered for `adapter.provider()`.
    pub fn with_adapter(mut self, adapter: impl ProviderAdapter + 'static) -> Self {
        let provider = adapter.provider();
        let adapter: Arc<dyn ProviderAdapter> = Arc::new(adapter);
        match provider {
            Provider::VideoQueue => self.video_queue = adapter,
            Provider::ImageStudio => self.image_studio = adapter,
            Provider::MotionTask => self.motion_task = adapter,
            Provider::TalkingAvatar => self.talking_avatar = adapter,
            Provider::InfluencerImage => self.influencer_image = adapter,
        }
        self
    }

    pub fn get(&self, provider: Provider) -> &dyn ProviderAdapter {
        match provider {
            Provider::VideoQueue => self.video_queue.as_ref(),
            Provider::ImageStudio => self.image_studio.as_ref(),
            Provider::MotionTask => self.motion_task.as_ref(),
            Provider::TalkingAvatar => self.talking_avatar.as_ref(),
            Provider::InfluencerImage => self.influencer_image.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollOverrides;
    use std::time::Duration;

    #[test]
    fn test_registry_lookup_matches_provider() {
        let registry = AdapterRegistry::default();
        for provider in Provider::ALL {
            assert_eq!(registry.get(provider).provider(), provider);
        }
    }

    #[test]
    fn test_from_config_applies_base_urls_and_poll_overrides() {
        let mut config = Config::default();
        config
            .base_urls
            .insert(Provider::MotionTask, "http://motion.local".to_string());
        config.poll = PollOverrides {
            initial_delay: None,
            interval: Some(Duration::from_secs(1)),
            max_attempts: Some(3),
        };

        let registry = AdapterRegistry::from_config(&config);
        assert_eq!(
            registry.get(Provider::MotionTask).base_url(),
            "http://motion.local"
        );
        // Derived adapter inherits its base provider's URL.
        assert_eq!(
            registry.get(Provider::TalkingAvatar).base_url(),
            "http://motion.local"
        );

        let policy = registry.get(Provider::VideoQueue).poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.initial_delay,
            VideoQueueAdapter::new().poll_policy().initial_delay
        );
    }

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("/v1/tasks/{id}/result", "abc-1_x.y~z").as_deref(),
            Some("/v1/tasks/abc-1_x.y~z/result")
        );
    }

    #[test]
    fn test_render_template_encodes_path_segment() {
        assert_eq!(
            render_template("/v1/video/tasks/{id}", "other?x=1").as_deref(),
            Some("/v1/video/tasks/other%3Fx=1")
        );
        assert_eq!(
            render_template("/v1/video/tasks/{id}", "a/b#c").as_deref(),
            Some("/v1/video/tasks/a%2Fb%23c")
        );
        assert_eq!(render_template("/v1/video/tasks/{id}", ".."), None);
    }

    #[test]
    fn test_render_template_encodes_query_value() {
        assert_eq!(
            render_template("/api/v1/generate/record-info?taskId={id}", "t1&taskId=t2").as_deref(),
            Some("/api/v1/generate/record-info?taskId=t1%26taskId%3Dt2")
        );
    }
}
