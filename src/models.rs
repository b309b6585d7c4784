//! Data models and structures
//!
//! Defines the caller-facing generation request, the credential and job records
//! that live for one call, and the uniform result every adapter produces.

use crate::error::{ErrorKind, GenerationError};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    VideoQueue,
    ImageStudio,
    MotionTask,
    TalkingAvatar,
    InfluencerImage,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::VideoQueue,
        Provider::ImageStudio,
        Provider::MotionTask,
        Provider::TalkingAvatar,
        Provider::InfluencerImage,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Provider::VideoQueue => "video_queue",
            Provider::ImageStudio => "image_studio",
            Provider::MotionTask => "motion_task",
            Provider::TalkingAvatar => "talking_avatar",
            Provider::InfluencerImage => "influencer_image",
        }
    }

    /// Provider whose credential this provider authenticates with.
    ///
    /// Derived adapters ride on their base provider's account.
    pub fn credential_provider(&self) -> Provider {
        match self {
            Provider::TalkingAvatar => Provider::MotionTask,
            Provider::InfluencerImage => Provider::ImageStudio,
            other => *other,
        }
    }

    pub fn supports(&self, mode: Mode) -> bool {
        match self {
            Provider::VideoQueue | Provider::MotionTask => {
                matches!(mode, Mode::TextToVideo | Mode::ImageToVideo)
            }
            Provider::ImageStudio | Provider::InfluencerImage => mode == Mode::TextToImage,
            Provider::TalkingAvatar => mode == Mode::AudioDrivenAvatar,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Provider::ALL
            .into_iter()
            .find(|p| p.slug() == normalized)
            .ok_or_else(|| format!("Unknown provider '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    TextToImage,
    TextToVideo,
    ImageToVideo,
    AudioDrivenAvatar,
}

impl Mode {
    /// Image-driven modes cannot be built without a source artifact.
    pub fn requires_source(&self) -> bool {
        matches!(self, Mode::ImageToVideo | Mode::AudioDrivenAvatar)
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Mode::TextToImage => ArtifactKind::Image,
            _ => ArtifactKind::Video,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "text-to-image" | "image" => Ok(Mode::TextToImage),
            "text-to-video" | "video" => Ok(Mode::TextToVideo),
            "image-to-video" => Ok(Mode::ImageToVideo),
            "audio-driven-avatar" | "avatar" => Ok(Mode::AudioDrivenAvatar),
            _ => Err(format!("Unknown mode '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
    Feed,
    Standard,
}

impl AspectRatio {
    pub fn as_ratio(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Feed => "4:5",
            AspectRatio::Standard => "4:3",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1:1" | "square" => Ok(AspectRatio::Square),
            "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            "4:5" | "feed" => Ok(AspectRatio::Feed),
            "4:3" | "standard" => Ok(AspectRatio::Standard),
            _ => Err(format!("Unsupported aspect ratio '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

/// Caller intent for one generation. Validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    provider: Provider,
    mode: Mode,
    prompt: String,
    source_artifact_ref: Option<String>,
    audio_artifact_ref: Option<String>,
    aspect_ratio: AspectRatio,
    duration_seconds: Option<u32>,
}

impl GenerationRequest {
    pub fn builder(
        provider: Provider,
        mode: Mode,
        prompt: impl Into<String>,
    ) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            provider,
            mode,
            prompt: prompt.into(),
            source_artifact_ref: None,
            audio_artifact_ref: None,
            aspect_ratio: AspectRatio::default(),
            duration_seconds: None,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn source_artifact_ref(&self) -> Option<&str> {
        self.source_artifact_ref.as_deref()
    }

    pub fn audio_artifact_ref(&self) -> Option<&str> {
        self.audio_artifact_ref.as_deref()
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn duration_seconds(&self) -> Option<u32> {
        self.duration_seconds
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    provider: Provider,
    mode: Mode,
    prompt: String,
    source_artifact_ref: Option<String>,
    audio_artifact_ref: Option<String>,
    aspect_ratio: AspectRatio,
    duration_seconds: Option<u32>,
}

impl GenerationRequestBuilder {
    pub fn source_artifact(mut self, url: impl Into<String>) -> Self {
        self.source_artifact_ref = Some(url.into());
        self
    }

    pub fn audio_artifact(mut self, url: impl Into<String>) -> Self {
        self.audio_artifact_ref = Some(url.into());
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    pub fn duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn build(self) -> Result<GenerationRequest> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(Error::InvalidRequest("prompt must not be empty".to_string()));
        }

        if !self.provider.supports(self.mode) {
            return Err(Error::InvalidRequest(format!(
                "provider '{}' does not support {:?}",
                self.provider, self.mode
            )));
        }

        let source_artifact_ref = self
            .source_artifact_ref
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if self.mode.requires_source() && source_artifact_ref.is_none() {
            return Err(Error::InvalidRequest(format!(
                "{:?} requires a source artifact",
                self.mode
            )));
        }

        Ok(GenerationRequest {
            provider: self.provider,
            mode: self.mode,
            prompt,
            source_artifact_ref,
            audio_artifact_ref: self
                .audio_artifact_ref
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            aspect_ratio: self.aspect_ratio,
            duration_seconds: self.duration_seconds,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialTier {
    Settings,
    ManualOverride,
    BuildDefault,
    Legacy,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: Provider,
    pub secret: String,
    pub source_tier: CredentialTier,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("secret", &"<redacted>")
            .field("source_tier", &self.source_tier)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

/// Provider-side unit of work, alive only for the duration of one `generate()` call.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub provider: Provider,
    status: JobStatus,
    pub attempts_made: u32,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, provider: Provider) -> Self {
        Self {
            id,
            provider,
            status: JobStatus::Pending,
            attempts_made: 0,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Apply an observed status. Returns false when the observation would move
    /// the job backward or out of a terminal state, in which case it is ignored.
    pub fn observe(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() || next.rank() < self.status.rank() {
            return false;
        }
        self.status = next;
        true
    }
}

/// The single output contract of [`GenerationFacade::generate`](crate::facade::GenerationFacade::generate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact_url: Option<String>,
    artifact_kind: ArtifactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_job_id: Option<String>,
}

impl GenerationResult {
    /// A successful result. An empty URL is never a success and becomes `ArtifactMissing`.
    pub fn succeeded(
        artifact_url: String,
        artifact_kind: ArtifactKind,
        provider_job_id: Option<String>,
    ) -> Self {
        if artifact_url.trim().is_empty() {
            return Self::failed(
                &GenerationError::ArtifactMissing,
                artifact_kind,
                provider_job_id,
            );
        }

        Self {
            success: true,
            artifact_url: Some(artifact_url),
            artifact_kind,
            error_kind: None,
            message: None,
            provider_job_id,
        }
    }

    /// A failed result. Provider-supplied detail is kept verbatim as the message.
    pub fn failed(
        error: &GenerationError,
        artifact_kind: ArtifactKind,
        provider_job_id: Option<String>,
    ) -> Self {
        Self {
            success: false,
            artifact_url: None,
            artifact_kind,
            error_kind: Some(error.kind()),
            message: Some(
                error
                    .provider_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            ),
            provider_job_id,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        self.artifact_kind
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn provider_job_id(&self) -> Option<&str> {
        self.provider_job_id.as_deref()
    }
}
