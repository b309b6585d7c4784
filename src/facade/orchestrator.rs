use super::GenerationService;
use crate::config::Config;
use crate::credentials::{
    CredentialDefaults, CredentialResolver, JsonSettingsStore, MemorySettingsStore, SettingsStore,
};
use crate::error::GenerationError;
use crate::http::ProviderHttpClient;
use crate::models::{ArtifactKind, GenerationRequest, GenerationResult};
use crate::normalize::Artifact;
use crate::poller::JobPoller;
use crate::providers::{AdapterRegistry, ProviderAdapter};
use crate::submit::{JobSubmitter, Submission};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// Resolve → build → submit → poll → normalize, for one request at a time.
///
/// Holds only read-only parts, so one facade can serve any number of concurrent calls.
pub struct GenerationFacade {
    resolver: CredentialResolver,
    adapters: AdapterRegistry,
    client: Client,
    timeout: Duration,
}

impl GenerationFacade {
    pub fn new(resolver: CredentialResolver, adapters: AdapterRegistry) -> Self {
        Self {
            resolver,
            adapters,
            client: Client::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Construct a facade from environment configuration (`Config::from_env`).
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings: Arc<dyn SettingsStore> = match &config.settings_path {
            Some(path) => {
                info!("Loading dashboard settings from {}", path.display());
                Arc::new(JsonSettingsStore::load(path)?)
            }
            None => Arc::new(MemorySettingsStore::new()),
        };

        let resolver = CredentialResolver::new(settings, CredentialDefaults::from_config(config));

        // Reuse one HTTP connection pool across providers.
        let client = Client::builder().build()?;

        Ok(Self {
            resolver,
            adapters: AdapterRegistry::from_config(config),
            client,
            timeout: config.http_timeout,
        })
    }

    pub fn with_http_client(mut self, client: Client, timeout: Duration) -> Self {
        self.client = client;
        self.timeout = timeout;
        self
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.generate_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`generate`](Self::generate), but gives up with `Cancelled` once `cancel` fires.
    ///
    /// An already-cancelled token sends nothing to the provider.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let adapter = self.adapters.get(request.provider());
        let kind = adapter.artifact_kind(request.mode());
        let span = tracing::info_span!(
            "generate",
            call_id = %Uuid::new_v4(),
            provider = %request.provider()
        );

        let mut job_id = None;
        let outcome = self
            .run(request, adapter, kind, cancel, &mut job_id)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match outcome {
            Ok(artifact) => {
                info!("Generated {:?} at {}", artifact.kind, artifact.url);
                GenerationResult::succeeded(artifact.url, artifact.kind, job_id)
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                GenerationResult::failed(&e, kind, job_id)
            }
        }
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        adapter: &dyn ProviderAdapter,
        kind: ArtifactKind,
        cancel: &CancellationToken,
        job_id: &mut Option<String>,
    ) -> std::result::Result<Artifact, GenerationError> {
        let provider = request.provider();
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let credential =
            self.resolver
                .resolve(provider)
                .ok_or_else(|| GenerationError::MissingCredential {
                    provider: provider.to_string(),
                })?;

        let built = adapter.build_request(request);
        info!(
            "Submitting {:?} request ({}) to {}",
            request.mode(),
            request.aspect_ratio().as_ratio(),
            built.endpoint
        );

        let http = ProviderHttpClient::new(
            self.client.clone(),
            adapter.base_url(),
            adapter.auth_scheme(),
            &credential,
            self.timeout,
        );

        let submitter = JobSubmitter::new(&http, adapter);
        let submission = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Generation cancelled before {} accepted the request", provider);
                return Err(GenerationError::Cancelled);
            }
            submitted = submitter.submit(&built, kind) => submitted?,
        };

        match submission {
            Submission::Artifact(artifact) => Ok(artifact),
            Submission::Job(mut job) => {
                *job_id = Some(job.id.clone());
                JobPoller::new(&http, adapter)
                    .poll(&mut job, kind, cancel)
                    .await
            }
        }
    }
}

#[async_trait]
impl GenerationService for GenerationFacade {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        GenerationFacade::generate(self, request).await
    }
}
