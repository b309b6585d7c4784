//! Layered credential resolution
//!
//! Secrets for a provider can come from several overlapping places. They are
//! probed in a fixed order and the first plausible value wins:
//!
//! 1. the dashboard's runtime settings blob, keyed by provider
//! 2. a manually entered per-provider override
//! 3. the build-time default for the canonical provider
//! 4. the legacy shared default
//!
//! "Plausible" only means non-empty and longer than a short placeholder; the
//! secret is never checked against the provider here.

use crate::config::Config;
use crate::models::{Credential, CredentialTier, Provider};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const MIN_SECRET_LEN: usize = 8;

/// The provider that the build-time default belongs to.
pub const CANONICAL_PROVIDER: Provider = Provider::VideoQueue;

/// Read-only view of the dashboard's settings store.
pub trait SettingsStore: Send + Sync {
    fn provider_setting(&self, provider: Provider) -> Option<String>;
    fn manual_override(&self, provider: Provider) -> Option<String>;
}

/// Settings file written by the dashboard UI.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSettingsStore {
    #[serde(default)]
    api_keys: HashMap<String, String>,
    #[serde(default)]
    manual_keys: HashMap<String, String>,
}

impl JsonSettingsStore {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| {
            Error::Config(format!("Invalid settings file {}: {}", path.display(), e))
        })
    }
}

impl SettingsStore for JsonSettingsStore {
    fn provider_setting(&self, provider: Provider) -> Option<String> {
        self.api_keys.get(provider.slug()).cloned()
    }

    fn manual_override(&self, provider: Provider) -> Option<String> {
        self.manual_keys.get(provider.slug()).cloned()
    }
}

/// In-memory settings store for embedding callers and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    settings: HashMap<Provider, String>,
    overrides: HashMap<Provider, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, provider: Provider, secret: impl Into<String>) -> Self {
        self.settings.insert(provider, secret.into());
        self
    }

    pub fn with_override(mut self, provider: Provider, secret: impl Into<String>) -> Self {
        self.overrides.insert(provider, secret.into());
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn provider_setting(&self, provider: Provider) -> Option<String> {
        self.settings.get(&provider).cloned()
    }

    fn manual_override(&self, provider: Provider) -> Option<String> {
        self.overrides.get(&provider).cloned()
    }
}

/// Defaults consulted after the settings store (tiers 3 and 4).
#[derive(Debug, Clone, Default)]
pub struct CredentialDefaults {
    pub build_default: Option<String>,
    pub legacy: Option<String>,
}

impl CredentialDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            build_default: config.default_api_key.clone(),
            legacy: config.legacy_api_key.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    settings: Arc<dyn SettingsStore>,
    defaults: CredentialDefaults,
}

impl CredentialResolver {
    pub fn new(settings: Arc<dyn SettingsStore>, defaults: CredentialDefaults) -> Self {
        Self { settings, defaults }
    }

    /// Pick the first acceptable secret for `provider`, or `None` if every tier is absent or implausible.
    pub fn resolve(&self, provider: Provider) -> Option<Credential> {
        let owner = provider.credential_provider();

        let candidates = [
            (
                CredentialTier::Settings,
                self.settings.provider_setting(owner),
            ),
            (
                CredentialTier::ManualOverride,
                self.settings.manual_override(owner),
            ),
            (
                CredentialTier::BuildDefault,
                self.defaults
                    .build_default
                    .clone()
                    .filter(|_| owner == CANONICAL_PROVIDER),
            ),
            (CredentialTier::Legacy, self.defaults.legacy.clone()),
        ];

        let credential = candidates.into_iter().find_map(|(tier, candidate)| {
            let secret = candidate.as_deref().and_then(plausible_secret)?;
            Some(Credential {
                provider: owner,
                secret: secret.to_string(),
                source_tier: tier,
            })
        });

        match &credential {
            Some(c) => tracing::debug!(
                "Resolved credential for {} from {:?}",
                provider,
                c.source_tier
            ),
            None => tracing::warn!("No usable credential for {}", provider),
        }

        credential
    }
}

fn plausible_secret(candidate: &str) -> Option<&str> {
    let trimmed = candidate.trim();
    (trimmed.chars().count() >= MIN_SECRET_LEN).then_some(trimmed)
}
