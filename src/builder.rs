//! Pure helpers for turning a [`GenerationRequest`](crate::models::GenerationRequest)
//! into a provider submission. Nothing here performs I/O or fails.

use crate::models::AspectRatio;
use serde_json::Value;

/// Endpoint path (relative to the adapter's base URL) plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub endpoint: String,
    pub payload: Value,
}

/// Cut `prompt` down to at most `limit` characters, never splitting a code point.
pub fn truncate_prompt(prompt: &str, limit: usize) -> String {
    match prompt.char_indices().nth(limit) {
        Some((byte_index, _)) => {
            tracing::debug!("Truncating prompt to {} characters", limit);
            prompt[..byte_index].trim_end().to_string()
        }
        None => prompt.to_string(),
    }
}

/// Aspect ratio literals a provider accepts, with an explicit fallback.
#[derive(Debug, Clone, Copy)]
pub struct RatioTable {
    pub entries: &'static [(AspectRatio, &'static str)],
    pub default: &'static str,
}

impl RatioTable {
    pub fn literal(&self, ratio: AspectRatio) -> &'static str {
        self.entries
            .iter()
            .find(|(r, _)| *r == ratio)
            .map(|(_, literal)| *literal)
            .unwrap_or(self.default)
    }
}

/// Discrete clip lengths a provider accepts, in ascending order.
#[derive(Debug, Clone, Copy)]
pub struct DurationBuckets {
    pub seconds: &'static [u32],
    pub default: u32,
}

impl DurationBuckets {
    /// Smallest bucket that fits the request, else the longest available.
    pub fn pick(&self, requested: Option<u32>) -> u32 {
        let Some(requested) = requested else {
            return self.default;
        };
        self.seconds
            .iter()
            .copied()
            .find(|bucket| *bucket >= requested)
            .or_else(|| self.seconds.last().copied())
            .unwrap_or(self.default)
    }
}
