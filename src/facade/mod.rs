//! The single entry point external callers use to generate media.
//!
//! `generate()` never fails: every error is folded into a
//! [`GenerationResult`](crate::models::GenerationResult) with `success == false`.

pub mod mock;
pub mod orchestrator;

pub use mock::MockGenerationService;
pub use orchestrator::GenerationFacade;

use crate::models::{GenerationRequest, GenerationResult};
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;
}
