//! Generation job orchestrator for the socialdash dashboard
//!
//! Submits image and video generation requests to external providers, polls
//! queued jobs to completion, and reconciles each provider's response shape
//! into a single `GenerationResult`.

pub mod builder;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod http;
pub mod models;
pub mod normalize;
pub mod poller;
pub mod providers;
pub mod submit;

pub use error::{Error, ErrorKind, GenerationError, Result};
