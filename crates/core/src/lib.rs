//! Core types and shared functionality for pagefront.
//!
//! This crate provides:
//! - Request parameter normalization with environment-sourced defaults
//! - Deterministic cache keys and a file-backed result cache
//! - The `Article` response model
//! - Unified error types
//! - Configuration structures

pub mod article;
pub mod cache;
pub mod config;
pub mod error;
pub mod params;

pub use article::Article;
pub use cache::{CacheEntry, CacheKey, CacheStore, derive_key};
pub use config::{AppConfig, FetcherKind};
pub use error::{Error, ErrorBody};
pub use params::{RequestParameters, WaitUntil, normalize};
