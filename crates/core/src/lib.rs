//! Core types and shared functionality for mcp-alphafold.
//!
//! This crate provides:
//! - Response cache with SQLite backend and deterministic request keys
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheStats, ResponseCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
